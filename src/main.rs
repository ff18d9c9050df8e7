//! # Oakline Billing Service
//!
//! Standalone web service around the billing library:
//!
//! - Axum handles HTTP routing and the request/response lifecycle
//! - SQLx manages the application database (orders, refunds, invoices)
//! - lettre delivers lifecycle emails when an SMTP relay is configured;
//!   otherwise sends are logged and skipped
//! - rendered invoice PDFs land in the configured invoice directory

use std::sync::Arc;

use tracing::info;

use oakline_billing::config::AppConfig;
use oakline_billing::invoice::{InvoiceService, PdfStore};
use oakline_billing::notify::{LogMailer, Mailer, Notifier, SmtpMailer};
use oakline_billing::refund::RefundService;
use oakline_billing::{create_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oakline_billing=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting Oakline billing service");

    let config = AppConfig::from_env();

    let pool = db::connect(&config.database_url).await?;
    info!("Connected to application database");

    db::MIGRATOR.run(&pool).await?;
    info!("Application migrations complete");

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            info!("Using SMTP relay {}", smtp.relay);
            Arc::new(
                SmtpMailer::new(smtp, &config.notify.from_address)
                    .map_err(|e| anyhow::anyhow!(e))?,
            )
        }
        None => {
            info!("No SMTP relay configured; outbound email will be logged only");
            Arc::new(LogMailer)
        }
    };
    let notifier = Notifier::new(mailer, config.notify.clone());

    let refunds = RefundService::new(pool.clone(), notifier.clone());
    let invoices = InvoiceService::new(
        pool.clone(),
        PdfStore::new(config.invoice_dir.clone()),
        notifier,
    );

    let app = create_app(pool, refunds, invoices);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
