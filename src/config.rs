//! Environment-driven configuration.
//!
//! Everything has a development default so `cargo run` works on a fresh
//! checkout. SMTP settings are optional: without `SMTP_RELAY` the service
//! logs outbound mail instead of sending it, and without `ADMIN_EMAIL`
//! admin notifications degrade to an unconfigured outcome.

use std::env;
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub invoice_dir: PathBuf,
    pub notify: NotifyConfig,
    pub smtp: Option<SmtpConfig>,
}

/// Addresses the notification dispatcher sends from and to.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub from_address: String,
    pub admin_address: Option<String>,
}

/// SMTP relay credentials for the lettre transport.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub relay: String,
    pub username: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let smtp = env::var("SMTP_RELAY").ok().map(|relay| SmtpConfig {
            relay,
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
        });

        Self {
            database_url: crate::db::url_from_env(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            invoice_dir: env::var("INVOICE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("invoices")),
            notify: NotifyConfig {
                from_address: env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "Oakline Billing <billing@oakline.example>".to_string()),
                admin_address: env::var("ADMIN_EMAIL").ok(),
            },
            smtp,
        }
    }
}
