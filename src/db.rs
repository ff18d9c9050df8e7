//! Database helpers.
//!
//! The billing services run on SQLite through sqlx. Writers are wrapped in
//! transactions by the services themselves; this module only knows how to
//! build the pool and run the embedded migrations.

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Embedded migrations from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Database URL from the environment, with a local-file default.
pub fn url_from_env() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://oakline.db".to_string())
}

/// Connect the application pool.
///
/// WAL mode plus a busy timeout keeps concurrent request handlers from
/// tripping over each other's write transactions; a conflicting writer waits
/// instead of failing immediately.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
