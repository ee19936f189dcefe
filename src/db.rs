use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Connect to PostgreSQL using the configured connection string (or the
/// `POSTGRES_URL` environment variable). A missing connection string is a
/// fatal configuration error surfaced before any other I/O.
pub async fn connect(config: &Config) -> Result<PgPool> {
    let url = config.db.connection_string()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await?;

    Ok(pool)
}
