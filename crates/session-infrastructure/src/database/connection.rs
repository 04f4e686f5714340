//! Postgres pool for the user directory

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use session_shared::config::DatabaseSettings;

fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
}

/// Connects eagerly so a bad URL fails at startup rather than on the first
/// authenticated request.
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(settings).connect(&settings.url).await?;
    info!(
        "Directory pool ready (max {} connections, acquire timeout {}s)",
        settings.max_connections, settings.acquire_timeout_secs
    );
    Ok(pool)
}
