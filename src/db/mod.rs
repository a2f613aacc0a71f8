pub(crate) mod models;
pub(crate) mod types;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use crate::core::config::Settings;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_BACKOFF: Duration = Duration::from_secs(3);

/// Acquires the pool once at startup. The process aborts if the database is
/// still unreachable after the bounded retry loop.
pub(crate) async fn init_pool(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    let database_url = settings.database().database_url();
    let mut connect_options: PgConnectOptions = database_url.parse()?;

    connect_options = connect_options
        .application_name("academy-rust")
        .log_statements(tracing::log::LevelFilter::Off);

    let options = PgPoolOptions::new()
        .max_connections(30)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true);

    let mut attempt = 1;
    loop {
        match options.clone().connect_with(connect_options.clone()).await {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    error = %err,
                    attempt,
                    "Database not reachable yet; retrying"
                );
                tokio::time::sleep(CONNECT_BACKOFF).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
