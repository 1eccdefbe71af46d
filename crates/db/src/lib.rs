use std::{str::FromStr, time::Duration};

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

pub mod models;

/// Connection tuning for [`DBService::new`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Applied to every statement through the `statement_timeout` session option.
    pub statement_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct DBService {
    pub pool: PgPool,
}

impl DBService {
    /// Connect and run the embedded migrations.
    pub async fn new(database_url: &str, settings: &PoolSettings) -> Result<DBService, sqlx::Error> {
        let pool = Self::pool_options(settings)
            .connect_with(Self::connect_options(database_url, settings)?)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(
            max_connections = settings.max_connections,
            "Database pool ready, migrations applied"
        );
        Ok(DBService { pool })
    }

    /// Build a pool that only connects on first use. Nothing touches the
    /// database until a query runs, so no migrations are applied.
    pub fn new_lazy(database_url: &str, settings: &PoolSettings) -> Result<DBService, sqlx::Error> {
        let pool = Self::pool_options(settings)
            .connect_lazy_with(Self::connect_options(database_url, settings)?);
        Ok(DBService { pool })
    }

    fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
    }

    fn connect_options(
        database_url: &str,
        settings: &PoolSettings,
    ) -> Result<PgConnectOptions, sqlx::Error> {
        let timeout_ms = settings.statement_timeout.as_millis().to_string();
        Ok(PgConnectOptions::from_str(database_url)?
            .options([("statement_timeout", timeout_ms.as_str())]))
    }
}
