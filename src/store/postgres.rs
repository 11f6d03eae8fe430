//! Postgres-backed store.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use thiserror::Error;

use crate::config::StoreOptions;

const MAX_CONNECTIONS: u32 = 12;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// User used when none is configured.
pub const DEFAULT_USERNAME: &str = "postgres";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("checkpoint {name} holds a negative block number {value}")]
    CorruptCheckpoint { name: String, value: i64 },

    #[error("block number {0} does not fit in a postgres BIGINT")]
    BlockOutOfRange(u64),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Connection pool plus the queries the controller needs.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open a pool and verify one connection.
    pub async fn connect(options: &StoreOptions) -> StoreResult<Self> {
        let pool = pool_options().connect_with(connect_options(options)).await?;

        tracing::info!(
            host = %options.host,
            port = options.port,
            database = %options.database,
            "Connected to postgres"
        );

        Ok(Self { pool })
    }

    /// Build a pool without connecting. Connections open on first query.
    pub fn connect_lazy(options: &StoreOptions) -> Self {
        Self {
            pool: pool_options().connect_lazy_with(connect_options(options)),
        }
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Last block the controller recorded under `name`.
    pub async fn load_checkpoint(&self, name: &str) -> StoreResult<Option<u64>> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT block_number FROM controller_checkpoints WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        value
            .map(|block| {
                u64::try_from(block).map_err(|_| StoreError::CorruptCheckpoint {
                    name: name.to_string(),
                    value: block,
                })
            })
            .transpose()
    }

    pub async fn save_checkpoint(&self, name: &str, block: u64) -> StoreResult<()> {
        let block = i64::try_from(block).map_err(|_| StoreError::BlockOutOfRange(block))?;

        sqlx::query(
            "INSERT INTO controller_checkpoints (name, block_number) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET block_number = EXCLUDED.block_number, updated_at = NOW()",
        )
        .bind(name)
        .bind(block)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Postgres pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Every field is set from `options`, so libpq `PG*` variables and
/// `.pgpass` never take part in resolution.
fn connect_options(options: &StoreOptions) -> PgConnectOptions {
    let or_default = |value: &str, default: &'static str| {
        if value.is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    PgConnectOptions::new_without_pgpass()
        .host(&or_default(&options.host, DEFAULT_HOST))
        .port(options.port)
        .database(&options.database)
        .username(&or_default(&options.username, DEFAULT_USERNAME))
        .password(&options.password)
        .ssl_mode(PgSslMode::Prefer)
}
