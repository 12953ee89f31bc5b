use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub use sqlx::PgPool;

mod config;

pub use config::{env_bool, env_parse, env_string, DbConfig};

/// Value of `listings.status` for rows visible to search.
pub const ACTIVE_STATUS: &str = "active";

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Lazily connected Postgres pool shared by the listing service.
pub struct Db {
    cfg: DbConfig,
    pool: OnceCell<PgPool>,
    migrated: OnceCell<()>,
}

impl Db {
    pub fn new(cfg: DbConfig) -> Self {
        Self {
            cfg,
            pool: OnceCell::new(),
            migrated: OnceCell::new(),
        }
    }

    /// Connect at startup. In eager mode a failure is returned; in lazy mode it
    /// is logged and the next `get_pool()` tries again.
    pub async fn init(&self) -> Result<(), DbInitError> {
        match self.get_pool().await {
            Ok(_) => Ok(()),
            Err(e) if !self.cfg.eager_init => {
                warn!(target: "listing_db", error = %e, "database not available at startup (lazy)");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Pool handle, connecting with retries on first use. Migrations run once
    /// after the first successful connect when enabled.
    pub async fn get_pool(&self) -> Result<&PgPool, DbInitError> {
        let pool = self
            .pool
            .get_or_try_init(|| self.connect_with_retry())
            .await?;
        if self.cfg.migrate_on_start {
            self.ensure_migrated(pool).await?;
        }
        Ok(pool)
    }

    /// Quick liveness probe bounded to one second.
    pub async fn health_check(&self) -> HealthStatus {
        if self.cfg.database_url.is_none() {
            return HealthStatus::NoUrl;
        }
        let Some(pool) = self.pool.get() else {
            return HealthStatus::NotInitialized;
        };
        let probe = sqlx::query("SELECT 1").execute(pool);
        match tokio::time::timeout(Duration::from_secs(1), probe).await {
            Ok(Ok(_)) => HealthStatus::Ok,
            Ok(Err(e)) => HealthStatus::Error(e.to_string()),
            Err(_) => HealthStatus::Error("health check timed out".to_string()),
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        let opts = PgPoolOptions::new()
            .min_connections(self.cfg.min_connections)
            .max_connections(self.cfg.max_connections)
            .acquire_timeout(Duration::from_secs(self.cfg.acquire_timeout_secs));
        match self.cfg.idle_timeout_secs {
            Some(secs) => opts.idle_timeout(Duration::from_secs(secs)),
            None => opts,
        }
    }

    async fn connect_once(&self, url: &str) -> Result<PgPool, String> {
        let connect = self.pool_options().connect(url);
        let secs = self.cfg.connect_timeout_secs;
        if secs == 0 {
            return connect.await.map_err(|e| e.to_string());
        }
        match tokio::time::timeout(Duration::from_secs(secs), connect).await {
            Ok(res) => res.map_err(|e| e.to_string()),
            Err(_) => Err(format!("connect attempt timed out after {secs}s")),
        }
    }

    async fn connect_with_retry(&self) -> Result<PgPool, DbInitError> {
        let url = self
            .cfg
            .database_url
            .as_deref()
            .ok_or(DbInitError::MissingUrl)?;
        let max = self.cfg.retry_max_attempts.max(1);

        let mut last_error = String::from("unknown error");
        for attempt in 1..=max {
            match self.connect_once(url).await {
                Ok(pool) => {
                    debug!(target: "listing_db", attempt, "connected to database");
                    return Ok(pool);
                }
                Err(msg) => {
                    last_error = msg;
                    if attempt == max {
                        break;
                    }
                    let delay = backoff_ms(self.cfg.retry_base_backoff_ms, attempt);
                    warn!(
                        target: "listing_db",
                        attempt,
                        max,
                        delay_ms = delay,
                        error = %last_error,
                        "db connect attempt failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }

        Err(DbInitError::Connect {
            attempts: max,
            last_error,
        })
    }

    async fn ensure_migrated(&self, pool: &PgPool) -> Result<(), DbInitError> {
        self.migrated
            .get_or_try_init(|| async {
                info!(target: "listing_db", "running database migrations");
                MIGRATOR
                    .run(pool)
                    .await
                    .map_err(|e| DbInitError::Migrate(e.to_string()))
            })
            .await
            .map(|_| ())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbInitError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,

    #[error("failed to connect after {attempts} attempt(s): {last_error}")]
    Connect { attempts: u32, last_error: String },

    #[error("migrations failed: {0}")]
    Migrate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    NoUrl,
    NotInitialized,
    Ok,
    Error(String),
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::NoUrl => "no_url",
            HealthStatus::NotInitialized => "not_initialized",
            HealthStatus::Ok => "ok",
            HealthStatus::Error(_) => "error",
        }
    }
}

/// Exponential backoff capped at 30s, plus up to `base/2` of jitter.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    let capped = base_ms.saturating_mul(factor).min(30_000);
    capped.saturating_add(fastrand::u64(0..=base_ms / 2))
}
