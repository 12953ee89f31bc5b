/// Pool and retry settings for the listings database.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub database_url: Option<String>,

    pub min_connections: u32,       // 0
    pub max_connections: u32,       // 10
    pub connect_timeout_secs: u64,  // 5
    pub acquire_timeout_secs: u64,  // 3
    pub idle_timeout_secs: Option<u64>,

    pub retry_max_attempts: u32,    // 3
    pub retry_base_backoff_ms: u64, // 200

    /// true: `Db::init` fails when the database cannot be reached after retries.
    /// false: log and continue; the first `get_pool()` connects instead.
    pub eager_init: bool,

    /// Apply bundled migrations after the first successful connect.
    pub migrate_on_start: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            min_connections: 0,
            max_connections: 10,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 3,
            idle_timeout_secs: None,
            retry_max_attempts: 3,
            retry_base_backoff_ms: 200,
            eager_init: false,
            migrate_on_start: false,
        }
    }
}

impl DbConfig {
    /// - DATABASE_URL (optional)
    /// - DB_MIN_CONNECTIONS, DB_MAX_CONNECTIONS
    /// - DB_CONNECT_TIMEOUT_SECS, DB_ACQUIRE_TIMEOUT_SECS, DB_IDLE_TIMEOUT_SECS
    /// - DB_RETRY_MAX_ATTEMPTS, DB_RETRY_BASE_BACKOFF_MS
    /// - DB_EAGER_INIT, DB_MIGRATE_ON_START (bool)
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            database_url: env_string("DATABASE_URL"),
            min_connections: env_parse("DB_MIN_CONNECTIONS", d.min_connections),
            max_connections: env_parse("DB_MAX_CONNECTIONS", d.max_connections),
            connect_timeout_secs: env_parse("DB_CONNECT_TIMEOUT_SECS", d.connect_timeout_secs),
            acquire_timeout_secs: env_parse("DB_ACQUIRE_TIMEOUT_SECS", d.acquire_timeout_secs),
            idle_timeout_secs: env_string("DB_IDLE_TIMEOUT_SECS").and_then(|s| s.parse().ok()),
            retry_max_attempts: env_parse("DB_RETRY_MAX_ATTEMPTS", d.retry_max_attempts),
            retry_base_backoff_ms: env_parse("DB_RETRY_BASE_BACKOFF_MS", d.retry_base_backoff_ms),
            eager_init: env_bool("DB_EAGER_INIT", d.eager_init),
            migrate_on_start: env_bool("DB_MIGRATE_ON_START", d.migrate_on_start),
        }
    }
}

/// Non-blank, trimmed value of an env var.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

pub fn env_bool(key: &str, default: bool) -> bool {
    env_string(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
