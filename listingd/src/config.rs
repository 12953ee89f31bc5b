use std::time::Duration;

use listing_db::{env_bool, env_parse, env_string};
use listing_query::DEFAULT_PAGE_SIZE;

/// App identifier and admin key for the hosted search index.
#[derive(Clone, PartialEq, Eq)]
pub struct IndexCredentials {
    pub app_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for IndexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCredentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Everything the search router needs to know, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub index_name: String,
    /// Overrides the per-app default host (`https://{app_id}-dsn.algolia.net`).
    pub index_base_url: Option<String>,
    pub default_page_size: u32,
    pub index_timeout: Duration,
    pub fallback_timeout: Duration,
    /// Escape `%` and `_` in user queries before the substring match.
    pub escape_wildcards: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            index_name: "listings".to_string(),
            index_base_url: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            index_timeout: Duration::from_millis(2_000),
            fallback_timeout: Duration::from_millis(3_000),
            escape_wildcards: false,
        }
    }
}

impl SearchConfig {
    /// - SEARCH_INDEX_APP_ID, SEARCH_INDEX_ADMIN_KEY (both needed for the index path)
    /// - SEARCH_INDEX_NAME (default "listings")
    /// - SEARCH_INDEX_BASE_URL (optional)
    /// - SEARCH_DEFAULT_PAGE_SIZE (default 12)
    /// - SEARCH_INDEX_TIMEOUT_MS (default 2000)
    /// - SEARCH_FALLBACK_TIMEOUT_MS (default 3000)
    /// - SEARCH_ESCAPE_WILDCARDS (bool, default false)
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            app_id: env_string("SEARCH_INDEX_APP_ID"),
            api_key: env_string("SEARCH_INDEX_ADMIN_KEY"),
            index_name: env_string("SEARCH_INDEX_NAME").unwrap_or(d.index_name),
            index_base_url: env_string("SEARCH_INDEX_BASE_URL"),
            default_page_size: env_parse("SEARCH_DEFAULT_PAGE_SIZE", d.default_page_size),
            index_timeout: Duration::from_millis(env_parse(
                "SEARCH_INDEX_TIMEOUT_MS",
                d.index_timeout.as_millis() as u64,
            )),
            fallback_timeout: Duration::from_millis(env_parse(
                "SEARCH_FALLBACK_TIMEOUT_MS",
                d.fallback_timeout.as_millis() as u64,
            )),
            escape_wildcards: env_bool("SEARCH_ESCAPE_WILDCARDS", d.escape_wildcards),
        }
    }

    /// Returns credentials only when both halves are present and non-blank.
    pub fn index_credentials(&self) -> Option<IndexCredentials> {
        let app_id = self.app_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let api_key = self.api_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(IndexCredentials {
            app_id: app_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn with_credentials(mut self, app_id: &str, api_key: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self.api_key = Some(api_key.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
}

impl ServerConfig {
    /// LISTINGD_ADDR (default 127.0.0.1:8787)
    pub fn from_env() -> Self {
        Self {
            addr: env_string("LISTINGD_ADDR").unwrap_or_else(|| "127.0.0.1:8787".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_both_halves() {
        let cfg = SearchConfig::default();
        assert!(cfg.index_credentials().is_none());

        let half = SearchConfig {
            app_id: Some("APP".into()),
            ..SearchConfig::default()
        };
        assert!(half.index_credentials().is_none());

        let blank = SearchConfig::default().with_credentials("APP", "   ");
        assert!(blank.index_credentials().is_none());

        let full = SearchConfig::default().with_credentials("APP", "secret");
        let creds = full.index_credentials().unwrap();
        assert_eq!(creds.app_id, "APP");
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
