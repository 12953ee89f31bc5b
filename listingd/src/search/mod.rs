//! Listing search with provider fallback.
//!
//! A query goes to the hosted index service first. When credentials are
//! missing, the call fails, or the answer is malformed, the same query is run
//! as a substring match against the relational store. If that fails too the
//! caller gets an empty result. Nothing is retried or cached between calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use listing_api::{Provider, SearchResult};
use listing_query::{effective_page_size, like_pattern};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;

mod error;
pub mod index_service;
pub mod store;

pub use error::ProviderError;
pub use index_service::{
    HttpIndexService, IndexEnvelope, IndexRequest, IndexResponse, IndexService, ACTIVE_FILTER,
};
pub use store::{ListingQuery, ListingStore, RelationalPage};

/// Pagination knobs for a search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Zero-based; defaults to 0.
    pub page: Option<u32>,
    /// Zero or missing means the configured default.
    pub page_size: Option<u32>,
}

impl SearchOptions {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

/// Raw answer from whichever provider responded, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    IndexService(IndexEnvelope),
    RelationalFallback(RelationalPage),
}

impl ProviderResponse {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderResponse::IndexService(_) => Provider::IndexService,
            ProviderResponse::RelationalFallback(_) => Provider::RelationalFallback,
        }
    }

    /// Convert into the shared result shape. `page` and `page_size` are the
    /// values the caller asked for.
    pub fn normalize(self, query: &str, page: u32, page_size: u32) -> SearchResult {
        match self {
            ProviderResponse::IndexService(env) => SearchResult::new(
                Provider::IndexService,
                query,
                env.hits,
                env.nb_hits,
                page,
                page_size,
                env.processing_time_ms,
            ),
            ProviderResponse::RelationalFallback(rows) => SearchResult::new(
                Provider::RelationalFallback,
                query,
                rows.rows.into_iter().map(with_object_id).collect(),
                rows.total,
                page,
                page_size,
                rows.elapsed_ms,
            ),
        }
    }
}

/// Copy the row's `id` into `objectID` so consumers can treat fallback hits
/// like index hits.
fn with_object_id(mut row: Value) -> Value {
    if let Value::Object(map) = &mut row {
        if !map.contains_key("objectID") {
            let id = match map.get("id") {
                Some(Value::String(s)) => Some(Value::String(s.clone())),
                Some(Value::Null) | None => None,
                Some(other) => Some(Value::String(other.to_string())),
            };
            if let Some(id) = id {
                map.insert("objectID".to_string(), id);
            }
        }
    }
    row
}

/// Routes a text query to the index service and degrades to the relational store.
pub struct SearchRouter {
    config: SearchConfig,
    index: Arc<dyn IndexService>,
    store: Arc<dyn ListingStore>,
}

impl SearchRouter {
    pub fn new(
        config: SearchConfig,
        index: Arc<dyn IndexService>,
        store: Arc<dyn ListingStore>,
    ) -> Self {
        Self {
            config,
            index,
            store,
        }
    }

    /// Resolve `query` into a [`SearchResult`]. Never fails: provider errors
    /// are logged and absorbed. Dropping the returned future cancels whichever
    /// provider call is in flight.
    pub async fn search(&self, query: &str, options: SearchOptions) -> SearchResult {
        let page = options.page.unwrap_or(0);
        let page_size = effective_page_size(options.page_size, self.config.default_page_size);

        match self.query_index(query, page, page_size).await {
            Ok(resp) => {
                debug!(target: "listing_search", provider = %resp.provider(), "index service answered");
                return resp.normalize(query, page, page_size);
            }
            Err(ProviderError::MissingCredentials) => {
                debug!(target: "listing_search", "index credentials absent; using relational fallback");
            }
            Err(e @ ProviderError::Malformed(_)) => {
                warn!(
                    target: "listing_search",
                    index = self.index.service_name(),
                    error = %e,
                    "index service returned a malformed response; falling back"
                );
            }
            Err(e) => {
                warn!(
                    target: "listing_search",
                    index = self.index.service_name(),
                    error = %e,
                    "index service failed; falling back"
                );
            }
        }

        match self.query_store(query, page, page_size).await {
            Ok(resp) => {
                info!(
                    target: "listing_search",
                    provider = %resp.provider(),
                    store = self.store.store_name(),
                    "served search from relational fallback"
                );
                resp.normalize(query, page, page_size)
            }
            Err(e) => {
                error!(
                    target: "listing_search",
                    error = %e,
                    query_len = query.len(),
                    "relational fallback failed; returning empty result"
                );
                SearchResult::empty(query, page, page_size)
            }
        }
    }

    async fn query_index(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<ProviderResponse, ProviderError> {
        let creds = self
            .config
            .index_credentials()
            .ok_or(ProviderError::MissingCredentials)?;
        let request = IndexRequest {
            index_name: self.config.index_name.clone(),
            query: query.to_string(),
            page,
            hits_per_page: page_size,
            filters: ACTIVE_FILTER.to_string(),
        };
        let call = self.index.search(&creds, &request);
        let resp = bounded(Provider::IndexService, self.config.index_timeout, call).await?;
        resp.into_first().map(ProviderResponse::IndexService)
    }

    async fn query_store(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<ProviderResponse, ProviderError> {
        let listing_query = ListingQuery {
            pattern: like_pattern(query, self.config.escape_wildcards),
            offset: u64::from(page).saturating_mul(u64::from(page_size)),
            limit: u64::from(page_size),
        };
        let call = self.store.search_active(&listing_query);
        bounded(Provider::RelationalFallback, self.config.fallback_timeout, call)
            .await
            .map(ProviderResponse::RelationalFallback)
    }
}

async fn bounded<T, F>(provider: Provider, limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(res) => res,
        Err(_) => Err(ProviderError::Timeout {
            provider,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_rows_get_object_id() {
        let page = RelationalPage {
            rows: vec![
                json!({"id": "abc", "title": "Sofa"}),
                json!({"id": 42}),
                json!({"id": "x", "objectID": "kept"}),
                json!({"title": "no id"}),
            ],
            total: 4,
            elapsed_ms: 3,
        };
        let r = ProviderResponse::RelationalFallback(page).normalize("", 0, 12);
        assert_eq!(r.hits[0]["objectID"], "abc");
        assert_eq!(r.hits[1]["objectID"], "42");
        assert_eq!(r.hits[2]["objectID"], "kept");
        assert!(r.hits[3].get("objectID").is_none());
        assert_eq!(r.provider, Some(Provider::RelationalFallback));
        assert_eq!(r.processing_time_ms, 3);
    }

    #[test]
    fn index_envelope_totals_are_recomputed_from_page_size() {
        let env = IndexEnvelope {
            hits: vec![json!({"objectID": "1"})],
            nb_hits: 25,
            page: 0,
            nb_pages: 1,
            hits_per_page: 10,
            processing_time_ms: 7,
        };
        let r = ProviderResponse::IndexService(env).normalize("q", 1, 10);
        assert_eq!(r.total_pages, 3);
        assert_eq!(r.page, 1);
        assert_eq!(r.page_size, 10);
        assert_eq!(r.processing_time_ms, 7);
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, ProviderError>(())
        };
        let err = bounded(Provider::IndexService, Duration::from_millis(5), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Timeout {
                provider: Provider::IndexService,
                after_ms: 5
            }
        ));
    }
}
