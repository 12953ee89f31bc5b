use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend that produced a [`SearchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "index-service")]
    IndexService,
    #[serde(rename = "relational-fallback")]
    RelationalFallback,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::IndexService => "index-service",
            Provider::RelationalFallback => "relational-fallback",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-agnostic search response handed to callers.
///
/// Built once per search and never mutated afterwards. `provider` is `None`
/// only for the last-resort empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub hits: Vec<Value>,
    pub total_hits: u64,
    pub page: u32,
    pub total_pages: u64,
    pub page_size: u32,
    pub processing_time_ms: u64,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
}

impl SearchResult {
    /// Result returned when every provider failed.
    pub fn empty(query: &str, page: u32, page_size: u32) -> Self {
        Self {
            hits: Vec::new(),
            total_hits: 0,
            page,
            total_pages: 0,
            page_size,
            processing_time_ms: 0,
            query: query.to_string(),
            provider: None,
        }
    }

    /// Assemble a successful result. Hits beyond `page_size` are dropped and
    /// `total_pages` is derived from `total_hits`.
    pub fn new(
        provider: Provider,
        query: &str,
        mut hits: Vec<Value>,
        total_hits: u64,
        page: u32,
        page_size: u32,
        processing_time_ms: u64,
    ) -> Self {
        hits.truncate(page_size as usize);
        Self {
            hits,
            total_hits,
            page,
            total_pages: total_pages(total_hits, page_size),
            page_size,
            processing_time_ms,
            query: query.to_string(),
            provider: Some(provider),
        }
    }
}

/// `ceil(total_hits / page_size)`. A zero page size yields zero.
pub fn total_pages(total_hits: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_hits.div_ceil(u64::from(page_size))
}
