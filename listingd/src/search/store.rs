use async_trait::async_trait;
use serde_json::Value;

use super::ProviderError;

/// Filter and range for the relational fallback. Only `status = active`
/// rows are ever considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// ILIKE pattern matched against title OR description; `None` matches all.
    pub pattern: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

/// One page of rows plus the exact number of matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalPage {
    pub rows: Vec<Value>,
    pub total: u64,
    pub elapsed_ms: u64,
}

/// System-of-record query used when the index service cannot answer.
#[async_trait]
pub trait ListingStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    async fn search_active(&self, query: &ListingQuery) -> Result<RelationalPage, ProviderError>;
}
