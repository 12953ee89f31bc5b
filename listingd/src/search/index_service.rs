use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProviderError;
use crate::config::IndexCredentials;

/// Filter expression restricting index queries to published listings.
pub const ACTIVE_FILTER: &str = "status:active";

/// One query against a named index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    pub index_name: String,
    pub query: String,
    pub page: u32,
    pub hits_per_page: u32,
    pub filters: String,
}

/// Per-index answer as returned by the hosted service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexEnvelope {
    #[serde(default)]
    pub hits: Vec<Value>,
    #[serde(rename = "nbHits", default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(rename = "nbPages", default)]
    pub nb_pages: u32,
    #[serde(rename = "hitsPerPage", default)]
    pub hits_per_page: u32,
    #[serde(rename = "processingTimeMS", default)]
    pub processing_time_ms: u64,
}

/// Multi-query response body: one envelope per request sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexResponse {
    #[serde(default)]
    pub results: Vec<IndexEnvelope>,
}

impl IndexResponse {
    /// First envelope, or `Malformed` when the results array is empty.
    pub fn into_first(self) -> Result<IndexEnvelope, ProviderError> {
        self.results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("empty results array".to_string()))
    }
}

/// Hosted full-text search backend.
#[async_trait]
pub trait IndexService: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn search(
        &self,
        creds: &IndexCredentials,
        request: &IndexRequest,
    ) -> Result<IndexResponse, ProviderError>;
}

#[derive(Serialize)]
struct MultiQueryBody<'a> {
    requests: [&'a IndexRequest; 1],
}

/// REST client for an Algolia-compatible multi-query endpoint.
#[derive(Clone)]
pub struct HttpIndexService {
    client: Client,
    base_url: Option<String>,
}

impl HttpIndexService {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("listingd/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, creds: &IndexCredentials) -> String {
        let base = match &self.base_url {
            Some(b) => b.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}-dsn.algolia.net",
                utf8_percent_encode(&creds.app_id.to_ascii_lowercase(), NON_ALPHANUMERIC)
            ),
        };
        format!("{base}/1/indexes/*/queries")
    }
}

#[async_trait]
impl IndexService for HttpIndexService {
    fn service_name(&self) -> &'static str {
        "http-index"
    }

    async fn search(
        &self,
        creds: &IndexCredentials,
        request: &IndexRequest,
    ) -> Result<IndexResponse, ProviderError> {
        let resp = self
            .client
            .post(self.endpoint(creds))
            .header("X-Algolia-Application-Id", &creds.app_id)
            .header("X-Algolia-API-Key", &creds.api_key)
            .json(&MultiQueryBody {
                requests: [request],
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            body.truncate(512);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice::<IndexResponse>(&bytes)
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
