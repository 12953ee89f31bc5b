#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use listingd::config::{IndexCredentials, SearchConfig};
use listingd::search::{
    IndexEnvelope, IndexRequest, IndexResponse, IndexService, ListingQuery, ListingStore,
    ProviderError, RelationalPage, SearchRouter,
};

pub enum IndexBehavior {
    Respond(IndexResponse),
    Fail,
    Hang,
}

/// Scripted index service that records every call.
pub struct FakeIndex {
    behavior: IndexBehavior,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<IndexRequest>>,
}

impl FakeIndex {
    pub fn new(behavior: IndexBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn with_hits(hits: Vec<Value>, nb_hits: u64) -> Arc<Self> {
        Self::new(IndexBehavior::Respond(IndexResponse {
            results: vec![IndexEnvelope {
                hits,
                nb_hits,
                page: 0,
                nb_pages: 1,
                hits_per_page: 12,
                processing_time_ms: 4,
            }],
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexService for FakeIndex {
    fn service_name(&self) -> &'static str {
        "fake-index"
    }

    async fn search(
        &self,
        _creds: &IndexCredentials,
        request: &IndexRequest,
    ) -> Result<IndexResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.behavior {
            IndexBehavior::Respond(r) => Ok(r.clone()),
            IndexBehavior::Fail => Err(ProviderError::Status {
                status: 403,
                body: "invalid api key".into(),
            }),
            IndexBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ProviderError::Transport("unreachable".into()))
            }
        }
    }
}

/// In-memory listings table with ILIKE-style substring matching.
pub struct MemoryStore {
    listings: Vec<Value>,
    fail: bool,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<ListingQuery>>,
}

impl MemoryStore {
    pub fn new(listings: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            listings,
            fail: false,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            listings: vec![],
            fail: true,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn matches(row: &Value, needle: Option<&str>) -> bool {
        if row["status"] != "active" {
            return false;
        }
        let Some(needle) = needle else { return true };
        ["title", "description"].iter().any(|f| {
            row[*f]
                .as_str()
                .map(|s| s.to_lowercase().contains(needle))
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn search_active(&self, query: &ListingQuery) -> Result<RelationalPage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if self.fail {
            return Err(ProviderError::Database("connection refused".into()));
        }
        let needle = query
            .pattern
            .as_deref()
            .map(|p| p.trim_matches('%').to_lowercase());
        let matching: Vec<&Value> = self
            .listings
            .iter()
            .filter(|row| Self::matches(row, needle.as_deref()))
            .collect();
        let rows = matching
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|v| (*v).clone())
            .collect();
        Ok(RelationalPage {
            rows,
            total: matching.len() as u64,
            elapsed_ms: 1,
        })
    }
}

pub fn listing(id: &str, title: &str, description: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": description,
        "status": status,
    })
}

pub fn router(cfg: SearchConfig, index: Arc<FakeIndex>, store: Arc<MemoryStore>) -> SearchRouter {
    SearchRouter::new(cfg, index, store)
}

pub fn with_creds() -> SearchConfig {
    SearchConfig::default().with_credentials("APP", "admin-key")
}
