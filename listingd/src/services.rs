use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use listing_db::Db;
use once_cell::sync::OnceCell;

use crate::config::SearchConfig;
use crate::search::{HttpIndexService, SearchRouter};
use crate::storage::PgListingStore;

/// Long-lived handles shared by every request.
pub struct Services {
    search: SearchRouter,
    db: Arc<Db>,
}

impl Services {
    pub fn new(search: SearchRouter, db: Arc<Db>) -> Self {
        Self { search, db }
    }

    /// Wire the production collaborators: HTTP index client and Postgres store.
    pub fn from_config(cfg: SearchConfig, db: Arc<Db>) -> Result<Self> {
        let index = HttpIndexService::new(cfg.index_base_url.clone(), cfg.index_timeout)
            .context("building index service client")?;
        let store = PgListingStore::new(db.clone());
        let search = SearchRouter::new(cfg, Arc::new(index), Arc::new(store));
        Ok(Self::new(search, db))
    }

    pub fn search(&self) -> &SearchRouter {
        &self.search
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

static SERVICES: OnceCell<Services> = OnceCell::new();

pub fn init(services: Services) -> Result<()> {
    SERVICES
        .set(services)
        .map_err(|_| anyhow!("services already initialized"))
}

pub fn services() -> Result<&'static Services> {
    SERVICES.get().ok_or_else(|| anyhow!("services not initialized"))
}
