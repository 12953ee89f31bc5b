// Relational fallback over the listings table. Queries stay read-only and
// scoped to active rows.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use listing_db::{Db, ACTIVE_STATUS};
use serde_json::Value;
use sqlx::Row;

use crate::search::{ListingQuery, ListingStore, ProviderError, RelationalPage};

// Count and page come from one statement so they share a snapshot.
// Insertion order keeps repeated calls stable without imposing relevance.
const SEARCH_ACTIVE: &str = "WITH matched AS (
         SELECT l.*
           FROM listings l
          WHERE l.status = $1
            AND ($2::text IS NULL OR l.title ILIKE $2 OR l.description ILIKE $2)
     ), page AS (
         SELECT to_jsonb(m) AS doc, m.created_at, m.id
           FROM matched m
          ORDER BY m.created_at ASC, m.id ASC
         OFFSET $3
          LIMIT $4
     )
     SELECT (SELECT COUNT(*) FROM matched) AS total,
            COALESCE(
                (SELECT jsonb_agg(p.doc ORDER BY p.created_at ASC, p.id ASC) FROM page p),
                '[]'::jsonb
            ) AS docs";

pub struct PgListingStore {
    db: Arc<Db>,
}

impl PgListingStore {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn into_page(total: i64, docs: Value, elapsed_ms: u64) -> Result<RelationalPage, ProviderError> {
    let rows = match docs {
        Value::Array(rows) => rows,
        other => {
            return Err(ProviderError::Malformed(format!(
                "expected a jsonb array of listings, got {other}"
            )))
        }
    };
    Ok(RelationalPage {
        rows,
        total: u64::try_from(total).unwrap_or(0),
        elapsed_ms,
    })
}

#[async_trait]
impl ListingStore for PgListingStore {
    fn store_name(&self) -> &'static str {
        "postgres"
    }

    async fn search_active(&self, query: &ListingQuery) -> Result<RelationalPage, ProviderError> {
        let pool = self.db.get_pool().await?;
        let started = Instant::now();

        let row = sqlx::query(SEARCH_ACTIVE)
            .bind(ACTIVE_STATUS)
            .bind(query.pattern.as_deref())
            .bind(to_i64(query.offset))
            .bind(to_i64(query.limit))
            .fetch_one(pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        let docs: Value = row.try_get("docs")?;

        into_page(total, docs, started.elapsed().as_millis() as u64)
    }
}
