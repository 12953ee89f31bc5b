use anyhow::Result;
use listing_api::status::StatusCode;
use listing_db::HealthStatus;
use listing_query::parse_search_params;
use tracing::debug;

use crate::proto::http_like::{Request, Response};
use crate::search::{SearchOptions, SearchRouter};
use crate::services::Services;

use super::util::{error_response, json_response, json_value};

/// `GET /api/search?q=&page=&pageSize=`. An empty `q` lists every active listing.
pub async fn handle_search(router: &SearchRouter, req: &Request) -> Result<Response> {
    let params = match parse_search_params(req.query()) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(StatusCode::BadRequest, &e.to_string())),
    };
    let options = SearchOptions {
        page: params.page,
        page_size: params.page_size,
    };
    let result = router.search(&params.q, options).await;
    debug!(
        target: "listingd",
        provider = result.provider.map(|p| p.as_str()).unwrap_or("none"),
        total_hits = result.total_hits,
        "search served"
    );
    json_value(StatusCode::Ok, &result)
}

pub async fn handle_db_health(svc: &Services) -> Result<Response> {
    let status = svc.db().health_check().await;
    let code = match status {
        HealthStatus::Ok => StatusCode::Ok,
        _ => StatusCode::ServiceUnavailable,
    };
    let mut body = serde_json::json!({ "status": status.as_str() });
    if let HealthStatus::Error(msg) = &status {
        body["error"] = serde_json::Value::String(msg.clone());
    }
    Ok(json_response(code, serde_json::to_vec(&body)?))
}
