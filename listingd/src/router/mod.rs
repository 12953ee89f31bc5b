use anyhow::Result;

use crate::proto::http_like::{Request, Response};
use crate::services::{self, Services};
use listing_api::status::StatusCode;

mod api;
mod util;

/// Dispatch against the process-wide services.
pub async fn handle(req: Request) -> Result<Response> {
    handle_with(services::services()?, req).await
}

pub async fn handle_with(svc: &Services, req: Request) -> Result<Response> {
    match (req.method.as_str(), req.route()) {
        ("GET", "/health/ready") => Ok(util::json_response(
            StatusCode::Ok,
            b"{\"status\":\"ready\"}".to_vec(),
        )),
        ("GET", "/health/db") => api::handle_db_health(svc).await,
        ("GET", "/api/search") => api::handle_search(svc.search(), &req).await,
        _ => Ok(util::error_response(StatusCode::NotFound, "not found")),
    }
}
