use listing_api::status::StatusCode;
use serde::Serialize;

use crate::proto::http_like::Response;

pub fn json_response(code: StatusCode, body: Vec<u8>) -> Response {
    Response {
        code,
        headers: vec![("content-type".into(), "application/json".into())],
        body,
    }
}

pub fn json_value<T: Serialize>(code: StatusCode, value: &T) -> anyhow::Result<Response> {
    Ok(json_response(code, serde_json::to_vec(value)?))
}

pub fn error_response(code: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string().into_bytes();
    json_response(code, body)
}
