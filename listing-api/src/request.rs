use crate::{limits::enforce_max_message_size, status::StatusCode};

/// Method and target of an HTTP/1.x request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
}

impl RequestLine {
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }

    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, q)| q)
    }
}

/// Parse the start line of a raw request buffer, enforcing the message size cap.
/// Returns 413 for oversized input and 400 for anything that is not
/// `METHOD /target HTTP/x.y`.
pub fn parse_request_line(raw: &[u8]) -> Result<RequestLine, StatusCode> {
    if enforce_max_message_size(raw.len()).is_err() {
        return Err(StatusCode::RequestEntityTooLarge);
    }
    let text = std::str::from_utf8(raw).map_err(|_| StatusCode::BadRequest)?;
    let line = text.lines().next().unwrap_or("");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");
    let version = parts.next().unwrap_or("");
    if method.is_empty() || !path.starts_with('/') || !version.starts_with("HTTP/") {
        return Err(StatusCode::BadRequest);
    }
    Ok(RequestLine {
        method: method.to_ascii_uppercase(),
        path: path.to_string(),
    })
}
