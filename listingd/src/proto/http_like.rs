use listing_api::{
    limits::{enforce_max_message_size, MAX_MESSAGE_BYTES},
    request::parse_request_line,
    status::StatusCode,
};
use memchr::{memchr, memmem::Finder};
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".into(),
            path: path.into(),
            headers: vec![],
            body: vec![],
        }
    }

    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }

    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, q)| q)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Read one HTTP/1.x request. Errors carry the status to answer with.
pub async fn read_request<S>(stream: &mut S) -> Result<Request, StatusCode>
where
    S: AsyncReadExt + Unpin,
{
    let mut buf = Vec::with_capacity(4096);
    let mut tmp = [0u8; 2048];
    // resume point for the CRLFCRLF scan so each byte is looked at once
    let mut search_from = 0usize;
    let finder = Finder::new(b"\r\n\r\n");
    let header_end = loop {
        let n = stream
            .read(&mut tmp)
            .await
            .map_err(|_| StatusCode::InternalServerError)?;
        if n == 0 {
            return Err(StatusCode::BadRequest);
        }
        buf.extend_from_slice(&tmp[..n]);
        if buf.len() > MAX_MESSAGE_BYTES {
            return Err(StatusCode::RequestEntityTooLarge);
        }
        let start = search_from.saturating_sub(3);
        if let Some(rel) = finder.find(&buf[start..]) {
            break start + rel;
        }
        search_from = buf.len();
    };

    let (head, rest) = buf.split_at(header_end + 4);
    let line = parse_request_line(head)?;
    let head_str = std::str::from_utf8(head).map_err(|_| StatusCode::BadRequest)?;

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    for raw in head_str.split("\r\n").skip(1) {
        if raw.is_empty() {
            continue;
        }
        let Some(idx) = memchr(b':', raw.as_bytes()) else {
            return Err(StatusCode::BadRequest);
        };
        let name = raw[..idx].trim().to_ascii_lowercase();
        let value = raw[idx + 1..].trim().to_string();
        if name == "content-length" {
            content_length = value.parse().map_err(|_| StatusCode::BadRequest)?;
        }
        headers.push((name, value));
    }

    let mut body = Vec::new();
    if content_length > 0 {
        enforce_max_message_size(header_end + 4 + content_length)
            .map_err(|_| StatusCode::RequestEntityTooLarge)?;
        body.extend_from_slice(rest);
        while body.len() < content_length {
            let mut chunk = [0u8; 4096];
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|_| StatusCode::InternalServerError)?;
            if n == 0 {
                return Err(StatusCode::BadRequest);
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);
    }

    Ok(Request {
        method: line.method,
        path: line.path,
        headers,
        body,
    })
}

#[derive(Debug)]
pub struct Response {
    pub code: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn into_bytes(self) -> Vec<u8> {
        make_response(self.code, &self.headers, &self.body)
    }
}

pub fn make_response(code: StatusCode, headers: &[(String, String)], body: &[u8]) -> Vec<u8> {
    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    let mut out = format!(
        "HTTP/1.1 {} {}\r\nserver: listingd\r\ndate: {}\r\nconnection: close\r\n",
        code.as_u16(),
        code.reason(),
        date
    )
    .into_bytes();
    let mut had_ct = false;
    for (k, v) in headers {
        if k.eq_ignore_ascii_case("content-length") {
            continue;
        }
        had_ct |= k.eq_ignore_ascii_case("content-type");
        out.extend_from_slice(format!("{k}: {v}\r\n").as_bytes());
    }
    if !had_ct {
        out.extend_from_slice(b"content-type: application/json\r\n");
    }
    out.extend_from_slice(format!("content-length: {}\r\n\r\n", body.len()).as_bytes());
    out.extend_from_slice(body);
    out
}

pub fn make_empty_response(code: StatusCode) -> Vec<u8> {
    make_response(code, &[], &[])
}
