use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Page size used when the caller omits one or asks for zero.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Search parameters decoded from a request query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Raw query text, decoded but otherwise untouched.
    pub q: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("invalid value for `{name}`: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Decode `q`, `page` and `pageSize` from a form-encoded query string.
///
/// - `+` decodes to a space, percent escapes are decoded lossily.
/// - `hitsPerPage` is accepted as an alias of `pageSize`.
/// - Unknown keys are ignored; for duplicate keys the last one wins.
/// - Empty numeric values count as absent.
pub fn parse_search_params(query_string: Option<&str>) -> Result<SearchParams, ParamError> {
    let mut params = SearchParams::default();
    let Some(qs) = query_string else {
        return Ok(params);
    };

    for pair in qs.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let value = form_decode(v);
        match form_decode(k).as_str() {
            "q" | "query" => params.q = value,
            "page" => params.page = parse_number("page", &value)?,
            "pageSize" | "hitsPerPage" => params.page_size = parse_number("pageSize", &value)?,
            _ => {}
        }
    }
    Ok(params)
}

fn parse_number(name: &'static str, value: &str) -> Result<Option<u32>, ParamError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ParamError::Invalid {
            name,
            value: value.to_string(),
        })
}

fn form_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Resolve the page size to use: missing or zero falls back to `default`,
/// and a zero default falls back to [`DEFAULT_PAGE_SIZE`].
pub fn effective_page_size(requested: Option<u32>, default: u32) -> u32 {
    let default = if default == 0 { DEFAULT_PAGE_SIZE } else { default };
    match requested {
        Some(n) if n > 0 => n,
        _ => default,
    }
}

/// Build a case-insensitive substring pattern (`%query%`) for ILIKE.
///
/// Returns `None` only for the empty string, meaning "no text filter".
/// Whitespace is matched literally. With `escape_wildcards` off, `%` and `_`
/// typed by the user keep their LIKE meaning.
pub fn like_pattern(query: &str, escape_wildcards: bool) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let body = if escape_wildcards {
        escape_like(query)
    } else {
        query.to_string()
    };
    Some(format!("%{body}%"))
}

/// Escape LIKE metacharacters using Postgres' default escape character (`\`).
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
