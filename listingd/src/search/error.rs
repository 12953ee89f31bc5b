use listing_api::Provider;
use thiserror::Error;

/// Failure of a single provider call. The router turns every variant into
/// either the fallback path or the empty result; none reach callers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("index service credentials are not configured")]
    MissingCredentials,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("index service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("{provider} call timed out after {after_ms} ms")]
    Timeout { provider: Provider, after_ms: u64 },

    #[error("database error: {0}")]
    Database(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

impl From<sqlx::Error> for ProviderError {
    fn from(e: sqlx::Error) -> Self {
        ProviderError::Database(e.to_string())
    }
}

impl From<listing_db::DbInitError> for ProviderError {
    fn from(e: listing_db::DbInitError) -> Self {
        ProviderError::Database(e.to_string())
    }
}
