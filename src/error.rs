// Error type for the API client. Application code wraps these in
// `anyhow::Error`; the variants exist so callers (and tests) can tell an
// HTTP rejection apart from a network or token-file failure.

use reqwest::StatusCode;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with something other than 200.
    #[error("[{method}] Failed {url} : {status} : {body}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("[{method}] Request to {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Token file {}: {source}", path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read refresh token from terminal: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Access token contains characters not allowed in a header")]
    InvalidAccessToken,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a rejected request, if that is what this error is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
