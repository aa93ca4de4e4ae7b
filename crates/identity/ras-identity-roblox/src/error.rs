//! OAuth2 error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("State mismatch: the callback state does not match the stored state")]
    StateMismatch,

    #[error("Access denied by the user")]
    AccessDenied,

    #[error("Provider error: {code}")]
    ProviderError {
        code: String,
        description: Option<String>,
    },

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Token exchange failed ({}): {body}", status_label(.status))]
    TokenExchangeFailed { status: Option<u16>, body: String },

    #[error("User info request failed ({}): {body}", status_label(.status))]
    UserInfoFetchFailed { status: Option<u16>, body: String },
}

impl OAuth2Error {
    /// HTTP status returned by the provider, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            OAuth2Error::TokenExchangeFailed { status, .. }
            | OAuth2Error::UserInfoFetchFailed { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!("status {}", status),
        None => "transport".to_string(),
    }
}

/// Failure raised by an [`HttpClient`](crate::HttpClient) before a response was received.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("{0}")]
    Transport(String),
}
