use reqwest::{header::HeaderName, StatusCode};
use thiserror::Error;

/// Everything that can go wrong while talking to the API.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport level failure.
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),

    /// A response body could not be decoded.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Data was requested before a token was fetched.
    #[error("no access token: call `get_token` before pulling data")]
    NoToken,

    /// The token endpoint answered with an OAuth2 error.
    #[error("token request rejected ({error}): {}", .description.as_deref().unwrap_or("no description"))]
    Auth {
        /// OAuth2 error code, e.g. `invalid_client`.
        error: String,
        /// Human readable explanation (if sent).
        description: Option<String>,
    },

    /// The server answered with a non-success status.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    /// A response header could not be parsed.
    #[error("header {0} holds an invalid value")]
    InvalidHeader(HeaderName),

    /// The response body did not have the expected shape.
    #[error("{0}")]
    UnexpectedBody(String),

    /// A request URL could not be built.
    #[error("invalid url {0}")]
    InvalidUrl(String),

    /// A required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}
