use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed, check the Storage API token")]
    AuthenticationFailed,

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns the HTTP status the Storage API answered with, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiError { status, .. } => Some(*status),
            Error::AuthenticationFailed => Some(401),
            Error::TableNotFound(_) => Some(404),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
