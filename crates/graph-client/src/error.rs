//! Error types for Graph API operations

/// Errors from Graph API operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Graph API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected Graph API response: {0}")]
    Response(String),
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Http(err.to_string())
    }
}

/// Result alias for Graph API operations.
pub type Result<T> = std::result::Result<T, GraphError>;
