//! Error types for page publishing

use graph_client::GraphError;

/// Errors from page-publishing operations. Every variant aborts the
/// workflow; nothing is retried or recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("could not obtain an app access token")]
    AppToken,

    #[error("access token failed the validity check")]
    InvalidToken,

    #[error("required scope not granted: {0}")]
    MissingScope(String),

    #[error("token is scoped to page {token_page}, not target page {target_page}")]
    WrongTarget {
        token_page: String,
        target_page: String,
    },

    #[error("page {0} is not among the caller's managed pages")]
    PageNotFound(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result alias for page-publishing operations.
pub type Result<T> = std::result::Result<T, PublishError>;
