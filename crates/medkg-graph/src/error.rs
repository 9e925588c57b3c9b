//! Graph store errors.

use thiserror::Error;

/// Errors raised by a [`GraphStore`](crate::GraphStore).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed (HTTP {0})")]
    AuthenticationFailed(u16),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Query failed [{code}]: {message}")]
    Query { code: String, message: String },

    /// A record that cannot be mapped onto the domain node/edge types.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

/// Result type for graph store operations.
pub type GraphResult<T> = Result<T, GraphError>;
