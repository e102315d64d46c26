//! Server error types.

use thiserror::Error;

/// Server errors.
///
/// Protocol and storage failures are answered with an `ERROR` envelope and
/// leave the connection open; only transport-level failures (and a frame
/// buffer overflowing its cap) close the connection.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] filepool_protocol::ProtocolError),

    #[error("storage error: {0}")]
    Storage(#[from] filepool_storage::StorageError),

    #[error("invalid worker configuration: {0}")]
    WorkerConfig(String),
}
