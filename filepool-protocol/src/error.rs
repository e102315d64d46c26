//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur during framing or message handling.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty command frame")]
    EmptyFrame,

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("malformed {verb} command (usage: {usage})")]
    BadArity {
        verb: &'static str,
        usage: &'static str,
    },

    #[error("frame payload contains the frame delimiter")]
    DelimiterInPayload,

    #[error("frame too large: {size} bytes buffered (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("invalid UTF-8 in frame")]
    InvalidUtf8,

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("invalid chunk encoding: {0}")]
    Chunk(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnknownCommand("FETCH".to_string());
        assert!(err.to_string().contains("FETCH"));

        let err = ProtocolError::BadArity {
            verb: "GET",
            usage: "GET <name>",
        };
        assert!(err.to_string().contains("GET <name>"));

        let err = ProtocolError::FrameTooLarge {
            size: 100,
            max: 50,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }
}
