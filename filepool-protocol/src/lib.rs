//! # filepool-protocol
//!
//! Wire protocol implementation for filepool.
//!
//! This crate provides:
//! - Delimiter-based text framing (`CR LF CR LF` terminated frames)
//! - Chunked base64 encoding for binary payloads
//! - Command parsing and the JSON response envelope
//! - Protocol error types

pub mod chunk;
pub mod error;
pub mod frame;
pub mod message;

pub use error::ProtocolError;
pub use frame::{encode_frame, FrameCodec, DELIMITER};
pub use message::{Command, Envelope, Status};

/// Default port for the filepool server.
pub const DEFAULT_PORT: u16 = 6667;

/// Default maximum size of a single base64 chunk, in raw bytes.
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;
