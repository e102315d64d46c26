//! # filepool-client
//!
//! Client library for filepool.
//!
//! This crate provides:
//! - Async TCP client with connection management
//! - High-level API for LIST, GET, UPLOAD and DELETE
//! - Transparent chunk encoding and decoding of file payloads

pub mod client;
pub mod connection;
pub mod error;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
