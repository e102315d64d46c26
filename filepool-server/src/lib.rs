//! # filepool-server
//!
//! TCP server for filepool.
//!
//! This crate provides:
//! - Delimiter-framed connection workers (one connection per worker)
//! - Command dispatch against a flat file store
//! - A bounded worker pool in two execution modes: thread-parallel
//!   (semaphore-bounded tasks in one process) and process-parallel
//!   (isolated worker processes sharing a port via `SO_REUSEPORT`)
//! - Layered configuration (defaults, YAML file, environment)

pub mod config;
pub mod error;
pub mod handler;
pub mod pool;
pub mod server;
pub mod worker;

pub use config::{Config, ConfigError, ExecutionMode, NetworkConfig, PoolConfig, StorageConfig};
pub use error::ServerError;
pub use handler::CommandHandler;
pub use server::{Server, ServerStats};
pub use worker::WorkerOptions;
