//! # filepool-storage
//!
//! Storage layer for filepool.
//!
//! This crate provides:
//! - A flat-directory file store (no hierarchy, no metadata sidecars)
//! - File name validation applied before any filesystem access
//! - Atomic writes via temp-file-then-rename

pub mod error;
pub mod store;

pub use error::StorageError;
pub use store::{validate_name, FileStore};
