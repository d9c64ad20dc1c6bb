//! Persistent storage for QuantaraX: configuration, signing identity,
//! sessions and resume bitmaps, the content-addressed store, and the DTN
//! retry queue.

#![forbid(unsafe_code)]

pub mod cas;
pub mod config;
pub mod db;
pub mod dtn;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod session;
pub mod token;

pub use error::StoreError;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
