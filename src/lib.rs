//! Mini KV - A single-node key-value server
//!
//! An LRU cache in front of an in-memory store, with every mutation recorded
//! in a write-ahead transaction log that is replayed on startup.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;
pub mod wal;

pub use api::AppState;
pub use config::Config;
pub use error::{KvError, Result};
pub use service::KvService;
pub use tasks::spawn_log_monitor;
