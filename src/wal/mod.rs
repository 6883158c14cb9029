//! Write-Ahead Transaction Log
//!
//! Append-only, sequence-numbered record of every Put and Delete, replayed
//! on startup to rebuild the store.
//!
//! The log is opened in read mode ([`TransactionLog`]), replayed once, then
//! switched into write mode ([`TransactionLogWriter`]) where a single task
//! owns the file.

mod event;
mod log;
mod writer;

pub use event::{Event, EventType};
pub use log::{ReadEvents, TransactionLog};
pub use writer::{LogFailure, TransactionLogWriter};
