//! Background Tasks Module
//!
//! Tasks that run alongside the server.
//!
//! # Tasks
//! - Log monitor: escalates a transaction log writer failure

mod log_monitor;

pub use log_monitor::spawn_log_monitor;
