//! Response models for the key-value server API
//!
//! DTOs serialized as JSON by the operational endpoints.

pub mod responses;

pub use responses::{HealthResponse, StatsResponse};
