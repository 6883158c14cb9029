//! API Module
//!
//! HTTP handlers and routing for the key-value server REST API.
//!
//! # Endpoints
//! - `PUT /v1/:key` - Store a value
//! - `GET /v1/:key` - Retrieve a value
//! - `DELETE /v1/:key` - Delete a key
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
