//! Middleware Module
//!
//! Request filters layered in front of the key-value routes.

mod throttle;

pub use throttle::{throttle_requests, uid_cookie, Throttle, UID_COOKIE};
