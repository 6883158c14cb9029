//! Request Throttle
//!
//! Token bucket per client, keyed by the `UID` cookie.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::ThrottleConfig;
use crate::error::{KvError, Result};

/// Name of the cookie identifying a client.
pub const UID_COOKIE: &str = "UID";

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    /// Instant up to which refills have been credited
    refilled_at: Instant,
}

// == Throttle ==
/// Per-client token buckets.
///
/// A new client starts with a full bucket. `refill` tokens are credited for
/// each whole `interval` elapsed, never beyond `max`.
#[derive(Debug)]
pub struct Throttle {
    config: ThrottleConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl Throttle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    // == Take ==
    /// Spends one token from `uid`'s bucket at time `now`.
    pub fn take(&self, uid: &str, now: Instant) -> Result<()> {
        let ThrottleConfig {
            max,
            refill,
            interval,
        } = self.config;
        if max < 1 {
            return Err(KvError::Internal(
                "throttle bucket size must be > 0".to_string(),
            ));
        }

        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(uid) else {
            buckets.insert(
                uid.to_string(),
                Bucket {
                    tokens: max - 1,
                    refilled_at: now,
                },
            );
            return Ok(());
        };

        let elapsed = now.saturating_duration_since(bucket.refilled_at);
        let intervals = elapsed.as_nanos() / interval.as_nanos().max(1);
        let added = intervals.saturating_mul(u128::from(refill));
        let current = u128::from(bucket.tokens).saturating_add(added);

        if current < 1 {
            debug!(uid, "throttled");
            return Err(KvError::TooManyRequests);
        }

        if current > u128::from(max) {
            bucket.refilled_at = now;
            bucket.tokens = max - 1;
        } else {
            // current <= max here, so both conversions fit in u32
            if added > 0 {
                bucket.refilled_at += interval * intervals as u32;
            }
            bucket.tokens = current as u32 - 1;
        }
        Ok(())
    }
}

/// Extracts the `UID` cookie value from the request headers.
pub fn uid_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == UID_COOKIE)
        .map(|(_, value)| value.to_string())
}

// == Middleware ==
/// axum middleware applying the throttle to each request.
///
/// Missing cookie → 400, empty bucket → 429, misconfigured bucket → 500.
pub async fn throttle_requests(
    State(throttle): State<Arc<Throttle>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let uid = uid_cookie(request.headers())
        .ok_or_else(|| KvError::InvalidRequest("missing UID cookie".to_string()))?;
    throttle.take(&uid, Instant::now())?;
    Ok(next.run(request).await)
}
