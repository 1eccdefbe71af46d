//! Per-client request limits, keyed on the caller's address.

use std::{num::NonZeroU32, sync::Arc};

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter, clock::Clock};

use crate::{error::ApiError, extract::ClientIp, state::AppState};

type KeyedLimiter = DefaultKeyedRateLimiter<String>;

const fn non_zero(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(n) => n,
        None => NonZeroU32::MIN,
    }
}

/// 100 writes per 15 minutes.
const API_WRITES_PER_HOUR: NonZeroU32 = non_zero(400);
const API_WRITE_BURST: NonZeroU32 = non_zero(100);
/// 3 attempts per 5 minutes on signup and login.
const SENSITIVE_PER_HOUR: NonZeroU32 = non_zero(36);
const SENSITIVE_BURST: NonZeroU32 = non_zero(3);

#[derive(Clone)]
pub struct RateLimits {
    api: Arc<KeyedLimiter>,
    sensitive: Arc<KeyedLimiter>,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimits {
    pub fn new() -> Self {
        Self {
            api: Arc::new(RateLimiter::keyed(
                Quota::per_hour(API_WRITES_PER_HOUR).allow_burst(API_WRITE_BURST),
            )),
            sensitive: Arc::new(RateLimiter::keyed(
                Quota::per_hour(SENSITIVE_PER_HOUR).allow_burst(SENSITIVE_BURST),
            )),
        }
    }

    /// Drops keys whose buckets have refilled, so idle clients do not pin memory.
    pub fn retain_recent(&self) {
        self.api.retain_recent();
        self.sensitive.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.api.len().max(self.sensitive.len())
    }
}

fn check(limiter: &KeyedLimiter, ip: &str, scope: &'static str) -> Result<(), ApiError> {
    limiter.check_key(&ip.to_string()).map_err(|not_until| {
        let wait = not_until.wait_time_from(limiter.clock().now());
        tracing::warn!(client_ip = %ip, scope, retry_after = wait.as_secs(), "Rate limit exceeded");
        ApiError::RateLimited {
            retry_after_secs: wait.as_secs().max(1),
        }
    })
}

/// Limits state-changing requests; reads are not counted.
pub async fn limit_writes(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        check(&state.rate_limits.api, &ip, "api")?;
    }
    Ok(next.run(request).await)
}

/// Tighter limit for signup, register and login.
pub async fn limit_sensitive(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check(&state.rate_limits.sensitive, &ip, "sensitive")?;
    Ok(next.run(request).await)
}
