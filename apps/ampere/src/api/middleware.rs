//! # Rate Limiting
//!
//! A single global token bucket in front of every route.
//!
//! `AMPERE_RATE_LIMIT` sets requests per second (default 100, `0` disables
//! the limiter).

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Environment variable holding the request rate.
pub const RATE_LIMIT_ENV: &str = "AMPERE_RATE_LIMIT";

/// Requests per second when nothing is configured.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Shared limiter handed to the middleware as router state.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a limiter allowing `requests_per_second`; zero falls back to the
/// default rate.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rate = NonZeroU32::new(requests_per_second)
        .or(NonZeroU32::new(DEFAULT_RATE_LIMIT))
        .unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rate)))
}

/// Parse a configured rate; missing or malformed values give the default.
pub fn parse_rate_limit(value: Option<&str>) -> u32 {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT)
}

/// Rate from `AMPERE_RATE_LIMIT`.
pub fn get_rate_limit_from_env() -> u32 {
    parse_rate_limit(std::env::var(RATE_LIMIT_ENV).ok().as_deref())
}

/// Answer 429 once the bucket is empty.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if limiter.check().is_err() {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_admits_first_request() {
        assert!(create_rate_limiter(5).check().is_ok());
        assert!(create_rate_limiter(0).check().is_ok());
    }

    #[test]
    fn limiter_exhausts_burst() {
        let limiter = create_rate_limiter(1);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn rate_parsing() {
        assert_eq!(parse_rate_limit(None), DEFAULT_RATE_LIMIT);
        assert_eq!(parse_rate_limit(Some(" 25 ")), 25);
        assert_eq!(parse_rate_limit(Some("0")), 0);
        assert_eq!(parse_rate_limit(Some("lots")), DEFAULT_RATE_LIMIT);
    }
}
