//! # Authentication Module
//!
//! Optional bearer-key authentication for the Ampere HTTP API.
//!
//! When `AMPERE_API_KEY` is set and non-empty, every request except
//! `GET /health` must carry `Authorization: Bearer <key>` (a bare `<key>` is
//! accepted too).

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "AMPERE_API_KEY";

/// Read the configured key; `None` disables authentication.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

/// Compare two keys in constant time.
///
/// Both sides are padded to a common length first so the comparison cost
/// does not depend on where, or whether, the keys differ in length.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    let width = provided.len().max(expected.len());

    let mut left = vec![0u8; width];
    let mut right = vec![0u8; width];
    left[..provided.len()].copy_from_slice(provided);
    right[..expected.len()].copy_from_slice(expected);

    let same_bytes: bool = left.ct_eq(&right).into();
    same_bytes && provided.len() == expected.len()
}

/// Reject requests without the configured key.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };

    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(key) if keys_match(key, &expected) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                path = %request.uri().path(),
                "rejected request with wrong API key"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                path = %request.uri().path(),
                "rejected request without Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_match() {
        assert!(keys_match("s3cret", "s3cret"));
    }

    #[test]
    fn prefix_does_not_match() {
        assert!(!keys_match("s3c", "s3cret"));
        assert!(!keys_match("s3cret-and-more", "s3cret"));
    }

    #[test]
    fn trailing_zero_bytes_do_not_match() {
        // Padding must not make "key\0" equal to "key".
        assert!(!keys_match("key\0", "key"));
    }
}
