//! Shared HTTP client construction and status handling.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::SkiffError;

/// Local models can be slow to answer on modest hardware.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Build a reqwest client with the request timeout applied.
pub fn build_client() -> Result<reqwest::Client, SkiffError> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Build default headers, adding a Bearer token when `api_key` is non-empty.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !api_key.is_empty() {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> SkiffError {
    match status {
        401 | 403 => SkiffError::Authentication(body.to_string()),
        429 => SkiffError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => SkiffError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_sends_no_authorization() {
        let headers = bearer_headers("");
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(
            bearer_headers("sk-1").get(AUTHORIZATION).unwrap(),
            "Bearer sk-1"
        );
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let err = status_to_error(429, r#"{"error":{"retry_after":1.5}}"#);
        assert!(matches!(
            err,
            SkiffError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }

    #[test]
    fn auth_statuses_map_to_authentication() {
        assert!(matches!(
            status_to_error(401, "bad key"),
            SkiffError::Authentication(_)
        ));
        assert!(matches!(
            status_to_error(500, "boom"),
            SkiffError::Api { status: 500, .. }
        ));
    }
}
