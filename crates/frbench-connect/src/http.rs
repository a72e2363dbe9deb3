//! POST loop shared by all wire formats: 429 backoff and status mapping.

use crate::config::RetryPolicy;
use crate::error::ConnectError;
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Send the request built by `build` until it stops answering 429.
///
/// At most `policy.max_attempts()` requests are sent, with `policy.backoff`
/// between consecutive 429 answers. Any other non-success status is turned
/// into an error by `decode_error` from the status code and the body.
pub(crate) async fn post_with_backoff<B, E>(
    policy: RetryPolicy,
    mut build: B,
    decode_error: E,
) -> Result<Vec<u8>, ConnectError>
where
    B: FnMut() -> reqwest::RequestBuilder,
    E: Fn(u16, &[u8]) -> ConnectError,
{
    let max_attempts = policy.max_attempts();

    for attempt in 1..=max_attempts {
        let response = build().send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            if attempt < max_attempts {
                warn!(
                    attempt,
                    max_attempts,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(policy.backoff).await;
            }
            continue;
        }

        if status.is_success() {
            let body = response.bytes().await?;
            debug!(status = status.as_u16(), bytes = body.len(), "provider response");
            return Ok(body.to_vec());
        }

        let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        return Err(decode_error(status.as_u16(), &body));
    }

    Err(ConnectError::RateLimitExhausted {
        attempts: max_attempts,
        window: policy.quota_window,
    })
}

/// Fallback error when the provider's error envelope cannot be decoded.
pub(crate) fn undecoded_error(status: u16, body: &[u8]) -> ConnectError {
    let message = String::from_utf8_lossy(body).trim().to_string();
    ConnectError::Provider {
        status,
        kind: "unknown".to_string(),
        message: if message.is_empty() {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("no body")
                .to_string()
        } else {
            message
        },
    }
}
