//! Mapping of Gemini HTTP failures onto [`GatewayError`]

use super::protocol::ErrorEnvelope;
use persona_chat_application::GatewayError;
use std::time::Duration;

/// `ErrorInfo.reason` values that mean the credential itself is bad
const AUTH_REASONS: &[&str] = &["API_KEY_INVALID", "API_KEY_SERVICE_BLOCKED"];

/// Finish reasons that mean the reply was withheld by the provider
pub const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "RECITATION",
];

/// Classify a non-success HTTP response.
///
/// `retry_after` comes from the `Retry-After` header; a `RetryInfo` detail in
/// the body is used when the header is absent.
pub fn map_http_error(status: u16, retry_after: Option<Duration>, body: &str) -> GatewayError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    let auth_reason = envelope.as_ref().is_some_and(|e| {
        e.error
            .details
            .iter()
            .filter_map(|d| d.reason.as_deref())
            .any(|r| AUTH_REASONS.contains(&r))
    });

    match status {
        401 | 403 => GatewayError::Auth(message),
        _ if auth_reason => GatewayError::Auth(message),
        429 => GatewayError::RateLimited {
            retry_after: retry_after.or_else(|| {
                envelope.as_ref().and_then(|e| {
                    e.error
                        .details
                        .iter()
                        .filter_map(|d| d.retry_delay.as_deref())
                        .find_map(parse_retry_delay)
                })
            }),
        },
        _ => GatewayError::TransientFailure(message),
    }
}

/// Parse a `Retry-After` header in its delta-seconds form.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Parse a protobuf duration string such as `"30s"` or `"1.5s"`.
fn parse_retry_delay(value: &str) -> Option<Duration> {
    let seconds = value.trim().strip_suffix('s')?.parse::<f64>().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}

/// Any transport-level failure (connect, TLS, body read) is worth retrying.
pub fn map_transport_error(error: &reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::TransientFailure(format!("request timed out: {}", error))
    } else {
        GatewayError::TransientFailure(format!("request failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVALID_KEY_BODY: &str = r#"{"error": {"code": 400,
        "message": "API key not valid. Please pass a valid API key.",
        "status": "INVALID_ARGUMENT",
        "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo",
                     "reason": "API_KEY_INVALID"}]}}"#;

    #[test]
    fn test_unauthorized_statuses_are_auth() {
        for status in [401, 403] {
            assert!(matches!(
                map_http_error(status, None, "nope"),
                GatewayError::Auth(_)
            ));
        }
    }

    #[test]
    fn test_invalid_key_reason_is_auth() {
        let err = map_http_error(400, None, INVALID_KEY_BODY);
        assert_eq!(
            err,
            GatewayError::Auth("API key not valid. Please pass a valid API key.".to_string())
        );
    }

    #[test]
    fn test_rate_limited_uses_header_first() {
        let body = r#"{"error": {"code": 429, "message": "quota",
            "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo",
                         "retryDelay": "30s"}]}}"#;

        assert_eq!(
            map_http_error(429, Some(Duration::from_secs(7)), body),
            GatewayError::RateLimited {
                retry_after: Some(Duration::from_secs(7))
            }
        );
        assert_eq!(
            map_http_error(429, None, body),
            GatewayError::RateLimited {
                retry_after: Some(Duration::from_secs(30))
            }
        );
        assert_eq!(
            map_http_error(429, None, ""),
            GatewayError::RateLimited { retry_after: None }
        );
    }

    #[test]
    fn test_other_statuses_are_transient() {
        let err = map_http_error(503, None, "<html>unavailable</html>");
        assert_eq!(err, GatewayError::TransientFailure("HTTP 503".to_string()));

        let err = map_http_error(
            500,
            None,
            r#"{"error": {"code": 500, "message": "internal"}}"#,
        );
        assert_eq!(err, GatewayError::TransientFailure("internal".to_string()));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("12"), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after(" 3 "), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_parse_retry_delay() {
        assert_eq!(parse_retry_delay("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_delay("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_delay("30"), None);
        assert_eq!(parse_retry_delay("-1s"), None);
    }
}
