//! Shared driver plumbing: pre-network validation and error classification
//!
//! Every driver runs the same checks before touching the network and maps
//! vendor failures onto the same taxonomy, so callers can choose a retry
//! policy without parsing vendor-specific error bodies.

use marketchat_core::{ChatRequest, Error, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;

/// Validate a request before any network call is made.
///
/// Failures surface synchronously as `validation_error`, never as a stream
/// item.
pub fn validate_request(provider: &str, configured: bool, request: &ChatRequest) -> Result<()> {
    if request.model.trim().is_empty() {
        return Err(Error::Validation("request is missing a model id".into()));
    }
    if request.messages.is_empty() {
        return Err(Error::Validation(
            "request must contain at least one message".into(),
        ));
    }
    if !configured {
        return Err(Error::Validation(format!(
            "provider '{}' is not configured; set its API key",
            provider
        )));
    }
    Ok(())
}

/// Classify an HTTP-equivalent status into the shared error taxonomy.
pub fn classify_status(
    provider: &str,
    status: u16,
    message: impl Into<String>,
    retry_after: Option<Duration>,
) -> Error {
    let message = message.into();
    match status {
        401 | 403 => Error::Authentication {
            provider: provider.to_string(),
            message,
        },
        429 => Error::RateLimit {
            provider: provider.to_string(),
            message,
            retry_after,
        },
        402 => Error::QuotaExceeded {
            provider: provider.to_string(),
            message,
        },
        500..=599 => Error::Server {
            provider: provider.to_string(),
            status,
            message,
        },
        _ => Error::Provider {
            provider: provider.to_string(),
            status: Some(status),
            message,
        },
    }
}

/// Parse a `Retry-After` header expressed in seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull the human-readable message out of a vendor error body
/// (`{"error": {"message": ...}}` for both vendors).
pub fn vendor_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Convert a transport error into the taxonomy. Timeouts are classified, not
/// swallowed.
pub fn network_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Network {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Classify a failure reported by the SSE transport.
pub fn classify_transport(provider: &str, err: reqwest_eventsource::Error) -> Error {
    use reqwest_eventsource::Error as EsError;
    match err {
        EsError::InvalidStatusCode(status, _) => classify_status(
            provider,
            status.as_u16(),
            format!("HTTP {} on stream open", status),
            None,
        ),
        EsError::Transport(e) if e.is_timeout() => Error::Timeout,
        other => Error::Network {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

/// A malformed vendor chunk that could not be normalized.
pub fn protocol_error(provider: &str, message: impl Into<String>) -> Error {
    Error::Protocol {
        provider: provider.to_string(),
        message: message.into(),
    }
}
