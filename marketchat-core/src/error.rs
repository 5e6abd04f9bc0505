//! Error types for the marketchat provider layer

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// The main error type for all provider operations
///
/// Vendor-specific error shapes never cross this boundary: drivers classify
/// HTTP status codes and wire-level failures into this taxonomy so callers
/// can pick a retry policy without parsing vendor error bodies.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Credentials rejected by the vendor (HTTP 401/403)
    Authentication {
        /// Provider name (e.g., "openai", "anthropic")
        provider: String,
        /// Error message
        message: String,
    },

    /// Request rejected due to rate limiting (HTTP 429)
    RateLimit {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
        /// Time to wait before retrying, when the vendor supplies one
        retry_after: Option<Duration>,
    },

    /// Account out of quota or credits (HTTP 402)
    QuotaExceeded {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Vendor-side failure (HTTP 5xx)
    Server {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Pre-network validation failure (missing model, empty messages,
    /// unconfigured provider). Raised synchronously, before any call is made.
    Validation(String),

    /// Malformed vendor chunk or event that could not be normalized
    Protocol {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Transport-level failure
    Network {
        /// Error message
        message: String,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The request or stream timed out
    Timeout,

    /// Any other vendor error, passed through with its status
    Provider {
        /// Provider name
        provider: String,
        /// HTTP status code if known
        status: Option<u16>,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Stable taxonomy name for this error, suitable for forwarding to
    /// clients (e.g. inside a server-sent error event).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Authentication { .. } => "auth_error",
            Error::RateLimit { .. } => "rate_limit",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::Server { .. } => "server_error",
            Error::Validation(_) => "validation_error",
            Error::Protocol { .. } => "protocol_error",
            Error::Network { .. } => "network_error",
            Error::Timeout => "timeout",
            Error::Provider { .. } => "provider_error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication { provider, message } => {
                write!(f, "Authentication error ({}): {}", provider, message)
            }
            Error::RateLimit {
                provider, message, ..
            } => write!(f, "Rate limited ({}): {}", provider, message),
            Error::QuotaExceeded { provider, message } => {
                write!(f, "Quota exceeded ({}): {}", provider, message)
            }
            Error::Server {
                provider,
                status,
                message,
            } => write!(f, "Server error ({}, HTTP {}): {}", provider, status, message),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::Protocol { provider, message } => {
                write!(f, "Protocol error ({}): {}", provider, message)
            }
            Error::Network { message, .. } => write!(f, "Network error: {}", message),
            Error::Timeout => write!(f, "Operation timed out"),
            Error::Provider {
                provider,
                status,
                message,
            } => match status {
                Some(status) => {
                    write!(f, "Provider error ({}, HTTP {}): {}", provider, status, message)
                }
                None => write!(f, "Provider error ({}): {}", provider, message),
            },
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Network { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Network {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
