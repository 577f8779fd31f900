//! Error types for the web service client.
//!
//! # Design
//! `ServiceError` is a closed set of outcomes so callers match on the variant
//! rather than inspecting strings. Every variant tied to an HTTP exchange
//! records the status and the URL queried; variants produced from a
//! structured error body also keep the service's `code`.
//!
//! Construction-time problems are reported separately through
//! `ConfigError`; they never surface from `get`/`post`.

use thiserror::Error;

/// A failed call to the web service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Transport failure (status `0`) or an HTTP response that could not be
    /// classified: redirects, server errors, unexpected bodies.
    #[error("{message}")]
    Http { message: String, status: u16, url: String },

    /// A response that looked well formed but whose body could not be
    /// decoded, or a 204 that carried content.
    #[error("{message}")]
    WebService { message: String, status: u16, url: String },

    /// The service rejected the request.
    #[error("{message}")]
    InvalidRequest {
        message: String,
        code: Option<String>,
        status: u16,
        url: String,
    },

    /// The service rejected the request because the IP address is not in
    /// its database. A refinement of `InvalidRequest`.
    #[error("{message}")]
    IpAddressNotFound {
        message: String,
        code: String,
        status: u16,
        url: String,
    },

    #[error("{message}")]
    Authentication {
        message: String,
        code: String,
        status: u16,
        url: String,
    },

    #[error("{message}")]
    PermissionRequired {
        message: String,
        code: String,
        status: u16,
        url: String,
    },

    #[error("{message}")]
    InsufficientFunds {
        message: String,
        code: String,
        status: u16,
        url: String,
    },

    /// The request content could not be encoded as JSON. Nothing was sent.
    #[error("{message}")]
    InvalidInput { message: String },
}

impl ServiceError {
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Http { message, .. }
            | ServiceError::WebService { message, .. }
            | ServiceError::InvalidRequest { message, .. }
            | ServiceError::IpAddressNotFound { message, .. }
            | ServiceError::Authentication { message, .. }
            | ServiceError::PermissionRequired { message, .. }
            | ServiceError::InsufficientFunds { message, .. }
            | ServiceError::InvalidInput { message } => message,
        }
    }

    /// HTTP status of the response, `0` for transport failures. `None` when
    /// no request was made.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Http { status, .. }
            | ServiceError::WebService { status, .. }
            | ServiceError::InvalidRequest { status, .. }
            | ServiceError::IpAddressNotFound { status, .. }
            | ServiceError::Authentication { status, .. }
            | ServiceError::PermissionRequired { status, .. }
            | ServiceError::InsufficientFunds { status, .. } => Some(*status),
            ServiceError::InvalidInput { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ServiceError::Http { url, .. }
            | ServiceError::WebService { url, .. }
            | ServiceError::InvalidRequest { url, .. }
            | ServiceError::IpAddressNotFound { url, .. }
            | ServiceError::Authentication { url, .. }
            | ServiceError::PermissionRequired { url, .. }
            | ServiceError::InsufficientFunds { url, .. } => Some(url),
            ServiceError::InvalidInput { .. } => None,
        }
    }

    /// The service-defined error code, for errors built from a structured
    /// error body.
    pub fn code(&self) -> Option<&str> {
        match self {
            ServiceError::InvalidRequest { code, .. } => code.as_deref(),
            ServiceError::IpAddressNotFound { code, .. }
            | ServiceError::Authentication { code, .. }
            | ServiceError::PermissionRequired { code, .. }
            | ServiceError::InsufficientFunds { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True for `InvalidRequest` and its `IpAddressNotFound` refinement.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidRequest { .. } | ServiceError::IpAddressNotFound { .. }
        )
    }
}

/// A transport could not complete the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub url: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            url: url.into(),
        }
    }
}

impl From<TransportError> for ServiceError {
    fn from(err: TransportError) -> Self {
        ServiceError::Http {
            message: format!("HTTP transport error: {}", err.message),
            status: 0,
            url: err.url,
        }
    }
}

/// Invalid client configuration, reported when the client is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("account ID must be a positive integer")]
    InvalidAccountId,

    #[error("license key must not be empty")]
    EmptyLicenseKey,

    #[error("host must not be empty")]
    EmptyHost,

    #[error("{name} must be a non-negative number of seconds, got {value}")]
    InvalidTimeout { name: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_becomes_status_zero_http_error() {
        let err: ServiceError =
            TransportError::new("connection refused", "https://example.com/x").into();
        assert_eq!(
            err,
            ServiceError::Http {
                message: "HTTP transport error: connection refused".to_string(),
                status: 0,
                url: "https://example.com/x".to_string(),
            }
        );
        assert_eq!(err.status(), Some(0));
    }

    #[test]
    fn ip_address_not_found_counts_as_invalid_request() {
        let err = ServiceError::IpAddressNotFound {
            message: "not found".to_string(),
            code: "IP_ADDRESS_NOT_FOUND".to_string(),
            status: 404,
            url: "https://example.com/ip".to_string(),
        };
        assert!(err.is_invalid_request());
        assert_eq!(err.code(), Some("IP_ADDRESS_NOT_FOUND"));
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn invalid_input_has_no_status_or_url() {
        let err = ServiceError::InvalidInput {
            message: "bad".to_string(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.url(), None);
        assert!(!err.is_invalid_request());
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::InvalidTimeout {
            name: "timeout",
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "timeout must be a non-negative number of seconds, got -1"
        );
    }
}
