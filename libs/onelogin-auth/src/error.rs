use http::StatusCode;
use thiserror::Error;

/// Errors from minting or revoking tokens.
///
/// No variant ever carries a secret or a response body.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Network, TLS, timeout or request construction failure.
    ///
    /// The inner string is produced by
    /// [`format_http_error`](crate::http_error::format_http_error).
    #[error("{0}")]
    Http(String),

    /// The endpoint answered with a status other than 200.
    #[error("{operation} failed: HTTP {status}")]
    Rejected {
        operation: &'static str,
        status: StatusCode,
    },

    /// The token endpoint answered 200 without a usable `access_token`.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// Missing or unusable credentials.
    #[error("authentication config error: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether the failure happened below the HTTP status level.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn rejected_renders_operation_and_status() {
        let e = AuthError::Rejected {
            operation: "token request",
            status: StatusCode::UNAUTHORIZED,
        };
        assert_eq!(e.to_string(), "token request failed: HTTP 401 Unauthorized");
        assert!(!e.is_transport());
    }

    #[test]
    fn config_error_renders() {
        let e = AuthError::Config("client_id must not be empty".into());
        assert_eq!(
            e.to_string(),
            "authentication config error: client_id must not be empty"
        );
    }

    #[test]
    fn http_error_is_transport() {
        assert!(AuthError::Http("token request timed out after 10s".into()).is_transport());
    }
}
