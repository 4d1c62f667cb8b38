use http::StatusCode;
use onelogin_auth::{AuthError, format_http_error};
use onelogin_http::HttpError;
use thiserror::Error;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    Construction,
    Authentication,
    Transport,
    Client,
    Server,
    Decode,
    FanOut,
    Validation,
}

/// Errors returned by the API client and the resource services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request could not be built: bad path segment, nested query value,
    /// unserializable body or rejected URL. Never retried.
    #[error("invalid request: {0}")]
    Construction(String),

    /// Minting or refreshing the bearer token failed, or credentials are missing.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The API answered 401/403 and a fresh token did not help, or the request
    /// did not use bearer auth.
    #[error("unauthorized: HTTP {status}")]
    Unauthorized { status: StatusCode },

    /// DNS, connect, TLS or timeout failure.
    #[error("unable to connect: {0}")]
    Transport(String),

    /// Any 4xx other than 401/403. `body` is the response text.
    #[error("HTTP {status}: {body}")]
    Client { status: StatusCode, body: String },

    /// 5xx. The remote body is not kept.
    #[error("unable to connect to the API: server responded with HTTP {status}")]
    Server { status: StatusCode },

    /// A response body did not match the expected model.
    #[error("unable to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// One or more concurrent sub-requests failed.
    #[error("unable to {action} [{}]", failed.join(", "))]
    FanOut {
        action: String,
        failed: Vec<String>,
    },

    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Construction(_) => ErrorKind::Construction,
            Self::Auth(_) | Self::Unauthorized { .. } => ErrorKind::Authentication,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Client { .. } => ErrorKind::Client,
            Self::Server { .. } => ErrorKind::Server,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::FanOut { .. } => ErrorKind::FanOut,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// HTTP status carried by the error, if the API answered at all.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { status }
            | Self::Client { status, .. }
            | Self::Server { status } => Some(*status),
            _ => None,
        }
    }

    /// 404 from the API: the remote object no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub(crate) fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }

    /// Map a transport-layer failure, keeping construction errors apart from
    /// network ones.
    pub(crate) fn from_http(err: &HttpError, context: &str) -> Self {
        let message = format_http_error(err, context);
        if err.is_construction() {
            Self::Construction(message)
        } else {
            Self::Transport(message)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Construction(format!("JSON encoding failed: {err}"))
    }
}

/// Join messages into one error, `None` when the list is empty.
pub(crate) fn stack_errors(messages: Vec<String>) -> Option<ApiError> {
    if messages.is_empty() {
        return None;
    }
    Some(ApiError::Validation(messages.join(", ")))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn fan_out_lists_failed_names() {
        let err = ApiError::FanOut {
            action: "attach privilege assignments".into(),
            failed: vec!["users".into(), "roles".into()],
        };
        assert_eq!(
            err.to_string(),
            "unable to attach privilege assignments [users, roles]"
        );
        assert_eq!(err.kind(), ErrorKind::FanOut);
    }

    #[test]
    fn not_found_is_a_404_client_error() {
        let err = ApiError::Client {
            status: StatusCode::NOT_FOUND,
            body: r#"{"message":"Not Found"}"#.into(),
        };
        assert!(err.is_not_found());
        assert!(
            !ApiError::Server {
                status: StatusCode::BAD_GATEWAY
            }
            .is_not_found()
        );
    }

    #[test]
    fn server_error_does_not_echo_body() {
        let err = ApiError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(
            err.to_string(),
            "unable to connect to the API: server responded with HTTP 500 Internal Server Error"
        );
    }

    #[test]
    fn auth_errors_share_a_kind() {
        let cfg = ApiError::from(AuthError::Config("client_id must not be empty".into()));
        let denied = ApiError::Unauthorized {
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(cfg.kind(), ErrorKind::Authentication);
        assert_eq!(denied.kind(), ErrorKind::Authentication);
        assert_eq!(denied.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn http_construction_errors_are_not_transport() {
        let err = HttpError::InvalidScheme {
            scheme: "ftp".into(),
            reason: "only http:// and https:// schemes are supported".into(),
        };
        assert_eq!(
            ApiError::from_http(&err, "request").kind(),
            ErrorKind::Construction
        );
        assert_eq!(
            ApiError::from_http(&HttpError::Overloaded, "request").kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn stacked_messages_join_with_commas() {
        assert!(stack_errors(Vec::new()).is_none());
        let err = stack_errors(vec!["a bad".into(), "b bad".into()]).unwrap();
        assert_eq!(err.to_string(), "a bad, b bad");
    }
}
