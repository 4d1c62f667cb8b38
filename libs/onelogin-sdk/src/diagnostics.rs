//! Error messages for the provider layer.

use std::fmt;

use crate::error::ApiError;

/// Lifecycle phase a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl ErrorCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Import => "IMPORT",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[{CATEGORY}] Error {operation} {resource_type} (ID: {id}): {err}`
///
/// The message is also logged at error level.
#[must_use]
pub fn format_error(
    category: ErrorCategory,
    resource_type: &str,
    operation: &str,
    id: &str,
    err: &dyn std::error::Error,
) -> String {
    let message = format!("[{category}] Error {operation} {resource_type} (ID: {id}): {err}");
    tracing::error!(
        category = category.as_str(),
        resource_type,
        operation,
        id,
        error = %err,
        "{message}"
    );
    message
}

/// Result of a read that tolerates the remote object being gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    Found(T),
    /// The API answered 404; the caller should drop its state.
    Gone,
}

impl<T> ReadOutcome<T> {
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Gone => None,
        }
    }
}

/// Turn a 404 into [`ReadOutcome::Gone`].
///
/// # Errors
///
/// Every error other than not-found.
pub fn read_or_gone<T>(result: Result<T, ApiError>) -> Result<ReadOutcome<T>, ApiError> {
    match result {
        Ok(value) => Ok(ReadOutcome::Found(value)),
        Err(e) if e.is_not_found() => {
            tracing::warn!(error = %e, "remote object not found; clearing state");
            Ok(ReadOutcome::Gone)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn format_error_renders_and_logs() {
        let err = ApiError::Server {
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        let msg = format_error(ErrorCategory::Update, "onelogin_app", "updating", "42", &err);
        assert_eq!(
            msg,
            "[UPDATE] Error updating onelogin_app (ID: 42): unable to connect to the API: \
             server responded with HTTP 503 Service Unavailable"
        );
        assert!(logs_contain("onelogin_app"));
    }

    #[test]
    fn not_found_becomes_gone() {
        let result: Result<(), ApiError> = Err(ApiError::Client {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        });
        assert_eq!(read_or_gone(result).unwrap(), ReadOutcome::Gone);
        assert_eq!(read_or_gone(Ok::<_, ApiError>(5)).unwrap().into_option(), Some(5));
    }

    #[test]
    fn other_errors_propagate() {
        let result: Result<(), ApiError> = Err(ApiError::Client {
            status: StatusCode::BAD_REQUEST,
            body: "bad".into(),
        });
        assert!(read_or_gone(result).is_err());
    }
}
