//! HTTP security utilities.

use http::Uri;

use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};

/// Maximum body preview size for error messages (8KB).
///
/// Non-2xx bodies are read up to this many bytes when building
/// [`HttpError::HttpStatus`](crate::HttpError::HttpStatus).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Header names whose values must never reach logs.
pub const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Returns `true` if the header value must be marked sensitive.
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

/// Parse `url` and check that it names a host over an allowed scheme.
///
/// Plain `http` passes only with [`TransportSecurity::AllowInsecureHttp`].
///
/// # Errors
///
/// [`HttpError::InvalidUri`] for unparseable URLs or missing parts,
/// [`HttpError::InvalidScheme`] for a scheme the transport does not allow.
pub fn check_url(url: &str, transport: TransportSecurity) -> Result<Uri, HttpError> {
    let invalid = |kind, reason: String| HttpError::InvalidUri {
        url: url.to_owned(),
        kind,
        reason,
    };

    let uri: Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(InvalidUriKind::ParseError, e.to_string()))?;
    if uri.authority().is_none() {
        return Err(invalid(InvalidUriKind::MissingAuthority, "missing host".to_owned()));
    }
    let Some(scheme) = uri.scheme_str() else {
        return Err(invalid(InvalidUriKind::MissingScheme, "missing scheme".to_owned()));
    };

    let allowed = match scheme {
        "https" => true,
        "http" => transport == TransportSecurity::AllowInsecureHttp,
        _ => {
            return Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http and https are supported".to_owned(),
            });
        }
    };
    if allowed {
        Ok(uri)
    } else {
        Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
            reason: "HTTPS required".to_owned(),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn authorization_is_sensitive_in_any_case() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("authorization"));
        assert!(!is_sensitive_header("content-type"));
    }

    #[test]
    fn https_is_always_allowed() {
        let uri =
            check_url("https://acme.onelogin.com/api/2/apps", TransportSecurity::TlsOnly).unwrap();
        assert_eq!(uri.host(), Some("acme.onelogin.com"));
    }

    #[test]
    fn plain_http_needs_opt_in() {
        let url = "http://127.0.0.1:8080/auth/oauth2/v2/token";
        assert!(matches!(
            check_url(url, TransportSecurity::TlsOnly),
            Err(HttpError::InvalidScheme { .. })
        ));
        assert!(check_url(url, TransportSecurity::AllowInsecureHttp).is_ok());
    }

    #[test]
    fn unusable_urls_are_classified() {
        let kind = |url| match check_url(url, TransportSecurity::AllowInsecureHttp) {
            Err(HttpError::InvalidUri { kind, .. }) => Some(kind),
            _ => None,
        };
        assert_eq!(kind("/api/2/apps"), Some(InvalidUriKind::MissingAuthority));
        assert_eq!(kind("acme.onelogin.com:443"), Some(InvalidUriKind::MissingScheme));
        assert_eq!(kind("not a url"), Some(InvalidUriKind::ParseError));
        assert!(matches!(
            check_url("ftp://acme.onelogin.com", TransportSecurity::AllowInsecureHttp),
            Err(HttpError::InvalidScheme { .. })
        ));
    }
}
