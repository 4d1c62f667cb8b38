use std::borrow::Cow;

use crate::error::ApiError;

/// One component of an API path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a>(Cow<'a, str>);

impl<'a> From<&'a str> for Segment<'a> {
    fn from(s: &'a str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl<'a> From<&'a String> for Segment<'a> {
    fn from(s: &'a String) -> Self {
        Self(Cow::Borrowed(s.as_str()))
    }
}

impl From<String> for Segment<'_> {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

macro_rules! segment_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Segment<'_> {
            fn from(n: $t) -> Self {
                Self(Cow::Owned(n.to_string()))
            }
        })*
    };
}

segment_from_int!(i32, i64, u32, u64);

/// Join segments into `/seg/seg/...`.
///
/// # Errors
///
/// [`ApiError::Construction`] when a segment is empty, is `.` or `..`,
/// contains `/`, `?`, `#` or whitespace, or when the path does not start
/// with `api` or `auth`.
pub fn api_path(segments: &[Segment<'_>]) -> Result<String, ApiError> {
    let Some(first) = segments.first() else {
        return Err(ApiError::Construction("API path has no segments".into()));
    };
    if first.0 != "api" && first.0 != "auth" {
        return Err(ApiError::Construction(format!(
            "API path must start with 'api' or 'auth', got '{}'",
            first.0
        )));
    }

    let mut path = String::new();
    for segment in segments {
        validate_segment(&segment.0)?;
        path.push('/');
        path.push_str(&segment.0);
    }
    Ok(path)
}

fn validate_segment(segment: &str) -> Result<(), ApiError> {
    if segment.is_empty() {
        return Err(ApiError::Construction("empty path segment".into()));
    }
    if segment == "." || segment == ".." {
        return Err(ApiError::Construction(format!(
            "path segment '{segment}' is not allowed"
        )));
    }
    if segment
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace())
    {
        return Err(ApiError::Construction(format!(
            "path segment '{segment}' contains a reserved character"
        )));
    }
    Ok(())
}

/// `api_path!("api", "2", "apps", id)`: each argument is converted with
/// [`Segment::from`].
#[macro_export]
macro_rules! api_path {
    ($($segment:expr),+ $(,)?) => {
        $crate::path::api_path(&[$($crate::path::Segment::from($segment)),+])
    };
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn joins_strings_and_integers() {
        let id: i32 = 42;
        assert_eq!(api_path!("api", "2", "apps", id, "rules").unwrap(), "/api/2/apps/42/rules");
    }

    #[test]
    fn hook_ids_are_strings() {
        let id = String::from("9f6b3c1e-1d4f");
        assert_eq!(api_path!("api", "2", "hooks", &id).unwrap(), "/api/2/hooks/9f6b3c1e-1d4f");
    }

    #[test]
    fn reserved_characters_are_rejected() {
        for bad in ["a/b", "a?b", "a#b", "a b", "", ".", ".."] {
            assert!(
                matches!(api_path!("api", "2", bad), Err(ApiError::Construction(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn first_segment_must_be_api_or_auth() {
        assert!(api_path!("auth", "oauth2", "revoke").is_ok());
        assert!(api_path!("users", "1").is_err());
        assert!(api_path(&[]).is_err());
    }
}
