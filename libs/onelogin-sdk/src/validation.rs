/// `None` when `value` is one of `legal`, otherwise the error message
/// `{key} must be one of [a b c], got: {value}`.
#[must_use]
pub fn one_of(key: &str, value: &str, legal: &[String]) -> Option<String> {
    if legal.iter().any(|option| option == value) {
        return None;
    }
    Some(format!(
        "{key} must be one of [{}], got: {value}",
        legal.join(" ")
    ))
}

/// Error when `value` is missing or blank.
pub(crate) fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, crate::ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(crate::ApiError::Validation(format!("{field} is required"))),
    }
}
