use std::future::Future;

use futures::future::join_all;

use crate::error::ApiError;

/// Run named sub-requests concurrently and wait for all of them.
///
/// Returns the values in input order, or [`ApiError::FanOut`] naming every
/// task that failed.
///
/// # Errors
///
/// [`ApiError::FanOut`] when at least one task fails.
pub async fn join_named<T, F>(
    action: &str,
    tasks: impl IntoIterator<Item = (String, F)>,
) -> Result<Vec<T>, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let (names, futures): (Vec<String>, Vec<F>) = tasks.into_iter().unzip();
    let results = join_all(futures).await;

    let mut values = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(value) => values.push(value),
            Err(e) => {
                tracing::warn!(action, task = %name, error = %e, "concurrent request failed");
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        Ok(values)
    } else {
        Err(ApiError::FanOut {
            action: action.to_owned(),
            failed,
        })
    }
}
