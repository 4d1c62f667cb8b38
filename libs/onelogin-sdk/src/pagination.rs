//! Cursor pagination over list endpoints.
//!
//! The API reports the next page through response headers:
//!
//! - `After-Cursor`: opaque cursor for the next page, empty or absent on the last one
//! - `Total-Pages` / `Current-Page`: page counters
//!
//! The driver re-sends the request with a `cursor` query parameter until the
//! cursor runs out, the counters say the last page was passed, or the caller
//! asked for an explicit `limit`.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::executor::{ApiResponse, Executor};
use crate::request::RequestDescriptor;

pub const AFTER_CURSOR: &str = "After-Cursor";
pub const TOTAL_PAGES: &str = "Total-Pages";
pub const CURRENT_PAGE: &str = "Current-Page";
pub const CURSOR_PARAM: &str = "cursor";
pub const LIMIT_PARAM: &str = "limit";

/// Raw page bodies in fetch order.
#[derive(Debug, Clone, Default)]
pub struct PagedResult {
    pages: Vec<Bytes>,
}

impl PagedResult {
    #[must_use]
    pub fn pages(&self) -> &[Bytes] {
        &self.pages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Decode every page as a JSON array and concatenate the items.
    /// Empty bodies contribute nothing.
    ///
    /// # Errors
    ///
    /// [`ApiError::Decode`] if a page is not an array of `T`.
    pub fn decode_items<T: DeserializeOwned>(
        &self,
        what: &'static str,
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        for page in &self.pages {
            if page.is_empty() {
                continue;
            }
            let decoded: Vec<T> =
                serde_json::from_slice(page).map_err(|e| ApiError::decode(what, e))?;
            items.extend(decoded);
        }
        Ok(items)
    }

    /// Decode the first page as a single object.
    ///
    /// # Errors
    ///
    /// [`ApiError::Decode`] if there is no page or it does not decode as `T`.
    pub fn decode_first<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, ApiError> {
        let page = self.pages.first().map_or(&[][..], Bytes::as_ref);
        serde_json::from_slice(page).map_err(|e| ApiError::decode(what, e))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CursorState {
    after_cursor: Option<String>,
    current_page: u64,
    total_pages: u64,
}

impl CursorState {
    fn from_response(response: &ApiResponse) -> Self {
        let counter = |name: &str| {
            response
                .header(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0)
        };
        Self {
            after_cursor: response
                .header(AFTER_CURSOR)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
            current_page: counter(CURRENT_PAGE),
            total_pages: counter(TOTAL_PAGES),
        }
    }
}

/// Fetch `request` and every following page.
///
/// Pages are fetched one after another. A failing page aborts the read and
/// the pages fetched so far are dropped.
///
/// # Errors
///
/// Any error from [`Executor::execute`].
pub async fn read_all(
    executor: &Executor,
    request: &RequestDescriptor,
) -> Result<PagedResult, ApiError> {
    let explicit_limit = request.has_query_param(LIMIT_PARAM);
    let mut pages = Vec::new();
    let mut next = request.clone();
    let mut previous_cursor: Option<String> = None;

    loop {
        let response = executor.execute(&next).await?;
        let state = CursorState::from_response(&response);
        pages.push(response.body);

        if explicit_limit {
            break;
        }
        let Some(cursor) = state.after_cursor else {
            break;
        };
        if state.current_page > state.total_pages {
            break;
        }
        if previous_cursor.as_deref() == Some(cursor.as_str()) {
            tracing::warn!(path = request.path(), "API repeated the same cursor; stopping");
            break;
        }

        tracing::debug!(path = request.path(), page = pages.len() + 1, "fetching next page");
        next = request.with_query_param(CURSOR_PARAM, &cursor);
        previous_cursor = Some(cursor);
    }

    Ok(PagedResult { pages })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use serde::Deserialize;

    fn response(headers: &[(&'static str, &'static str)]) -> ApiResponse {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        ApiResponse {
            status: StatusCode::OK,
            headers: map,
            body: Bytes::new(),
        }
    }

    #[test]
    fn cursor_state_parses_headers() {
        let state = CursorState::from_response(&response(&[
            ("after-cursor", "abc"),
            ("current-page", "2"),
            ("total-pages", "5"),
        ]));
        assert_eq!(
            state,
            CursorState {
                after_cursor: Some("abc".into()),
                current_page: 2,
                total_pages: 5,
            }
        );
    }

    #[test]
    fn unparseable_counters_are_zero_and_empty_cursor_is_none() {
        let state = CursorState::from_response(&response(&[
            ("after-cursor", ""),
            ("current-page", "two"),
        ]));
        assert_eq!(state, CursorState::default());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i32,
    }

    #[test]
    fn decode_items_concatenates_pages() {
        let result = PagedResult {
            pages: vec![
                Bytes::from_static(br#"[{"id":1},{"id":2}]"#),
                Bytes::new(),
                Bytes::from_static(br#"[{"id":3}]"#),
            ],
        };
        let items: Vec<Item> = result.decode_items("items").unwrap();
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }, Item { id: 3 }]);
    }

    #[test]
    fn decode_first_reports_what_failed() {
        let result = PagedResult {
            pages: vec![Bytes::from_static(b"not json")],
        };
        let err = result.decode_first::<Item>("app").unwrap_err();
        assert!(err.to_string().starts_with("unable to decode app"));
        assert!(PagedResult::default().decode_first::<Item>("app").is_err());
    }
}
