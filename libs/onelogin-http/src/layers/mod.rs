//! Tower layers for the HTTP client stack
//!
//! - [`DefaultHeadersLayer`] - Adds `User-Agent` and `Accept` when absent

mod default_headers;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
