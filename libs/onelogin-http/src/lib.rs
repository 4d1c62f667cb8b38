#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTPS transport for the OneLogin API client
//!
//! This crate provides a hyper-based HTTP client with:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - A per-request timeout
//! - Default `User-Agent` and `Accept` headers
//! - Transparent response decompression (gzip, brotli, deflate)
//! - Response body size limits
//!
//! The client never retries and never interprets status codes on its own:
//! `send()` returns `Ok` for every HTTP status and `Err` only for transport,
//! timeout, TLS and request-construction failures. Status classification
//! belongs to the caller.
//!
//! # Example
//!
//! ```ignore
//! use onelogin_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let resp = client
//!     .request(http::Method::GET, "https://acme.onelogin.com/api/2/apps")
//!     .sensitive_header("authorization", "Bearer tok")
//!     .send()
//!     .await?;
//! let body = resp.bytes().await?;
//! ```

mod builder;
mod client;
mod config;
mod connector;
mod error;
mod layers;
mod request;
mod response;
pub mod security;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, TlsRootConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody};
