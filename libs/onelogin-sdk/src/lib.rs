#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! OneLogin API client
//!
//! Layers, bottom to top:
//! - [`request`]: transport-independent request descriptors
//! - [`executor`]: sends descriptors with bearer or basic auth, classifies
//!   statuses and retries once on a rejected token
//! - [`pagination`]: follows `After-Cursor` headers across list pages
//! - [`fanout`]: joins concurrent sub-requests and names the failed ones
//! - [`services`]: typed resource services (apps, users, roles, ...)
//! - [`diagnostics`]: error messages and not-found handling for provider code
//!
//! # Example
//!
//! ```ignore
//! use onelogin_sdk::{OneLoginClient, services::apps::AppsQuery};
//!
//! let client = OneLoginClient::from_env()?;
//! let apps = client
//!     .apps()
//!     .query(&AppsQuery { name: Some("Slack".into()), ..Default::default() })
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod fanout;
pub mod logging;
pub mod pagination;
pub mod path;
pub mod query;
pub mod request;
pub mod services;
pub mod validation;

pub use client::{DEFAULT_USER_AGENT, OneLoginClient};
pub use config::ClientConfig;
pub use diagnostics::{ErrorCategory, ReadOutcome, format_error, read_or_gone};
pub use error::{ApiError, ErrorKind};
pub use executor::{ApiResponse, Executor};
pub use logging::init_logging;
pub use pagination::{PagedResult, read_all};
pub use request::{AuthMethod, RequestDescriptor, RequestDescriptorBuilder};

pub use onelogin_auth::{AuthError, CredentialStore, SecretString};
