#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Client-credentials authentication for the OneLogin API.
//!
//! [`CredentialStore`] owns the bearer token of one API client: it mints
//! tokens from the client id and secret, serves the held token without
//! network access, and revokes or invalidates it on request.

pub mod config;
pub mod error;
pub mod http_error;
pub mod secret;
pub mod store;
mod types;

pub use config::{CredentialsConfig, REVOKE_PATH, TOKEN_PATH, subdomain_url};
pub use error::AuthError;
pub use http_error::format_http_error;
pub use secret::SecretString;
pub use store::CredentialStore;
