use std::fmt;
use url::Url;

use crate::error::AuthError;
use crate::secret::SecretString;

/// Path of the client-credentials token endpoint, relative to the base URL.
pub const TOKEN_PATH: &str = "/auth/oauth2/v2/token";

/// Path of the token revocation endpoint, relative to the base URL.
pub const REVOKE_PATH: &str = "/auth/oauth2/revoke";

/// Inputs the [`CredentialStore`](crate::CredentialStore) derives tokens from.
///
/// `Debug` redacts `client_secret`.
#[derive(Clone)]
pub struct CredentialsConfig {
    /// `https://{subdomain}.onelogin.com` unless overridden.
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    /// When `None`,
    /// [`HttpClientConfig::token_endpoint()`](onelogin_http::HttpClientConfig::token_endpoint)
    /// is used.
    pub http_config: Option<onelogin_http::HttpClientConfig>,
}

impl CredentialsConfig {
    /// Build a config for `https://{subdomain}.onelogin.com`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the subdomain does not form a valid host.
    pub fn for_subdomain(
        subdomain: &str,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Result<Self, AuthError> {
        let base_url = subdomain_url(subdomain)?;
        Ok(Self {
            base_url,
            client_id: client_id.into(),
            client_secret,
            http_config: None,
        })
    }

    /// Check that credentials are present and the base URL can carry paths.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] naming the first missing input.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Config("client_id must not be empty".into()));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::Config("client_secret must not be empty".into()));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(AuthError::Config(format!(
                "base URL '{}' cannot carry a path",
                self.base_url
            )));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the joined URL is invalid.
    pub fn token_url(&self) -> Result<Url, AuthError> {
        join(&self.base_url, TOKEN_PATH)
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the joined URL is invalid.
    pub fn revoke_url(&self) -> Result<Url, AuthError> {
        join(&self.base_url, REVOKE_PATH)
    }
}

/// `https://{subdomain}.onelogin.com`
///
/// # Errors
///
/// Returns [`AuthError::Config`] for an empty subdomain or one that is not a
/// valid host label.
pub fn subdomain_url(subdomain: &str) -> Result<Url, AuthError> {
    let subdomain = subdomain.trim();
    if subdomain.is_empty() {
        return Err(AuthError::Config("subdomain must not be empty".into()));
    }
    if subdomain.contains(['/', ':', '@', '?', '#']) {
        return Err(AuthError::Config(format!("invalid subdomain '{subdomain}'")));
    }
    Url::parse(&format!("https://{subdomain}.onelogin.com"))
        .map_err(|e| AuthError::Config(format!("invalid subdomain '{subdomain}': {e}")))
}

fn join(base: &Url, path: &str) -> Result<Url, AuthError> {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{path}"));
    if url.cannot_be_a_base() {
        return Err(AuthError::Config(format!("cannot join '{path}' onto '{base}'")));
    }
    Ok(url)
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("http_config", &self.http_config)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn config() -> CredentialsConfig {
        CredentialsConfig::for_subdomain("acme", "abc", SecretString::new("def")).unwrap()
    }

    #[test]
    fn subdomain_expands_to_onelogin_host() {
        assert_eq!(config().base_url.as_str(), "https://acme.onelogin.com/");
    }

    #[test]
    fn endpoint_urls() {
        let cfg = config();
        assert_eq!(
            cfg.token_url().unwrap().as_str(),
            "https://acme.onelogin.com/auth/oauth2/v2/token"
        );
        assert_eq!(
            cfg.revoke_url().unwrap().as_str(),
            "https://acme.onelogin.com/auth/oauth2/revoke"
        );
    }

    #[test]
    fn base_url_with_path_prefix_is_kept() {
        let mut cfg = config();
        cfg.base_url = Url::parse("http://127.0.0.1:9000/mock/").unwrap();
        assert_eq!(
            cfg.token_url().unwrap().as_str(),
            "http://127.0.0.1:9000/mock/auth/oauth2/v2/token"
        );
    }

    #[test]
    fn invalid_subdomains_are_rejected() {
        assert!(subdomain_url("").is_err());
        assert!(subdomain_url("evil.com/x").is_err());
        assert!(subdomain_url("user@host").is_err());
    }

    #[test]
    fn validate_requires_credentials() {
        let mut cfg = config();
        assert!(cfg.validate().is_ok());

        cfg.client_id = "  ".into();
        assert!(matches!(cfg.validate(), Err(AuthError::Config(m)) if m.contains("client_id")));

        let mut cfg = config();
        cfg.client_secret = SecretString::new("");
        assert!(
            matches!(cfg.validate(), Err(AuthError::Config(m)) if m.contains("client_secret"))
        );
    }

    #[test]
    fn clone_keeps_every_field() {
        let cfg = config();
        let copy = cfg.clone();
        assert_eq!(copy.base_url, cfg.base_url);
        assert_eq!(copy.client_id, "abc");
        assert_eq!(copy.client_secret.expose(), "def");
        assert!(copy.http_config.is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let dbg = format!("{:?}", config());
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("def\""));
    }
}
