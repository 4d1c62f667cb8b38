use std::sync::Arc;

use onelogin_auth::CredentialStore;
use onelogin_http::{HttpClientBuilder, HttpClientConfig};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::executor::{ApiResponse, Executor};
use crate::pagination::{PagedResult, read_all};
use crate::request::RequestDescriptor;
use crate::services::app_rules::AppRulesService;
use crate::services::apps::AppsService;
use crate::services::auth_servers::AuthServersService;
use crate::services::hook_env_vars::HookEnvVarsService;
use crate::services::legal_values::LegalValuesService;
use crate::services::privileges::PrivilegesService;
use crate::services::roles::RolesService;
use crate::services::smart_hooks::SmartHooksService;
use crate::services::user_mappings::UserMappingsService;
use crate::services::users::UsersService;

/// `User-Agent` sent when [`ClientConfig::user_agent`] is unset.
pub const DEFAULT_USER_AGENT: &str = concat!("onelogin-sdk/", env!("CARGO_PKG_VERSION"));

const CLIENT_CONTEXT: &str = "HTTP client";

/// Entry point: one credential store and one connection pool shared by
/// every service.
///
/// Cloning is cheap and clones share the token.
#[derive(Debug, Clone)]
pub struct OneLoginClient {
    executor: Executor,
}

impl OneLoginClient {
    /// # Errors
    ///
    /// [`ApiError::Auth`] for missing or invalid settings,
    /// [`ApiError::Construction`] or [`ApiError::Transport`] when the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_http_config(config, HttpClientConfig::default())
    }

    /// Like [`Self::new`] with explicit transport settings. The timeout and
    /// user agent from `config` take precedence.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_http_config(
        config: &ClientConfig,
        mut http: HttpClientConfig,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        let base_url = config.base_url()?;

        http.request_timeout = config.timeout;
        http.user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

        let token_http = HttpClientConfig {
            request_timeout: http.request_timeout,
            user_agent: http.user_agent.clone(),
            transport: http.transport,
            tls_roots: http.tls_roots,
            ..HttpClientConfig::token_endpoint()
        };
        let mut credentials = config.credentials(base_url.clone());
        credentials.http_config = Some(token_http);
        let store = Arc::new(CredentialStore::new(&credentials)?);

        let client = HttpClientBuilder::with_config(http)
            .build()
            .map_err(|e| ApiError::from_http(&e, CLIENT_CONTEXT))?;

        tracing::debug!(base_url = %base_url, timeout = ?config.timeout, "OneLogin client ready");
        Ok(Self {
            executor: Executor::new(client, store, base_url),
        })
    }

    /// Client configured from `ONELOGIN_*` environment variables.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`] and [`Self::new`].
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&ClientConfig::from_env()?)
    }

    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.executor.credentials()
    }

    /// Send one request. See [`Executor::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`Executor::execute`].
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        self.executor.execute(request).await
    }

    /// Send a list request and follow its cursors. See [`read_all`].
    ///
    /// # Errors
    ///
    /// Same as [`Executor::execute`].
    pub async fn read_all(&self, request: &RequestDescriptor) -> Result<PagedResult, ApiError> {
        read_all(&self.executor, request).await
    }

    /// Revoke the held access token, if any.
    ///
    /// # Errors
    ///
    /// [`ApiError::Auth`] when the revocation request fails.
    pub async fn revoke_token(&self) -> Result<(), ApiError> {
        let store = self.credentials();
        if let Some(token) = store.get() {
            store.revoke(&token).await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn apps(&self) -> AppsService<'_> {
        AppsService::new(&self.executor)
    }

    #[must_use]
    pub fn app_rules(&self) -> AppRulesService<'_> {
        AppRulesService::new(&self.executor)
    }

    #[must_use]
    pub fn legal_values(&self) -> LegalValuesService<'_> {
        LegalValuesService::new(&self.executor)
    }

    #[must_use]
    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(&self.executor)
    }

    #[must_use]
    pub fn roles(&self) -> RolesService<'_> {
        RolesService::new(&self.executor)
    }

    #[must_use]
    pub fn privileges(&self) -> PrivilegesService<'_> {
        PrivilegesService::new(&self.executor)
    }

    #[must_use]
    pub fn smart_hooks(&self) -> SmartHooksService<'_> {
        SmartHooksService::new(&self.executor)
    }

    #[must_use]
    pub fn hook_env_vars(&self) -> HookEnvVarsService<'_> {
        HookEnvVarsService::new(&self.executor)
    }

    #[must_use]
    pub fn user_mappings(&self) -> UserMappingsService<'_> {
        UserMappingsService::new(&self.executor)
    }

    #[must_use]
    pub fn auth_servers(&self) -> AuthServersService<'_> {
        AuthServersService::new(&self.executor)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use onelogin_auth::SecretString;

    #[test]
    fn missing_credentials_are_an_auth_error() {
        let config = ClientConfig {
            subdomain: "acme".into(),
            ..ClientConfig::default()
        };
        let err = OneLoginClient::new(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(err.to_string().contains("client_id is required"));
    }

    #[tokio::test]
    async fn base_url_follows_subdomain() {
        let config = ClientConfig {
            subdomain: "acme".into(),
            client_id: "abc".into(),
            client_secret: SecretString::new("def"),
            ..ClientConfig::default()
        };
        let client = OneLoginClient::new(&config).unwrap();
        assert_eq!(client.executor().base_url().as_str(), "https://acme.onelogin.com/");
        assert!(client.credentials().get().is_none());
    }

    #[test]
    fn default_user_agent_names_the_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("onelogin-sdk/"));
    }
}
