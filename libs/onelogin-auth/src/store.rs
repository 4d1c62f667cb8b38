use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use base64::{Engine as _, engine::general_purpose};
use http::StatusCode;
use http::header::AUTHORIZATION;
use tokio::sync::{Mutex, MutexGuard};
use url::Url;
use zeroize::Zeroizing;

use crate::config::CredentialsConfig;
use crate::error::AuthError;
use crate::http_error::format_http_error;
use crate::secret::SecretString;
use crate::types::{RevokeRequest, TokenRequest, TokenResponse};

const TOKEN_CONTEXT: &str = "token request";
const REVOKE_CONTEXT: &str = "token revocation";

/// Holder of the bearer token for one API client.
///
/// Reads are lock-free. Network mints are serialized behind one async mutex,
/// and [`token`](Self::token) and [`refresh`](Self::refresh) re-check the held
/// token after acquiring it, so a burst of callers produces a single mint.
///
/// No expiry is tracked; callers learn about stale tokens from 401/403
/// responses and call [`refresh`](Self::refresh).
pub struct CredentialStore {
    client: onelogin_http::HttpClient,
    token_url: Url,
    revoke_url: Url,
    client_id: String,
    client_secret: SecretString,
    current: ArcSwapOption<SecretString>,
    mint_lock: Mutex<()>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create an empty store. No network activity happens until the first mint.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] for missing credentials or an unusable base
    /// URL, and [`AuthError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &CredentialsConfig) -> Result<Self, AuthError> {
        config.validate()?;

        let http_config = config
            .http_config
            .clone()
            .unwrap_or_else(onelogin_http::HttpClientConfig::token_endpoint);
        let client = onelogin_http::HttpClientBuilder::with_config(http_config)
            .build()
            .map_err(|e| AuthError::Http(format_http_error(&e, TOKEN_CONTEXT)))?;

        Ok(Self {
            client,
            token_url: config.token_url()?,
            revoke_url: config.revoke_url()?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            current: ArcSwapOption::empty(),
            mint_lock: Mutex::new(()),
        })
    }

    /// The held token, without network activity. `None` means not yet minted.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.current.load().as_deref().cloned()
    }

    /// Exchange the client credentials for a new token and store it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Http`] on transport failure; the previous token is kept.
    /// - [`AuthError::Rejected`] on a non-200 status; the store is emptied.
    /// - [`AuthError::InvalidResponse`] when the body has no `access_token`;
    ///   the store is emptied.
    pub async fn mint(&self) -> Result<SecretString, AuthError> {
        let guard = self.mint_lock.lock().await;
        self.mint_locked(&guard).await
    }

    /// The held token, minting one first when the store is empty.
    ///
    /// # Errors
    ///
    /// Same as [`mint`](Self::mint).
    pub async fn token(&self) -> Result<SecretString, AuthError> {
        if let Some(token) = self.get() {
            return Ok(token);
        }

        let guard = self.mint_lock.lock().await;
        if let Some(token) = self.get() {
            tracing::debug!("reusing token minted while waiting");
            return Ok(token);
        }
        self.mint_locked(&guard).await
    }

    /// Replace a token the server rejected.
    ///
    /// When another caller already swapped `stale` for a newer token, that
    /// token is returned without minting.
    ///
    /// # Errors
    ///
    /// Same as [`mint`](Self::mint).
    pub async fn refresh(&self, stale: &SecretString) -> Result<SecretString, AuthError> {
        let guard = self.mint_lock.lock().await;
        if let Some(token) = self.get()
            && token != *stale
        {
            tracing::debug!("token already refreshed by another caller");
            return Ok(token);
        }
        self.mint_locked(&guard).await
    }

    /// Drop the held token locally.
    pub fn invalidate(&self) {
        self.current.store(None);
    }

    /// Revoke `token` at the server.
    ///
    /// If `token` is the one held by this store, the store is emptied as well.
    ///
    /// # Errors
    ///
    /// [`AuthError::Http`] on transport failure, [`AuthError::Rejected`] on a
    /// non-200 status.
    pub async fn revoke(&self, token: &SecretString) -> Result<(), AuthError> {
        let authorization = self.basic_authorization();
        let response = self
            .client
            .post(self.revoke_url.as_str())
            .sensitive_header(AUTHORIZATION.as_str(), &authorization)
            .json(&RevokeRequest {
                access_token: token.expose(),
            })
            .map_err(|e| AuthError::Http(format_http_error(&e, REVOKE_CONTEXT)))?
            .send()
            .await
            .map_err(|e| AuthError::Http(format_http_error(&e, REVOKE_CONTEXT)))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(status = %status, "token revocation rejected");
            return Err(AuthError::Rejected {
                operation: REVOKE_CONTEXT,
                status,
            });
        }

        let _guard = self.mint_lock.lock().await;
        if self.get().is_some_and(|held| held == *token) {
            self.current.store(None);
        }
        tracing::info!("access token revoked");
        Ok(())
    }

    async fn mint_locked(&self, _guard: &MutexGuard<'_, ()>) -> Result<SecretString, AuthError> {
        tracing::debug!(url = %self.token_url, "requesting access token");

        let authorization = self.basic_authorization();
        let response = self
            .client
            .post(self.token_url.as_str())
            .sensitive_header(AUTHORIZATION.as_str(), &authorization)
            .json(&TokenRequest::CLIENT_CREDENTIALS)
            .map_err(|e| AuthError::Http(format_http_error(&e, TOKEN_CONTEXT)))?
            .send()
            .await
            .map_err(|e| {
                let msg = format_http_error(&e, TOKEN_CONTEXT);
                tracing::warn!(error = %msg, "token request did not complete");
                AuthError::Http(msg)
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Http(format_http_error(&e, TOKEN_CONTEXT)))?;

        if status != StatusCode::OK {
            self.current.store(None);
            tracing::warn!(status = %status, "token request rejected");
            return Err(AuthError::Rejected {
                operation: TOKEN_CONTEXT,
                status,
            });
        }

        let parsed: TokenResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.current.store(None);
                return Err(AuthError::InvalidResponse(e.to_string()));
            }
        };

        match parsed.access_token {
            Some(raw) if !raw.is_empty() => {
                let token = SecretString::new(raw);
                self.current.store(Some(Arc::new(token.clone())));
                tracing::info!("access token minted");
                Ok(token)
            }
            _ => {
                self.current.store(None);
                Err(AuthError::InvalidResponse("missing access_token".into()))
            }
        }
    }

    /// `Basic base64(client_id:client_secret)`, zeroed on drop. Never log it.
    #[must_use]
    pub fn basic_authorization(&self) -> Zeroizing<String> {
        let credentials = Zeroizing::new(format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose()
        ));
        let encoded = Zeroizing::new(general_purpose::STANDARD.encode(credentials.as_bytes()));
        Zeroizing::new(format!("Basic {}", &*encoded))
    }
}
