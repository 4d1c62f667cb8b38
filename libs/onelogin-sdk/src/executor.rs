use std::sync::Arc;

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::{HeaderMap, StatusCode};
use onelogin_auth::{CredentialStore, SecretString};
use onelogin_http::HttpClient;
use url::Url;
use zeroize::Zeroizing;

use crate::error::ApiError;
use crate::request::{AuthMethod, RequestDescriptor};

const REQUEST_CONTEXT: &str = "API request";

/// Successful response: status, headers and the raw body.
///
/// 204 responses carry an empty body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    /// Header value as a string, `None` if absent or not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends request descriptors and classifies the responses.
///
/// A bearer request answered with 401 or 403 is sent once more with a
/// refreshed token; a second rejection is final.
#[derive(Clone)]
pub struct Executor {
    http: HttpClient,
    store: Arc<CredentialStore>,
    base_url: Url,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("base_url", &self.base_url.as_str())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Executor {
    #[must_use]
    pub fn new(http: HttpClient, store: Arc<CredentialStore>, base_url: Url) -> Self {
        Self {
            http,
            store,
            base_url,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Send `request` and classify the answer.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Construction`] for an unusable URL or header
    /// - [`ApiError::Auth`] when no token can be minted
    /// - [`ApiError::Transport`] for network failures, never retried
    /// - [`ApiError::Unauthorized`] for 401/403 after the single retry, or
    ///   immediately for non-bearer requests
    /// - [`ApiError::Client`] for other 4xx, with the body text
    /// - [`ApiError::Server`] for 5xx
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let url = request.url(&self.base_url)?;
        let mut token = match request.auth() {
            AuthMethod::Bearer => Some(self.store.token().await?),
            AuthMethod::Basic | AuthMethod::None => None,
        };
        let mut retried = false;

        loop {
            let (status, headers, body) = self.send_once(request, &url, token.as_ref()).await?;
            tracing::debug!(
                method = %request.method(),
                path = request.path(),
                status = %status,
                "API response"
            );

            if status == StatusCode::NO_CONTENT {
                return Ok(ApiResponse {
                    status,
                    headers,
                    body: Bytes::new(),
                });
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                match token.as_ref() {
                    Some(stale) if !retried => {
                        tracing::warn!(
                            status = %status,
                            path = request.path(),
                            "token rejected, refreshing"
                        );
                        token = Some(self.store.refresh(stale).await?);
                        retried = true;
                        continue;
                    }
                    _ => return Err(ApiError::Unauthorized { status }),
                }
            }

            if status.is_client_error() {
                return Err(ApiError::Client {
                    status,
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }

            if status.is_server_error() {
                tracing::warn!(status = %status, path = request.path(), "API server error");
                return Err(ApiError::Server { status });
            }

            return Ok(ApiResponse {
                status,
                headers,
                body,
            });
        }
    }

    async fn send_once(
        &self,
        request: &RequestDescriptor,
        url: &Url,
        token: Option<&SecretString>,
    ) -> Result<(StatusCode, HeaderMap, Bytes), ApiError> {
        tracing::debug!(method = %request.method(), path = request.path(), "sending API request");

        let mut builder = self
            .http
            .request(request.method().clone(), url.as_str())
            .header(http::header::CONTENT_TYPE.as_str(), "application/json");

        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        match request.auth() {
            AuthMethod::Bearer => {
                if let Some(token) = token {
                    let value = Zeroizing::new(format!("Bearer {}", token.expose()));
                    builder = builder.sensitive_header(AUTHORIZATION.as_str(), &value);
                }
            }
            AuthMethod::Basic => {
                let value = self.store.basic_authorization();
                builder = builder.sensitive_header(AUTHORIZATION.as_str(), &value);
            }
            AuthMethod::None => {}
        }

        if let Some(body) = request.body() {
            builder = builder.body_bytes(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_http(&e, REQUEST_CONTEXT))?;
        response
            .into_parts()
            .await
            .map_err(|e| ApiError::from_http(&e, REQUEST_CONTEXT))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use onelogin_auth::CredentialsConfig;
    use onelogin_http::{HttpClientBuilder, HttpClientConfig};

    fn executor_for(server: &MockServer) -> Executor {
        let base_url = Url::parse(&server.base_url()).unwrap();
        let store = CredentialStore::new(&CredentialsConfig {
            base_url: base_url.clone(),
            client_id: "abc".into(),
            client_secret: SecretString::new("def"),
            http_config: Some(HttpClientConfig::for_testing()),
        })
        .unwrap();
        let http = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap();
        Executor::new(http, Arc::new(store), base_url)
    }

    fn mock_token<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
        let body = format!(r#"{{"access_token":"{token}"}}"#);
        server.mock(|when, then| {
            when.method(POST).path("/auth/oauth2/v2/token");
            then.status(200).body(body);
        })
    }

    fn get(path: &str) -> RequestDescriptor {
        RequestDescriptor::get(path).build().unwrap()
    }

    #[tokio::test]
    async fn success_returns_raw_body() {
        let server = MockServer::start();
        let token = mock_token(&server, "tok123");
        let api = server.mock(|when, then| {
            when.method(GET)
                .path("/api/2/apps")
                .header("authorization", "Bearer tok123")
                .header("content-type", "application/json");
            then.status(200).body(r#"[{"id":1}]"#);
        });

        let resp = executor_for(&server).execute(&get("/api/2/apps")).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body.as_ref(), br#"[{"id":1}]"#);
        token.assert_calls(1);
        api.assert_calls(1);
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let server = MockServer::start();
        mock_token(&server, "tok123");
        server.mock(|when, then| {
            when.method(DELETE).path("/api/2/roles/7");
            then.status(204).body("ignored");
        });

        let req = RequestDescriptor::delete("/api/2/roles/7").build().unwrap();
        let resp = executor_for(&server).execute(&req).await.unwrap();
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
        assert!(resp.body.is_empty());
    }

    #[tokio::test]
    async fn client_error_keeps_body() {
        let server = MockServer::start();
        mock_token(&server, "tok123");
        server.mock(|when, then| {
            when.method(GET).path("/api/2/apps/9");
            then.status(404).body(r#"{"message":"Not Found"}"#);
        });

        let err = executor_for(&server)
            .execute(&get("/api/2/apps/9"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, ApiError::Client { body, .. } if body.contains("Not Found")));
    }

    #[tokio::test]
    async fn server_error_drops_body() {
        let server = MockServer::start();
        mock_token(&server, "tok123");
        server.mock(|when, then| {
            when.method(GET).path("/api/2/apps");
            then.status(502).body("upstream stack trace");
        });

        let err = executor_for(&server)
            .execute(&get("/api/2/apps"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status } if status == StatusCode::BAD_GATEWAY));
        assert!(!err.to_string().contains("stack trace"));
    }

    #[tokio::test]
    async fn non_bearer_unauthorized_is_not_retried() {
        let server = MockServer::start();
        let token = mock_token(&server, "tok123");
        let api = server.mock(|when, then| {
            when.method(GET).path("/api/2/apps");
            then.status(401);
        });

        let req = RequestDescriptor::get("/api/2/apps")
            .auth(AuthMethod::None)
            .build()
            .unwrap();
        let err = executor_for(&server).execute(&req).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
        api.assert_calls(1);
        token.assert_calls(0);
    }

    #[tokio::test]
    async fn basic_auth_uses_client_credentials() {
        let server = MockServer::start();
        let api = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/oauth2/revoke")
                .header("authorization", "Basic YWJjOmRlZg==");
            then.status(200);
        });

        let req = RequestDescriptor::post("/auth/oauth2/revoke")
            .auth(AuthMethod::Basic)
            .json(&serde_json::json!({ "access_token": "x" }))
            .build()
            .unwrap();
        executor_for(&server).execute(&req).await.unwrap();
        api.assert_calls(1);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let base_url = Url::parse("http://127.0.0.1:1").unwrap();
        let store = CredentialStore::new(&CredentialsConfig {
            base_url: base_url.clone(),
            client_id: "abc".into(),
            client_secret: SecretString::new("def"),
            http_config: Some(HttpClientConfig::for_testing()),
        })
        .unwrap();
        let http = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap();
        let executor = Executor::new(http, Arc::new(store), base_url);

        let req = RequestDescriptor::get("/api/2/apps")
            .auth(AuthMethod::None)
            .build()
            .unwrap();
        let err = executor.execute(&req).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    }
}
