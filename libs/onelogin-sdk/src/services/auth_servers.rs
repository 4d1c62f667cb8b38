use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::claims::ClaimsService;
use crate::services::scopes::ScopesService;
use crate::services::{IdResponse, destroy, read_list, read_one, required, write, write_unit};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthServerQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub cursor: Option<String>,
    pub name: Option<String>,
}

/// API authorization server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthServer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<AuthServerConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthServerConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_expiration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_expiration_minutes: Option<i32>,
}

/// `/api/2/api_authorizations`
#[derive(Debug, Clone)]
pub struct AuthServersService<'a> {
    executor: &'a Executor,
}

impl<'a> AuthServersService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// Scopes of the server's APIs.
    #[must_use]
    pub fn scopes(&self) -> ScopesService<'a> {
        ScopesService::new(self.executor)
    }

    /// Claims added to the server's access tokens.
    #[must_use]
    pub fn claims(&self) -> ClaimsService<'a> {
        ClaimsService::new(self.executor)
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &AuthServerQuery) -> Result<Vec<AuthServer>, ApiError> {
        let path = api_path!("api", "2", "api_authorizations")?;
        read_list(self.executor, path, Some(query), "auth servers").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, id: i32) -> Result<AuthServer, ApiError> {
        let path = api_path!("api", "2", "api_authorizations", id)?;
        read_one(self.executor, path, "auth server").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn create(&self, server: &AuthServer) -> Result<AuthServer, ApiError> {
        let path = api_path!("api", "2", "api_authorizations")?;
        let answer: IdResponse =
            write(self.executor, Method::POST, path, server, "auth server id").await?;
        Ok(AuthServer {
            id: Some(answer.id),
            ..server.clone()
        })
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id, then request or transport
    /// failures.
    pub async fn update(&self, server: &AuthServer) -> Result<AuthServer, ApiError> {
        let id = required("auth server id", server.id)?;
        let path = api_path!("api", "2", "api_authorizations", id)?;
        write_unit(self.executor, Method::PUT, path, server).await?;
        Ok(server.clone())
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: i32) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "api_authorizations", id)?).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn configuration_round_trips_api_shape() {
        let json = r#"{"id":3,"name":"api","configuration":{
            "resource_identifier":"https://api.example.com","audiences":["a","b"],
            "access_token_expiration_minutes":10}}"#;
        let server: AuthServer = serde_json::from_str(json).unwrap();
        let config = server.configuration.as_ref().unwrap();
        assert_eq!(config.audiences, vec!["a", "b"]);
        assert_eq!(config.refresh_token_expiration_minutes, None);
        let body = serde_json::to_value(&server).unwrap();
        assert!(body["configuration"].get("refresh_token_expiration_minutes").is_none());
    }
}
