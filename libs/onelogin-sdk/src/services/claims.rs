use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::{IdResponse, destroy, read_list, required, write, write_unit};

/// Custom claim added to access tokens minted by an auth server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_server_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_attribute_mappings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_attribute_macros: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_transformations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if_blank: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_values: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_entitlements: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ClaimsService<'a> {
    executor: &'a Executor,
}

impl<'a> ClaimsService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, auth_server_id: i32) -> Result<Vec<AccessTokenClaim>, ApiError> {
        let path = api_path!("api", "2", "api_authorizations", auth_server_id, "claims")?;
        read_list::<_, ()>(self.executor, path, None, "access token claims").await
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without an auth server id, then request,
    /// transport or decode failures.
    pub async fn create(&self, claim: &AccessTokenClaim) -> Result<AccessTokenClaim, ApiError> {
        let server = required("auth_server_id", claim.auth_server_id)?;
        let path = api_path!("api", "2", "api_authorizations", server, "claims")?;
        let answer: IdResponse = write(self.executor, Method::POST, path, claim, "claim id").await?;
        Ok(AccessTokenClaim {
            id: Some(answer.id),
            ..claim.clone()
        })
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without both ids, then request or transport
    /// failures.
    pub async fn update(&self, claim: &AccessTokenClaim) -> Result<AccessTokenClaim, ApiError> {
        let id = required("id", claim.id)?;
        let server = required("auth_server_id", claim.auth_server_id)?;
        let path = api_path!("api", "2", "api_authorizations", server, "claims", id)?;
        write_unit(self.executor, Method::PUT, path, claim).await?;
        Ok(claim.clone())
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, auth_server_id: i32, id: i32) -> Result<(), ApiError> {
        let path = api_path!("api", "2", "api_authorizations", auth_server_id, "claims", id)?;
        destroy(self.executor, path).await
    }
}
