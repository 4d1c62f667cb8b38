use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::{IdResponse, destroy, read_list, required, write, write_unit};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_server_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `/api/2/api_authorizations/{auth_server_id}/scopes`
#[derive(Debug, Clone)]
pub struct ScopesService<'a> {
    executor: &'a Executor,
}

impl<'a> ScopesService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, auth_server_id: i32) -> Result<Vec<Scope>, ApiError> {
        let path = api_path!("api", "2", "api_authorizations", auth_server_id, "scopes")?;
        read_list::<_, ()>(self.executor, path, None, "scopes").await
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without an auth server id, then request,
    /// transport or decode failures.
    pub async fn create(&self, scope: &Scope) -> Result<Scope, ApiError> {
        let server = required("auth_server_id", scope.auth_server_id)?;
        let path = api_path!("api", "2", "api_authorizations", server, "scopes")?;
        let answer: IdResponse = write(self.executor, Method::POST, path, scope, "scope id").await?;
        Ok(Scope {
            id: Some(answer.id),
            ..scope.clone()
        })
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without both ids, then request or transport
    /// failures.
    pub async fn update(&self, scope: &Scope) -> Result<Scope, ApiError> {
        let id = required("id", scope.id)?;
        let server = required("auth_server_id", scope.auth_server_id)?;
        let path = api_path!("api", "2", "api_authorizations", server, "scopes", id)?;
        write_unit(self.executor, Method::PUT, path, scope).await?;
        Ok(scope.clone())
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, auth_server_id: i32, id: i32) -> Result<(), ApiError> {
        let path = api_path!("api", "2", "api_authorizations", auth_server_id, "scopes", id)?;
        destroy(self.executor, path).await
    }
}
