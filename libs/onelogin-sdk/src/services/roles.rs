use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::{PageQuery, destroy, read_list, read_one, required, write_merged};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admins: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct RolesService<'a> {
    executor: &'a Executor,
}

impl<'a> RolesService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &PageQuery) -> Result<Vec<Role>, ApiError> {
        read_list(self.executor, api_path!("api", "2", "roles")?, Some(query), "roles").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, id: i32) -> Result<Role, ApiError> {
        read_one(self.executor, api_path!("api", "2", "roles", id)?, "role").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn create(&self, role: &Role) -> Result<Role, ApiError> {
        let path = api_path!("api", "2", "roles")?;
        write_merged(self.executor, Method::POST, path, role, "role").await
    }

    /// The id travels in the path only.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id, then request, transport or
    /// decode failures.
    pub async fn update(&self, role: &Role) -> Result<Role, ApiError> {
        let id = required("role id", role.id)?;
        let body = Role {
            id: None,
            ..role.clone()
        };
        let path = api_path!("api", "2", "roles", id)?;
        let mut updated: Role =
            write_merged(self.executor, Method::PUT, path, &body, "role").await?;
        updated.id.get_or_insert(id);
        Ok(updated)
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: i32) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "roles", id)?).await
    }
}
