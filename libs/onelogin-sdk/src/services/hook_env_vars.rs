use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::{PageQuery, destroy, read_list, read_one, write};
use crate::validation::require;

/// Environment variable shared by smart hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Serialize)]
struct ValueUpdate<'a> {
    value: &'a str,
}

/// `/api/2/hooks/envs`
#[derive(Debug, Clone)]
pub struct HookEnvVarsService<'a> {
    executor: &'a Executor,
}

impl<'a> HookEnvVarsService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &PageQuery) -> Result<Vec<EnvVar>, ApiError> {
        let path = api_path!("api", "2", "hooks", "envs")?;
        read_list(self.executor, path, Some(query), "hook env vars").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, id: &str) -> Result<EnvVar, ApiError> {
        let path = api_path!("api", "2", "hooks", "envs", id)?;
        read_one(self.executor, path, "hook env var").await
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without a name and value, then request,
    /// transport or decode failures.
    pub async fn create(&self, env_var: &EnvVar) -> Result<EnvVar, ApiError> {
        require("name", env_var.name.as_deref())?;
        require("value", env_var.value.as_deref())?;
        let path = api_path!("api", "2", "hooks", "envs")?;
        write(self.executor, Method::POST, path, env_var, "hook env var").await
    }

    /// Change the value of a variable. Only the value is sent; a variable
    /// given by name alone is looked up first.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] when the variable cannot be identified or
    /// carries no value.
    pub async fn update(&self, env_var: &EnvVar) -> Result<EnvVar, ApiError> {
        let id = match (&env_var.id, &env_var.name) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(name)) => self.find_id(name).await?,
            (None, None) => None,
        };
        let Some(id) = id else {
            return Err(ApiError::Validation("no ID or Name given".into()));
        };
        let Some(value) = env_var.value.as_deref() else {
            return Err(ApiError::Validation("value is required".into()));
        };

        let path = api_path!("api", "2", "hooks", "envs", &id)?;
        write(self.executor, Method::PUT, path, &ValueUpdate { value }, "hook env var").await
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "hooks", "envs", id)?).await
    }

    async fn find_id(&self, name: &str) -> Result<Option<String>, ApiError> {
        let all = self.query(&PageQuery::default()).await.map_err(|e| {
            tracing::warn!(name, error = %e, "unable to list hook env vars");
            ApiError::Validation("unable to find by ID or Name".into())
        })?;
        let found = all
            .into_iter()
            .find(|v| v.name.as_deref() == Some(name))
            .and_then(|v| v.id);
        tracing::debug!(name, found = found.is_some(), "resolved hook env var by name");
        Ok(found)
    }
}
