//! Smart hooks, `/api/2/hooks`.
//!
//! The API stores the hook function base64-encoded. Writes encode it unless
//! it already is, reads hand it back as plain source.

use std::collections::BTreeMap;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::encoding::{decode_if_encoded, encode_if_needed};
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::hook_env_vars::EnvVar;
use crate::services::legal_values::RuleCondition;
use crate::services::{destroy, read_list, read_one, write};

pub const TYPE_PRE_AUTHENTICATION: &str = "pre-authentication";
pub const TYPE_USER_MIGRATION: &str = "user-migration";

pub const STATUS_READY: &str = "ready";
pub const STATUS_CREATE_QUEUED: &str = "create-queued";
pub const STATUS_CREATE_RUNNING: &str = "create-running";
pub const STATUS_CREATE_FAILED: &str = "create-failed";
pub const STATUS_UPDATE_QUEUED: &str = "update-queued";
pub const STATUS_UPDATE_RUNNING: &str = "update-running";
pub const STATUS_UPDATE_FAILED: &str = "update-failed";

#[derive(Debug, Clone, Default, Serialize)]
pub struct SmartHookQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub cursor: Option<String>,
    #[serde(rename = "type")]
    pub hook_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartHook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i32>,
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<SmartHookOptions>,
    /// npm package name to version.
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<RuleCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartHookOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_device_info_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_enabled: Option<bool>,
}

/// Wire shape of a write: env vars go out as names only.
#[derive(Serialize)]
struct HookWrite<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    hook_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<i32>,
    env_vars: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    runtime: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retries: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a SmartHookOptions>,
    packages: &'a BTreeMap<String, String>,
    function: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conditions: &'a Vec<RuleCondition>,
}

impl<'a> HookWrite<'a> {
    fn from_hook(hook: &'a SmartHook) -> Result<Self, ApiError> {
        let Some(function) = hook.function.as_deref() else {
            return Err(ApiError::Validation("No Function Definition Given".into()));
        };
        Ok(Self {
            hook_type: hook.hook_type.as_deref(),
            disabled: hook.disabled,
            timeout: hook.timeout,
            env_vars: hook.env_vars.iter().filter_map(|v| v.name.as_deref()).collect(),
            runtime: hook.runtime.as_deref(),
            context_version: hook.context_version.as_deref(),
            retries: hook.retries,
            options: hook.options.as_ref(),
            packages: &hook.packages,
            function: encode_if_needed(function),
            conditions: &hook.conditions,
        })
    }
}

/// `/api/2/hooks`
#[derive(Debug, Clone)]
pub struct SmartHooksService<'a> {
    executor: &'a Executor,
}

impl<'a> SmartHooksService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// Functions in the listing are left as the API returns them.
    ///
    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &SmartHookQuery) -> Result<Vec<SmartHook>, ApiError> {
        read_list(self.executor, api_path!("api", "2", "hooks")?, Some(query), "smart hooks").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, id: &str) -> Result<SmartHook, ApiError> {
        let path = api_path!("api", "2", "hooks", id)?;
        let hook = read_one(self.executor, path, "smart hook").await?;
        Ok(decoded(hook))
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without a function, then request, transport
    /// or decode failures.
    pub async fn create(&self, hook: &SmartHook) -> Result<SmartHook, ApiError> {
        let body = HookWrite::from_hook(hook)?;
        let path = api_path!("api", "2", "hooks")?;
        let created = write(self.executor, Method::POST, path, &body, "smart hook").await?;
        Ok(decoded(created))
    }

    /// The id travels in the path only.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id or a function, then request,
    /// transport or decode failures.
    pub async fn update(&self, hook: &SmartHook) -> Result<SmartHook, ApiError> {
        let Some(id) = hook.id.as_deref() else {
            return Err(ApiError::Validation("No ID Given".into()));
        };
        let body = HookWrite::from_hook(hook)?;
        let path = api_path!("api", "2", "hooks", id)?;
        let updated = write(self.executor, Method::PUT, path, &body, "smart hook").await?;
        Ok(decoded(updated))
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "hooks", id)?).await
    }
}

fn decoded(mut hook: SmartHook) -> SmartHook {
    hook.function = hook.function.as_deref().map(decode_if_encoded);
    hook
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn hook(function: Option<&str>) -> SmartHook {
        SmartHook {
            id: Some("h1".into()),
            hook_type: Some(TYPE_PRE_AUTHENTICATION.into()),
            function: function.map(str::to_owned),
            env_vars: vec![EnvVar {
                id: Some("e1".into()),
                name: Some("API_KEY".into()),
                value: Some("v".into()),
                ..EnvVar::default()
            }],
            packages: BTreeMap::from([("axios".to_owned(), "0.21.1".to_owned())]),
            ..SmartHook::default()
        }
    }

    #[test]
    fn write_encodes_function_and_flattens_env_vars() {
        let source = hook(Some("exports.handler = async () => {}"));
        let body = serde_json::to_value(HookWrite::from_hook(&source).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "type": "pre-authentication",
                "env_vars": ["API_KEY"],
                "packages": { "axios": "0.21.1" },
                "function": "ZXhwb3J0cy5oYW5kbGVyID0gYXN5bmMgKCkgPT4ge30="
            })
        );
    }

    #[test]
    fn write_without_function_is_rejected() {
        let err = HookWrite::from_hook(&hook(None)).err().unwrap();
        assert_eq!(err.to_string(), "No Function Definition Given");
    }

    #[test]
    fn already_encoded_function_is_sent_as_is() {
        let source = hook(Some("ZXhwb3J0cy5oYW5kbGVyID0gYXN5bmMgKCkgPT4ge30="));
        let body = HookWrite::from_hook(&source).unwrap();
        assert_eq!(body.function, "ZXhwb3J0cy5oYW5kbGVyID0gYXN5bmMgKCkgPT4ge30=");
    }
}
