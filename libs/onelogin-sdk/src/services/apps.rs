use std::collections::{BTreeMap, HashSet};

use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::{ApiError, stack_errors};
use crate::executor::Executor;
use crate::services::{destroy, read_list, read_one, required, write};

/// Filters for `GET /api/2/apps`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppsQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub cursor: Option<String>,
    pub name: Option<String>,
    pub connector_id: Option<i32>,
    pub auth_method: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_assumed_signin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning: Option<AppProvisioning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso: Option<AppSso>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<AppConfiguration>,
    /// Keyed by `param_key_name`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, AppParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProvisioning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSso {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acs_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sls_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<AppSsoCertificate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSsoCertificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Connector-specific settings. OIDC and SAML apps use different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_expiration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_application_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_expiration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idp_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_logout_redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    #[serde(rename = "relaystate", skip_serializing_if = "Option::is_none")]
    pub relay_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<String>,
    #[serde(rename = "saml_notonorafter", skip_serializing_if = "Option::is_none")]
    pub saml_not_on_or_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_attribute_value_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_initiater_id: Option<String>,
    #[serde(rename = "saml_notbefore", skip_serializing_if = "Option::is_none")]
    pub saml_not_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_issuer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_sign_element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypt_assertion: Option<String>,
    #[serde(
        rename = "saml_sessionnotonorafter",
        skip_serializing_if = "Option::is_none"
    )]
    pub saml_session_not_on_or_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_encryption_method_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_nameid_format_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_attribute_mappings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_attribute_macros: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_transformations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if_blank: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_values: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_entitlements: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_entitlements_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_in_saml_assertion: Option<bool>,
}

/// Entry of `GET /api/2/apps/{id}/users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppUser {
    pub id: Option<i32>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// `/api/2/apps`
#[derive(Debug, Clone)]
pub struct AppsService<'a> {
    executor: &'a Executor,
}

impl<'a> AppsService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &AppsQuery) -> Result<Vec<App>, ApiError> {
        read_list(self.executor, api_path!("api", "2", "apps")?, Some(query), "apps").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures; a missing app is a 404
    /// [`ApiError::Client`].
    pub async fn get(&self, id: i32) -> Result<App, ApiError> {
        read_one(self.executor, api_path!("api", "2", "apps", id)?, "app").await
    }

    /// Users assigned to the app.
    ///
    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn users(&self, id: i32) -> Result<Vec<AppUser>, ApiError> {
        read_list::<_, ()>(
            self.executor,
            api_path!("api", "2", "apps", id, "users")?,
            None,
            "app users",
        )
        .await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn create(&self, app: &App) -> Result<App, ApiError> {
        write(self.executor, Method::POST, api_path!("api", "2", "apps")?, app, "app").await
    }

    /// Update the app, delete the parameters `app` no longer lists, then
    /// return the app as re-read from the API.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id. When parameter deletion fails
    /// the error lists every failed deletion.
    pub async fn update(&self, app: &App) -> Result<App, ApiError> {
        let id = required("app id", app.id)?;
        let updated: App = write(
            self.executor,
            Method::PUT,
            api_path!("api", "2", "apps", id)?,
            app,
            "app",
        )
        .await?;

        if let Some(err) = self.prune_parameters(id, &app.parameters, &updated).await {
            tracing::warn!(app_id = id, error = %err, "unable to prune app parameters");
            return Err(err);
        }
        self.get(id).await
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: i32) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "apps", id)?).await
    }

    async fn prune_parameters(
        &self,
        app_id: i32,
        requested: &BTreeMap<String, AppParameter>,
        updated: &App,
    ) -> Option<ApiError> {
        let keep = parameters_to_keep(requested, updated);
        let mut failures = Vec::new();
        for param_id in updated.parameters.values().filter_map(|p| p.id) {
            if keep.contains(&param_id) {
                continue;
            }
            tracing::debug!(app_id, param_id, "deleting app parameter");
            let result = match api_path!("api", "2", "apps", app_id, "parameters", param_id) {
                Ok(path) => destroy(self.executor, path).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                failures.push(format!("parameter {param_id}: {e}"));
            }
        }
        stack_errors(failures)
    }
}

/// Ids of the requested parameters. A parameter given without an id is
/// matched to the updated app by key name.
fn parameters_to_keep(requested: &BTreeMap<String, AppParameter>, updated: &App) -> HashSet<i32> {
    requested
        .iter()
        .filter_map(|(key, param)| {
            param.id.or_else(|| {
                let name = param.param_key_name.as_deref().unwrap_or(key);
                updated.parameters.get(name).and_then(|p| p.id)
            })
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn param(id: Option<i32>, key: &str) -> AppParameter {
        AppParameter {
            id,
            param_key_name: Some(key.into()),
            ..AppParameter::default()
        }
    }

    #[test]
    fn keep_set_resolves_ids_by_key_name() {
        let requested = BTreeMap::from([
            ("email".to_owned(), param(None, "email")),
            ("groups".to_owned(), param(Some(7), "groups")),
        ]);
        let updated = App {
            parameters: BTreeMap::from([
                ("email".to_owned(), param(Some(3), "email")),
                ("groups".to_owned(), param(Some(7), "groups")),
                ("legacy".to_owned(), param(Some(9), "legacy")),
            ]),
            ..App::default()
        };
        let keep = parameters_to_keep(&requested, &updated);
        assert_eq!(keep, HashSet::from([3, 7]));
    }

    #[test]
    fn app_serialization_omits_unset_fields() {
        let app = App {
            name: Some("Slack".into()),
            connector_id: Some(108_419),
            ..App::default()
        };
        let body = serde_json::to_value(&app).unwrap();
        assert_eq!(body, serde_json::json!({ "name": "Slack", "connector_id": 108_419 }));
    }

    #[test]
    fn app_decodes_api_shape() {
        let json = r#"{
            "id": 1, "name": "Slack", "visible": true, "auth_method": 2,
            "parameters": { "email": { "id": 3, "label": "Email", "param_key_name": "email" } },
            "configuration": { "relaystate": "x", "saml_notonorafter": "3" },
            "role_ids": [5]
        }"#;
        let app: App = serde_json::from_str(json).unwrap();
        assert_eq!(app.parameters["email"].id, Some(3));
        let config = app.configuration.unwrap();
        assert_eq!(config.relay_state.as_deref(), Some("x"));
        assert_eq!(config.saml_not_on_or_after.as_deref(), Some("3"));
        assert_eq!(app.role_ids, vec![5]);
    }
}
