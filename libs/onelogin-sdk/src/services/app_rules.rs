use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::legal_values::{ActionValues, LegalValuesService, RuleCondition};
use crate::services::{destroy, read_list, read_one, required, write_merged};

const LEGAL_VALUES_PREFIX: &str = "rules";

/// Rule attached to an app, evaluated when users are provisioned to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `all` or `any`.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<AppRuleAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRuleAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// `/api/2/apps/{app_id}/rules`
#[derive(Debug, Clone)]
pub struct AppRulesService<'a> {
    executor: &'a Executor,
}

impl<'a> AppRulesService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, app_id: i32) -> Result<Vec<AppRule>, ApiError> {
        let path = api_path!("api", "2", "apps", app_id, "rules")?;
        read_list::<_, ()>(self.executor, path, None, "app rules").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, app_id: i32, id: i32) -> Result<AppRule, ApiError> {
        let path = api_path!("api", "2", "apps", app_id, "rules", id)?;
        read_one(self.executor, path, "app rule").await
    }

    /// Create the rule and return it with the id assigned by the API.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without an app id, then request, transport or
    /// decode failures.
    pub async fn create(&self, rule: &AppRule) -> Result<AppRule, ApiError> {
        let app_id = required("app_id", rule.app_id)?;
        let path = api_path!("api", "2", "apps", app_id, "rules")?;
        write_merged(self.executor, Method::POST, path, rule, "app rule").await
    }

    /// Check the rule against the legal values, then update it.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without both ids or when a condition or
    /// action uses an illegal value.
    pub async fn update(&self, rule: &AppRule) -> Result<AppRule, ApiError> {
        let id = required("id", rule.id)?;
        let app_id = required("app_id", rule.app_id)?;
        self.validate(rule).await?;

        let path = api_path!("api", "2", "apps", app_id, "rules", id)?;
        write_merged(self.executor, Method::PUT, path, rule, "app rule").await
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, app_id: i32, id: i32) -> Result<(), ApiError> {
        let path = api_path!("api", "2", "apps", app_id, "rules", id)?;
        destroy(self.executor, path).await
    }

    async fn validate(&self, rule: &AppRule) -> Result<(), ApiError> {
        let actions: Vec<ActionValues<'_>> = rule
            .actions
            .iter()
            .map(|a| ActionValues {
                action: a.action.as_deref(),
                values: &a.value,
            })
            .collect();
        LegalValuesService::new(self.executor)
            .validate(
                LEGAL_VALUES_PREFIX,
                rule.name.as_deref().unwrap_or_default(),
                &rule.conditions,
                &actions,
            )
            .await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn rule_uses_match_key_and_always_sends_lists() {
        let rule = AppRule {
            app_id: Some(4),
            name: Some("r".into()),
            match_type: Some("all".into()),
            ..AppRule::default()
        };
        let body = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "app_id": 4, "name": "r", "match": "all", "conditions": [], "actions": []
            })
        );
    }

    #[test]
    fn rule_decodes_expression_actions() {
        let rule: AppRule = serde_json::from_str(
            r#"{"id":1,"actions":[{"action":"set_email","expression":"{email}"}]}"#,
        )
        .unwrap();
        assert_eq!(rule.actions[0].expression.as_deref(), Some("{email}"));
        assert!(rule.actions[0].value.is_empty());
        assert!(rule.conditions.is_empty());
    }
}
