use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::legal_values::{ActionValues, LegalValuesService, RuleCondition};
use crate::services::{IdResponse, destroy, read_list, read_one, required, write};

const LEGAL_VALUES_PREFIX: &str = "mappings";

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserMappingsQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub cursor: Option<String>,
    pub has_condition: Option<String>,
    pub has_condition_type: Option<String>,
    pub has_action: Option<String>,
    pub has_action_type: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<UserMappingAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMappingAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<String>,
}

/// `/api/2/mappings`
#[derive(Debug, Clone)]
pub struct UserMappingsService<'a> {
    executor: &'a Executor,
}

impl<'a> UserMappingsService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &UserMappingsQuery) -> Result<Vec<UserMapping>, ApiError> {
        let path = api_path!("api", "2", "mappings")?;
        read_list(self.executor, path, Some(query), "user mappings").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, id: i32) -> Result<UserMapping, ApiError> {
        read_one(self.executor, api_path!("api", "2", "mappings", id)?, "user mapping").await
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] for illegal condition or action values, then
    /// request, transport or decode failures.
    pub async fn create(&self, mapping: &UserMapping) -> Result<UserMapping, ApiError> {
        self.validate(mapping).await?;
        let answer: IdResponse = write(
            self.executor,
            Method::POST,
            api_path!("api", "2", "mappings")?,
            mapping,
            "user mapping id",
        )
        .await?;
        Ok(UserMapping {
            id: Some(answer.id),
            ..mapping.clone()
        })
    }

    /// The id travels in the path only.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id or for illegal values, then
    /// request, transport or decode failures.
    pub async fn update(&self, mapping: &UserMapping) -> Result<UserMapping, ApiError> {
        let id = required("mapping id", mapping.id)?;
        self.validate(mapping).await?;
        let body = UserMapping {
            id: None,
            ..mapping.clone()
        };
        let answer: IdResponse = write(
            self.executor,
            Method::PUT,
            api_path!("api", "2", "mappings", id)?,
            &body,
            "user mapping id",
        )
        .await?;
        Ok(UserMapping {
            id: Some(answer.id),
            ..body
        })
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: i32) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "mappings", id)?).await
    }

    async fn validate(&self, mapping: &UserMapping) -> Result<(), ApiError> {
        let actions: Vec<ActionValues<'_>> = mapping
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
                mapping.name.as_deref().unwrap_or_default(),
                &mapping.conditions,
                &actions,
            )
            .await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::query::serialize_query;

    #[test]
    fn query_renders_bools() {
        let query = UserMappingsQuery {
            enabled: Some(false),
            has_action: Some("set_role".into()),
            ..UserMappingsQuery::default()
        };
        let mut pairs = serialize_query(&query).unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("enabled".to_owned(), "false".to_owned()),
                ("has_action".to_owned(), "set_role".to_owned()),
            ]
        );
    }
}
