//! Legal values for rule and mapping fields.
//!
//! `GET /api/2/{address}` answers `[{"name": .., "value": ..}]`. Rules are
//! checked under the `rules/` prefix and user mappings under `mappings/`.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, stack_errors};
use crate::executor::Executor;
use crate::path::{Segment, api_path};
use crate::services::read_list;
use crate::validation::one_of;

/// One `{name, value}` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegalValue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl LegalValue {
    /// The value as text; non-string JSON is rendered as JSON.
    #[must_use]
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Condition shape shared by app rules and user mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Borrowed view of an action for validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActionValues<'a> {
    pub action: Option<&'a str>,
    pub values: &'a [String],
}

#[derive(Debug, Clone)]
pub struct LegalValuesService<'a> {
    executor: &'a Executor,
}

impl<'a> LegalValuesService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// Fetch the legal entries listed under `address`, e.g. `rules/conditions`.
    ///
    /// # Errors
    ///
    /// Construction errors for an unusable address, request, transport or
    /// decode failures.
    pub async fn query(&self, address: &str) -> Result<Vec<LegalValue>, ApiError> {
        let mut segments: Vec<Segment<'_>> = vec!["api".into(), "2".into()];
        segments.extend(address.split('/').map(Segment::from));
        let path = api_path(&segments)?;
        read_list::<_, ()>(self.executor, path, None, "legal values").await
    }

    /// Values under `address` as text.
    ///
    /// # Errors
    ///
    /// Same as [`Self::query`].
    pub async fn values(&self, address: &str) -> Result<Vec<String>, ApiError> {
        Ok(self
            .query(address)
            .await?
            .iter()
            .map(LegalValue::value_text)
            .collect())
    }

    /// Values under `address`, or an empty list when the lookup fails.
    /// An empty list disables the check it feeds.
    async fn values_or_empty(&self, address: String) -> (String, Vec<String>) {
        match self.values(&address).await {
            Ok(values) => (address, values),
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "unable to fetch legal values");
                (address, Vec::new())
            }
        }
    }

    /// Check a rule or mapping named `name` against the legal values under
    /// `prefix`. All lookups run concurrently.
    pub(crate) async fn validate(
        &self,
        prefix: &str,
        name: &str,
        conditions: &[RuleCondition],
        actions: &[ActionValues<'_>],
    ) -> Result<(), ApiError> {
        let lookups = lookup_addresses(prefix, conditions, actions)
            .into_iter()
            .map(|address| self.values_or_empty(address));
        let legal: BTreeMap<String, Vec<String>> = join_all(lookups).await.into_iter().collect();

        match stack_errors(check(prefix, name, conditions, actions, &legal)) {
            Some(err) => {
                tracing::warn!(prefix, name, error = %err, "illegal values given");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

fn lookup_addresses(
    prefix: &str,
    conditions: &[RuleCondition],
    actions: &[ActionValues<'_>],
) -> BTreeSet<String> {
    let mut addresses =
        BTreeSet::from([format!("{prefix}/conditions"), format!("{prefix}/actions")]);
    for source in conditions.iter().filter_map(|c| c.source.as_deref()) {
        addresses.insert(format!("{prefix}/conditions/{source}/values"));
        addresses.insert(format!("{prefix}/conditions/{source}/operators"));
    }
    for action in actions.iter().filter_map(|a| a.action) {
        addresses.insert(format!("{prefix}/actions/{action}/values"));
    }
    addresses
}

fn check(
    prefix: &str,
    name: &str,
    conditions: &[RuleCondition],
    actions: &[ActionValues<'_>],
    legal: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    let lookup = |address: String| legal.get(&address).filter(|v| !v.is_empty());
    let mut errors = Vec::new();
    let mut test = |key: &str, value: Option<&str>, options: Option<&Vec<String>>| {
        if let (Some(value), Some(options)) = (value, options)
            && let Some(msg) = one_of(&format!("{name}.{key}"), value, options)
        {
            errors.push(msg);
        }
    };

    for condition in conditions {
        let source = condition.source.as_deref();
        test("conditions.source", source, lookup(format!("{prefix}/conditions")));
        if let Some(source) = source {
            test(
                "conditions.value",
                condition.value.as_deref(),
                lookup(format!("{prefix}/conditions/{source}/values")),
            );
            test(
                "conditions.operator",
                condition.operator.as_deref(),
                lookup(format!("{prefix}/conditions/{source}/operators")),
            );
        }
    }

    for action in actions {
        test("actions.action", action.action, lookup(format!("{prefix}/actions")));
        if let Some(kind) = action.action {
            let options = lookup(format!("{prefix}/actions/{kind}/values"));
            for value in action.values {
                test("actions.values", Some(value.as_str()), options);
            }
        }
    }
    errors
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn condition(source: &str, operator: &str, value: &str) -> RuleCondition {
        RuleCondition {
            source: Some(source.into()),
            operator: Some(operator.into()),
            value: Some(value.into()),
        }
    }

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn addresses_cover_every_source_and_action() {
        let conditions = [condition("has_role", "ri", "1")];
        let values = owned(&["x"]);
        let actions = [ActionValues {
            action: Some("set_role"),
            values: &values,
        }];
        let addresses: Vec<String> = lookup_addresses("rules", &conditions, &actions)
            .into_iter()
            .collect();
        assert_eq!(
            addresses,
            vec![
                "rules/actions",
                "rules/actions/set_role/values",
                "rules/conditions",
                "rules/conditions/has_role/operators",
                "rules/conditions/has_role/values",
            ]
        );
    }

    #[test]
    fn illegal_values_are_reported_and_empty_lists_skip_checks() {
        let legal = BTreeMap::from([
            ("mappings/conditions".to_owned(), owned(&["has_role", "last_login"])),
            ("mappings/conditions/has_role/operators".to_owned(), owned(&["ri", "!~"])),
            ("mappings/conditions/has_role/values".to_owned(), Vec::new()),
            ("mappings/actions".to_owned(), owned(&["set_role"])),
            ("mappings/actions/set_role/values".to_owned(), owned(&["1", "2"])),
        ]);
        let conditions = [condition("has_role", "=", "anything")];
        let values = owned(&["2", "3"]);
        let actions = [ActionValues {
            action: Some("set_role"),
            values: &values,
        }];

        let errors = check("mappings", "m1", &conditions, &actions, &legal);
        assert_eq!(
            errors,
            vec![
                "m1.conditions.operator must be one of [ri !~], got: =",
                "m1.actions.values must be one of [1 2], got: 3",
            ]
        );
    }

    #[test]
    fn non_string_values_render_as_json() {
        let json = r#"[{"name":"Role","value":12},{"name":"Src","value":"has_role"}]"#;
        let entries: Vec<LegalValue> = serde_json::from_str(json).unwrap();
        let values: Vec<String> = entries.iter().map(LegalValue::value_text).collect();
        assert_eq!(values, vec!["12", "has_role"]);
    }
}
