//! Delegated administration privileges, `/api/1/privileges`.
//!
//! Users and roles assigned to a privilege live under separate
//! sub-resources. Reads fetch both concurrently and writes attach or
//! discard them after the privilege itself is saved.

use std::collections::{BTreeMap, HashSet};

use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::fanout::join_named;
use crate::services::{PageQuery, destroy, read_list, read_one, write, write_merged, write_unit};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege: Option<PrivilegeData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "Statement", default)]
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Effect", skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(rename = "Action", default)]
    pub action: Vec<String>,
    #[serde(rename = "Scope", default)]
    pub scope: Vec<String>,
}

/// Sub-resource holding the privilege's assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Users,
    Roles,
}

impl Assignment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
        }
    }
}

#[derive(Debug, Deserialize)]
struct AttachAnswer {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Clone)]
pub struct PrivilegesService<'a> {
    executor: &'a Executor,
}

impl<'a> PrivilegesService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// Privileges without their assignments.
    ///
    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &PageQuery) -> Result<Vec<Privilege>, ApiError> {
        let path = api_path!("api", "1", "privileges")?;
        read_list(self.executor, path, Some(query), "privileges").await
    }

    /// The privilege with its assigned users and roles.
    ///
    /// # Errors
    ///
    /// [`ApiError::FanOut`] naming the assignment kinds that could not be read.
    pub async fn get(&self, id: &str) -> Result<Privilege, ApiError> {
        let mut privilege: Privilege =
            read_one(self.executor, api_path!("api", "1", "privileges", id)?, "privilege").await?;
        privilege.id.get_or_insert_with(|| id.to_owned());

        let tasks = [Assignment::Users, Assignment::Roles]
            .map(|kind| (kind.as_str().to_owned(), self.assigned(id, kind)));
        let mut assigned = join_named("read", tasks).await?.into_iter();
        privilege.user_ids = assigned.next().unwrap_or_default();
        privilege.role_ids = assigned.next().unwrap_or_default();
        Ok(privilege)
    }

    /// Create the privilege, then attach its users and roles. The privilege
    /// is deleted again when attaching fails.
    ///
    /// # Errors
    ///
    /// Request, transport or decode failures, or [`ApiError::FanOut`] naming
    /// the assignments that could not be attached.
    pub async fn create(&self, privilege: &Privilege) -> Result<Privilege, ApiError> {
        let body = without_assignments(privilege);
        let mut created: Privilege = write_merged(
            self.executor,
            Method::POST,
            api_path!("api", "1", "privileges")?,
            &body,
            "privilege",
        )
        .await?;
        let Some(id) = created.id.clone() else {
            return Err(ApiError::Validation("API returned no privilege id".into()));
        };

        if let Err(err) = self
            .attach(&id, &privilege.user_ids, &privilege.role_ids)
            .await
        {
            tracing::warn!(privilege_id = %id, error = %err, "attach failed; deleting privilege");
            if let Err(e) = self.destroy(&id).await {
                tracing::error!(privilege_id = %id, error = %e, "unable to delete privilege");
            }
            return Err(err);
        }

        created.user_ids.clone_from(&privilege.user_ids);
        created.role_ids.clone_from(&privilege.role_ids);
        Ok(created)
    }

    /// Update the privilege so its assignments are exactly the requested
    /// ones: new ids are attached, the rest are discarded.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id, request or transport
    /// failures, or [`ApiError::FanOut`] for failed assignment changes.
    pub async fn update(&self, privilege: &Privilege) -> Result<Privilege, ApiError> {
        let Some(id) = privilege.id.as_deref() else {
            return Err(ApiError::Validation("privilege id is required".into()));
        };
        let body = without_assignments(privilege);
        let path = api_path!("api", "1", "privileges", id)?;
        write_unit(self.executor, Method::PUT, path, &body).await?;

        self.attach(id, &privilege.user_ids, &privilege.role_ids).await?;

        let mut current = self.get(id).await?;
        let users = unrequested(&current.user_ids, &privilege.user_ids);
        let roles = unrequested(&current.role_ids, &privilege.role_ids);
        self.discard(id, Assignment::Users, &users).await?;
        self.discard(id, Assignment::Roles, &roles).await?;

        current.user_ids.retain(|n| !users.contains(n));
        current.role_ids.retain(|n| !roles.contains(n));
        Ok(current)
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: &str) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "1", "privileges", id)?).await
    }

    /// Assign users and roles. Empty lists are skipped.
    ///
    /// # Errors
    ///
    /// [`ApiError::FanOut`] naming the kinds that failed or were not
    /// acknowledged.
    pub async fn attach(
        &self,
        id: &str,
        user_ids: &[i32],
        role_ids: &[i32],
    ) -> Result<(), ApiError> {
        let tasks = [(Assignment::Users, user_ids), (Assignment::Roles, role_ids)]
            .map(|(kind, ids)| (kind.as_str().to_owned(), self.attach_kind(id, kind, ids)));
        join_named("assign", tasks).await?;
        Ok(())
    }

    /// Remove the given assignments, one request per id.
    ///
    /// # Errors
    ///
    /// [`ApiError::FanOut`] naming the ids that could not be removed.
    pub async fn discard(&self, id: &str, kind: Assignment, ids: &[i32]) -> Result<(), ApiError> {
        let tasks = ids.iter().map(|&n| {
            let executor = self.executor;
            let path = api_path!("api", "1", "privileges", id, kind.as_str(), n);
            (n.to_string(), async move { destroy(executor, path?).await })
        });
        join_named(&format!("remove {}", kind.as_str()), tasks).await?;
        Ok(())
    }

    async fn assigned(&self, id: &str, kind: Assignment) -> Result<Vec<i32>, ApiError> {
        let path = api_path!("api", "1", "privileges", id, kind.as_str())?;
        let answer: serde_json::Map<String, serde_json::Value> =
            read_one(self.executor, path, "privilege assignments").await?;
        match answer.get(kind.as_str()) {
            Some(ids) => serde_json::from_value(ids.clone())
                .map_err(|e| ApiError::decode("privilege assignments", e)),
            None => Ok(Vec::new()),
        }
    }

    async fn attach_kind(&self, id: &str, kind: Assignment, ids: &[i32]) -> Result<(), ApiError> {
        if ids.is_empty() {
            return Ok(());
        }
        let path = api_path!("api", "1", "privileges", id, kind.as_str())?;
        let body = BTreeMap::from([(kind.as_str(), ids)]);
        let answer: AttachAnswer =
            write(self.executor, Method::POST, path, &body, "assignment answer").await?;
        if answer.success {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "API did not acknowledge assigning {}",
                kind.as_str()
            )))
        }
    }
}

fn without_assignments(privilege: &Privilege) -> Privilege {
    Privilege {
        user_ids: Vec::new(),
        role_ids: Vec::new(),
        ..privilege.clone()
    }
}

/// Ids in `current` that the caller did not ask to keep.
fn unrequested(current: &[i32], keep: &[i32]) -> Vec<i32> {
    let keep: HashSet<i32> = keep.iter().copied().collect();
    current.iter().copied().filter(|n| !keep.contains(n)).collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn unrequested_keeps_remote_order() {
        assert_eq!(unrequested(&[5, 1, 9, 2], &[1, 2, 3]), vec![5, 9]);
        assert!(unrequested(&[1], &[1]).is_empty());
    }

    #[test]
    fn statement_keys_are_capitalized() {
        let privilege = Privilege {
            name: Some("super admin".into()),
            privilege: Some(PrivilegeData {
                version: Some("2018-05-18".into()),
                statement: vec![Statement {
                    effect: Some("Allow".into()),
                    action: vec!["users:List".into()],
                    scope: vec!["*".into()],
                }],
            }),
            user_ids: vec![1],
            ..Privilege::default()
        };
        let body = serde_json::to_value(without_assignments(&privilege)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "super admin",
                "privilege": {
                    "version": "2018-05-18",
                    "Statement": [{ "Effect": "Allow", "Action": ["users:List"], "Scope": ["*"] }]
                }
            })
        );
    }
}
