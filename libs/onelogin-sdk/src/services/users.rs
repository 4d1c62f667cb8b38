use std::collections::BTreeMap;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::api_path;
use crate::error::ApiError;
use crate::executor::Executor;
use crate::services::{destroy, read_list, read_one, required, write_merged};

/// User `state` values.
pub mod state {
    pub const UNAPPROVED: i32 = 0;
    pub const APPROVED: i32 = 1;
    pub const REJECTED: i32 = 2;
    pub const UNLICENSED: i32 = 3;
}

/// User `status` values. Only [`status::ACTIVE`] users can log in.
pub mod status {
    pub const UNACTIVATED: i32 = 0;
    pub const ACTIVE: i32 = 1;
    pub const SUSPENDED: i32 = 2;
    pub const LOCKED: i32 = 3;
    pub const PASSWORD_EXPIRED: i32 = 4;
    pub const AWAITING_PASSWORD_RESET: i32 = 5;
    pub const PASSWORD_PENDING: i32 = 7;
    pub const SECURITY_QUESTIONS_REQUIRED: i32 = 8;
}

/// Filters for `GET /api/2/users`. Timestamps are ISO 8601 strings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub cursor: Option<String>,
    pub created_since: Option<String>,
    pub created_until: Option<String>,
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
    pub last_login_since: Option<String>,
    pub last_login_until: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub samaccountname: Option<String>,
    pub directory_id: Option<String>,
    pub external_id: Option<String>,
    pub app_id: Option<String>,
    /// Comma separated.
    pub user_ids: Option<String>,
    pub fields: Option<String>,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinguished_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samaccountname: Option<String>,
    #[serde(rename = "userprincipalname", skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_login_attempts: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_idp_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_ad_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_user_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_attributes: BTreeMap<String, serde_json::Value>,
}

/// Entry of `GET /api/2/users/{id}/apps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserApp {
    pub id: Option<i32>,
    pub icon_url: Option<String>,
    pub login_id: Option<i32>,
    pub provisioning_status: Option<String>,
    pub provisioning_state: Option<String>,
    pub provisioning_enabled: Option<bool>,
}

/// `/api/2/users`
#[derive(Debug, Clone)]
pub struct UsersService<'a> {
    executor: &'a Executor,
}

impl<'a> UsersService<'a> {
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn query(&self, query: &UserQuery) -> Result<Vec<User>, ApiError> {
        read_list(self.executor, api_path!("api", "2", "users")?, Some(query), "users").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn get(&self, id: i32) -> Result<User, ApiError> {
        read_one(self.executor, api_path!("api", "2", "users", id)?, "user").await
    }

    /// Apps the user is assigned to.
    ///
    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn apps(&self, id: i32) -> Result<Vec<UserApp>, ApiError> {
        let path = api_path!("api", "2", "users", id, "apps")?;
        read_list::<_, ()>(self.executor, path, None, "user apps").await
    }

    /// # Errors
    ///
    /// Request, transport or decode failures.
    pub async fn create(&self, user: &User) -> Result<User, ApiError> {
        let path = api_path!("api", "2", "users")?;
        write_merged(self.executor, Method::POST, path, user, "user").await
    }

    /// # Errors
    ///
    /// [`ApiError::Validation`] without an id, then request, transport or
    /// decode failures.
    pub async fn update(&self, user: &User) -> Result<User, ApiError> {
        let id = required("user id", user.id)?;
        let path = api_path!("api", "2", "users", id)?;
        write_merged(self.executor, Method::PUT, path, user, "user").await
    }

    /// # Errors
    ///
    /// Request or transport failures.
    pub async fn destroy(&self, id: i32) -> Result<(), ApiError> {
        destroy(self.executor, api_path!("api", "2", "users", id)?).await
    }
}
