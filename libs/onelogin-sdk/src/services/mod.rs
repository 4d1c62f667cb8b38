//! Typed resource services.
//!
//! Every service borrows the client's [`Executor`], uses bearer auth and
//! decodes responses itself. List reads go through the pagination driver.

use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::executor::Executor;
use crate::pagination::{PagedResult, read_all};
use crate::request::RequestDescriptor;

pub mod app_rules;
pub mod apps;
pub mod auth_servers;
pub mod claims;
pub mod hook_env_vars;
pub mod legal_values;
pub mod privileges;
pub mod roles;
pub mod scopes;
pub mod smart_hooks;
pub mod user_mappings;
pub mod users;

/// `limit`, `page` and `cursor`, shared by most list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub cursor: Option<String>,
}

/// Body of endpoints that answer a write with `{"id": n}`.
#[derive(Debug, Deserialize)]
pub(crate) struct IdResponse {
    pub id: i32,
}

pub(crate) async fn read_pages<Q: Serialize + ?Sized>(
    executor: &Executor,
    path: String,
    query: Option<&Q>,
) -> Result<PagedResult, ApiError> {
    let mut builder = RequestDescriptor::get(path);
    if let Some(query) = query {
        builder = builder.query(query);
    }
    read_all(executor, &builder.build()?).await
}

pub(crate) async fn read_list<T, Q>(
    executor: &Executor,
    path: String,
    query: Option<&Q>,
    what: &'static str,
) -> Result<Vec<T>, ApiError>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    read_pages(executor, path, query).await?.decode_items(what)
}

pub(crate) async fn read_one<T: DeserializeOwned>(
    executor: &Executor,
    path: String,
    what: &'static str,
) -> Result<T, ApiError> {
    read_pages::<()>(executor, path, None)
        .await?
        .decode_first(what)
}

/// Send `body` and decode the JSON answer as `T`.
pub(crate) async fn write<B, T>(
    executor: &Executor,
    method: Method,
    path: String,
    body: &B,
    what: &'static str,
) -> Result<T, ApiError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let request = RequestDescriptor::builder(method, path).json(body).build()?;
    let response = executor.execute(&request).await?;
    serde_json::from_slice(&response.body).map_err(|e| ApiError::decode(what, e))
}

/// Send `body` and return it with the fields of the JSON answer laid over
/// it. Writes that answer `{"id": n}` hand back the request with its new id.
pub(crate) async fn write_merged<B>(
    executor: &Executor,
    method: Method,
    path: String,
    body: &B,
    what: &'static str,
) -> Result<B, ApiError>
where
    B: Serialize + DeserializeOwned,
{
    let request = RequestDescriptor::builder(method, path).json(body).build()?;
    let response = executor.execute(&request).await?;
    merge_answer(body, &response.body, what)
}

fn merge_answer<B>(body: &B, answer: &[u8], what: &'static str) -> Result<B, ApiError>
where
    B: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(body)?;
    if !answer.is_empty() {
        let answer: Value = serde_json::from_slice(answer).map_err(|e| ApiError::decode(what, e))?;
        if let (Value::Object(target), Value::Object(fields)) = (&mut merged, answer) {
            target.extend(fields);
        }
    }
    serde_json::from_value(merged).map_err(|e| ApiError::decode(what, e))
}

/// Send `body` and ignore the answer.
pub(crate) async fn write_unit<B: Serialize + ?Sized>(
    executor: &Executor,
    method: Method,
    path: String,
    body: &B,
) -> Result<(), ApiError> {
    let request = RequestDescriptor::builder(method, path).json(body).build()?;
    executor.execute(&request).await?;
    Ok(())
}

pub(crate) async fn destroy(executor: &Executor, path: String) -> Result<(), ApiError> {
    let request = RequestDescriptor::delete(path).build()?;
    executor.execute(&request).await?;
    Ok(())
}

fn missing(field: &str) -> ApiError {
    ApiError::Validation(format!("{field} is required"))
}

/// Error unless `value` is set.
pub(crate) fn required<T: Copy>(field: &str, value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| missing(field))
}
