use bytes::Bytes;
use http::Method;
use serde::Serialize;
use url::Url;

use crate::error::ApiError;
use crate::query::serialize_query;

/// How the executor authenticates a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMethod {
    None,
    /// `Authorization: Basic base64(client_id:client_secret)`
    Basic,
    /// `Authorization: Bearer <token>` from the credential store.
    #[default]
    Bearer,
}

/// Immutable description of one API call.
///
/// Pagination derives follow-up descriptors with
/// [`with_query_param`](Self::with_query_param); the original is never
/// changed.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    auth: AuthMethod,
    body: Option<Bytes>,
}

impl RequestDescriptor {
    pub fn builder(method: Method, path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            auth: AuthMethod::Bearer,
            body: None,
            error: None,
        }
    }

    pub fn get(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::DELETE, path)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn auth(&self) -> AuthMethod {
        self.auth
    }

    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn has_query_param(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Copy of this descriptor with `key` set to `value`, replacing any
    /// previous value.
    #[must_use]
    pub fn with_query_param(&self, key: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.query.retain(|(k, _)| k != key);
        next.query.push((key.to_owned(), value.to_owned()));
        next
    }

    /// Absolute URL of this request under `base`. A path prefix on `base` is
    /// kept.
    ///
    /// # Errors
    ///
    /// [`ApiError::Construction`] if `base` cannot carry a path.
    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        if base.cannot_be_a_base() {
            return Err(ApiError::Construction(format!(
                "base URL '{base}' cannot carry a path"
            )));
        }
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{}", self.path));
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// Fluent builder for [`RequestDescriptor`].
///
/// Query and body errors are deferred to [`build`](Self::build).
#[must_use = "call .build() to obtain a RequestDescriptor"]
pub struct RequestDescriptorBuilder {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    auth: AuthMethod,
    body: Option<Bytes>,
    error: Option<ApiError>,
}

impl RequestDescriptorBuilder {
    /// Serialize a query object; see [`serialize_query`].
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serialize_query(query) {
            Ok(pairs) => self.query.extend(pairs),
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_vec(body) {
            Ok(encoded) => self.body = Some(Bytes::from(encoded)),
            Err(e) => {
                self.error = Some(ApiError::Construction(format!(
                    "unable to serialize request body: {e}"
                )));
            }
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = auth;
        self
    }

    /// # Errors
    ///
    /// Returns the first deferred query or body error, or
    /// [`ApiError::Construction`] when the path is not absolute.
    pub fn build(self) -> Result<RequestDescriptor, ApiError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if !self.path.starts_with('/') || self.path.contains(['?', '#']) {
            return Err(ApiError::Construction(format!(
                "request path '{}' must be absolute and carry no query",
                self.path
            )));
        }
        Ok(RequestDescriptor {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            auth: self.auth,
            body: self.body,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_defaults_to_bearer() {
        let req = RequestDescriptor::get("/api/2/apps").build().unwrap();
        assert_eq!(req.auth(), AuthMethod::Bearer);
        assert_eq!(*req.method(), Method::GET);
        assert!(req.body().is_none());
    }

    #[test]
    fn url_keeps_base_prefix_and_encodes_query() {
        let req = RequestDescriptor::get("/api/2/users")
            .query(&json!({ "email": "a+b@example.com", "limit": 10 }))
            .build()
            .unwrap();
        let base = Url::parse("http://127.0.0.1:8080/mock/").unwrap();
        assert_eq!(
            req.url(&base).unwrap().as_str(),
            "http://127.0.0.1:8080/mock/api/2/users?email=a%2Bb%40example.com&limit=10"
        );
    }

    #[test]
    fn url_without_query_has_no_question_mark() {
        let req = RequestDescriptor::get("/api/2/apps").build().unwrap();
        let base = Url::parse("https://acme.onelogin.com").unwrap();
        assert_eq!(
            req.url(&base).unwrap().as_str(),
            "https://acme.onelogin.com/api/2/apps"
        );
    }

    #[test]
    fn with_query_param_replaces_and_leaves_original() {
        let req = RequestDescriptor::get("/api/2/apps")
            .query_param("cursor", "one")
            .build()
            .unwrap();
        let next = req.with_query_param("cursor", "two");
        assert_eq!(req.query_param("cursor"), Some("one"));
        assert_eq!(next.query_param("cursor"), Some("two"));
        assert_eq!(next.query().len(), 1);
    }

    #[test]
    fn query_error_is_deferred_to_build() {
        let err = RequestDescriptor::get("/api/2/apps")
            .query(&json!({ "nested": { "a": 1 } }))
            .json(&json!({ "name": "ok" }))
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Construction(_)));
    }

    #[test]
    fn relative_path_is_rejected() {
        assert!(RequestDescriptor::get("api/2/apps").build().is_err());
        assert!(RequestDescriptor::get("/api/2/apps?x=1").build().is_err());
    }

    #[test]
    fn json_body_is_encoded() {
        let req = RequestDescriptor::post("/api/2/roles")
            .json(&json!({ "name": "admins" }))
            .build()
            .unwrap();
        assert_eq!(req.body().unwrap().as_ref(), br#"{"name":"admins"}"#);
    }
}
