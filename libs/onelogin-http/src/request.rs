use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::response::{HttpResponse, ResponseBody};
use crate::security::{check_url, is_sensitive_header};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use tower::Service;

#[derive(Clone, Debug)]
enum BodyKind {
    Empty,
    Bytes(Bytes),
    Json(Bytes),
}

/// Single outbound request, built fluently and consumed by [`send()`](RequestBuilder::send).
///
/// Header and body errors are captured and reported when the request is sent,
/// so chains never need intermediate `?` except for [`json`](RequestBuilder::json).
///
/// ```ignore
/// let resp = client
///     .request(http::Method::POST, "https://acme.onelogin.com/api/2/apps")
///     .sensitive_header("authorization", &format!("Bearer {token}"))
///     .json(&app)?
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    method: http::Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: BodyKind,
    error: Option<HttpError>,
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: http::Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            method,
            url,
            headers: Vec::new(),
            body: BodyKind::Empty,
            error: None,
            transport_security,
        }
    }

    /// Add a header. Names in [`SENSITIVE_HEADERS`](crate::security::SENSITIVE_HEADERS)
    /// are marked sensitive automatically.
    pub fn header(self, name: &str, value: &str) -> Self {
        let sensitive = is_sensitive_header(name);
        self.push_header(name, value, sensitive)
    }

    /// Add a header whose value is always marked sensitive.
    ///
    /// Sensitive values are excluded from `Debug` output of the request and
    /// from HPACK indexing on HTTP/2 connections.
    pub fn sensitive_header(self, name: &str, value: &str) -> Self {
        self.push_header(name, value, true)
    }

    fn push_header(mut self, name: &str, value: &str, sensitive: bool) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(mut value)) => {
                value.set_sensitive(sensitive);
                self.headers.push((name, value));
            }
            (Err(e), _) => self.error = Some(HttpError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(HttpError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Serialize `body` as JSON. `Content-Type: application/json` is added
    /// unless the caller already set one.
    ///
    /// # Errors
    ///
    /// Returns a previously deferred header error, or `HttpError::Json` if
    /// serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let encoded = serde_json::to_vec(body)?;
        self.body = BodyKind::Json(Bytes::from(encoded));
        Ok(self)
    }

    /// Use pre-encoded bytes as the body.
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = BodyKind::Bytes(body);
        self
    }

    /// Send the request.
    ///
    /// Succeeds for every HTTP status; use [`HttpResponse::error_for_status`]
    /// or [`HttpResponse::checked_bytes`] to turn non-2xx into an error.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` for deferred build errors, a rejected URL or
    /// scheme, transport and TLS failures, timeouts, and a full buffer
    /// (`Overloaded`).
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = check_url(&self.url, self.transport_security)?;
        let mut builder = Request::builder().method(self.method).uri(uri);

        let has_content_type = self.headers.iter().any(|(name, _)| name == CONTENT_TYPE);
        if !has_content_type && matches!(self.body, BodyKind::Json(_)) {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let body = match self.body {
            BodyKind::Empty => Bytes::new(),
            BodyKind::Bytes(b) | BodyKind::Json(b) => b,
        };
        let request = builder.body(Full::new(body))?;

        try_acquire_buffer_slot(&mut self.service).await?;

        let inner: Response<ResponseBody> =
            self.service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}
