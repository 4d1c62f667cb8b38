use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use tower::Service;
use tower::buffer::Buffer;

pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

/// `Buffer<Req, F>` over the boxed middleware stack.
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// HTTP client over a buffered tower stack.
///
/// `HttpClient` is `Clone + Send + Sync`; clones share the same
/// connection pool and request queue, so it can be stored directly in
/// long-lived structs without a `Mutex`.
///
/// `send()` returns `Ok` for every HTTP status. Status handling belongs to
/// the caller.
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BufferedService,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl HttpClient {
    /// Client with the default configuration.
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, HttpError> {
        HttpClientBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Start a request with an arbitrary method.
    ///
    /// The URL must be absolute; query parameters are expected to be
    /// encoded into it already.
    pub fn request(&self, method: http::Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            url.to_owned(),
            self.transport_security,
        )
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::POST, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PUT, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::DELETE, url)
    }
}

/// Unwraps the inner `HttpError`; anything else means the buffer worker is gone.
pub fn map_buffer_error(err: tower::BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(err) => {
            tracing::error!(
                error = %err,
                "buffer worker closed unexpectedly; service unavailable"
            );
            HttpError::ServiceClosed
        }
    }
}

/// Poll the buffer once; a full buffer fails with `HttpError::Overloaded`
/// instead of waiting.
pub async fn try_acquire_buffer_slot(service: &mut BufferedService) -> Result<(), HttpError> {
    use std::task::Poll;

    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(HttpError::Overloaded),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::HttpClientConfig;
    use crate::error::InvalidUriKind;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write;

    fn test_client() -> HttpClient {
        HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    fn gzip_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn get_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/2/apps");
            then.status(200).json_body(json!([{"id": 1}]));
        });

        let body = test_client()
            .get(&server.url("/api/2/apps"))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();

        mock.assert();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value[0]["id"], 1);
    }

    #[tokio::test]
    async fn json_body_sets_content_type_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/2/roles")
                .header("content-type", "application/json")
                .json_body(json!({"name": "admins"}));
            then.status(201).json_body(json!({"id": 9}));
        });

        let resp = test_client()
            .post(&server.url("/api/2/roles"))
            .json(&json!({"name": "admins"}))
            .unwrap()
            .send()
            .await
            .unwrap();

        mock.assert();
        assert_eq!(resp.status(), http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn default_headers_are_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/ua")
                .header("accept", "application/json")
                .header_exists("user-agent");
            then.status(200);
        });

        test_client().get(&server.url("/ua")).send().await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn sensitive_header_reaches_server() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/2/users/5")
                .header("authorization", "Bearer tok123");
            then.status(204);
        });

        let resp = test_client()
            .delete(&server.url("/api/2/users/5"))
            .sensitive_header("authorization", "Bearer tok123")
            .send()
            .await
            .unwrap();

        mock.assert();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
        assert!(resp.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_2xx_is_ok_from_send() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/api/2/apps/1");
            then.status(422).body(r#"{"message":"bad"}"#);
        });

        let resp = test_client()
            .put(&server.url("/api/2/apps/1"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

        let err = resp.checked_bytes().await.unwrap_err();
        assert!(matches!(err, HttpError::HttpStatus { status, .. } if status == 422));
    }

    #[tokio::test]
    async fn gzip_body_is_decompressed() {
        let server = MockServer::start();
        let original = br#"{"data":"compressed"}"#;
        let compressed = gzip_compress(original);
        server.mock(|when, then| {
            when.method(GET).path("/gzip");
            then.status(200)
                .header("content-encoding", "gzip")
                .body(compressed);
        });

        let body = test_client()
            .get(&server.url("/gzip"))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(body.as_ref(), original);
    }

    #[tokio::test]
    async fn body_limit_applies_after_decompression() {
        let server = MockServer::start();
        let compressed = gzip_compress(&[b'a'; 4096]);
        server.mock(|when, then| {
            when.method(GET).path("/bomb");
            then.status(200)
                .header("content-encoding", "gzip")
                .body(compressed);
        });

        let client = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .max_body_size(1024)
            .build()
            .unwrap();
        let err = client
            .get(&server.url("/bomb"))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge { limit: 1024, .. }));
    }

    #[tokio::test]
    async fn concurrent_requests_share_client() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/c");
            then.status(200).body("ok");
        });

        let client = test_client();
        let url = server.url("/c");
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let client = client.clone();
                let url = url.clone();
                tokio::spawn(async move { client.get(&url).send().await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        mock.assert_calls(20);
    }

    #[tokio::test]
    async fn http_rejected_when_tls_only() {
        let client = HttpClient::new().unwrap();
        let err = client.get("http://localhost/x").send().await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { ref scheme, .. } if scheme == "http"));
    }

    #[tokio::test]
    async fn relative_url_rejected() {
        let err = test_client().get("/api/2/apps").send().await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_header_is_deferred_to_send() {
        let err = test_client()
            .get("http://localhost/x")
            .header("bad header", "v")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderName(_)));
    }

    #[test]
    fn map_buffer_error_passes_through_http_error() {
        let boxed: tower::BoxError =
            Box::new(HttpError::Timeout(std::time::Duration::from_secs(10)));
        assert!(matches!(map_buffer_error(boxed), HttpError::Timeout(_)));
    }

    #[test]
    fn map_buffer_error_reports_closed_worker() {
        let boxed: tower::BoxError = Box::new(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "buffer worker died",
        ));
        assert!(matches!(map_buffer_error(boxed), HttpError::ServiceClosed));
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpClient>();
    }
}
