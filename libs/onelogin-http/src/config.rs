use std::time::Duration;

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("onelogin-http/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout for OneLogin API calls
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum response body size (10 MB)
const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// TLS root certificate source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsRootConfig {
    /// Mozilla root certificates compiled into the binary
    #[default]
    WebPki,
    /// Root certificates from the operating system store
    Native,
}

/// Which URL schemes the client accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportSecurity {
    /// Only `https://` URLs are accepted
    #[default]
    TlsOnly,
    /// `http://` URLs are accepted as well (mock servers in tests)
    AllowInsecureHttp,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Timeout applied to each request (default: 10s)
    pub request_timeout: Duration,

    /// Maximum response body size in bytes, applied after decompression
    pub max_body_size: usize,

    /// User-Agent header value, added when a request does not set one
    pub user_agent: String,

    /// Accepted URL schemes
    pub transport: TransportSecurity,

    /// Root certificate source for TLS
    pub tls_roots: TlsRootConfig,

    /// Number of requests that may be queued in the client buffer
    ///
    /// When the buffer is full `send()` fails with `HttpError::Overloaded`
    /// instead of waiting.
    pub buffer_capacity: usize,

    /// Idle timeout for pooled connections (`None` keeps them indefinitely)
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::WebPki,
            buffer_capacity: 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpClientConfig {
    /// Configuration for the `OAuth2` token and revocation endpoints.
    ///
    /// Token responses are small, so the body limit is tight and the
    /// connection pool is kept minimal.
    #[must_use]
    pub fn token_endpoint() -> Self {
        Self {
            max_body_size: 1024 * 1024,
            buffer_capacity: 64,
            pool_max_idle_per_host: 2,
            ..Self::default()
        }
    }

    /// Configuration for tests against local mock servers.
    ///
    /// Allows plain HTTP and uses a short timeout.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            transport: TransportSecurity::AllowInsecureHttp,
            pool_idle_timeout: None,
            ..Self::default()
        }
    }
}
