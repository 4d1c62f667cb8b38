use std::fmt;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Serialized};
use onelogin_auth::{AuthError, CredentialsConfig, SecretString, subdomain_url};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;

/// Request timeout used when none (or a non-positive one) is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix of the environment variables read by [`ClientConfig::from_env`].
pub const ENV_PREFIX: &str = "ONELOGIN_";

/// Settings for [`OneLoginClient`](crate::OneLoginClient).
///
/// `Debug` redacts `client_secret`.
#[derive(Clone)]
pub struct ClientConfig {
    pub subdomain: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub timeout: Duration,
    /// Replaces `https://{subdomain}.onelogin.com` when set.
    pub api_url: Option<Url>,
    /// Replaces the transport's default `User-Agent` when set.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            client_id: String::new(),
            client_secret: SecretString::new(""),
            timeout: DEFAULT_TIMEOUT,
            api_url: None,
            user_agent: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("subdomain", &self.subdomain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("api_url", &self.api_url.as_ref().map(Url::as_str))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Shape of the environment, before secret wrapping.
#[derive(Default, Serialize, Deserialize)]
struct EnvConfig {
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    subdomain: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
}

impl ClientConfig {
    /// Load `ONELOGIN_SUBDOMAIN`, `ONELOGIN_CLIENT_ID`, `ONELOGIN_CLIENT_SECRET`,
    /// `ONELOGIN_TIMEOUT` (seconds), `ONELOGIN_API_URL` and
    /// `ONELOGIN_USER_AGENT`.
    ///
    /// A missing, unparseable or non-positive timeout falls back to
    /// [`DEFAULT_TIMEOUT`]. The result is not validated; call
    /// [`validate`](Self::validate) or let the client do it.
    ///
    /// # Errors
    ///
    /// [`ApiError::Auth`] with a config error if the environment cannot be
    /// read or `ONELOGIN_API_URL` is not a URL.
    pub fn from_env() -> Result<Self, ApiError> {
        let raw: EnvConfig = Figment::new()
            .merge(Serialized::defaults(EnvConfig {
                timeout: Some(DEFAULT_TIMEOUT.as_secs().to_string()),
                ..EnvConfig::default()
            }))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| config_error(format!("unable to read environment: {e}")))?;

        let api_url = raw
            .api_url
            .filter(|u| !u.trim().is_empty())
            .map(|u| {
                Url::parse(u.trim())
                    .map_err(|e| config_error(format!("invalid ONELOGIN_API_URL: {e}")))
            })
            .transpose()?;

        Ok(Self {
            subdomain: raw.subdomain.unwrap_or_default(),
            client_id: raw.client_id.unwrap_or_default(),
            client_secret: SecretString::new(raw.client_secret.unwrap_or_default()),
            timeout: parse_timeout(raw.timeout.as_deref()),
            api_url,
            user_agent: raw.user_agent.filter(|ua| !ua.trim().is_empty()),
        })
    }

    /// # Errors
    ///
    /// [`ApiError::Auth`] naming the first missing setting.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.client_id.trim().is_empty() {
            return Err(config_error("client_id is required".into()));
        }
        if self.client_secret.is_empty() {
            return Err(config_error("client_secret is required".into()));
        }
        if self.api_url.is_none() && self.subdomain.trim().is_empty() {
            return Err(config_error("subdomain is required".into()));
        }
        if self.timeout.is_zero() {
            return Err(config_error("timeout must be positive".into()));
        }
        Ok(())
    }

    /// `api_url` if set, otherwise `https://{subdomain}.onelogin.com`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Auth`] if the subdomain is not a valid host label.
    pub fn base_url(&self) -> Result<Url, ApiError> {
        match &self.api_url {
            Some(url) => Ok(url.clone()),
            None => Ok(subdomain_url(&self.subdomain)?),
        }
    }

    pub(crate) fn credentials(&self, base_url: Url) -> CredentialsConfig {
        CredentialsConfig {
            base_url,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            http_config: None,
        }
    }
}

fn config_error(message: String) -> ApiError {
    ApiError::Auth(AuthError::Config(message))
}

fn parse_timeout(raw: Option<&str>) -> Duration {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(secs) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
        _ => DEFAULT_TIMEOUT,
    }
}

/// Accept strings, numbers and booleans as a string. Environment values that
/// look numeric arrive as numbers.
fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    struct LooseString;

    impl<'de> Visitor<'de> for LooseString {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_owned()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(LooseString)
}
