use serde::{Deserialize, Serialize};

/// Body of the token request.
#[derive(Serialize)]
pub(crate) struct TokenRequest {
    pub grant_type: &'static str,
}

impl TokenRequest {
    pub const CLIENT_CREDENTIALS: Self = Self {
        grant_type: "client_credentials",
    };
}

/// Body of the revocation request.
#[derive(Serialize)]
pub(crate) struct RevokeRequest<'a> {
    pub access_token: &'a str,
}

/// Token endpoint response. Unknown fields are ignored.
///
/// `Deserialize`-only so access tokens cannot be serialized back into logs.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}
