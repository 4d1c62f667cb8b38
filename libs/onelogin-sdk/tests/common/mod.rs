#![allow(dead_code)]

use httpmock::prelude::*;
use onelogin_http::HttpClientConfig;
use onelogin_sdk::{ClientConfig, OneLoginClient, SecretString};
use url::Url;

pub const TOKEN_PATH: &str = "/auth/oauth2/v2/token";

/// Client pointed at `server` with plain-HTTP transport.
pub fn client_for(server: &MockServer) -> OneLoginClient {
    let config = ClientConfig {
        client_id: "abc".into(),
        client_secret: SecretString::new("def"),
        api_url: Some(Url::parse(&server.base_url()).unwrap()),
        ..ClientConfig::default()
    };
    OneLoginClient::with_http_config(&config, HttpClientConfig::for_testing()).unwrap()
}

pub fn mock_token<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
    let body = format!(r#"{{"access_token":"{token}","token_type":"bearer","expires_in":36000}}"#);
    server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}
