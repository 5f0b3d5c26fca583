//! Shared wiremock fixtures for the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OPENID_PATH: &str = "/v1/.well-known/openid-configuration";
pub const ISSUER_PATH: &str = "/auth/.well-known/openid-configuration";
pub const TOKEN_PATH: &str = "/auth/token";

/// Server with authentication disabled.
pub async fn mount_anonymous(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(OPENID_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

/// Server whose issuer lives on the same mock and supports `grant_types`.
pub async fn mount_issuer(server: &MockServer, grant_types: &[&str]) {
    Mock::given(method("GET"))
        .and(path(OPENID_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientId": "wcs",
            "href": format!("{}{ISSUER_PATH}", server.uri()),
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(ISSUER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "grant_types_supported": grant_types,
            "token_endpoint": format!("{}{TOKEN_PATH}", server.uri()),
        })))
        .mount(server)
        .await;
}

pub fn token_body(access_token: &str, expires_in: i64) -> Value {
    json!({"access_token": access_token, "expires_in": expires_in})
}

/// Number of requests the server received on `request_path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}
