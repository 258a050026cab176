//! Mock server helpers for the OKMS REST API

use super::constants::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve a secret read at `secret_path`
pub async fn mock_get_secret(server: &MockServer, secret_path: &str, data: Value, version: u32) {
    Mock::given(method("GET"))
        .and(path(format!("{}/secret/{}", api_prefix(), secret_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"currentVersion": version},
            "version": {"data": data}
        })))
        .mount(server)
        .await;
}

/// Serve a metadata listing under `root` (empty for the domain root)
pub async fn mock_list(server: &MockServer, root: &str, keys: &[&str]) {
    let endpoint = if root.is_empty() {
        format!("{}/metadata", api_prefix())
    } else {
        format!("{}/metadata/{}", api_prefix(), root)
    };
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"keys": keys}})))
        .mount(server)
        .await;
}

/// KMS error body
pub fn kms_error(code: u32, message: &str) -> Value {
    json!({
        "error_code": code,
        "error_id": "err-id",
        "errors": [message],
        "request_id": "req-id"
    })
}

/// Answer `verb` on `endpoint` with a KMS error
pub async fn mock_kms_error(
    server: &MockServer,
    verb: &str,
    endpoint: String,
    status: u16,
    code: u32,
) {
    Mock::given(method(verb))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_json(kms_error(code, "failure")))
        .mount(server)
        .await;
}
