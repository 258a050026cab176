//! Builders for secret documents, seeded stores and clients

use super::constants::*;
use okms_secrets::memory::InMemoryOkms;
use okms_secrets::okms::rest::RestAuth;
use okms_secrets::{RestOkmsClient, SecretData, SecureString};
use serde_json::Value;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Convert a `json!` object literal into a secret document
pub fn doc(value: Value) -> SecretData {
    value
        .as_object()
        .cloned()
        .expect("secret documents are JSON objects")
}

/// Store holding the canonical hierarchy used across discovery tests
pub fn hierarchy_store() -> InMemoryOkms {
    InMemoryOkms::new()
        .with_secret("path/to/secret1", doc(serde_json::json!({"one": "1"})))
        .with_secret("path/secret2", doc(serde_json::json!({"two": "2"})))
        .with_secret("path/secrets/secret3", doc(serde_json::json!({"three": "3"})))
}

/// Token-authenticated REST client pointed at `server_uri`
pub fn rest_client(server_uri: &str) -> RestOkmsClient {
    rest_client_with_timeout(server_uri, Duration::from_secs(5))
}

pub fn rest_client_with_timeout(server_uri: &str, timeout: Duration) -> RestOkmsClient {
    RestOkmsClient::new(
        &Url::parse(server_uri).expect("mock server URI is valid"),
        Uuid::parse_str(OKMS_ID).expect("test OKMS id is a UUID"),
        RestAuth::Token(SecureString::from(TEST_TOKEN)),
        timeout,
    )
    .expect("REST client builds")
}
