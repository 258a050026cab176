//! Discovery scenarios over the in-memory store

mod common;

use async_trait::async_trait;
use common::*;
use okms_secrets::discovery::{find_secrets, list_secret_paths};
use okms_secrets::{
    Error, FindRef, OkmsClient, OkmsSecretsClient, RemoteError, SecretData, SecretRecord,
    SecretsClient,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_root_enumerates_every_leaf() {
    let store = hierarchy_store();
    let mut paths = list_secret_paths(&store, String::new()).await.unwrap();
    paths.sort();
    assert_eq!(
        paths,
        vec!["path/secret2", "path/secrets/secret3", "path/to/secret1"]
    );
}

#[tokio::test]
async fn test_equivalent_prefixes() {
    let store = hierarchy_store();
    for prefix in ["path", "path/"] {
        let found = find_secrets(&store, &FindRef::under(prefix)).await.unwrap();
        assert_eq!(found.len(), 3, "prefix {:?}", prefix);
    }

    let whole = find_secrets(&store, &FindRef::under("/")).await.unwrap();
    let unset = find_secrets(&store, &FindRef::default()).await.unwrap();
    assert_eq!(whole, unset);
}

#[tokio::test]
async fn test_leading_slash_prefix_finds_nothing() {
    let store = hierarchy_store();
    let err = find_secrets(&store, &FindRef::under("/path"))
        .await
        .unwrap_err();
    assert!(err.is_empty_result());
}

#[tokio::test]
async fn test_unanchored_regex() {
    let store = hierarchy_store();
    let found = find_secrets(&store, &FindRef::default().matching("secret[12]"))
        .await
        .unwrap();
    let keys: Vec<&str> = found.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["path/secret2", "path/to/secret1"]);
}

#[tokio::test]
async fn test_get_all_through_client() {
    let store = Arc::new(hierarchy_store());
    let client = OkmsSecretsClient::new(store, STORE_NAME, false);
    let found = client
        .get_all_secrets(&FindRef::under("path/to"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found["path/to/secret1"], br#"{"one":"1"}"#);
}

/// Store whose listing never completes
struct StalledStore {
    listings: AtomicUsize,
}

#[async_trait]
impl OkmsClient for StalledStore {
    async fn get_secret(
        &self,
        _path: &str,
        _version: Option<u32>,
        _include_data: bool,
    ) -> Result<SecretRecord, RemoteError> {
        Err(RemoteError::NotFound)
    }

    async fn list_secret_keys(&self, _root: &str) -> Result<Vec<String>, RemoteError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        futures::future::pending().await
    }

    async fn create_secret(&self, _path: &str, _data: &SecretData) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn update_secret(
        &self,
        _path: &str,
        _data: &SecretData,
        _cas: Option<u32>,
    ) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn delete_secret(&self, _path: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn probe(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_dropping_the_future_cancels_enumeration() {
    let store = StalledStore {
        listings: AtomicUsize::new(0),
    };

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        find_secrets(&store, &FindRef::default()),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(store.listings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listing_error_is_not_an_empty_result() {
    let store = hierarchy_store().with_failing_listing("path/to");
    let err = find_secrets(&store, &FindRef::default()).await.unwrap_err();
    assert!(matches!(err, Error::Remote(_)));
    assert!(!err.is_empty_result());
}
