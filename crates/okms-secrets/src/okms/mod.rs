//! Remote store client contract and implementations

pub mod rest;

use crate::error::RemoteError;
use crate::types::{SecretData, SecretRecord, SecretVersion};
use async_trait::async_trait;

/// Operations the connector needs from the OKMS secret manager
///
/// Every call returns `RemoteError::NotFound` when the path holds no secret so
/// callers can branch on absence without inspecting transport details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OkmsClient: Send + Sync {
    /// Read the secret at `path`, optionally pinned to `version`
    async fn get_secret(
        &self,
        path: &str,
        version: Option<SecretVersion>,
        include_data: bool,
    ) -> Result<SecretRecord, RemoteError>;

    /// List the next path segment of every entry under `root`
    ///
    /// Segments ending with `/` are namespaces, the rest are secrets.
    async fn list_secret_keys(&self, root: &str) -> Result<Vec<String>, RemoteError>;

    async fn create_secret(&self, path: &str, data: &SecretData) -> Result<(), RemoteError>;

    /// Write a new version; `cas` is the version the write expects to replace
    async fn update_secret(
        &self,
        path: &str,
        data: &SecretData,
        cas: Option<SecretVersion>,
    ) -> Result<(), RemoteError>;

    async fn delete_secret(&self, path: &str) -> Result<(), RemoteError>;

    /// Cheap authorized call used to check the store is reachable
    async fn probe(&self) -> Result<(), RemoteError>;
}

pub use rest::RestOkmsClient;
