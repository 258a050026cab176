//! Secrets client: the operations a secret store exposes to the control plane

use crate::discovery;
use crate::error::{Error, Result};
use crate::okms::OkmsClient;
use crate::push::{PushOutcome, Reconciler};
use crate::read::{self, read_secret};
use crate::types::{FindRef, LocalSecret, PushDescriptor, RemoteRef, ValidationResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Trait for secret store clients
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Resolve a single reference to bytes
    async fn get_secret(&self, remote_ref: &RemoteRef) -> Result<Vec<u8>>;

    /// Resolve a single reference whose value is a JSON object into key → bytes
    async fn get_secret_map(&self, remote_ref: &RemoteRef) -> Result<BTreeMap<String, Vec<u8>>>;

    /// Enumerate, filter and fetch every secret selected by `find`
    async fn get_all_secrets(&self, find: &FindRef) -> Result<BTreeMap<String, Vec<u8>>>;

    /// Reconcile a local secret into the store
    async fn push_secret(
        &self,
        secret: &LocalSecret,
        descriptor: &PushDescriptor,
    ) -> Result<PushOutcome>;

    async fn delete_secret(&self, remote_key: &str) -> Result<()>;

    /// Returns Ok(false) when nothing is stored at the reference
    async fn secret_exists(&self, remote_ref: &RemoteRef) -> Result<bool>;

    /// Check the store is reachable and the credentials are accepted
    async fn validate(&self) -> Result<ValidationResult>;
}

/// Secrets client for one OKMS domain
pub struct OkmsSecretsClient {
    okms: Arc<dyn OkmsClient>,
    store: String,
    cas_required: bool,
}

impl OkmsSecretsClient {
    /// `store` names the domain in audit entries
    pub fn new(okms: Arc<dyn OkmsClient>, store: impl Into<String>, cas_required: bool) -> Self {
        Self {
            okms,
            store: store.into(),
            cas_required,
        }
    }

    pub fn cas_required(&self) -> bool {
        self.cas_required
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(self.okms.as_ref(), &self.store, self.cas_required)
    }
}

#[async_trait]
impl SecretsClient for OkmsSecretsClient {
    async fn get_secret(&self, remote_ref: &RemoteRef) -> Result<Vec<u8>> {
        Ok(read_secret(self.okms.as_ref(), remote_ref).await?.value)
    }

    async fn get_secret_map(&self, remote_ref: &RemoteRef) -> Result<BTreeMap<String, Vec<u8>>> {
        let value = self.get_secret(remote_ref).await?;
        read::secret_map_from_bytes(&value)
    }

    async fn get_all_secrets(&self, find: &FindRef) -> Result<BTreeMap<String, Vec<u8>>> {
        discovery::find_secrets(self.okms.as_ref(), find).await
    }

    async fn push_secret(
        &self,
        secret: &LocalSecret,
        descriptor: &PushDescriptor,
    ) -> Result<PushOutcome> {
        self.reconciler().push(secret, descriptor).await
    }

    async fn delete_secret(&self, remote_key: &str) -> Result<()> {
        self.reconciler().delete(remote_key).await
    }

    async fn secret_exists(&self, remote_ref: &RemoteRef) -> Result<bool> {
        let version = read::validate_ref(remote_ref)?;
        match self.okms.get_secret(&remote_ref.key, version, false).await {
            Ok(_) => Ok(true),
            Err(e) => match Error::from(e) {
                Error::NotFound => {
                    debug!("Secret {} does not exist", remote_ref.key);
                    Ok(false)
                }
                other => Err(other),
            },
        }
    }

    async fn validate(&self) -> Result<ValidationResult> {
        self.okms.probe().await?;
        Ok(ValidationResult::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KmsError, RemoteError};
    use crate::memory::InMemoryOkms;
    use crate::okms::MockOkmsClient;
    use serde_json::json;

    fn store() -> Arc<InMemoryOkms> {
        Arc::new(
            InMemoryOkms::new()
                .with_secret(
                    "app/db",
                    json!({"user": "admin", "port": 5432, "tls": {"enabled": true}})
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
                .with_secret(
                    "app/plain",
                    json!({"value": "text"}).as_object().cloned().unwrap(),
                ),
        )
    }

    fn client(okms: Arc<InMemoryOkms>) -> OkmsSecretsClient {
        OkmsSecretsClient::new(okms, "test-store", false)
    }

    #[tokio::test]
    async fn test_get_secret_map() {
        let client = client(store());
        let map = client.get_secret_map(&RemoteRef::new("app/db")).await.unwrap();
        assert_eq!(map["user"], b"admin");
        assert_eq!(map["port"], b"5432");
        assert_eq!(map["tls"], br#"{"enabled":true}"#);
    }

    #[tokio::test]
    async fn test_get_secret_map_rejects_scalar_property() {
        let client = client(store());
        let result = client
            .get_secret_map(&RemoteRef::new("app/plain").with_property("value"))
            .await;
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_secret_exists() {
        let client = client(store());
        assert!(client.secret_exists(&RemoteRef::new("app/db")).await.unwrap());
        assert!(!client.secret_exists(&RemoteRef::new("app/none")).await.unwrap());
        assert!(client
            .secret_exists(&RemoteRef::new(""))
            .await
            .unwrap_err()
            .is_validation());
    }

    #[tokio::test]
    async fn test_secret_exists_reads_without_data() {
        let mut okms = MockOkmsClient::new();
        okms.expect_get_secret()
            .withf(|path, version, include_data| path == "k" && version.is_none() && !include_data)
            .times(1)
            .returning(|_, _, _| Ok(Default::default()));

        let client = OkmsSecretsClient::new(Arc::new(okms), "test-store", false);
        assert!(client.secret_exists(&RemoteRef::new("k")).await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_ready() {
        let client = client(store());
        assert_eq!(client.validate().await.unwrap(), ValidationResult::Ready);
    }

    #[tokio::test]
    async fn test_validate_propagates_probe_failure() {
        let mut okms = MockOkmsClient::new();
        okms.expect_probe().times(1).returning(|| {
            Err(RemoteError::from_api(
                401,
                KmsError {
                    error_code: 17125379,
                    ..Default::default()
                },
            ))
        });

        let client = OkmsSecretsClient::new(Arc::new(okms), "test-store", false);
        let err = client.validate().await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_delete_through_client() {
        let okms = store();
        let client = client(okms.clone());
        client.delete_secret("app/db").await.unwrap();
        assert!(okms.current("app/db").is_none());
        assert!(client.delete_secret("app/db").await.unwrap_err().is_not_found());
    }
}
