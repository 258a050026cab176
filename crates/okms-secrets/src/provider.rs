//! Store providers and the registry the host builds at startup
//!
//! A provider validates store specs and turns a validated spec plus host
//! credentials into a ready [`SecretsClient`]. Credential material lives in
//! the control plane, so providers only see it through [`CredentialResolver`].

use crate::client::{OkmsSecretsClient, SecretsClient};
use crate::config::{AuthMethod, SecretKeySelector, StoreSpec};
use crate::error::{Error, Result};
use crate::okms::rest::{RestAuth, RestOkmsClient};
use crate::security::SecureString;
use crate::types::Capabilities;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Host hook resolving a secret key selector to its value
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, selector: &SecretKeySelector) -> anyhow::Result<SecureString>;
}

/// Trait for secret store providers
#[async_trait]
pub trait SecretStoreProvider: Send + Sync {
    /// Provider name used for registration
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Static checks only, no remote call
    fn validate_store(&self, spec: &StoreSpec) -> Result<()>;

    async fn new_client(
        &self,
        spec: &StoreSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Box<dyn SecretsClient>>;
}

/// Provider for the OVHcloud OKMS secret manager
#[derive(Debug, Clone, Copy, Default)]
pub struct OkmsProvider;

impl OkmsProvider {
    pub const NAME: &'static str = "ovh";

    pub fn new() -> Self {
        Self
    }
}

/// Resolve a selector, rejecting empty material with `empty_message`
async fn resolve_nonempty(
    credentials: &dyn CredentialResolver,
    selector: &SecretKeySelector,
    empty_message: &str,
) -> Result<SecureString> {
    let value = credentials.resolve(selector).await.map_err(|e| {
        Error::credentials(format!(
            "failed to resolve secret {}/{}: {:#}",
            selector.name, selector.key, e
        ))
    })?;
    if value.is_empty() {
        return Err(Error::credentials(empty_message));
    }
    Ok(value)
}

#[async_trait]
impl SecretStoreProvider for OkmsProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ReadWrite
    }

    fn validate_store(&self, spec: &StoreSpec) -> Result<()> {
        spec.validate().map(|_| ())
    }

    async fn new_client(
        &self,
        spec: &StoreSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Box<dyn SecretsClient>> {
        let store = spec.validate()?;

        let auth = match &store.auth {
            AuthMethod::Token { token } => {
                debug!("Using token authentication for OKMS {}", store.okms_id);
                RestAuth::Token(
                    resolve_nonempty(
                        credentials,
                        token,
                        "ovh store auth.token.tokenSecretRef cannot be empty",
                    )
                    .await?,
                )
            }
            AuthMethod::Mtls { certificate, key } => {
                debug!("Using mTLS authentication for OKMS {}", store.okms_id);
                let key = resolve_nonempty(
                    credentials,
                    key,
                    "ovh store auth.mtls.keySecretRef cannot be empty",
                )
                .await?;
                let certificate = resolve_nonempty(
                    credentials,
                    certificate,
                    "ovh store auth.mtls.certSecretRef cannot be empty",
                )
                .await?;
                RestAuth::Mtls { certificate, key }
            }
        };

        let transport = RestOkmsClient::new(&store.server, store.okms_id, auth, store.timeout)?;
        info!(
            "Connected OKMS secrets client to {} (cas_required={})",
            store.server, store.cas_required
        );
        Ok(Box::new(OkmsSecretsClient::new(
            Arc::new(transport),
            store.okms_id.to_string(),
            store.cas_required,
        )))
    }
}

/// Explicit provider registry
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn SecretStoreProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every provider this crate ships
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OkmsProvider::new()));
        registry
    }

    /// Register a provider, replacing any provider with the same name
    pub fn register(&mut self, provider: Arc<dyn SecretStoreProvider>) {
        debug!("Registering secret store provider {}", provider.name());
        self.providers.insert(provider.name(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SecretStoreProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
