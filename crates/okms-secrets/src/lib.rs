//! Secret store connector for the OVHcloud OKMS secret manager
//!
//! This crate resolves secret references against OKMS and reconciles local
//! secret material into it:
//! - **Discovery**: recursive enumeration under a prefix with regex filtering
//! - **Reads**: single secrets, pinned versions and dotted property paths
//! - **Push**: diff-based create/update with optional compare-and-swap
//! - **Security**: zeroized credentials and audit logging of every mutation

// Core modules
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod memory;
pub mod okms;
pub mod property;
pub mod provider;
pub mod push;
pub mod read;
pub mod security;
pub mod types;

// Re-export commonly used items
pub use client::{OkmsSecretsClient, SecretsClient};
pub use config::{AuthMethod, SecretKeySelector, StoreSpec, ValidatedStore};
pub use error::{Error, KmsError, RemoteError, Result};
pub use okms::{OkmsClient, RestOkmsClient};
pub use provider::{CredentialResolver, OkmsProvider, ProviderRegistry, SecretStoreProvider};
pub use push::PushOutcome;
pub use security::{AuditLog, SecureString};
pub use types::{
    Capabilities, FindRef, LocalSecret, MetadataPolicy, NameMatcher, PushDescriptor, RemoteRef,
    SecretData, SecretRecord, SecretVersion, ValidationResult,
};
