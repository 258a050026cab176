//! Secret store configuration
//!
//! Configuration is loaded with the following precedence (low to high):
//! 1. Store spec file (YAML)
//! 2. Environment variables (OKMS_* prefix)
//!
//! The spec mirrors the store resource the control plane hands over, where
//! authentication is a pair of optional blocks. `StoreSpec::validate` turns it
//! into a `ValidatedStore` whose `AuthMethod` has exactly one variant.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

fn default_timeout_seconds() -> u64 {
    30
}

/// Store configuration as written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSpec {
    /// Base URL of the OKMS REST endpoint
    #[serde(default)]
    pub server: String,
    /// OKMS domain identifier
    #[serde(default, rename = "okmsid")]
    pub okms_id: String,
    /// Send the probed version with every update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_required: Option<bool>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub auth: AuthSpec,
}

impl Default for StoreSpec {
    fn default() -> Self {
        Self {
            server: String::new(),
            okms_id: String::new(),
            cas_required: None,
            timeout_seconds: default_timeout_seconds(),
            auth: AuthSpec::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtls: Option<MtlsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtlsSpec {
    #[serde(default, rename = "certSecretRef", skip_serializing_if = "Option::is_none")]
    pub certificate: Option<SecretKeySelector>,
    #[serde(default, rename = "keySecretRef", skip_serializing_if = "Option::is_none")]
    pub key: Option<SecretKeySelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    #[serde(default, rename = "tokenSecretRef", skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretKeySelector>,
}

/// Points at one key of a control-plane secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Authentication method selected by a validated store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Token {
        token: SecretKeySelector,
    },
    Mtls {
        certificate: SecretKeySelector,
        key: SecretKeySelector,
    },
}

/// Store configuration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStore {
    pub server: Url,
    pub okms_id: Uuid,
    pub cas_required: bool,
    pub timeout: Duration,
    pub auth: AuthMethod,
}

impl StoreSpec {
    /// Parse a store spec from YAML
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Load a store spec file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let spec = Self::from_yaml_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path.display(), e)))?;
        debug!("Loaded store spec from {}", path.display());
        Ok(spec.apply_env_overrides())
    }

    /// Apply OKMS_SERVER, OKMS_ID, OKMS_CAS_REQUIRED and OKMS_TIMEOUT
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(server) = std::env::var("OKMS_SERVER") {
            self.server = server;
        }
        if let Ok(okms_id) = std::env::var("OKMS_ID") {
            self.okms_id = okms_id;
        }
        if let Ok(cas) = std::env::var("OKMS_CAS_REQUIRED") {
            self.cas_required = Some(cas == "true" || cas == "1");
        }
        if let Some(timeout) = std::env::var("OKMS_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.timeout_seconds = timeout;
        }
        self
    }

    /// Statically validate the spec
    pub fn validate(&self) -> Result<ValidatedStore> {
        if self.server.is_empty() {
            return Err(Error::invalid_config("server cannot be empty"));
        }
        let server = Url::parse(&self.server)
            .map_err(|e| Error::invalid_config(format!("invalid server URL {}: {}", self.server, e)))?;
        let okms_id = Uuid::parse_str(&self.okms_id)
            .map_err(|e| Error::invalid_config(format!("invalid okmsid {}: {}", self.okms_id, e)))?;

        let auth = match (&self.auth.mtls, &self.auth.token) {
            (None, None) => return Err(Error::invalid_config("missing authentication method")),
            (Some(_), Some(_)) => {
                return Err(Error::invalid_config(
                    "only one authentication method allowed (mtls | token)",
                ))
            }
            (Some(mtls), None) => match (&mtls.certificate, &mtls.key) {
                (Some(certificate), Some(key)) => AuthMethod::Mtls {
                    certificate: certificate.clone(),
                    key: key.clone(),
                },
                _ => return Err(Error::invalid_config("missing tls certificate or key")),
            },
            (None, Some(token)) => match &token.token {
                Some(selector) => AuthMethod::Token {
                    token: selector.clone(),
                },
                None => {
                    return Err(Error::invalid_config(
                        "auth.token.tokenSecretRef cannot be empty",
                    ))
                }
            },
        };

        Ok(ValidatedStore {
            server,
            okms_id,
            cas_required: self.cas_required.unwrap_or(false),
            timeout: Duration::from_secs(self.timeout_seconds),
            auth,
        })
    }
}
