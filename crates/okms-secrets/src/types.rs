//! Core types for the OKMS connector

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Version counter the store assigns on every write; doubles as the CAS token
pub type SecretVersion = u32;

/// Full document stored at a secret path
pub type SecretData = Map<String, Value>;

/// Whether provider metadata should be fetched alongside a secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetadataPolicy {
    #[default]
    None,
    Fetch,
}

/// Request for a single secret
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRef {
    /// Secret path
    pub key: String,
    /// Dotted path into the secret value; empty selects the whole value
    pub property: String,
    /// Pinned version; empty selects the latest
    pub version: String,
    pub metadata_policy: MetadataPolicy,
}

impl RemoteRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_metadata_policy(mut self, policy: MetadataPolicy) -> Self {
        self.metadata_policy = policy;
        self
    }
}

/// Name filter for a read-all request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatcher {
    pub regexp: String,
}

/// Request for every secret under a prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindRef {
    pub path: Option<String>,
    pub name: Option<NameMatcher>,
}

impl FindRef {
    pub fn under(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            name: None,
        }
    }

    pub fn matching(mut self, regexp: impl Into<String>) -> Self {
        self.name = Some(NameMatcher {
            regexp: regexp.into(),
        });
        self
    }
}

/// Mapping rule from local key/value pairs to one remote secret
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushDescriptor {
    pub remote_key: String,
    /// Single local key to push; empty pushes every key
    pub secret_key: String,
    /// Property to nest the pushed object under; empty pushes it at the top level
    pub property: String,
}

impl PushDescriptor {
    pub fn new(remote_key: impl Into<String>) -> Self {
        Self {
            remote_key: remote_key.into(),
            ..Default::default()
        }
    }

    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = secret_key.into();
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }
}

/// Local secret material handed over by the control plane
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LocalSecret {
    pub data: Option<BTreeMap<String, Vec<u8>>>,
}

impl LocalSecret {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            data: Some(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.as_ref().is_none_or(|d| d.is_empty())
    }
}

impl fmt::Debug for LocalSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            None => write!(f, "LocalSecret(None)"),
            Some(data) => {
                let keys: Vec<&str> = data.keys().map(String::as_str).collect();
                write!(f, "LocalSecret(keys={:?}, [REDACTED])", keys)
            }
        }
    }
}

/// A secret as returned by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretRecord {
    pub data: SecretData,
    pub current_version: Option<SecretVersion>,
}

/// Outcome of the store reachability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Ready,
}

/// What a store backend supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capabilities {
    ReadWrite,
}
