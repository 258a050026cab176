//! In-memory secret manager
//!
//! Behaves like the OKMS secret manager for the calls the connector makes:
//! hierarchical listing that returns one segment per entry, per-path version
//! counters, and CAS rejection on stale versions. Every mutation is recorded
//! so callers can assert on exactly what was written.

use crate::error::{KmsError, RemoteError};
use crate::okms::OkmsClient;
use crate::types::{SecretData, SecretRecord, SecretVersion};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Error code the store answers with when a CAS precondition fails
pub const CAS_MISMATCH_CODE: u32 = 17125380;

/// A recorded mutation
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCall {
    Create {
        path: String,
        data: SecretData,
    },
    Update {
        path: String,
        data: SecretData,
        cas: Option<SecretVersion>,
    },
    Delete {
        path: String,
    },
}

#[derive(Debug, Default)]
struct State {
    secrets: BTreeMap<String, (SecretData, SecretVersion)>,
    writes: Vec<WriteCall>,
    listed: Vec<String>,
    failing_roots: BTreeSet<String>,
    failing_reads: BTreeSet<String>,
    vanished: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryOkms {
    state: Mutex<State>,
}

impl InMemoryOkms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret at version 1 without recording a write
    pub fn with_secret(self, path: &str, data: SecretData) -> Self {
        self.lock().secrets.insert(path.to_string(), (data, 1));
        self
    }

    /// Make listing `root` fail with a server error
    pub fn with_failing_listing(self, root: &str) -> Self {
        self.lock().failing_roots.insert(root.to_string());
        self
    }

    /// Make reading `path` fail with a server error
    pub fn with_failing_read(self, path: &str) -> Self {
        self.lock().failing_reads.insert(path.to_string());
        self
    }

    /// Keep `path` in listings but answer reads with not-found
    pub fn with_vanished(self, path: &str) -> Self {
        self.lock().vanished.insert(path.to_string());
        self
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.lock().writes.clone()
    }

    /// Roots passed to `list_secret_keys`, in call order
    pub fn listed_roots(&self) -> Vec<String> {
        self.lock().listed.clone()
    }

    pub fn current(&self, path: &str) -> Option<(SecretData, SecretVersion)> {
        self.lock().secrets.get(path).cloned()
    }

    /// Simulate a concurrent writer bumping the version at `path`
    pub fn bump_version(&self, path: &str) {
        if let Some((_, version)) = self.lock().secrets.get_mut(path) {
            *version += 1;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn server_error(message: &str) -> RemoteError {
        RemoteError::Api {
            status: 500,
            error: KmsError {
                errors: vec![message.to_string()],
                ..Default::default()
            },
        }
    }
}

/// Next-segment view of `path` relative to `root`, or None when outside it
fn next_segment(root: &str, path: &str) -> Option<String> {
    let rest = if root.is_empty() {
        path
    } else {
        path.strip_prefix(root)?.strip_prefix('/')?
    };
    match rest.find('/') {
        Some(idx) => Some(format!("{}/", &rest[..idx])),
        None => Some(rest.to_string()),
    }
}

#[async_trait]
impl OkmsClient for InMemoryOkms {
    async fn get_secret(
        &self,
        path: &str,
        version: Option<SecretVersion>,
        include_data: bool,
    ) -> Result<SecretRecord, RemoteError> {
        let state = self.lock();
        if state.failing_reads.contains(path) {
            return Err(Self::server_error("read failed"));
        }
        if state.vanished.contains(path) {
            return Err(RemoteError::NotFound);
        }
        let (data, current) = state.secrets.get(path).ok_or(RemoteError::NotFound)?;
        if let Some(v) = version {
            // Only the current version is retained
            if v != *current {
                return Err(RemoteError::NotFound);
            }
        }
        Ok(SecretRecord {
            data: if include_data {
                data.clone()
            } else {
                SecretData::new()
            },
            current_version: Some(*current),
        })
    }

    async fn list_secret_keys(&self, root: &str) -> Result<Vec<String>, RemoteError> {
        let mut state = self.lock();
        state.listed.push(root.to_string());
        if state.failing_roots.contains(root) {
            return Err(Self::server_error("listing failed"));
        }

        let mut seen = BTreeSet::new();
        let mut keys = Vec::new();
        let paths = state.secrets.keys().chain(state.vanished.iter());
        for path in paths {
            if let Some(segment) = next_segment(root, path) {
                if seen.insert(segment.clone()) {
                    keys.push(segment);
                }
            }
        }
        Ok(keys)
    }

    async fn create_secret(&self, path: &str, data: &SecretData) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.writes.push(WriteCall::Create {
            path: path.to_string(),
            data: data.clone(),
        });
        if state.secrets.contains_key(path) {
            return Err(RemoteError::Api {
                status: 409,
                error: KmsError {
                    errors: vec![format!("secret {} already exists", path)],
                    ..Default::default()
                },
            });
        }
        state.secrets.insert(path.to_string(), (data.clone(), 1));
        Ok(())
    }

    async fn update_secret(
        &self,
        path: &str,
        data: &SecretData,
        cas: Option<SecretVersion>,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.writes.push(WriteCall::Update {
            path: path.to_string(),
            data: data.clone(),
            cas,
        });
        let (stored, version) = state
            .secrets
            .get_mut(path)
            .ok_or(RemoteError::NotFound)?;
        if let Some(expected) = cas {
            if expected != *version {
                return Err(RemoteError::Api {
                    status: 400,
                    error: KmsError {
                        error_code: CAS_MISMATCH_CODE,
                        errors: vec![format!(
                            "cas mismatch: expected {}, current {}",
                            expected, version
                        )],
                        ..Default::default()
                    },
                });
            }
        }
        *stored = data.clone();
        *version += 1;
        Ok(())
    }

    async fn delete_secret(&self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.writes.push(WriteCall::Delete {
            path: path.to_string(),
        });
        state
            .secrets
            .remove(path)
            .map(|_| ())
            .ok_or(RemoteError::NotFound)
    }

    async fn probe(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}
