//! Push reconciliation
//!
//! A push probes the current remote value, builds the candidate document from
//! local data, and only writes when the canonical JSON of the candidate
//! differs from what the store returned. Creates are used for absent secrets,
//! updates (optionally CAS-guarded) for existing ones.

use crate::error::{Error, Result};
use crate::okms::OkmsClient;
use crate::read::read_secret;
use crate::security::{AuditLog, AuditOperation};
use crate::types::{LocalSecret, PushDescriptor, RemoteRef, SecretData, SecretVersion};
use serde_json::Value;
use tracing::debug;

/// What a push ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Remote value already matched the candidate
    Unchanged,
    Created,
    Updated { cas: Option<SecretVersion> },
}

/// Interpret a local value as JSON, falling back to its literal text
pub fn parse_or_literal(raw: &[u8]) -> Value {
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

/// Build the document a push would write
pub fn build_secret_to_push(secret: &LocalSecret, descriptor: &PushDescriptor) -> SecretData {
    let mut values = SecretData::new();
    if let Some(data) = &secret.data {
        if descriptor.secret_key.is_empty() {
            for (key, raw) in data {
                values.insert(key.clone(), parse_or_literal(raw));
            }
        } else {
            let raw = data
                .get(&descriptor.secret_key)
                .map(Vec::as_slice)
                .unwrap_or_default();
            values.insert(descriptor.secret_key.clone(), parse_or_literal(raw));
        }
    }

    if descriptor.property.is_empty() {
        values
    } else {
        let mut wrapped = SecretData::new();
        wrapped.insert(descriptor.property.clone(), Value::Object(values));
        wrapped
    }
}

/// Whether `candidate` serializes to exactly the remote bytes
///
/// An empty remote value never matches.
pub fn is_unchanged(candidate: &SecretData, remote: &[u8]) -> Result<bool> {
    if remote.is_empty() {
        return Ok(false);
    }
    Ok(serde_json::to_vec(candidate)? == remote)
}

/// Reconciles local secrets into one store
pub struct Reconciler<'a> {
    client: &'a dyn OkmsClient,
    store: &'a str,
    cas_required: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn OkmsClient, store: &'a str, cas_required: bool) -> Self {
        Self {
            client,
            store,
            cas_required,
        }
    }

    /// Create or update `descriptor.remote_key` from `secret`
    pub async fn push(
        &self,
        secret: &LocalSecret,
        descriptor: &PushDescriptor,
    ) -> Result<PushOutcome> {
        if secret.is_empty() {
            return Err(Error::validation("cannot push empty secret"));
        }

        let probe = read_secret(self.client, &RemoteRef::new(descriptor.remote_key.as_str())).await;
        let (remote_value, current_version, exists) = match probe {
            Ok(fetched) => (fetched.value, fetched.current_version, true),
            Err(Error::NotFound) => {
                debug!("Secret {} does not exist yet", descriptor.remote_key);
                (Vec::new(), None, false)
            }
            Err(e) => return Err(e),
        };

        let candidate = build_secret_to_push(secret, descriptor);
        if is_unchanged(&candidate, &remote_value)? {
            debug!("Secret {} is up to date, skipping push", descriptor.remote_key);
            return Ok(PushOutcome::Unchanged);
        }

        let cas = if self.cas_required {
            current_version
        } else {
            None
        };

        if exists {
            let audit = AuditLog::new(AuditOperation::Update, &descriptor.remote_key, self.store)
                .with_cas(cas);
            let result = self
                .client
                .update_secret(&descriptor.remote_key, &candidate, cas)
                .await;
            audit.record(&result);
            result?;
            Ok(PushOutcome::Updated { cas })
        } else {
            let audit = AuditLog::new(AuditOperation::Create, &descriptor.remote_key, self.store);
            let result = self
                .client
                .create_secret(&descriptor.remote_key, &candidate)
                .await;
            audit.record(&result);
            result?;
            Ok(PushOutcome::Created)
        }
    }

    /// Remove `remote_key` from the store
    pub async fn delete(&self, remote_key: &str) -> Result<()> {
        if remote_key.is_empty() {
            return Err(Error::validation("remote key cannot be empty"));
        }
        let audit = AuditLog::new(AuditOperation::Delete, remote_key, self.store);
        let result = self.client.delete_secret(remote_key).await;
        audit.record(&result);
        Ok(result?)
    }
}
