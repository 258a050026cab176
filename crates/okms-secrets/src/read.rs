//! Single-secret read path shared by lookups, discovery and push

use crate::error::{Error, Result};
use crate::okms::OkmsClient;
use crate::property;
use crate::types::{MetadataPolicy, RemoteRef, SecretVersion};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Bytes resolved for a remote reference plus the store's current version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSecret {
    pub value: Vec<u8>,
    pub current_version: Option<SecretVersion>,
}

/// Parse a pinned version; empty means latest
pub fn decode_version(version: &str) -> Result<Option<SecretVersion>> {
    if version.is_empty() {
        return Ok(None);
    }
    let parsed: u64 = version
        .parse()
        .map_err(|_| Error::validation(format!("invalid secret version \"{}\"", version)))?;
    let version = SecretVersion::try_from(parsed)
        .map_err(|_| Error::validation("overflow occurred while decoding secret version"))?;
    Ok(Some(version))
}

/// Check a reference before any remote call is made
pub fn validate_ref(remote_ref: &RemoteRef) -> Result<Option<SecretVersion>> {
    if remote_ref.metadata_policy == MetadataPolicy::Fetch {
        return Err(Error::validation("fetch metadata policy not supported"));
    }
    if remote_ref.key.is_empty() {
        return Err(Error::validation("remote key cannot be empty"));
    }
    decode_version(&remote_ref.version)
}

/// Resolve one remote reference
///
/// A missing secret surfaces as `Error::NotFound`.
pub async fn read_secret(client: &dyn OkmsClient, remote_ref: &RemoteRef) -> Result<FetchedSecret> {
    let version = validate_ref(remote_ref)?;

    let record = client.get_secret(&remote_ref.key, version, true).await?;
    debug!(
        "Read secret {} (requested version {:?}, current {:?})",
        remote_ref.key, version, record.current_version
    );

    let value = property::extract(&record.data, &remote_ref.property)?;
    Ok(FetchedSecret {
        value,
        current_version: record.current_version,
    })
}

/// Split a JSON object value into per-key bytes
///
/// String values are returned raw, everything else as JSON text. An empty
/// value yields an empty map.
pub fn secret_map_from_bytes(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }
    let object: serde_json::Map<String, Value> = serde_json::from_slice(bytes)?;
    object
        .iter()
        .map(|(key, value)| -> Result<(String, Vec<u8>)> {
            let bytes = match value {
                Value::String(s) => s.clone().into_bytes(),
                other => serde_json::to_vec(other)?,
            };
            Ok((key.clone(), bytes))
        })
        .collect()
}
