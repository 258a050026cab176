//! Secret discovery: prefix normalization, recursive enumeration and
//! regex-filtered fetching
//!
//! The OKMS metadata listing only returns the next path segment under the
//! queried root, with a trailing `/` marking a namespace. Given the secrets
//! `path/to/secret1`, `path/secret2` and `path/secrets/secret3`, listing
//! `path` answers `["to/", "secret2", "secrets/"]`; the enumerator recurses
//! into `path/to` and `path/secrets` and keeps `path/secret2` as a leaf.

use crate::error::{Error, Result};
use crate::okms::OkmsClient;
use crate::read::read_secret;
use crate::types::{FindRef, NameMatcher, RemoteRef};
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Normalize a user prefix into a traversal root
///
/// Returns None when the prefix can never match a secret: a prefix ending in
/// `//`, or one that still starts with `/` once its trailing slash is gone.
/// `None`, `""` and `"/"` all select the whole namespace.
pub fn resolve_root(prefix: Option<&str>) -> Option<String> {
    let prefix = match prefix {
        None | Some("") => return Some(String::new()),
        Some(p) => p,
    };
    if prefix.ends_with("//") {
        return None;
    }
    let root = prefix.strip_suffix('/').unwrap_or(prefix);
    if root.starts_with('/') {
        return None;
    }
    Some(root.to_string())
}

fn join(root: &str, segment: &str) -> String {
    if root.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", root, segment)
    }
}

/// Collect every secret path reachable under `root`
///
/// Walks depth-first with one listing in flight at a time. Any listing error
/// aborts the walk and discards what was collected so far.
pub fn list_secret_paths(
    client: &dyn OkmsClient,
    root: String,
) -> BoxFuture<'_, Result<Vec<String>>> {
    async move {
        let keys = client.list_secret_keys(&root).await?;
        debug!("Listed {} entries under '{}'", keys.len(), root);

        let mut paths = Vec::new();
        for key in keys {
            if key.is_empty() || key.starts_with('/') {
                continue;
            }
            match key.strip_suffix('/') {
                Some(namespace) => {
                    let nested = list_secret_paths(client, join(&root, namespace)).await?;
                    paths.extend(nested);
                }
                None => paths.push(join(&root, &key)),
            }
        }
        Ok(paths)
    }
    .boxed()
}

/// Compile the optional name filter
pub fn compile_matcher(name: Option<&NameMatcher>) -> Result<Option<Regex>> {
    name.map(|n| {
        Regex::new(&n.regexp)
            .map_err(|e| Error::validation(format!("failed to parse regexp: {}", e)))
    })
    .transpose()
}

/// Fetch every path accepted by `matcher`
///
/// Paths that vanished between listing and fetching are skipped; any other
/// read error aborts the batch.
pub async fn fetch_matching(
    client: &dyn OkmsClient,
    paths: &[String],
    matcher: Option<&Regex>,
) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut secrets = BTreeMap::new();
    for path in paths {
        if let Some(re) = matcher {
            if !re.is_match(path) {
                continue;
            }
        }
        match read_secret(client, &RemoteRef::new(path.as_str())).await {
            Ok(fetched) => {
                secrets.insert(path.clone(), fetched.value);
            }
            Err(Error::NotFound) => debug!("Secret {} disappeared before fetch, skipping", path),
            Err(e) => return Err(e),
        }
    }

    if secrets.is_empty() {
        return Err(Error::NoSecretsMatched);
    }
    Ok(secrets)
}

/// Resolve a find request into path → value
pub async fn find_secrets(
    client: &dyn OkmsClient,
    find: &FindRef,
) -> Result<BTreeMap<String, Vec<u8>>> {
    let matcher = compile_matcher(find.name.as_ref())?;

    let paths = match resolve_root(find.path.as_deref()) {
        Some(root) => list_secret_paths(client, root).await?,
        None => {
            debug!("Prefix {:?} cannot match any secret", find.path);
            Vec::new()
        }
    };
    if paths.is_empty() {
        return Err(Error::NoSecretsFound);
    }
    debug!("Enumerated {} secrets", paths.len());

    fetch_matching(client, &paths, matcher.as_ref()).await
}
