//! OKMS REST transport
//!
//! Talks to the secret manager endpoints under `{server}/api/{okmsId}/v2`.
//! Error bodies are decoded into [`KmsError`] and the not-found code (or a
//! bare 404) is folded into `RemoteError::NotFound`.

use super::OkmsClient;
use crate::error::{Error, KmsError, RemoteError, Result};
use crate::security::SecureString;
use crate::types::{SecretData, SecretRecord, SecretVersion};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

/// Credential material the transport authenticates with
pub enum RestAuth {
    /// Sent as `Authorization: Bearer <token>`
    Token(SecureString),
    /// PEM client certificate and private key
    Mtls {
        certificate: SecureString,
        key: SecureString,
    },
}

#[derive(Debug, Default, Deserialize)]
struct GetSecretResponse {
    #[serde(default)]
    metadata: Option<SecretMetadata>,
    #[serde(default)]
    version: Option<VersionBody>,
}

#[derive(Debug, Default, Deserialize)]
struct SecretMetadata {
    #[serde(default, rename = "currentVersion")]
    current_version: Option<SecretVersion>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionBody {
    #[serde(default)]
    data: Option<SecretData>,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Option<ListData>,
}

#[derive(Debug, Default, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    path: &'a str,
    version: WriteVersion<'a>,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    version: WriteVersion<'a>,
}

#[derive(Serialize)]
struct WriteVersion<'a> {
    data: &'a SecretData,
}

/// `OkmsClient` backed by the OKMS REST API
pub struct RestOkmsClient {
    http: reqwest::Client,
    base: Url,
}

impl RestOkmsClient {
    /// Build a client for the domain `okms_id` served at `server`
    pub fn new(server: &Url, okms_id: Uuid, auth: RestAuth, timeout: Duration) -> Result<Self> {
        let base = base_url(server, okms_id)?;
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("okms-secrets/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout);

        match auth {
            RestAuth::Token(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| Error::credentials("token contains invalid header characters"))?;
                value.set_sensitive(true);
                let mut headers = HeaderMap::new();
                headers.insert(AUTHORIZATION, value);
                builder = builder.default_headers(headers);
            }
            RestAuth::Mtls { certificate, key } => {
                let pem = SecureString::new(format!("{}\n{}", certificate.as_str(), key.as_str()));
                let identity = reqwest::Identity::from_pem(pem.as_str().as_bytes())
                    .map_err(|e| Error::credentials(format!("invalid client certificate: {}", e)))?;
                builder = builder.identity(identity);
            }
        }

        let http = builder.build().map_err(RemoteError::Transport)?;
        debug!("Created OKMS REST client for {}", base);
        Ok(Self { http, base })
    }

    /// Endpoint URL for `kind` (`secret` or `metadata`) and an optional path
    fn endpoint(&self, kind: &str, path: &str) -> std::result::Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                RemoteError::decode(format!("server URL {} cannot be a base", self.base))
            })?;
            segments.pop_if_empty().push(kind);
            // Empty segments are kept: `a//b` and `a/b` are distinct secrets
            if !path.is_empty() {
                segments.extend(path.split('/'));
            }
        }
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> std::result::Result<T, RemoteError> {
        let body = check(response).await?.bytes().await?;
        if body.is_empty() {
            return Err(RemoteError::decode("empty response body"));
        }
        serde_json::from_slice(&body).map_err(|e| RemoteError::decode(e.to_string()))
    }
}

fn base_url(server: &Url, okms_id: Uuid) -> Result<Url> {
    let mut url = server.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| Error::invalid_config(format!("server URL {} cannot be a base", server)))?
        .pop_if_empty()
        .extend(["api", &okms_id.to_string(), "v2"]);
    Ok(url)
}

/// Turn a non-success response into a `RemoteError`
async fn check(response: Response) -> std::result::Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound);
    }

    let body = response.text().await.unwrap_or_default();
    trace!("OKMS error response ({}): {}", status, body);
    let error = match serde_json::from_str::<KmsError>(&body) {
        Ok(error) if error.error_code != 0 => error,
        _ => KmsError {
            errors: if body.is_empty() { Vec::new() } else { vec![body] },
            ..Default::default()
        },
    };
    Err(RemoteError::from_api(status.as_u16(), error))
}

#[async_trait]
impl OkmsClient for RestOkmsClient {
    async fn get_secret(
        &self,
        path: &str,
        version: Option<SecretVersion>,
        include_data: bool,
    ) -> std::result::Result<SecretRecord, RemoteError> {
        let mut url = self.endpoint("secret", path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("includeData", if include_data { "true" } else { "false" });
            if let Some(version) = version {
                query.append_pair("version", &version.to_string());
            }
        }
        debug!("GET secret {}", path);

        let response: GetSecretResponse = Self::decode(self.http.get(url).send().await?).await?;
        Ok(SecretRecord {
            data: response
                .version
                .and_then(|v| v.data)
                .unwrap_or_default(),
            current_version: response.metadata.and_then(|m| m.current_version),
        })
    }

    async fn list_secret_keys(&self, root: &str) -> std::result::Result<Vec<String>, RemoteError> {
        let mut url = self.endpoint("metadata", root)?;
        url.query_pairs_mut().append_pair("list", "true");
        debug!("LIST metadata '{}'", root);

        let response: ListResponse = Self::decode(self.http.get(url).send().await?).await?;
        Ok(response.data.map(|d| d.keys).unwrap_or_default())
    }

    async fn create_secret(
        &self,
        path: &str,
        data: &SecretData,
    ) -> std::result::Result<(), RemoteError> {
        let url = self.endpoint("secret", "")?;
        let body = CreateRequest {
            path,
            version: WriteVersion { data },
        };
        check(self.http.post(url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn update_secret(
        &self,
        path: &str,
        data: &SecretData,
        cas: Option<SecretVersion>,
    ) -> std::result::Result<(), RemoteError> {
        let mut url = self.endpoint("secret", path)?;
        if let Some(cas) = cas {
            url.query_pairs_mut().append_pair("cas", &cas.to_string());
        }
        let body = UpdateRequest {
            version: WriteVersion { data },
        };
        check(self.http.put(url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn delete_secret(&self, path: &str) -> std::result::Result<(), RemoteError> {
        let url = self.endpoint("secret", path)?;
        check(self.http.delete(url).send().await?).await?;
        Ok(())
    }

    async fn probe(&self) -> std::result::Result<(), RemoteError> {
        let url = self.endpoint("secret", "")?;
        check(self.http.get(url).send().await?).await?;
        Ok(())
    }
}
