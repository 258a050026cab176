//! Error types for okms-secrets

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Result type alias using okms-secrets' Error type
pub type Result<T> = std::result::Result<T, Error>;

/// OKMS error code returned when a secret path holds no secret
pub const SECRET_NOT_FOUND_CODE: u32 = 17125377;

/// Connector error types
#[derive(Error, Debug)]
pub enum Error {
    /// Target path has no value. Callers branch on this rather than fail.
    #[error("secret does not exist")]
    NotFound,

    /// Caller-supplied reference or payload is malformed
    #[error("{message}")]
    Validation { message: String },

    /// Requested property is absent from an otherwise valid secret
    #[error("secret property \"{property}\" not found")]
    PropertyNotFound { property: String },

    /// Transport, authorization or server-side failure
    #[error(transparent)]
    Remote(RemoteError),

    /// Enumeration produced no secrets at all
    #[error("no secrets found in the secret manager")]
    NoSecretsFound,

    /// Secrets were listed but none survived filtering and fetching
    #[error("no secrets matched the regexp")]
    NoSecretsMatched,

    /// Store configuration is invalid
    #[error("Invalid store configuration: {message}")]
    InvalidConfig { message: String },

    /// Host credential resolver failed or returned unusable material
    #[error("Credential resolution failed: {message}")]
    Credentials { message: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a property not found error
    pub fn property_not_found(property: impl Into<String>) -> Self {
        Self::PropertyNotFound {
            property: property.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a credentials error
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// True for the "nothing found" outcomes of a read-all, as opposed to failures
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NoSecretsFound | Self::NoSecretsMatched)
    }
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound => Self::NotFound,
            other => Self::Remote(other),
        }
    }
}

/// Failure reported by the remote store client
#[derive(Error, Debug)]
pub enum RemoteError {
    /// No secret at the requested path
    #[error("secret does not exist")]
    NotFound,

    /// Structured error returned by the OKMS API
    #[error("OKMS API error (HTTP {status}): {error}")]
    Api { status: u16, error: KmsError },

    /// Request never produced a usable response
    #[error("OKMS transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("unexpected OKMS response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classify an API error body, folding the not-found code into `NotFound`
    pub fn from_api(status: u16, error: KmsError) -> Self {
        if error.error_code == SECRET_NOT_FOUND_CODE {
            Self::NotFound
        } else {
            Self::Api { status, error }
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Error body returned by the OKMS REST API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KmsError {
    #[serde(default)]
    pub error_code: u32,
    #[serde(default)]
    pub error_id: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub request_id: String,
}

impl fmt::Display for KmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code={}, ID=\"{}\", Request-ID=\"{}\"",
            self.error_code, self.error_id, self.request_id
        )?;
        if !self.errors.is_empty() {
            write!(f, ": {}", self.errors.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_code_maps_to_not_found() {
        let err = RemoteError::from_api(
            404,
            KmsError {
                error_code: SECRET_NOT_FOUND_CODE,
                ..Default::default()
            },
        );
        assert!(matches!(err, RemoteError::NotFound));
        assert!(Error::from(err).is_not_found());
    }

    #[test]
    fn test_other_codes_stay_remote() {
        let err = RemoteError::from_api(
            400,
            KmsError {
                error_code: 17125378,
                request_id: "req-1".to_string(),
                ..Default::default()
            },
        );
        let err = Error::from(err);
        assert!(!err.is_not_found());
        assert!(matches!(err, Error::Remote(RemoteError::Api { status: 400, .. })));
        assert!(err.to_string().contains("Code=17125378"));
        assert!(err.to_string().contains("req-1"));
    }

    #[test]
    fn test_kms_error_deserializes_partial_body() {
        let err: KmsError = serde_json::from_str(r#"{"error_code":17125377}"#).unwrap();
        assert_eq!(err.error_code, SECRET_NOT_FOUND_CODE);
        assert!(err.errors.is_empty());
    }

    #[test]
    fn test_empty_result_classification() {
        assert!(Error::NoSecretsFound.is_empty_result());
        assert!(Error::NoSecretsMatched.is_empty_result());
        assert!(!Error::NotFound.is_empty_result());
        assert!(!Error::validation("bad").is_empty_result());
    }

    #[test]
    fn test_property_not_found_names_property() {
        let err = Error::property_not_found("Invalid Property");
        assert_eq!(
            err.to_string(),
            "secret property \"Invalid Property\" not found"
        );
    }
}
