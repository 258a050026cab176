//! Credential hygiene and audit logging
//!
//! Provides:
//! - SecureString with zeroize, used for tokens and private keys
//! - Audit entries for store mutations (never logs secret values)

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that is zeroed on drop and redacted when formatted
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Get the string value (use with caution)
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED {} bytes])", self.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Store mutation performed by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOperation::Create => write!(f, "create"),
            AuditOperation::Update => write!(f, "update"),
            AuditOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Audit log entry for a store mutation
#[derive(Debug, Clone)]
pub struct AuditLog {
    pub operation: AuditOperation,
    pub remote_key: String,
    pub store: String,
    pub cas: Option<u32>,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: std::time::SystemTime,
}

impl AuditLog {
    pub fn new(operation: AuditOperation, remote_key: &str, store: &str) -> Self {
        Self {
            operation,
            remote_key: remote_key.to_string(),
            store: store.to_string(),
            cas: None,
            success: true,
            error: None,
            timestamp: std::time::SystemTime::now(),
        }
    }

    pub fn with_cas(mut self, cas: Option<u32>) -> Self {
        self.cas = cas;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Record the outcome of a mutation and emit the entry
    pub fn record<T, E: fmt::Display>(self, outcome: &Result<T, E>) {
        match outcome {
            Ok(_) => self.log(),
            Err(e) => self.with_error(e.to_string()).log(),
        }
    }

    /// Log the audit entry
    pub fn log(&self) {
        if self.success {
            tracing::info!(
                operation = %self.operation,
                remote_key = %self.remote_key,
                store = %self.store,
                cas = ?self.cas,
                timestamp = ?self.timestamp,
                "Secret store mutation successful"
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                remote_key = %self.remote_key,
                store = %self.store,
                cas = ?self.cas,
                error = ?self.error,
                timestamp = ?self.timestamp,
                "Secret store mutation failed"
            );
        }
    }
}
