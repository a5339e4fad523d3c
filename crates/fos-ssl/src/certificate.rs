//! Certificates
//!
//! The certificate store belongs to the network stack. Pages and certificate
//! errors only hold shared handles to its entries.

use std::sync::Arc;
use std::time::SystemTime;

/// Shared handle to a certificate owned by the certificate store
pub type CertHandle = Arc<Certificate>;

/// X.509 certificate summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub subject: String,
    pub issuer: String,
    pub valid_start: SystemTime,
    pub valid_expiry: SystemTime,
    /// SHA-256 fingerprint, hex encoded
    pub fingerprint: String,
}

impl Certificate {
    pub fn new(subject: &str, issuer: &str, valid_start: SystemTime, valid_expiry: SystemTime) -> Self {
        Self {
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            valid_start,
            valid_expiry,
            fingerprint: String::new(),
        }
    }

    /// Set the fingerprint
    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        self.fingerprint = fingerprint.to_ascii_lowercase();
        self
    }

    /// Wrap in a shared handle
    pub fn into_handle(self) -> CertHandle {
        Arc::new(self)
    }

    /// Whether the certificate expired before `now`
    pub fn has_expired_at(&self, now: SystemTime) -> bool {
        now > self.valid_expiry
    }

    /// Whether the certificate has expired
    pub fn has_expired(&self) -> bool {
        self.has_expired_at(SystemTime::now())
    }
}

/// Whether two optional handles refer to the same certificate object
pub fn same_certificate(a: Option<&CertHandle>, b: Option<&CertHandle>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
