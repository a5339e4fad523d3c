//! Security Configuration
//!
//! Knobs for classification policy and certificate error handling.

use serde::{Deserialize, Serialize};

use crate::net_status::NetCertStatus;
use crate::SslError;

/// Security configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Cert status errors the network stack treats as minor
    pub minor_cert_errors: NetCertStatus,
    /// Panic on engine contract violations instead of logging them
    pub strict_invariants: bool,
    /// Show a placeholder page while a main frame error is pending
    pub placeholder_pages: bool,
    /// Remember certificate errors the user chose to allow
    pub remember_allowed_certificates: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            minor_cert_errors: NetCertStatus::MINOR_ERRORS,
            strict_invariants: false,
            placeholder_pages: true,
            remember_allowed_certificates: false,
        }
    }
}

impl SecurityConfig {
    /// Parse from JSON. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self, SslError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, SslError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SecurityConfig::default();
        assert_eq!(config.minor_cert_errors, NetCertStatus::MINOR_ERRORS);
        assert!(!config.strict_invariants);
        assert!(config.placeholder_pages);
        assert!(!config.remember_allowed_certificates);
    }

    #[test]
    fn test_config_partial_json() {
        let config = SecurityConfig::from_json(r#"{"strict_invariants": true}"#).unwrap();
        assert!(config.strict_invariants);
        assert!(config.placeholder_pages);
        assert_eq!(config.minor_cert_errors, NetCertStatus::MINOR_ERRORS);
    }

    #[test]
    fn test_config_minor_errors_as_bits() {
        let config = SecurityConfig::from_json(r#"{"minor_cert_errors": 32}"#).unwrap();
        assert_eq!(config.minor_cert_errors, NetCertStatus::UNABLE_TO_CHECK_REVOCATION);
    }

    #[test]
    fn test_config_invalid_json() {
        let result = SecurityConfig::from_json("{not json");
        assert!(matches!(result, Err(SslError::Config(_))));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let mut config = SecurityConfig::default();
        config.remember_allowed_certificates = true;
        let json = config.to_json().unwrap();
        assert_eq!(SecurityConfig::from_json(&json).unwrap(), config);
    }
}
