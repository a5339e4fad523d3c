//! SSL Host State
//!
//! Per-host SSL decisions for a browser context: which hosts ran insecure
//! content in which renderer process, and which certificate errors the user
//! chose to allow.

use std::collections::{HashMap, HashSet};

use crate::certificate::Certificate;
use crate::config::SecurityConfig;
use crate::types::CertError;

/// Answer to a certificate policy query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertPolicy {
    Allowed,
    Denied,
}

/// Remembered SSL decisions, keyed by host
#[derive(Debug, Default)]
pub struct SslHostState {
    remember_allowed: bool,
    /// (host, renderer process id)
    ran_insecure_content: HashSet<(String, i32)>,
    /// host -> (certificate fingerprint or subject, error)
    allowed_certs: HashMap<String, HashSet<(String, CertError)>>,
}

impl SslHostState {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            remember_allowed: config.remember_allowed_certificates,
            ..Self::default()
        }
    }

    /// Record that `host` ran insecure content in process `process_id`
    pub fn host_ran_insecure_content(&mut self, host: &str, process_id: i32) {
        self.ran_insecure_content
            .insert((host.to_ascii_lowercase(), process_id));
    }

    pub fn did_host_run_insecure_content(&self, host: &str, process_id: i32) -> bool {
        self.ran_insecure_content
            .contains(&(host.to_ascii_lowercase(), process_id))
    }

    /// Remember that the user allowed `error` for `cert` on `host`
    pub fn allow_cert(&mut self, host: &str, cert: &Certificate, error: CertError) {
        if !self.remember_allowed {
            tracing::debug!("Not remembering allowed certificate for {}", host);
            return;
        }
        self.allowed_certs
            .entry(host.to_ascii_lowercase())
            .or_default()
            .insert((Self::cert_key(cert), error));
    }

    /// Whether `error` for `cert` on `host` was previously allowed
    pub fn query_policy(&self, host: &str, cert: &Certificate, error: CertError) -> CertPolicy {
        let allowed = self
            .allowed_certs
            .get(&host.to_ascii_lowercase())
            .is_some_and(|certs| certs.contains(&(Self::cert_key(cert), error)));

        if allowed {
            CertPolicy::Allowed
        } else {
            CertPolicy::Denied
        }
    }

    pub fn has_allow_exception(&self, host: &str) -> bool {
        self.allowed_certs
            .get(&host.to_ascii_lowercase())
            .is_some_and(|certs| !certs.is_empty())
    }

    /// Forget allowed certificates for `host`
    pub fn revoke_user_allow_exceptions(&mut self, host: &str) {
        self.allowed_certs.remove(&host.to_ascii_lowercase());
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.ran_insecure_content.clear();
        self.allowed_certs.clear();
    }

    fn cert_key(cert: &Certificate) -> String {
        if cert.fingerprint.is_empty() {
            format!("{}|{}", cert.subject, cert.issuer)
        } else {
            cert.fingerprint.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn cert(fingerprint: &str) -> Certificate {
        Certificate::new("www.example.com", "www.foo.com", SystemTime::UNIX_EPOCH, SystemTime::UNIX_EPOCH)
            .with_fingerprint(fingerprint)
    }

    fn remembering() -> SslHostState {
        SslHostState::new(&SecurityConfig { remember_allowed_certificates: true, ..SecurityConfig::default() })
    }

    #[test]
    fn test_query_policy_denied_by_default() {
        let mut state = SslHostState::new(&SecurityConfig::default());
        state.allow_cert("www.google.com", &cert("aa"), CertError::BadIdentity);

        assert_eq!(state.query_policy("www.google.com", &cert("aa"), CertError::BadIdentity), CertPolicy::Denied);
        assert!(!state.has_allow_exception("www.google.com"));
    }

    #[test]
    fn test_host_ran_insecure_content() {
        let mut state = SslHostState::default();
        state.host_ran_insecure_content("www.google.com", 1);
        state.host_ran_insecure_content("www.example.co.uk", 3);

        assert!(state.did_host_run_insecure_content("www.google.com", 1));
        assert!(!state.did_host_run_insecure_content("www.google.com", 2));
        assert!(!state.did_host_run_insecure_content("www.google.com", 3));

        assert!(!state.did_host_run_insecure_content("www.example.co.uk", 1));
        assert!(state.did_host_run_insecure_content("www.example.co.uk", 3));

        assert!(!state.did_host_run_insecure_content("www.google.co.uk", 1));
    }

    #[test]
    fn test_allow_cert_when_remembering() {
        let mut state = remembering();
        state.allow_cert("WWW.Google.com", &cert("AA"), CertError::AuthorityInvalid);

        assert_eq!(state.query_policy("www.google.com", &cert("aa"), CertError::AuthorityInvalid), CertPolicy::Allowed);
        assert_eq!(state.query_policy("www.google.com", &cert("aa"), CertError::Expired), CertPolicy::Denied);
        assert_eq!(state.query_policy("www.google.com", &cert("bb"), CertError::AuthorityInvalid), CertPolicy::Denied);
        assert_eq!(state.query_policy("www.foo.com", &cert("aa"), CertError::AuthorityInvalid), CertPolicy::Denied);
        assert!(state.has_allow_exception("www.google.com"));
    }

    #[test]
    fn test_revoke_and_clear() {
        let mut state = remembering();
        state.allow_cert("www.google.com", &cert("aa"), CertError::Revoked);
        state.host_ran_insecure_content("www.google.com", 1);

        state.revoke_user_allow_exceptions("www.google.com");
        assert!(!state.has_allow_exception("www.google.com"));
        assert!(state.did_host_run_insecure_content("www.google.com", 1));

        state.clear();
        assert!(!state.did_host_run_insecure_content("www.google.com", 1));
    }
}
