//! Security Level Classification
//!
//! Maps the SSL state of a page to one of the [`SecurityLevel`] values.

use crate::net_status::{ContentStatus, NetCertStatus, SecurityStyle};
use crate::security_status::SslSnapshot;
use crate::types::SecurityLevel;

/// Whether `scheme` is a cryptographic scheme
pub fn is_cryptographic_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("https") || scheme.eq_ignore_ascii_case("wss")
}

/// Calculate the security level of a page.
///
/// Rules are evaluated in order and the first match wins. The minor / major
/// partition of cert status errors is supplied by the caller in `minor`.
pub fn calculate_security_level(
    scheme: &str,
    has_certificate: bool,
    cert_status: NetCertStatus,
    content_status: ContentStatus,
    minor: NetCertStatus,
) -> SecurityLevel {
    if !is_cryptographic_scheme(scheme) || !has_certificate {
        return SecurityLevel::None;
    }

    if cert_status.is_major_error(minor) {
        return SecurityLevel::Error;
    }

    if content_status.ran_insecure() {
        return SecurityLevel::Error;
    }

    if content_status.displayed_insecure() {
        return SecurityLevel::Warning;
    }

    debug_assert!(content_status.is_normal());

    if cert_status.is_minor_error(minor) {
        return SecurityLevel::Warning;
    }

    if cert_status.contains(NetCertStatus::IS_EV) {
        return SecurityLevel::SecureEV;
    }

    SecurityLevel::Secure
}

/// A snapshot the network stack should never produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("insecure content ran on a page reported as authenticated")]
    AuthenticatedRanInsecure,

    #[error("insecure content was displayed on a page reported as authenticated")]
    AuthenticatedDisplayedInsecure,

    #[error("major cert status error on a page reported as authenticated")]
    AuthenticatedWithMajorError,
}

/// Check a snapshot against the network stack's own security style.
///
/// Snapshots without a style are not checked.
pub fn check_invariants(snapshot: &SslSnapshot, minor: NetCertStatus) -> Option<InvariantViolation> {
    if snapshot.security_style != Some(SecurityStyle::Authenticated) {
        return None;
    }

    if snapshot.content_status.ran_insecure() {
        return Some(InvariantViolation::AuthenticatedRanInsecure);
    }

    if snapshot.content_status.displayed_insecure() {
        return Some(InvariantViolation::AuthenticatedDisplayedInsecure);
    }

    if snapshot.cert_status.is_major_error(minor) {
        return Some(InvariantViolation::AuthenticatedWithMajorError);
    }

    None
}
