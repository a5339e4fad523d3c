//! Cert Status Mapping
//!
//! Translates the network stack's cert status bits into [`CertStatus`].

use crate::certificate::Certificate;
use crate::net_status::NetCertStatus;
use crate::types::CertStatus;

/// Bits with a direct mapping, in evaluation order.
const DIRECT_MAPPINGS: [(NetCertStatus, CertStatus); 7] = [
    (NetCertStatus::COMMON_NAME_INVALID, CertStatus::BAD_IDENTITY),
    (NetCertStatus::AUTHORITY_INVALID, CertStatus::AUTHORITY_INVALID),
    (NetCertStatus::UNABLE_TO_CHECK_REVOCATION, CertStatus::REVOCATION_CHECK_FAILED),
    (NetCertStatus::REVOKED, CertStatus::REVOKED),
    (NetCertStatus::INVALID, CertStatus::INVALID),
    (NetCertStatus::WEAK_SIGNATURE_ALGORITHM, CertStatus::INSECURE),
    (NetCertStatus::WEAK_KEY, CertStatus::INSECURE),
];

/// Calculate the [`CertStatus`] for a page.
///
/// Every handled input bit is consumed on its own. Whatever is left sets
/// [`CertStatus::GENERIC_ERROR`] if it contains an error that is not minor
/// according to `minor`. A missing revocation mechanism is never penalized.
pub fn calculate_cert_status(
    status: NetCertStatus,
    cert: Option<&Certificate>,
    minor: NetCertStatus,
) -> CertStatus {
    let mut remaining = status;
    let mut rv = CertStatus::OK;

    if remaining.contains(NetCertStatus::DATE_INVALID) {
        // Could also be not yet valid, or an issuer that expired
        if cert.is_some_and(Certificate::has_expired) {
            rv |= CertStatus::EXPIRED;
        } else {
            rv |= CertStatus::DATE_INVALID;
        }
        remaining.remove(NetCertStatus::DATE_INVALID);
    }

    for (input, output) in DIRECT_MAPPINGS {
        if remaining.contains(input) {
            rv |= output;
            remaining.remove(input);
        }
    }

    remaining.remove(NetCertStatus::NO_REVOCATION_MECHANISM);

    if remaining.is_error() && !remaining.is_minor_error(minor) {
        rv |= CertStatus::GENERIC_ERROR;
    }

    rv
}
