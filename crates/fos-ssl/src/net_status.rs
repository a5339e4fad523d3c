//! Network Stack SSL Signals
//!
//! Raw inputs reported by the network stack for the visible navigation entry:
//! cert status bits, mixed content bits, the engine's own security style and
//! certificate net error codes.

use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::types::CertError;

/// Set operations shared by the flag types in this crate.
macro_rules! impl_flag_ops {
    ($name:ident) => {
        impl $name {
            /// Raw bits
            #[inline]
            pub const fn bits(self) -> u32 {
                self.0
            }

            /// Whether no flag is set
            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Whether every flag of `other` is set
            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                (self.0 & other.0) == other.0
            }

            /// Whether any flag of `other` is set
            #[inline]
            pub const fn intersects(self, other: Self) -> bool {
                (self.0 & other.0) != 0
            }

            /// Flags set in either
            #[inline]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Flags set in both
            #[inline]
            pub const fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            /// Flags of `self` not in `other`
            #[inline]
            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            /// Set the flags of `other`
            #[inline]
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Clear the flags of `other`
            #[inline]
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self::Output {
                self.union(rhs)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.insert(rhs);
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self::Output {
                self.intersection(rhs)
            }
        }
    };
}

pub(crate) use impl_flag_ops;

/// Cert status bits as reported by the network stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetCertStatus(u32);

impl NetCertStatus {
    pub const NONE: Self = Self(0);

    // Bits 0 to 15 are errors.
    pub const COMMON_NAME_INVALID: Self = Self(1 << 0);
    pub const DATE_INVALID: Self = Self(1 << 1);
    pub const AUTHORITY_INVALID: Self = Self(1 << 2);
    // 1 << 3 is reserved for "contains errors".
    pub const NO_REVOCATION_MECHANISM: Self = Self(1 << 4);
    pub const UNABLE_TO_CHECK_REVOCATION: Self = Self(1 << 5);
    pub const REVOKED: Self = Self(1 << 6);
    pub const INVALID: Self = Self(1 << 7);
    pub const WEAK_SIGNATURE_ALGORITHM: Self = Self(1 << 8);
    pub const NON_UNIQUE_NAME: Self = Self(1 << 10);
    pub const WEAK_KEY: Self = Self(1 << 11);
    pub const PINNED_KEY_MISSING: Self = Self(1 << 13);
    pub const NAME_CONSTRAINT_VIOLATION: Self = Self(1 << 14);
    pub const VALIDITY_TOO_LONG: Self = Self(1 << 15);

    // Bits 16 to 31 are informational.
    pub const IS_EV: Self = Self(1 << 16);
    pub const REV_CHECKING_ENABLED: Self = Self(1 << 17);
    pub const SHA1_SIGNATURE_PRESENT: Self = Self(1 << 19);
    pub const CT_COMPLIANCE_FAILED: Self = Self(1 << 20);

    pub const ALL_ERRORS: Self = Self(0xFFFF);

    /// Errors the network stack does not consider serious
    pub const MINOR_ERRORS: Self =
        Self(Self::UNABLE_TO_CHECK_REVOCATION.0 | Self::NO_REVOCATION_MECHANISM.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The error bits only
    pub const fn errors(self) -> Self {
        self.intersection(Self::ALL_ERRORS)
    }

    /// Whether any error bit is set
    pub const fn is_error(self) -> bool {
        !self.errors().is_empty()
    }

    /// Whether error bits are set and all of them are in `minor`
    pub const fn is_minor_error(self, minor: Self) -> bool {
        let errors = self.errors();
        !errors.is_empty() && errors.difference(minor).is_empty()
    }

    /// Whether an error bit outside `minor` is set
    pub const fn is_major_error(self, minor: Self) -> bool {
        !self.errors().difference(minor).is_empty()
    }
}

impl_flag_ops!(NetCertStatus);

/// Mixed content bits for the visible page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContentStatus(u32);

impl ContentStatus {
    pub const NORMAL: Self = Self(0);
    /// Passive insecure content (images, media) was shown
    pub const DISPLAYED_INSECURE: Self = Self(1 << 0);
    /// Active insecure content (script, style) was run
    pub const RAN_INSECURE: Self = Self(1 << 1);
    pub const DISPLAYED_WITH_CERT_ERRORS: Self = Self(1 << 2);
    pub const RAN_WITH_CERT_ERRORS: Self = Self(1 << 3);

    const KNOWN: u32 = 0b1111;

    /// Unknown bits are dropped
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::KNOWN)
    }

    /// Whether no insecure content was loaded
    pub const fn is_normal(self) -> bool {
        self.is_empty()
    }

    /// Whether active insecure or broken content ran
    pub const fn ran_insecure(self) -> bool {
        self.intersects(Self::RAN_INSECURE.union(Self::RAN_WITH_CERT_ERRORS))
    }

    /// Whether passive insecure or broken content was displayed
    pub const fn displayed_insecure(self) -> bool {
        self.intersects(Self::DISPLAYED_INSECURE.union(Self::DISPLAYED_WITH_CERT_ERRORS))
    }
}

impl_flag_ops!(ContentStatus);

/// The network stack's own verdict for a navigation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityStyle {
    Unknown,
    Unauthenticated,
    AuthenticationBroken,
    Authenticated,
}

/// Certificate net error codes
pub mod net_error {
    pub const ERR_CERT_COMMON_NAME_INVALID: i32 = -200;
    pub const ERR_CERT_DATE_INVALID: i32 = -201;
    pub const ERR_CERT_AUTHORITY_INVALID: i32 = -202;
    pub const ERR_CERT_CONTAINS_ERRORS: i32 = -203;
    pub const ERR_CERT_NO_REVOCATION_MECHANISM: i32 = -204;
    pub const ERR_CERT_UNABLE_TO_CHECK_REVOCATION: i32 = -205;
    pub const ERR_CERT_REVOKED: i32 = -206;
    pub const ERR_CERT_INVALID: i32 = -207;
    pub const ERR_CERT_WEAK_SIGNATURE_ALGORITHM: i32 = -208;
    // -209 was "not in DNS".
    pub const ERR_CERT_NON_UNIQUE_NAME: i32 = -210;
    pub const ERR_CERT_WEAK_KEY: i32 = -211;
    pub const ERR_CERT_NAME_CONSTRAINT_VIOLATION: i32 = -212;
    pub const ERR_CERT_VALIDITY_TOO_LONG: i32 = -213;
    pub const ERR_CERT_END: i32 = -214;

    /// Whether `error` is in the certificate error range
    pub const fn is_certificate_error(error: i32) -> bool {
        error <= ERR_CERT_COMMON_NAME_INVALID && error > ERR_CERT_END
    }
}

/// Map a certificate net error code to a [`CertError`].
///
/// A date error counts as expiry only when the certificate is available and
/// has actually expired.
pub fn cert_error_for_net_error(error: i32, cert: Option<&Certificate>) -> CertError {
    use net_error::*;

    debug_assert!(is_certificate_error(error));

    match error {
        ERR_CERT_COMMON_NAME_INVALID => CertError::BadIdentity,
        ERR_CERT_DATE_INVALID => {
            if cert.is_some_and(Certificate::has_expired) {
                CertError::Expired
            } else {
                CertError::DateInvalid
            }
        }
        ERR_CERT_AUTHORITY_INVALID => CertError::AuthorityInvalid,
        ERR_CERT_CONTAINS_ERRORS | ERR_CERT_INVALID | ERR_CERT_VALIDITY_TOO_LONG => CertError::Invalid,
        ERR_CERT_REVOKED => CertError::Revoked,
        ERR_CERT_WEAK_SIGNATURE_ALGORITHM | ERR_CERT_WEAK_KEY => CertError::Insecure,
        _ => CertError::Generic,
    }
}
