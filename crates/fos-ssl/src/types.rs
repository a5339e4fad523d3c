//! Security Types
//!
//! Discrete outputs exposed to the host application.

use std::fmt;

use crate::net_status::impl_flag_ops;

/// Security level of the visible page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SecurityLevel {
    /// Not a secure connection
    #[default]
    None,
    Secure,
    /// Secure, with an Extended Validation certificate
    SecureEV,
    /// Secure, but with minor problems such as passive mixed content
    Warning,
    /// Security is broken
    Error,
}

impl SecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Secure => "secure",
            Self::SecureEV => "secure-ev",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate status flags for the visible page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CertStatus(u32);

impl CertStatus {
    pub const OK: Self = Self(0);
    pub const BAD_IDENTITY: Self = Self(1 << 0);
    pub const EXPIRED: Self = Self(1 << 1);
    pub const DATE_INVALID: Self = Self(1 << 2);
    pub const AUTHORITY_INVALID: Self = Self(1 << 3);
    pub const REVOCATION_CHECK_FAILED: Self = Self(1 << 4);
    pub const REVOKED: Self = Self(1 << 5);
    pub const INVALID: Self = Self(1 << 6);
    pub const INSECURE: Self = Self(1 << 7);
    pub const GENERIC_ERROR: Self = Self(1 << 8);

    /// Whether no error flag is set
    pub const fn is_ok(self) -> bool {
        self.is_empty()
    }
}

impl_flag_ops!(CertStatus);

/// Type of a certificate error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CertError {
    /// Subject does not match the host
    BadIdentity = 0,
    Expired = 1,
    /// Not valid yet, or an issuer is outside its validity period
    DateInvalid = 2,
    /// Not issued by a trusted authority
    AuthorityInvalid = 3,
    RevocationCheckFailed = 4,
    Revoked = 5,
    Invalid = 6,
    /// Weak signature algorithm or key
    Insecure = 7,
    Generic = 8,
}

impl CertError {
    pub const ALL: [CertError; 9] = [
        Self::BadIdentity,
        Self::Expired,
        Self::DateInvalid,
        Self::AuthorityInvalid,
        Self::RevocationCheckFailed,
        Self::Revoked,
        Self::Invalid,
        Self::Insecure,
        Self::Generic,
    ];

    /// The [`CertStatus`] flag for this error
    pub const fn status_flag(self) -> CertStatus {
        match self {
            Self::BadIdentity => CertStatus::BAD_IDENTITY,
            Self::Expired => CertStatus::EXPIRED,
            Self::DateInvalid => CertStatus::DATE_INVALID,
            Self::AuthorityInvalid => CertStatus::AUTHORITY_INVALID,
            Self::RevocationCheckFailed => CertStatus::REVOCATION_CHECK_FAILED,
            Self::Revoked => CertStatus::REVOKED,
            Self::Invalid => CertStatus::INVALID,
            Self::Insecure => CertStatus::INSECURE,
            Self::Generic => CertStatus::GENERIC_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadIdentity => "bad-identity",
            Self::Expired => "expired",
            Self::DateInvalid => "date-invalid",
            Self::AuthorityInvalid => "authority-invalid",
            Self::RevocationCheckFailed => "revocation-check-failed",
            Self::Revoked => "revoked",
            Self::Invalid => "invalid",
            Self::Insecure => "insecure",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for CertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Each CertError owns the CertStatus bit at its own index.
const _: () = {
    let mut i = 0;
    while i < CertError::ALL.len() {
        let error = CertError::ALL[i];
        assert!(error as u32 == i as u32);
        assert!(error.status_flag().bits() == 1 << (error as u32));
        i += 1;
    }
};
