//! Security Status
//!
//! Tracks the security status of the visible page and tells observers which
//! parts of it changed.

use std::cell::{Cell, RefCell};

use url::Url;

use crate::callback_list::{CallbackList, Subscription};
use crate::cert_status::calculate_cert_status;
use crate::certificate::{same_certificate, CertHandle};
use crate::config::SecurityConfig;
use crate::net_status::{impl_flag_ops, ContentStatus, NetCertStatus, SecurityStyle};
use crate::security_level::{calculate_security_level, check_invariants};
use crate::types::{CertStatus, SecurityLevel};

/// SSL state of the visible navigation entry
#[derive(Debug, Clone, Default)]
pub struct SslSnapshot {
    pub scheme: String,
    pub certificate: Option<CertHandle>,
    pub cert_status: NetCertStatus,
    pub content_status: ContentStatus,
    /// The network stack's own verdict, if it reported one
    pub security_style: Option<SecurityStyle>,
}

impl SslSnapshot {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Snapshot for a URL with no certificate
    pub fn for_url(url: &Url) -> Self {
        Self::new(url.scheme())
    }

    pub fn with_certificate(mut self, certificate: CertHandle) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn with_cert_status(mut self, cert_status: NetCertStatus) -> Self {
        self.cert_status = cert_status;
        self
    }

    pub fn with_content_status(mut self, content_status: ContentStatus) -> Self {
        self.content_status = content_status;
        self
    }

    pub fn with_security_style(mut self, style: SecurityStyle) -> Self {
        self.security_style = Some(style);
        self
    }
}

/// Which parts of a [`SecurityStatus`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangedFlags(u32);

impl ChangedFlags {
    pub const NONE: Self = Self(0);
    pub const SECURITY_LEVEL: Self = Self(1 << 0);
    pub const CONTENT_STATUS: Self = Self(1 << 1);
    pub const CERT_STATUS: Self = Self(1 << 2);
    pub const CERTIFICATE: Self = Self(1 << 3);
}

impl_flag_ops!(ChangedFlags);

/// Security status of a page.
///
/// State lives in cells so observers can read it back while being notified.
pub struct SecurityStatus {
    config: SecurityConfig,
    security_level: Cell<SecurityLevel>,
    content_status: Cell<ContentStatus>,
    cert_status: Cell<CertStatus>,
    certificate: RefCell<Option<CertHandle>>,
    callbacks: CallbackList<ChangedFlags>,
}

impl SecurityStatus {
    /// Status for a page that has not loaded anything yet. The first
    /// [`refresh`](Self::refresh) reports every field that differs from this.
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config,
            security_level: Cell::new(SecurityLevel::None),
            content_status: Cell::new(ContentStatus::NORMAL),
            cert_status: Cell::new(CertStatus::OK),
            certificate: RefCell::new(None),
            callbacks: CallbackList::new(),
        }
    }

    /// Status calculated from the visible entry's current SSL state
    pub fn with_snapshot(config: SecurityConfig, snapshot: &SslSnapshot) -> Self {
        let status = Self::new(config);
        status.refresh(snapshot);
        status
    }

    pub fn security_level(&self) -> SecurityLevel {
        self.security_level.get()
    }

    pub fn content_status(&self) -> ContentStatus {
        self.content_status.get()
    }

    pub fn cert_status(&self) -> CertStatus {
        self.cert_status.get()
    }

    pub fn certificate(&self) -> Option<CertHandle> {
        self.certificate.borrow().clone()
    }

    /// Register a change observer
    #[must_use = "the callback is removed when the subscription is dropped"]
    pub fn add_change_callback(&self, callback: impl FnMut(ChangedFlags) + 'static) -> Subscription {
        self.callbacks.add(callback)
    }

    /// Recalculate from the visible entry's SSL state.
    ///
    /// The new state is stored before observers are notified, once, if
    /// anything changed. Returns what changed.
    pub fn refresh(&self, snapshot: &SslSnapshot) -> ChangedFlags {
        let minor = self.config.minor_cert_errors;

        if let Some(violation) = check_invariants(snapshot, minor) {
            if self.config.strict_invariants {
                panic!("Invalid SSL state: {}", violation);
            }
            tracing::error!("Invalid SSL state: {}", violation);
        }

        let certificate = snapshot.certificate.clone();
        let security_level = calculate_security_level(
            &snapshot.scheme,
            certificate.is_some(),
            snapshot.cert_status,
            snapshot.content_status,
            minor,
        );
        let cert_status = calculate_cert_status(snapshot.cert_status, certificate.as_deref(), minor);
        let content_status = snapshot.content_status;

        let mut flags = ChangedFlags::NONE;
        if security_level != self.security_level.replace(security_level) {
            flags |= ChangedFlags::SECURITY_LEVEL;
        }
        if content_status != self.content_status.replace(content_status) {
            flags |= ChangedFlags::CONTENT_STATUS;
        }
        if cert_status != self.cert_status.replace(cert_status) {
            flags |= ChangedFlags::CERT_STATUS;
        }
        let previous = self.certificate.replace(certificate);
        if !same_certificate(self.certificate.borrow().as_ref(), previous.as_ref()) {
            flags |= ChangedFlags::CERTIFICATE;
        }

        if flags.is_empty() {
            return flags;
        }

        tracing::debug!(
            "Security status changed: level={} cert_status={:?} flags={:?}",
            security_level,
            cert_status,
            flags
        );
        self.callbacks.notify(flags);

        flags
    }
}

impl std::fmt::Debug for SecurityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityStatus")
            .field("security_level", &self.security_level.get())
            .field("content_status", &self.content_status.get())
            .field("cert_status", &self.cert_status.get())
            .field("certificate", &self.certificate.borrow())
            .field("observers", &self.callbacks.len())
            .finish()
    }
}
