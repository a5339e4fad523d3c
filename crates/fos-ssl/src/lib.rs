//! fOS SSL
//!
//! Security status and certificate error handling for the fOS browser engine.
//!
//! Features:
//! - Certificate status mapping from the network stack's cert status bits
//! - Security level classification for the visible page
//! - Per-page security status tracking with change notification
//! - Certificate error responses (allow / deny / cancel) with placeholder pages
//! - Certificate error dispatch and per-frame cancellation
//! - Per-host SSL state (insecure content, allowed certificates)
//!
//! Everything here runs on the browser UI thread. Shared state uses `Rc` and
//! `RefCell`, and callbacks are not required to be `Send`.

pub mod config;
pub mod certificate;
pub mod net_status;
pub mod types;
pub mod cert_status;
pub mod security_level;
pub mod callback_list;
pub mod security_status;
pub mod placeholder;
pub mod certificate_error;
pub mod manager;
pub mod dispatcher;
pub mod host_state;

pub use config::SecurityConfig;
pub use certificate::{Certificate, CertHandle};
pub use net_status::{ContentStatus, NetCertStatus, SecurityStyle};
pub use types::{CertError, CertStatus, SecurityLevel};
pub use cert_status::calculate_cert_status;
pub use security_level::{calculate_security_level, InvariantViolation};
pub use callback_list::{CallbackList, Subscription};
pub use security_status::{ChangedFlags, SecurityStatus, SslSnapshot};
pub use placeholder::{NavigationHost, PlaceholderPage};
pub use certificate_error::{
    CancelHandle, CertificateError, CertificateErrorInfo, ResponseCallback, ResponseState,
};
pub use manager::{CertificateErrorManager, FrameId};
pub use dispatcher::{
    CertificateErrorClient, CertificateErrorDispatcher, CertificateErrorEvent,
    CertificateRequestResult, ResourceType,
};
pub use host_state::{CertPolicy, SslHostState};

/// SSL error
#[derive(Debug, thiserror::Error)]
pub enum SslError {
    #[error("Not a certificate error: net error {0}")]
    NotCertificateError(i32),

    #[error("Invalid security config: {0}")]
    Config(#[from] serde_json::Error),
}
