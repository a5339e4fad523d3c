//! Certificate Errors
//!
//! A [`CertificateError`] is a single pending decision about a certificate
//! that failed validation. The application answers it with
//! [`allow`](CertificateError::allow) or [`deny`](CertificateError::deny);
//! the engine may cancel it first through a [`CancelHandle`]. Whichever comes
//! first wins and every later attempt is a logged no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::certificate::CertHandle;
use crate::placeholder::{NavigationHost, PlaceholderPage};
use crate::types::CertError;

/// Receives the application's decision, `true` to allow
pub type ResponseCallback = Box<dyn FnOnce(bool)>;

type CancelCallback = Box<dyn FnOnce()>;

/// Where a certificate error is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseState {
    Pending,
    Allowed,
    Denied,
    Cancelled,
}

impl ResponseState {
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// State shared between the error and the engine's cancel handle
struct Responder {
    state: ResponseState,
    /// The error was dropped without a response
    released: bool,
    response: Option<ResponseCallback>,
    on_cancel: Option<CancelCallback>,
    placeholder: Option<PlaceholderPage>,
}

impl Responder {
    fn is_pending(&self) -> bool {
        self.state == ResponseState::Pending && !self.released
    }
}

/// Move to a terminal state, then run whatever that state triggers.
///
/// Callbacks run after the shared state is updated and unborrowed.
fn resolve(responder: &RefCell<Responder>, state: ResponseState) {
    debug_assert!(state.is_terminal());

    let (response, on_cancel, placeholder) = {
        let mut r = responder.borrow_mut();
        debug_assert!(r.is_pending());
        r.state = state;
        (r.response.take(), r.on_cancel.take(), r.placeholder.take())
    };

    match state {
        ResponseState::Allowed => {
            if let Some(response) = response {
                response(true);
            }
            if let Some(placeholder) = placeholder {
                placeholder.proceed();
            }
        }
        ResponseState::Denied => {
            if let Some(response) = response {
                response(false);
            }
            if let Some(placeholder) = placeholder {
                placeholder.dismiss();
            }
        }
        ResponseState::Cancelled => {
            if let Some(on_cancel) = on_cancel {
                on_cancel();
            }
            if let Some(placeholder) = placeholder {
                placeholder.dismiss();
            }
        }
        ResponseState::Pending => {}
    }
}

/// Parameters of a certificate error
#[derive(Debug, Clone)]
pub struct CertificateErrorInfo {
    pub is_main_frame: bool,
    pub is_subresource: bool,
    pub cert_error: CertError,
    pub certificate: Option<CertHandle>,
    pub url: Url,
    pub strict_enforcement: bool,
    /// Whether the engine allows overriding. Further restricted by
    /// `strict_enforcement` and the kind of load.
    pub overridable: bool,
}

impl CertificateErrorInfo {
    /// Overridable main frame document error without a certificate
    pub fn new(cert_error: CertError, url: Url) -> Self {
        Self {
            is_main_frame: true,
            is_subresource: false,
            cert_error,
            certificate: None,
            url,
            strict_enforcement: false,
            overridable: true,
        }
    }

    pub fn with_certificate(mut self, certificate: CertHandle) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn main_frame(mut self, is_main_frame: bool) -> Self {
        self.is_main_frame = is_main_frame;
        self
    }

    pub fn subresource(mut self, is_subresource: bool) -> Self {
        self.is_subresource = is_subresource;
        self
    }

    pub fn strict_enforcement(mut self, strict_enforcement: bool) -> Self {
        self.strict_enforcement = strict_enforcement;
        self
    }

    pub fn overridable(mut self, overridable: bool) -> Self {
        self.overridable = overridable;
        self
    }

    /// Whether this is an error for a main frame document load
    pub fn is_main_frame_document(&self) -> bool {
        self.is_main_frame && !self.is_subresource
    }
}

/// A certificate error waiting for the application's decision
pub struct CertificateError {
    is_main_frame: bool,
    is_subresource: bool,
    cert_error: CertError,
    certificate: Option<CertHandle>,
    url: Url,
    strict_enforcement: bool,
    overridable: bool,
    responder: Rc<RefCell<Responder>>,
}

impl CertificateError {
    /// Create an error. `response` receives the decision if there is one.
    pub fn new(info: CertificateErrorInfo, response: Option<ResponseCallback>) -> Self {
        let overridable =
            info.overridable && !info.strict_enforcement && info.is_main_frame_document();

        Self {
            is_main_frame: info.is_main_frame,
            is_subresource: info.is_subresource,
            cert_error: info.cert_error,
            certificate: info.certificate,
            url: info.url,
            strict_enforcement: info.strict_enforcement,
            overridable,
            responder: Rc::new(RefCell::new(Responder {
                state: ResponseState::Pending,
                released: false,
                response,
                on_cancel: None,
                placeholder: None,
            })),
        }
    }

    /// Create an error with a placeholder page shown while it is pending
    pub fn with_placeholder(
        info: CertificateErrorInfo,
        response: Option<ResponseCallback>,
        host: Rc<dyn NavigationHost>,
    ) -> Self {
        let error = Self::new(info, response);
        error.attach_placeholder(host);
        error
    }

    /// If the error is from the main frame
    pub fn is_main_frame(&self) -> bool {
        self.is_main_frame
    }

    /// Whether the error is for a subresource of the frame
    pub fn is_subresource(&self) -> bool {
        self.is_subresource
    }

    pub fn cert_error(&self) -> CertError {
        self.cert_error
    }

    pub fn certificate(&self) -> Option<&CertHandle> {
        self.certificate.as_ref()
    }

    /// The request URL that triggered the error
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn overridable(&self) -> bool {
        self.overridable
    }

    /// Whether the URL requires secure transport (HSTS)
    pub fn strict_enforcement(&self) -> bool {
        self.strict_enforcement
    }

    pub fn state(&self) -> ResponseState {
        self.responder.borrow().state
    }

    /// Whether the engine cancelled the error. The application should hide
    /// its error UI when this happens.
    pub fn is_cancelled(&self) -> bool {
        self.state() == ResponseState::Cancelled
    }

    /// Set a callback to run if the engine cancels the error
    pub fn set_cancel_callback(&self, callback: impl FnOnce() + 'static) {
        let mut responder = self.responder.borrow_mut();
        if responder.state.is_terminal() {
            tracing::warn!("Can't set a cancel callback on a CertificateError that has finished");
            return;
        }
        responder.on_cancel = Some(Box::new(callback));
    }

    /// Show a placeholder page while the error is pending.
    ///
    /// Only main frame document errors get one. Returns whether it was
    /// attached.
    pub fn attach_placeholder(&self, host: Rc<dyn NavigationHost>) -> bool {
        self.cancel_handle().attach_placeholder(host, &self.url)
    }

    /// Allow the request that generated the error to continue, ignoring the
    /// error. Only possible if the error is overridable.
    pub fn allow(&self) {
        if !self.overridable {
            tracing::warn!("Can't override a non-overridable error");
            return;
        }

        if !self.check_can_respond() {
            return;
        }

        tracing::debug!("Certificate error for {} allowed", self.url);
        resolve(&self.responder, ResponseState::Allowed);
    }

    /// Cancel the request that generated the error
    pub fn deny(&self) {
        if !self.check_can_respond() {
            return;
        }

        tracing::debug!("Certificate error for {} denied", self.url);
        resolve(&self.responder, ResponseState::Denied);
    }

    /// Handle the engine uses to cancel this error
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            responder: self.responder.clone(),
            is_main_frame: self.is_main_frame,
            is_subresource: self.is_subresource,
        }
    }

    fn check_can_respond(&self) -> bool {
        match self.state() {
            ResponseState::Pending => true,
            ResponseState::Cancelled => {
                tracing::warn!("Can't respond to a CertificateError that's been cancelled");
                false
            }
            ResponseState::Allowed | ResponseState::Denied => {
                tracing::warn!("Can't respond more than once to a CertificateError");
                false
            }
        }
    }
}

impl Drop for CertificateError {
    fn drop(&mut self) {
        if self.state() != ResponseState::Pending {
            return;
        }

        if self.overridable {
            tracing::debug!("Certificate error for {} dropped without a response, denying", self.url);
            resolve(&self.responder, ResponseState::Denied);
            return;
        }

        // The engine already failed the request. Release everything so a late
        // cancel is ignored.
        let placeholder = {
            let mut responder = self.responder.borrow_mut();
            responder.released = true;
            responder.response = None;
            responder.on_cancel = None;
            responder.placeholder.take()
        };
        drop(placeholder);
    }
}

impl fmt::Debug for CertificateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateError")
            .field("is_main_frame", &self.is_main_frame)
            .field("is_subresource", &self.is_subresource)
            .field("cert_error", &self.cert_error)
            .field("url", &self.url.as_str())
            .field("strict_enforcement", &self.strict_enforcement)
            .field("overridable", &self.overridable)
            .field("state", &self.state())
            .finish()
    }
}

/// Engine side of a [`CertificateError`]
#[derive(Clone)]
pub struct CancelHandle {
    responder: Rc<RefCell<Responder>>,
    is_main_frame: bool,
    is_subresource: bool,
}

impl CancelHandle {
    /// Cancel the error, e.g. because a new navigation superseded it.
    ///
    /// Returns `false` if the error already finished or was dropped.
    pub fn cancel(&self) -> bool {
        if !self.is_pending() {
            tracing::debug!("Ignoring cancel for a certificate error that has finished");
            return false;
        }

        resolve(&self.responder, ResponseState::Cancelled);
        true
    }

    /// Whether the error still awaits a decision
    pub fn is_pending(&self) -> bool {
        self.responder.borrow().is_pending()
    }

    pub fn is_subresource(&self) -> bool {
        self.is_subresource
    }

    pub fn state(&self) -> ResponseState {
        self.responder.borrow().state
    }

    /// Show a placeholder page for `url` while the error is pending.
    ///
    /// Only main frame document errors get one. Returns whether it was
    /// attached.
    pub fn attach_placeholder(&self, host: Rc<dyn NavigationHost>, url: &Url) -> bool {
        if !self.is_main_frame || self.is_subresource {
            tracing::warn!("Placeholder pages are only for main frame document errors");
            return false;
        }

        if !self.can_attach_placeholder() {
            return false;
        }

        // The host may query or cancel the error while showing the page
        let page = PlaceholderPage::attach(host, url);

        if !self.can_attach_placeholder() {
            page.dismiss();
            return false;
        }
        self.responder.borrow_mut().placeholder = Some(page);
        true
    }

    fn can_attach_placeholder(&self) -> bool {
        let responder = self.responder.borrow();
        responder.is_pending() && responder.placeholder.is_none()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let responder = self.responder.borrow();
        f.debug_struct("CancelHandle")
            .field("state", &responder.state)
            .field("released", &responder.released)
            .field("is_main_frame", &self.is_main_frame)
            .field("is_subresource", &self.is_subresource)
            .finish()
    }
}
