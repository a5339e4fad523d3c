//! Certificate Error Dispatch
//!
//! Receives certificate errors from the network stack, decides what happens
//! to the failing request right away, and hands a [`CertificateError`] to the
//! application.

use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::certificate::CertHandle;
use crate::certificate_error::{CertificateError, CertificateErrorInfo, ResponseCallback};
use crate::config::SecurityConfig;
use crate::manager::{CertificateErrorManager, FrameId};
use crate::net_status::{cert_error_for_net_error, net_error};
use crate::placeholder::NavigationHost;
use crate::SslError;

/// Application side receiver of certificate errors
pub trait CertificateErrorClient {
    /// Dropping `error` without a response denies it, if it's overridable
    fn on_certificate_error(&mut self, error: CertificateError);
}

/// Kind of resource a request loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    Xhr,
    Other,
}

impl ResourceType {
    /// Whether this is a frame document
    pub fn is_frame(self) -> bool {
        matches!(self, Self::MainFrame | Self::SubFrame)
    }
}

/// What the network stack does with the request right away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateRequestResult {
    /// Wait for the response callback
    Continue,
    /// Fail the request, loading an error page for documents
    Deny,
    /// Stop the request without an error page
    Cancel,
}

/// A certificate error reported by the network stack
#[derive(Debug, Clone)]
pub struct CertificateErrorEvent {
    pub frame: FrameId,
    pub is_main_frame: bool,
    /// Certificate net error code
    pub net_error: i32,
    pub certificate: Option<CertHandle>,
    pub url: Url,
    pub resource_type: ResourceType,
    pub overridable: bool,
    pub strict_enforcement: bool,
}

impl CertificateErrorEvent {
    /// Overridable main frame document error
    pub fn main_frame(frame: FrameId, net_error: i32, url: Url) -> Self {
        Self {
            frame,
            is_main_frame: true,
            net_error,
            certificate: None,
            url,
            resource_type: ResourceType::MainFrame,
            overridable: true,
            strict_enforcement: false,
        }
    }
}

/// Dispatches certificate errors for a page
pub struct CertificateErrorDispatcher {
    config: SecurityConfig,
    client: Option<Box<dyn CertificateErrorClient>>,
    host: Option<Rc<dyn NavigationHost>>,
    manager: CertificateErrorManager,
}

impl CertificateErrorDispatcher {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config,
            client: None,
            host: None,
            manager: CertificateErrorManager::new(),
        }
    }

    /// Set the application client. Without one, errors are denied.
    pub fn set_client(&mut self, client: Option<Box<dyn CertificateErrorClient>>) {
        self.client = client;
    }

    /// Set the navigation controller used for placeholder pages
    pub fn set_navigation_host(&mut self, host: Option<Rc<dyn NavigationHost>>) {
        self.host = host;
    }

    pub fn can_dispatch(&self) -> bool {
        self.client.is_some()
    }

    pub fn manager(&self) -> &CertificateErrorManager {
        &self.manager
    }

    /// Handle a certificate error from the network stack.
    ///
    /// Only main frame document errors are overridable, as that's the only
    /// case where the page's security status is guaranteed to be correct and
    /// the application can show a meaningful UI.
    pub fn allow_certificate_error(
        &mut self,
        event: CertificateErrorEvent,
        response: Option<ResponseCallback>,
    ) -> Result<CertificateRequestResult, SslError> {
        if !net_error::is_certificate_error(event.net_error) {
            return Err(SslError::NotCertificateError(event.net_error));
        }
        debug_assert!(!event.strict_enforcement || !event.overridable);

        let Some(client) = self.client.as_mut() else {
            tracing::debug!("No certificate error client, denying {}", event.url);
            return Ok(CertificateRequestResult::Deny);
        };

        let is_main_frame_resource = event.resource_type == ResourceType::MainFrame;
        let overridable = event.overridable
            && !event.strict_enforcement
            && response.is_some()
            && is_main_frame_resource;

        let result = if !is_main_frame_resource {
            CertificateRequestResult::Deny
        } else if !overridable {
            // A placeholder page is shown instead of an error page
            CertificateRequestResult::Cancel
        } else {
            CertificateRequestResult::Continue
        };

        let info = CertificateErrorInfo {
            is_main_frame: event.is_main_frame,
            is_subresource: !event.resource_type.is_frame(),
            cert_error: cert_error_for_net_error(event.net_error, event.certificate.as_deref()),
            certificate: event.certificate,
            url: event.url,
            strict_enforcement: event.strict_enforcement,
            overridable,
        };
        let url = info.url.clone();
        let error = CertificateError::new(info, if overridable { response } else { None });
        let handle = error.cancel_handle();

        tracing::info!(
            "Certificate error ({}) for {}, overridable={} result={:?}",
            error.cert_error(),
            url,
            overridable,
            result
        );

        self.manager.add(event.frame, handle.clone());
        client.on_certificate_error(error);

        if !handle.is_pending() {
            // Responded during dispatch, or dropped by the client
            return Ok(result);
        }

        if !is_main_frame_resource || !self.config.placeholder_pages {
            return Ok(result);
        }

        if let Some(host) = &self.host {
            handle.attach_placeholder(host.clone(), &url);
        }

        Ok(result)
    }

    /// Forwarded from the engine when a frame's provisional load stops
    pub fn did_stop_provisional_load_for_frame(&mut self, frame: FrameId) -> usize {
        self.manager.did_stop_provisional_load_for_frame(frame)
    }

    /// Forwarded from the engine when a frame is detached
    pub fn frame_detached(&mut self, frame: FrameId) -> usize {
        self.manager.frame_detached(frame)
    }
}

impl fmt::Debug for CertificateErrorDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateErrorDispatcher")
            .field("config", &self.config)
            .field("has_client", &self.client.is_some())
            .field("has_host", &self.host.is_some())
            .field("manager", &self.manager)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate_error::ResponseState;
    use crate::placeholder::testing::{HostCall, RecordingHost};
    use crate::types::CertError;
    use std::cell::{Cell, RefCell};

    /// Keeps every error it receives
    struct KeepingClient(Rc<RefCell<Vec<CertificateError>>>);

    impl CertificateErrorClient for KeepingClient {
        fn on_certificate_error(&mut self, error: CertificateError) {
            self.0.borrow_mut().push(error);
        }
    }

    /// Drops every error it receives
    struct DroppingClient;

    impl CertificateErrorClient for DroppingClient {
        fn on_certificate_error(&mut self, _error: CertificateError) {}
    }

    struct Fixture {
        dispatcher: CertificateErrorDispatcher,
        errors: Rc<RefCell<Vec<CertificateError>>>,
        host: Rc<RecordingHost>,
        responses: Rc<Cell<u32>>,
        last_response: Rc<Cell<Option<bool>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let errors = Rc::new(RefCell::new(Vec::new()));
            let host = Rc::new(RecordingHost::default());
            let mut dispatcher = CertificateErrorDispatcher::new(SecurityConfig::default());
            dispatcher.set_client(Some(Box::new(KeepingClient(errors.clone()))));
            dispatcher.set_navigation_host(Some(host.clone()));
            Self {
                dispatcher,
                errors,
                host,
                responses: Rc::new(Cell::new(0)),
                last_response: Rc::new(Cell::new(None)),
            }
        }

        fn callback(&self) -> Option<ResponseCallback> {
            let (count, last) = (self.responses.clone(), self.last_response.clone());
            Some(Box::new(move |allow| {
                count.set(count.get() + 1);
                last.set(Some(allow));
            }))
        }

        fn dispatch(&mut self, event: CertificateErrorEvent) -> CertificateRequestResult {
            let callback = self.callback();
            self.dispatcher.allow_certificate_error(event, callback).unwrap()
        }

        fn last_error_state(&self) -> ResponseState {
            self.errors.borrow().last().unwrap().state()
        }
    }

    fn url() -> Url {
        Url::parse("https://www.foo.com/").unwrap()
    }

    fn event() -> CertificateErrorEvent {
        CertificateErrorEvent::main_frame(1, net_error::ERR_CERT_COMMON_NAME_INVALID, url())
    }

    #[test]
    fn test_not_a_certificate_error() {
        let mut fixture = Fixture::new();
        let mut event = event();
        event.net_error = -105;

        let result = fixture.dispatcher.allow_certificate_error(event, None);

        assert!(matches!(result, Err(SslError::NotCertificateError(-105))));
    }

    #[test]
    fn test_no_client_denies() {
        let mut fixture = Fixture::new();
        fixture.dispatcher.set_client(None);
        assert!(!fixture.dispatcher.can_dispatch());

        assert_eq!(fixture.dispatch(event()), CertificateRequestResult::Deny);
        assert_eq!(fixture.responses.get(), 0);
    }

    #[test]
    fn test_main_frame_continue() {
        let mut fixture = Fixture::new();

        assert_eq!(fixture.dispatch(event()), CertificateRequestResult::Continue);

        let errors = fixture.errors.borrow();
        let error = errors.last().unwrap();
        assert!(error.is_main_frame());
        assert!(!error.is_subresource());
        assert!(error.overridable());
        assert_eq!(error.cert_error(), CertError::BadIdentity);
        assert_eq!(error.url(), &url());
    }

    #[test]
    fn test_resource_types() {
        let rows = [
            (ResourceType::MainFrame, true, CertificateRequestResult::Continue, true, false),
            (ResourceType::MainFrame, false, CertificateRequestResult::Cancel, false, false),
            (ResourceType::SubFrame, true, CertificateRequestResult::Deny, false, false),
            (ResourceType::Script, true, CertificateRequestResult::Deny, false, true),
            (ResourceType::Image, true, CertificateRequestResult::Deny, false, true),
        ];

        for (resource_type, overridable_in, result, overridable_out, is_subresource) in rows {
            let mut fixture = Fixture::new();
            let mut event = event();
            event.resource_type = resource_type;
            event.is_main_frame = resource_type != ResourceType::SubFrame;
            event.overridable = overridable_in;

            assert_eq!(fixture.dispatch(event), result, "{:?}", resource_type);
            let errors = fixture.errors.borrow();
            let error = errors.last().unwrap();
            assert_eq!(error.overridable(), overridable_out, "{:?}", resource_type);
            assert_eq!(error.is_subresource(), is_subresource, "{:?}", resource_type);
        }
    }

    #[test]
    fn test_strict_enforcement() {
        let mut fixture = Fixture::new();
        let mut event = event();
        event.strict_enforcement = true;
        event.overridable = false;

        assert_eq!(fixture.dispatch(event), CertificateRequestResult::Cancel);
        let errors = fixture.errors.borrow();
        assert!(errors.last().unwrap().strict_enforcement());
        assert!(!errors.last().unwrap().overridable());
    }

    #[test]
    fn test_missing_callback_is_not_overridable() {
        let mut fixture = Fixture::new();

        let result = fixture.dispatcher.allow_certificate_error(event(), None).unwrap();

        assert_eq!(result, CertificateRequestResult::Cancel);
        assert!(!fixture.errors.borrow().last().unwrap().overridable());
    }

    #[test]
    fn test_response() {
        let mut fixture = Fixture::new();
        fixture.dispatch(event());

        fixture.errors.borrow().last().unwrap().allow();

        assert_eq!(fixture.responses.get(), 1);
        assert_eq!(fixture.last_response.get(), Some(true));
        assert_eq!(fixture.host.calls().last(), Some(&HostCall::Proceed));
    }

    #[test]
    fn test_placeholder_page() {
        let mut fixture = Fixture::new();
        fixture.dispatch(event());

        assert_eq!(fixture.host.calls(), vec![HostCall::Show("https://www.foo.com/".into())]);
        assert_eq!(fixture.last_error_state(), ResponseState::Pending);
    }

    #[test]
    fn test_placeholder_for_non_overridable_main_frame() {
        let mut fixture = Fixture::new();
        let mut event = event();
        event.overridable = false;
        fixture.dispatch(event);

        assert_eq!(fixture.host.calls().len(), 1);

        fixture.errors.borrow_mut().clear();
        assert_eq!(fixture.host.calls().last(), Some(&HostCall::RollBack));
    }

    #[test]
    fn test_no_placeholder_for_non_main_frame() {
        let mut fixture = Fixture::new();
        let mut event = event();
        event.resource_type = ResourceType::SubFrame;
        event.is_main_frame = false;

        assert_eq!(fixture.dispatch(event), CertificateRequestResult::Deny);
        assert!(fixture.host.calls().is_empty());
    }

    #[test]
    fn test_no_placeholder_when_disabled() {
        let mut fixture = Fixture::new();
        let config = SecurityConfig { placeholder_pages: false, ..SecurityConfig::default() };
        fixture.dispatcher.config = config;

        fixture.dispatch(event());

        assert!(fixture.host.calls().is_empty());
    }

    #[test]
    fn test_no_placeholder_for_sync_response() {
        let mut fixture = Fixture::new();
        fixture.dispatcher.set_client(Some(Box::new(DroppingClient)));

        assert_eq!(fixture.dispatch(event()), CertificateRequestResult::Continue);

        assert_eq!(fixture.responses.get(), 1);
        assert_eq!(fixture.last_response.get(), Some(false));
        assert!(fixture.host.calls().is_empty());
        assert_eq!(fixture.dispatcher.manager().pending_count(), 0);
    }

    #[test]
    fn test_stop_provisional_load_cancels() {
        let mut fixture = Fixture::new();
        fixture.dispatch(event());
        let cancelled = Rc::new(Cell::new(false));
        let c = cancelled.clone();
        fixture.errors.borrow().last().unwrap().set_cancel_callback(move || c.set(true));

        assert_eq!(fixture.dispatcher.did_stop_provisional_load_for_frame(1), 1);

        assert!(cancelled.get());
        assert_eq!(fixture.last_error_state(), ResponseState::Cancelled);
        assert_eq!(fixture.responses.get(), 0);
        assert_eq!(fixture.host.calls().last(), Some(&HostCall::RollBack));
    }

    #[test]
    fn test_frame_detached_cancels_subresource_errors() {
        let mut fixture = Fixture::new();
        let mut event = event();
        event.frame = 3;
        event.resource_type = ResourceType::Script;
        fixture.dispatch(event);

        assert_eq!(fixture.dispatcher.did_stop_provisional_load_for_frame(3), 0);
        assert_eq!(fixture.dispatcher.frame_detached(3), 1);
        assert_eq!(fixture.last_error_state(), ResponseState::Cancelled);
    }
}
