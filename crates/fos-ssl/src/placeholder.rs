//! Placeholder Pages
//!
//! While a main frame certificate error is unresolved, a transient navigation
//! entry for the failing URL keeps the URL bar, back button and loading state
//! consistent for the application's error UI.

use std::fmt;
use std::rc::Rc;

use url::Url;

/// Navigation controller of the page an error belongs to
pub trait NavigationHost {
    /// Insert a transient entry showing `url`
    fn show_placeholder(&self, url: &Url);

    /// Let the navigation continue past the transient entry
    fn proceed(&self);

    /// Discard the transient entry and return to the last committed entry
    fn roll_back(&self);
}

/// Transient entry attached to a pending certificate error.
///
/// Calls exactly one of [`NavigationHost::proceed`] or
/// [`NavigationHost::roll_back`] over its lifetime. Dropping an unresolved
/// placeholder rolls back.
pub struct PlaceholderPage {
    host: Rc<dyn NavigationHost>,
    url: Url,
    resolved: bool,
}

impl PlaceholderPage {
    /// Show a placeholder for `url`
    pub fn attach(host: Rc<dyn NavigationHost>, url: &Url) -> Self {
        tracing::debug!("Showing certificate error placeholder for {}", url);
        host.show_placeholder(url);
        Self {
            host,
            url: url.clone(),
            resolved: false,
        }
    }

    /// The error was allowed
    pub fn proceed(mut self) {
        self.resolved = true;
        self.host.proceed();
    }

    /// The error was denied or cancelled
    pub fn dismiss(mut self) {
        self.resolved = true;
        self.host.roll_back();
    }
}

impl Drop for PlaceholderPage {
    fn drop(&mut self) {
        if !self.resolved {
            self.host.roll_back();
        }
    }
}

impl fmt::Debug for PlaceholderPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderPage")
            .field("url", &self.url.as_str())
            .field("resolved", &self.resolved)
            .finish()
    }
}
