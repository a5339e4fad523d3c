//! Callback List
//!
//! Ordered list of observer callbacks. Registering returns a [`Subscription`]
//! and dropping it unregisters the callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<A> = Box<dyn FnMut(A)>;

struct Slot<A> {
    id: u64,
    /// Taken out while the callback runs
    callback: Option<Callback<A>>,
}

struct Inner<A> {
    slots: Vec<Slot<A>>,
    next_id: u64,
}

/// Callbacks notified synchronously in registration order
pub struct CallbackList<A> {
    inner: Rc<RefCell<Inner<A>>>,
}

impl<A: Copy + 'static> CallbackList<A> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner { slots: Vec::new(), next_id: 0 })),
        }
    }

    /// Register a callback
    #[must_use = "the callback is removed when the subscription is dropped"]
    pub fn add(&self, callback: impl FnMut(A) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.slots.push(Slot { id, callback: Some(Box::new(callback)) });

        let weak: Weak<RefCell<Inner<A>>> = Rc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().slots.retain(|slot| slot.id != id);
                }
            })),
        }
    }

    /// Run every registered callback with `arg`.
    ///
    /// Callbacks added during notification are not run. Callbacks removed
    /// during notification are not run if they haven't been already.
    pub fn notify(&self, arg: A) {
        let ids: Vec<u64> = self.inner.borrow().slots.iter().map(|slot| slot.id).collect();
        tracing::trace!("Notifying {} callbacks", ids.len());

        for id in ids {
            let callback = self
                .inner
                .borrow_mut()
                .slots
                .iter_mut()
                .find(|slot| slot.id == id)
                .and_then(|slot| slot.callback.take());

            let Some(mut callback) = callback else {
                continue;
            };

            callback(arg);

            let mut inner = self.inner.borrow_mut();
            if let Some(slot) = inner.slots.iter_mut().find(|slot| slot.id == id) {
                slot.callback = Some(callback);
            }
        }
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Copy + 'static> Default for CallbackList<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for CallbackList<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.inner.borrow().slots.len())
            .finish()
    }
}

/// Keeps a callback registered while alive
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
