//! Certificate Error Manager
//!
//! Keeps track of pending certificate errors per frame, so they can be
//! cancelled when the frame's load stops, the frame goes away or the page
//! is closed.

use crate::certificate_error::CancelHandle;

/// Identifies a frame within a page
pub type FrameId = u64;

#[derive(Debug)]
struct TrackedError {
    frame: FrameId,
    handle: CancelHandle,
}

/// Pending certificate errors of a page
#[derive(Debug, Default)]
pub struct CertificateErrorManager {
    errors: Vec<TrackedError>,
}

impl CertificateErrorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an error raised for `frame`
    pub fn add(&mut self, frame: FrameId, handle: CancelHandle) {
        self.compact();
        self.errors.push(TrackedError { frame, handle });
    }

    /// The provisional load in `frame` stopped. Frame errors (not
    /// subresource errors) for it are cancelled.
    pub fn did_stop_provisional_load_for_frame(&mut self, frame: FrameId) -> usize {
        self.cancel_where(|e| e.frame == frame && !e.handle.is_subresource())
    }

    /// `frame` was removed from the page. All of its errors are cancelled.
    pub fn frame_detached(&mut self, frame: FrameId) -> usize {
        self.cancel_where(|e| e.frame == frame)
    }

    /// Cancel every pending error
    pub fn cancel_all(&mut self) -> usize {
        self.cancel_where(|_| true)
    }

    /// Number of errors still awaiting a decision
    pub fn pending_count(&self) -> usize {
        self.errors.iter().filter(|e| e.handle.is_pending()).count()
    }

    fn compact(&mut self) {
        self.errors.retain(|e| e.handle.is_pending());
    }

    /// Remove matching errors from the list, then cancel them. Cancel
    /// callbacks never see a half-updated list.
    fn cancel_where(&mut self, matches: impl Fn(&TrackedError) -> bool) -> usize {
        self.compact();

        let (cancel, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.errors)
            .into_iter()
            .partition(|e| matches(e));
        self.errors = keep;

        let count = cancel.iter().filter(|e| e.handle.cancel()).count();
        if count > 0 {
            tracing::debug!("Cancelled {} pending certificate errors", count);
        }
        count
    }
}

impl Drop for CertificateErrorManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
