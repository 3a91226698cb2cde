//! The result channel between the scanner and its host.
//!
//! Hosts receive results through a [`ScanDelegate`] and/or a one-shot
//! [`CompletionHandler`]; both are optional and both are invoked with the
//! completion handler first. Success is guarded to fire at most once per
//! armed cycle; failures (notably `ReadFailure`) repeat as they happen.

use crate::error::ScanError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Host callbacks for scan results.
///
/// `did_change_torch` has a default empty body, so delegates that do not
/// care about the torch implement only the two required methods.
pub trait ScanDelegate: Send + Sync {
    /// A code was scanned and presented; `code` is its decoded text.
    fn did_success(&self, code: &str);

    /// A setup or detection failure occurred.
    fn did_fail(&self, error: &ScanError);

    /// The torch was toggled.
    fn did_change_torch(&self, is_on: bool) {
        let _ = is_on;
    }
}

/// One-shot completion alternative to [`ScanDelegate`]:
/// `(succeeded, decoded_text, error)`.
pub type CompletionHandler =
    Box<dyn Fn(bool, Option<&str>, Option<&ScanError>) + Send + Sync>;

/// Fans results out to the configured delegate and completion handler.
pub struct ResultChannel {
    delegate: Mutex<Option<Arc<dyn ScanDelegate>>>,
    completion: Mutex<Option<Arc<CompletionHandler>>>,
    success_reported: AtomicBool,
}

impl ResultChannel {
    /// Creates a channel with no sinks attached.
    pub fn new() -> Self {
        Self {
            delegate: Mutex::new(None),
            completion: Mutex::new(None),
            success_reported: AtomicBool::new(false),
        }
    }

    /// Replaces the delegate.
    pub fn set_delegate(&self, delegate: Option<Arc<dyn ScanDelegate>>) {
        *lock(&self.delegate) = delegate;
    }

    /// Replaces the completion handler.
    pub fn set_completion(&self, completion: Option<CompletionHandler>) {
        *lock(&self.completion) = completion.map(Arc::new);
    }

    /// Re-opens the success guard for a fresh cycle.
    pub fn rearm(&self) {
        self.success_reported.store(false, Ordering::SeqCst);
    }

    /// Reports a scanned code. No-ops after the first success of a cycle.
    pub fn success(&self, code: &str) {
        if self.success_reported.swap(true, Ordering::SeqCst) {
            tracing::debug!("duplicate success suppressed");
            return;
        }
        if let Some(completion) = lock(&self.completion).clone() {
            (*completion)(true, Some(code), None);
        }
        if let Some(delegate) = lock(&self.delegate).clone() {
            delegate.did_success(code);
        }
    }

    /// Reports a failure. May repeat.
    pub fn failure(&self, error: &ScanError) {
        if let Some(completion) = lock(&self.completion).clone() {
            (*completion)(false, None, Some(error));
        }
        if let Some(delegate) = lock(&self.delegate).clone() {
            delegate.did_fail(error);
        }
    }

    /// Reports a torch state change.
    pub fn torch_changed(&self, is_on: bool) {
        if let Some(delegate) = lock(&self.delegate).clone() {
            delegate.did_change_torch(is_on);
        }
    }
}

impl Default for ResultChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
