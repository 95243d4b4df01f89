//! Cooperative cancellation for crew runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

/// A cloneable cancellation flag.
///
/// The orchestrator checks the flag at task boundaries and the agent runner
/// checks it between reasoning steps. A model or tool call already in flight
/// is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    sig: Arc<AtomicBool>,
    reason: Arc<OnceLock<String>>,
}

impl CancelSignal {
    /// Create a signal that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.sig.store(true, Ordering::SeqCst);
    }

    /// Request cancellation with a reason. The first reason wins.
    pub fn cancel_with_reason(&self, reason: &str) {
        let _ = self.reason.set(reason.to_owned());
        self.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.sig.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if one was given.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    /// Returns [`Error::Cancelled`] if cancellation has been requested.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Cancelled`] after [`cancel`](Self::cancel).
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled(self.reason().map(str::to_owned)))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        assert!(signal.check().is_ok());

        clone.cancel_with_reason("ctrl-c");
        assert!(signal.is_cancelled());
        assert_eq!(signal.reason(), Some("ctrl-c"));
        assert!(matches!(signal.check(), Err(Error::Cancelled(Some(r))) if r == "ctrl-c"));
    }

    #[test]
    fn first_reason_wins() {
        let signal = CancelSignal::new();
        signal.cancel_with_reason("first");
        signal.cancel_with_reason("second");
        assert_eq!(signal.reason(), Some("first"));
    }

    #[test]
    fn cancel_without_reason() {
        let signal = CancelSignal::new();
        signal.cancel();
        assert!(matches!(signal.check(), Err(Error::Cancelled(None))));
    }
}
