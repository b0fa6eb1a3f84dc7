//! Cancellation token for cooperative cancellation.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct TokenState {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Callbacks to invoke on cancellation.
    callbacks: Mutex<Vec<CancelCallback>>,
    /// Wakes tasks parked in [`CancellationToken::cancelled`].
    notify: Notify,
}

/// A token for cooperative cancellation.
///
/// Clones share the same state, so the token handed to a consumer observes
/// the cancellation requested through any other clone.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
#[derive(Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// Returns `true` if this call performed the cancellation, `false` if the
    /// token was already cancelled. Callbacks are invoked on the calling
    /// thread, outside any internal lock. Panics in callbacks are logged and
    /// suppressed.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        {
            // The reason is stored before the flag, under the write lock, so
            // any observer that sees `is_cancelled()` also sees the reason.
            let mut slot = self.state.reason.write();
            if self.state.cancelled.load(Ordering::SeqCst) {
                return false;
            }
            *slot = Some(reason.into());
            self.state.cancelled.store(true, Ordering::SeqCst);
        }

        let callbacks = std::mem::take(&mut *self.state.callbacks.lock());
        for callback in callbacks {
            invoke(callback);
        }

        self.state.notify.notify_waiters();
        true
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut callbacks = self.state.callbacks.lock();
            // Checked under the lock: `cancel` drains the list after setting
            // the flag, so a callback pushed here is guaranteed to be drained.
            if !self.is_cancelled() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        invoke(Box::new(callback));
    }

    /// Waits until cancellation has been requested.
    pub async fn cancelled(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.state.reason.read().clone()
    }

    /// Returns the number of callbacks waiting for cancellation.
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.state.callbacks.lock().len()
    }

    /// Returns whether two tokens observe the same cancellation state.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

fn invoke(callback: CancelCallback) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
