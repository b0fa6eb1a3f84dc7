//! Lifetime handles: the signaling side paired with a cancellation token.

use super::CancellationToken;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;
use uuid::Uuid;

/// A one-shot action run when a handle's resources are reclaimed.
pub type ReleaseAction = Box<dyn FnOnce(HandleId) + Send>;

/// Unique identifier of a lifetime handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a lifetime handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifetimeState {
    /// Issued and not yet cancelled.
    Active,
    /// Cancellation has been requested; resources not yet reclaimed.
    Signaled,
    /// Resources reclaimed. Terminal.
    Released,
}

impl LifetimeState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Signaled => 1,
            Self::Released => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Signaled,
            _ => Self::Released,
        }
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Released)
    }
}

impl fmt::Display for LifetimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Signaled => write!(f, "signaled"),
            Self::Released => write!(f, "released"),
        }
    }
}

/// Result of asking a handle to retire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// This call signaled the handle and released it.
    Signaled,
    /// Another caller is signaling the handle and will release it.
    AlreadySignaled,
    /// Another caller already signaled and released the handle.
    AlreadyReleased,
}

/// One operation's cancellable lifetime.
///
/// Transitions are strictly `Active -> Signaled -> Released`. The caller whose
/// compare-exchange moves the handle out of `Active` cancels the token and is
/// then the only one allowed to release it, so a handle is never released
/// before its token is cancelled and the release action runs at most once.
pub struct LifetimeHandle {
    id: HandleId,
    state: AtomicU8,
    token: CancellationToken,
    release_action: Mutex<Option<ReleaseAction>>,
}

impl LifetimeHandle {
    /// Creates an active handle with a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: HandleId::generate(),
            state: AtomicU8::new(LifetimeState::Active.as_u8()),
            token: CancellationToken::new(),
            release_action: Mutex::new(None),
        }
    }

    /// Attaches the action run exactly once when the handle is released.
    #[must_use]
    pub fn with_release_action<F>(self, action: F) -> Self
    where
        F: FnOnce(HandleId) + Send + 'static,
    {
        *self.release_action.lock() = Some(Box::new(action));
        self
    }

    /// Returns the handle identifier.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifetimeState {
        LifetimeState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns the observation side of this handle.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns whether `token` observes this handle.
    #[must_use]
    pub fn owns(&self, token: &CancellationToken) -> bool {
        self.token.same_as(token)
    }

    /// Signals cancellation, then releases. Idempotent.
    ///
    /// Only the call that returns [`SignalOutcome::Signaled`] does any work.
    /// Every other call leaves the handle to that caller.
    pub fn retire(&self, reason: &str) -> SignalOutcome {
        match self.transition(LifetimeState::Active, LifetimeState::Signaled) {
            Ok(()) => {
                self.token.cancel(reason);
                debug!(handle = %self.id, reason, "Lifetime signaled");
                self.release_signaled();
                SignalOutcome::Signaled
            }
            Err(LifetimeState::Released) => SignalOutcome::AlreadyReleased,
            Err(_) => SignalOutcome::AlreadySignaled,
        }
    }

    fn release_signaled(&self) {
        if self
            .transition(LifetimeState::Signaled, LifetimeState::Released)
            .is_err()
        {
            return;
        }
        let action = self.release_action.lock().take();
        if let Some(action) = action {
            action(self.id);
        }
        debug!(handle = %self.id, "Lifetime released");
    }

    fn transition(&self, from: LifetimeState, to: LifetimeState) -> Result<(), LifetimeState> {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(LifetimeState::from_u8)
    }
}

impl Default for LifetimeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LifetimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifetimeHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
