//! A series of non-overlapping cancellation lifetimes.

use super::{CancellationToken, HandleId, LifetimeHandle, SignalOutcome};
use crate::config::SeriesConfig;
use crate::events::{NoOpSeriesEventSink, SeriesEventKind, SeriesEventSink};
use crate::observability::SpanTimer;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Observer invoked once for every released handle.
pub type ReleaseHook = Arc<dyn Fn(HandleId) + Send + Sync>;

/// Point-in-time counters for a series.
///
/// `superseded`, `cleared` and `completed` only count the call that actually
/// signaled a handle, so together they never exceed `issued`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeriesStats {
    /// Handles created by `next`.
    pub issued: u64,
    /// Handles signaled because a later `next` replaced them.
    pub superseded: u64,
    /// Handles signaled by `clear`.
    pub cleared: u64,
    /// Handles signaled by their own lease.
    pub completed: u64,
    /// Handles whose resources were reclaimed, on any path.
    pub released: u64,
}

#[derive(Debug, Default)]
struct Counters {
    issued: AtomicU64,
    superseded: AtomicU64,
    cleared: AtomicU64,
    completed: AtomicU64,
    released: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retirement {
    Superseded,
    Cleared,
    Completed,
}

/// State shared between the series, its leases, and the release actions of
/// its handles.
struct Shared {
    config: SeriesConfig,
    counters: Counters,
    sink: RwLock<Arc<dyn SeriesEventSink>>,
    release_hook: RwLock<Option<ReleaseHook>>,
}

impl Shared {
    fn sink(&self) -> Arc<dyn SeriesEventSink> {
        self.sink.read().clone()
    }

    fn payload(&self, id: HandleId) -> serde_json::Value {
        serde_json::json!({
            "series": self.config.name,
            "handle": id.to_string(),
        })
    }

    fn emit(&self, kind: SeriesEventKind, id: HandleId) {
        self.sink().try_emit(kind.as_str(), Some(self.payload(id)));
    }

    fn on_released(&self, id: HandleId) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        self.emit(SeriesEventKind::Released, id);
        let hook = self.release_hook.read().clone();
        if let Some(hook) = hook {
            hook(id);
        }
    }

    /// Retires a handle and emits the matching event from this thread.
    fn retire(&self, handle: &LifetimeHandle, retirement: Retirement) -> SignalOutcome {
        let (outcome, kind) = self.retire_silently(handle, retirement);
        if let Some(kind) = kind {
            self.emit(kind, handle.id());
        }
        outcome
    }

    /// Signals and releases `handle`, counting the retirement only when this
    /// call is the one that signaled. Returns the event the caller should
    /// emit, if any.
    fn retire_silently(
        &self,
        handle: &LifetimeHandle,
        retirement: Retirement,
    ) -> (SignalOutcome, Option<SeriesEventKind>) {
        let timer = SpanTimer::start("series.retire");
        let (reason, counter, kind) = match retirement {
            Retirement::Superseded => (
                self.config.supersede_reason.as_str(),
                &self.counters.superseded,
                SeriesEventKind::Superseded,
            ),
            Retirement::Cleared => (
                self.config.clear_reason.as_str(),
                &self.counters.cleared,
                SeriesEventKind::Cleared,
            ),
            Retirement::Completed => (
                self.config.complete_reason.as_str(),
                &self.counters.completed,
                SeriesEventKind::Completed,
            ),
        };

        let outcome = handle.retire(reason);
        debug!(
            series = %self.config.name,
            handle = %handle.id(),
            outcome = ?outcome,
            duration_ms = timer.finish(),
            "Retired {}",
            kind
        );

        if outcome == SignalOutcome::Signaled {
            counter.fetch_add(1, Ordering::SeqCst);
            (outcome, Some(kind))
        } else {
            (outcome, None)
        }
    }
}

/// Produces a series of cancellation tokens whose lifetimes never overlap.
///
/// Each call to [`next`](Self::next) cancels the token handed out by the
/// previous call before returning a new one, so operations started under
/// successive tokens never run concurrently, as long as they stop promptly
/// on cancellation.
///
/// The slot holding the current handle is only ever changed by a single
/// exchange. Whichever call wins the exchange owns the previous handle and
/// retires it after the lock is dropped. A lease may race that retirement;
/// the handle itself lets only one of them signal and release.
///
/// Dropping the series leaves the last handle untouched: its token is never
/// cancelled and its release action never runs.
pub struct CancellationSeries {
    shared: Arc<Shared>,
    slot: Mutex<Option<Arc<LifetimeHandle>>>,
}

impl CancellationSeries {
    /// Creates a series with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SeriesConfig::default())
    }

    /// Creates a series with the given configuration.
    #[must_use]
    pub fn with_config(config: SeriesConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                counters: Counters::default(),
                sink: RwLock::new(Arc::new(NoOpSeriesEventSink)),
                release_hook: RwLock::new(None),
            }),
            slot: Mutex::new(None),
        }
    }

    /// Sets the sink that receives lifecycle events.
    #[must_use]
    pub fn with_event_sink(self, sink: Arc<dyn SeriesEventSink>) -> Self {
        *self.shared.sink.write() = sink;
        self
    }

    /// Sets a hook invoked exactly once per released handle.
    ///
    /// The hook runs after the handle's token has been cancelled.
    #[must_use]
    pub fn with_release_hook<F>(self, hook: F) -> Self
    where
        F: Fn(HandleId) + Send + Sync + 'static,
    {
        *self.shared.release_hook.write() = Some(Arc::new(hook));
        self
    }

    /// Returns the series configuration.
    #[must_use]
    pub fn config(&self) -> &SeriesConfig {
        &self.shared.config
    }

    /// Produces the next token, cancelling the one before.
    ///
    /// The previous token is cancelled before this returns. The returned token
    /// was not cancelled at the moment it was installed; a concurrent `next`
    /// or `clear` may cancel it at any time afterwards.
    pub fn next(&self) -> CancellationToken {
        let handle = self.issue();
        // Taken before the exchange: once installed, another caller may
        // supersede and release the handle at any point.
        let token = handle.token();
        if let Some(prior) = self.exchange(Some(handle)) {
            self.shared.retire(&prior, Retirement::Superseded);
        }
        token
    }

    /// Async version of [`next`](Self::next).
    ///
    /// Retiring the previous handle runs its cancellation callbacks. With
    /// `offload_async_signal` enabled they run on the blocking pool and this
    /// future waits for them. Retirement still completes if the future is
    /// dropped while waiting.
    pub async fn next_async(&self) -> CancellationToken {
        let handle = self.issue();
        let token = handle.token();
        let prior = self.exchange(Some(handle));
        self.retire_async(prior, Retirement::Superseded).await;
        token
    }

    /// Like [`next`](Self::next), but also returns the consumer's share of the
    /// handle for reporting natural completion.
    pub fn next_lease(&self) -> Lease {
        let handle = self.issue();
        let lease = Lease {
            token: handle.token(),
            handle: handle.clone(),
            shared: self.shared.clone(),
        };
        if let Some(prior) = self.exchange(Some(handle)) {
            self.shared.retire(&prior, Retirement::Superseded);
        }
        lease
    }

    /// Cancels the current token without issuing a new one.
    ///
    /// Calls made while nothing is current are no-ops.
    pub fn clear(&self) {
        if let Some(prior) = self.exchange(None) {
            self.shared.retire(&prior, Retirement::Cleared);
        }
    }

    /// Async version of [`clear`](Self::clear).
    pub async fn clear_async(&self) {
        let prior = self.exchange(None);
        self.retire_async(prior, Retirement::Cleared).await;
    }

    /// Returns whether `token` belongs to the current handle.
    #[must_use]
    pub fn is_current(&self, token: &CancellationToken) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|handle| handle.owns(token))
    }

    /// Returns whether a handle is currently installed.
    #[must_use]
    pub fn has_current(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Returns a snapshot of the series counters.
    #[must_use]
    pub fn stats(&self) -> SeriesStats {
        let counters = &self.shared.counters;
        SeriesStats {
            issued: counters.issued.load(Ordering::SeqCst),
            superseded: counters.superseded.load(Ordering::SeqCst),
            cleared: counters.cleared.load(Ordering::SeqCst),
            completed: counters.completed.load(Ordering::SeqCst),
            released: counters.released.load(Ordering::SeqCst),
        }
    }

    fn issue(&self) -> Arc<LifetimeHandle> {
        let shared = Arc::downgrade(&self.shared);
        let handle = LifetimeHandle::new().with_release_action(move |id| {
            if let Some(shared) = shared.upgrade() {
                shared.on_released(id);
            }
        });
        self.shared.counters.issued.fetch_add(1, Ordering::SeqCst);
        self.shared.emit(SeriesEventKind::Advanced, handle.id());
        Arc::new(handle)
    }

    /// The single atomic step: install `next`, hand back whatever was there.
    fn exchange(&self, next: Option<Arc<LifetimeHandle>>) -> Option<Arc<LifetimeHandle>> {
        std::mem::replace(&mut *self.slot.lock(), next)
    }

    async fn retire_async(&self, prior: Option<Arc<LifetimeHandle>>, retirement: Retirement) {
        let Some(prior) = prior else {
            return;
        };
        let id = prior.id();

        let offload = self.shared.config.offload_async_signal
            && tokio::runtime::Handle::try_current().is_ok();
        let kind = if offload {
            let shared = self.shared.clone();
            let task =
                tokio::task::spawn_blocking(move || shared.retire_silently(&prior, retirement).1);
            match task.await {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(series = %self.shared.config.name, "Retirement task failed: {}", e);
                    None
                }
            }
        } else {
            self.shared.retire_silently(&prior, retirement).1
        };

        if let Some(kind) = kind {
            let sink = self.shared.sink();
            sink.emit(kind.as_str(), Some(self.shared.payload(id))).await;
        }
    }
}

impl Default for CancellationSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSeries")
            .field("name", &self.shared.config.name)
            .field("has_current", &self.has_current())
            .field("stats", &self.stats())
            .finish()
    }
}

/// The consumer's share of a lifetime handle.
///
/// Completing or dropping the lease retires the handle with the configured
/// `complete_reason`: its token is cancelled, so every remaining observer
/// hears about it, and then it is released. If the series already signaled
/// the handle, the lease does nothing; the series owns that release.
pub struct Lease {
    token: CancellationToken,
    handle: Arc<LifetimeHandle>,
    shared: Arc<Shared>,
}

impl Lease {
    /// Returns the token gating the leased operation.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the leased handle's identifier.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    /// Reports that the operation finished on its own.
    ///
    /// Returns [`SignalOutcome::Signaled`] when this call retired the handle.
    pub fn complete(self) -> SignalOutcome {
        self.shared.retire(&self.handle, Retirement::Completed)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.shared.retire(&self.handle, Retirement::Completed);
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::LifetimeState;
    use crate::events::{CollectingSeriesEventSink, LoggingSeriesEventSink};
    use std::time::Duration;

    fn release_counter() -> (Arc<AtomicU64>, impl Fn(HandleId) + Send + Sync + 'static) {
        let released = Arc::new(AtomicU64::new(0));
        let released_clone = released.clone();
        (released, move |_| {
            released_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_next_cancels_previous() {
        let series = CancellationSeries::new();

        let a = series.next();
        assert!(!a.is_cancelled());

        let b = series.next();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert_eq!(a.reason(), Some("superseded".to_string()));
    }

    #[test]
    fn test_clear_without_next_is_noop() {
        let series = CancellationSeries::new();
        series.clear();
        series.clear();

        assert!(!series.has_current());
        assert_eq!(series.stats(), SeriesStats::default());
    }

    #[test]
    fn test_scenario_next_next_clear_clear() {
        let sink = Arc::new(CollectingSeriesEventSink::new());
        let series = CancellationSeries::new().with_event_sink(sink.clone());

        let a = series.next();
        assert!(!a.is_cancelled());

        let b = series.next();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(series.is_current(&b));
        assert!(!series.is_current(&a));

        series.clear();
        assert!(b.is_cancelled());
        assert_eq!(b.reason(), Some("cleared".to_string()));
        assert!(!series.has_current());

        series.clear();

        assert_eq!(
            series.stats(),
            SeriesStats {
                issued: 2,
                superseded: 1,
                cleared: 1,
                completed: 0,
                released: 2,
            }
        );
        assert_eq!(sink.count_of("series.advanced"), 2);
        assert_eq!(sink.count_of("series.superseded"), 1);
        assert_eq!(sink.count_of("series.cleared"), 1);
        assert_eq!(sink.count_of("series.released"), 2);
    }

    #[test]
    fn test_scenario_with_logging_sink() {
        crate::observability::init_tracing("cancelseries=debug");
        let sink = Arc::new(LoggingSeriesEventSink::info());
        let series = CancellationSeries::with_config(SeriesConfig::new().with_name("logged"))
            .with_event_sink(sink);

        let a = series.next();
        let lease = series.next_lease();
        assert!(a.is_cancelled());
        assert_eq!(lease.complete(), SignalOutcome::Signaled);
        series.clear();

        assert_eq!(
            series.stats(),
            SeriesStats {
                issued: 2,
                superseded: 1,
                cleared: 0,
                completed: 1,
                released: 2,
            }
        );
    }

    #[test]
    fn test_custom_reasons() {
        let series = CancellationSeries::with_config(
            SeriesConfig::new()
                .with_supersede_reason("newer request")
                .with_clear_reason("page closed")
                .with_complete_reason("finished"),
        );

        let a = series.next();
        let b = series.next();
        series.clear();
        let lease = series.next_lease();
        let c = lease.token().clone();
        lease.complete();

        assert_eq!(a.reason(), Some("newer request".to_string()));
        assert_eq!(b.reason(), Some("page closed".to_string()));
        assert_eq!(c.reason(), Some("finished".to_string()));
    }

    #[test]
    fn test_lease_complete_signals_then_supersede_is_noop() {
        let (released, hook) = release_counter();
        let series = CancellationSeries::new().with_release_hook(hook);

        let lease = series.next_lease();
        let token = lease.token().clone();
        let cancels = Arc::new(AtomicU64::new(0));
        let cancels_clone = cancels.clone();
        token.on_cancel(move || {
            cancels_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(lease.complete(), SignalOutcome::Signaled);
        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("completed".to_string()));
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let _next = series.next();
        assert_eq!(token.reason(), Some("completed".to_string()));
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completed_handle_not_counted_as_superseded() {
        let sink = Arc::new(CollectingSeriesEventSink::new());
        let series = CancellationSeries::new().with_event_sink(sink.clone());

        assert_eq!(series.next_lease().complete(), SignalOutcome::Signaled);
        let _next = series.next();

        let stats = series.stats();
        assert_eq!(stats.issued, 2);
        assert_eq!(stats.superseded, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.released, 1);
        assert_eq!(sink.count_of("series.superseded"), 0);
        assert_eq!(sink.count_of("series.completed"), 1);
    }

    #[test]
    fn test_dropped_lease_not_counted_as_cleared() {
        let sink = Arc::new(CollectingSeriesEventSink::new());
        let series = CancellationSeries::new().with_event_sink(sink.clone());

        drop(series.next_lease());
        series.clear();

        let stats = series.stats();
        assert_eq!(stats.cleared, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.released, 1);
        assert_eq!(sink.count_of("series.cleared"), 0);
    }

    #[test]
    fn test_superseded_lease_drop_is_noop() {
        let series = CancellationSeries::new();

        let lease = series.next_lease();
        let _b = series.next();
        assert!(lease.token().is_cancelled());
        assert_eq!(lease.handle.state(), LifetimeState::Released);

        drop(lease);
        let stats = series.stats();
        assert_eq!(stats.released, 1);
        assert_eq!(stats.superseded, 1);
        assert_eq!(stats.completed, 0);
    }

    #[test]
    fn test_drop_leaves_last_handle_untouched() {
        let (released, hook) = release_counter();
        let series = CancellationSeries::new().with_release_hook(hook);

        let first = series.next();
        let last = series.next();
        drop(series);

        assert!(first.is_cancelled());
        assert!(!last.is_cancelled());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lease_complete_wakes_waiter() {
        let series = CancellationSeries::new();
        let lease = series.next_lease();
        let waiter = lease.token().clone();

        let task = tokio::spawn(async move {
            waiter.cancelled().await;
            waiter.reason()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        lease.complete();

        let reason = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .expect("waiter should not panic");
        assert_eq!(reason, Some("completed".to_string()));
    }

    #[tokio::test]
    async fn test_next_async_signals_before_return() {
        let sink = Arc::new(CollectingSeriesEventSink::new());
        let series = CancellationSeries::new().with_event_sink(sink.clone());

        let a = series.next_async().await;
        let b = series.next_async().await;
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());

        series.clear_async().await;
        assert!(b.is_cancelled());
        series.clear_async().await;

        assert_eq!(sink.count_of("series.superseded"), 1);
        assert_eq!(sink.count_of("series.cleared"), 1);
    }

    #[test]
    fn test_async_variants_under_block_on() {
        let series = CancellationSeries::new();
        let a = tokio_test::block_on(series.next_async());
        tokio_test::block_on(series.clear_async());
        assert!(a.is_cancelled());
    }

    #[test]
    fn test_async_variants_without_runtime_retire_inline() {
        let series = CancellationSeries::new();
        let a = futures::executor::block_on(series.next_async());
        let b = futures::executor::block_on(series.next_async());
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
    }
}
