//! Series event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, trace, Level};

/// Trait for sinks that receive series lifecycle events.
///
/// Blocking series operations call [`try_emit`](SeriesEventSink::try_emit)
/// from the thread that performed the transition. `next_async` and
/// `clear_async` await [`emit`](SeriesEventSink::emit) for the retirement
/// they performed.
#[async_trait]
pub trait SeriesEventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "series.advanced")
    /// * `data` - Optional event data
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event without blocking.
    ///
    /// This method must never panic. Errors are logged but suppressed.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSeriesEventSink;

#[async_trait]
impl SeriesEventSink for NoOpSeriesEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// A sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingSeriesEventSink {
    level: Level,
}

impl Default for LoggingSeriesEventSink {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggingSeriesEventSink {
    /// Creates a logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: Option<&serde_json::Value>) {
        match self.level {
            Level::TRACE => {
                trace!(event_type = %event_type, event_data = ?data, "Series event: {}", event_type);
            }
            Level::DEBUG => {
                debug!(event_type = %event_type, event_data = ?data, "Series event: {}", event_type);
            }
            _ => {
                info!(event_type = %event_type, event_data = ?data, "Series event: {}", event_type);
            }
        }
    }
}

#[async_trait]
impl SeriesEventSink for LoggingSeriesEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// A collecting sink for tests and diagnostics.
#[derive(Debug, Default)]
pub struct CollectingSeriesEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingSeriesEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns how many events of exactly this type were collected.
    #[must_use]
    pub fn count_of(&self, event_type: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t == event_type)
            .count()
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SeriesEventSink for CollectingSeriesEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpSeriesEventSink;
        sink.emit("series.advanced", None).await;
        sink.try_emit("series.cleared", Some(serde_json::json!({"x": 1})));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingSeriesEventSink::info();
        sink.emit("series.advanced", Some(serde_json::json!({"series": "a"}))).await;
        sink.try_emit("series.released", None);
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingSeriesEventSink::new();
        assert!(sink.is_empty());

        sink.emit("series.advanced", None).await;
        sink.try_emit("series.superseded", Some(serde_json::json!({"handle": "h"})));
        sink.try_emit("series.advanced", None);

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.count_of("series.advanced"), 2);
        assert_eq!(sink.events_of_type("series.sup").len(), 1);
        assert_eq!(sink.events()[0].0, "series.advanced");
    }
}
