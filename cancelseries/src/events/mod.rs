//! Lifecycle events emitted by a cancellation series.

mod sink;

pub use sink::{
    CollectingSeriesEventSink, LoggingSeriesEventSink, NoOpSeriesEventSink, SeriesEventSink,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of event a series emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesEventKind {
    /// A new handle was installed.
    Advanced,
    /// The previous handle was replaced and signaled.
    Superseded,
    /// The current handle was retired without a replacement.
    Cleared,
    /// A leased handle was retired by its consumer.
    Completed,
    /// A handle's resources were reclaimed.
    Released,
}

impl SeriesEventKind {
    /// Returns the event type string passed to sinks.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Advanced => "series.advanced",
            Self::Superseded => "series.superseded",
            Self::Cleared => "series.cleared",
            Self::Completed => "series.completed",
            Self::Released => "series.released",
        }
    }
}

impl fmt::Display for SeriesEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(SeriesEventKind::Advanced.to_string(), "series.advanced");
        assert_eq!(SeriesEventKind::Superseded.as_str(), "series.superseded");
        assert_eq!(SeriesEventKind::Cleared.as_str(), "series.cleared");
        assert_eq!(SeriesEventKind::Completed.as_str(), "series.completed");
        assert_eq!(SeriesEventKind::Released.as_str(), "series.released");
    }
}
