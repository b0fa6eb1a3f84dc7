//! # Cancelseries
//!
//! Non-overlapping cancellation lifetimes for concurrent callers.
//!
//! A [`CancellationSeries`](cancellation::CancellationSeries) hands out a fresh
//! [`CancellationToken`](cancellation::CancellationToken) on every call to
//! `next`, cancelling the token it handed out before. Operations started
//! under successive tokens therefore never overlap, provided they stop
//! promptly once their token is cancelled.
//!
//! - **Race-free handoff**: the current handle is swapped in a single step;
//!   each superseded handle is signaled and released by exactly one caller
//! - **Threads or tasks**: blocking `next`/`clear` and awaitable
//!   `next_async`/`clear_async`
//! - **Natural completion**: a [`Lease`](cancellation::Lease) lets the
//!   consumer retire its own handle without racing the series
//!
//! ## Quick Start
//!
//! ```rust
//! use cancelseries::prelude::*;
//!
//! let series = CancellationSeries::new();
//!
//! let first = series.next();
//! let second = series.next();
//! assert!(first.is_cancelled());
//! assert!(!second.is_cancelled());
//!
//! series.clear();
//! assert!(second.is_cancelled());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod errors;
pub mod events;
pub mod observability;

#[cfg(feature = "collaborators")]
pub mod otlp;
#[cfg(feature = "collaborators")]
pub mod process;
#[cfg(feature = "collaborators")]
pub mod resource;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{
        CancellationSeries, CancellationToken, HandleId, Lease, LifetimeHandle, LifetimeState,
        SeriesStats, SignalOutcome,
    };
    pub use crate::config::SeriesConfig;
    pub use crate::errors::CancelSeriesError;
    pub use crate::events::{
        CollectingSeriesEventSink, LoggingSeriesEventSink, NoOpSeriesEventSink, SeriesEventSink,
    };
}
