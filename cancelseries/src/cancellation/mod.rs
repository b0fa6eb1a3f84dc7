//! Cancellation tokens, lifetime handles, and the series that sequences them.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation
//! - LifetimeHandle pairing a token with its signaling side
//! - CancellationSeries for handing out non-overlapping lifetimes

mod handle;
mod series;
mod token;


pub use handle::{HandleId, LifetimeHandle, LifetimeState, ReleaseAction, SignalOutcome};
pub use series::{CancellationSeries, Lease, ReleaseHook, SeriesStats};
pub use token::{CancelCallback, CancellationToken};
