//! Process exit status holder.

use crate::errors::{CancelSeriesError, Result};
use serde::{Deserialize, Serialize};

/// The result of running an external process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessResult {
    exit_code: i32,
}

impl ProcessResult {
    /// Wraps an exit code.
    #[must_use]
    pub const fn new(exit_code: i32) -> Self {
        Self { exit_code }
    }

    /// Returns the exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns true if the process exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Converts a non-zero exit code into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(CancelSeriesError::NonZeroExit(self.exit_code))
        }
    }
}

impl From<i32> for ProcessResult {
    fn from(exit_code: i32) -> Self {
        Self::new(exit_code)
    }
}
