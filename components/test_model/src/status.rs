//! Test status lifecycle.

use serde::{Deserialize, Serialize};

/// Status of a [`crate::Test`].
///
/// `Running` is initial; `Passed` and `Failed` are terminal for one
/// execution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Callback has not settled yet
    #[default]
    Running,
    /// Callback settled with a truthy result
    Passed,
    /// Callback settled with a falsy result
    Failed,
}

impl TestStatus {
    /// Terminal status for a callback result
    pub fn from_outcome(passed: bool) -> Self {
        if passed {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        }
    }

    /// Check if the test is still running
    pub fn is_running(&self) -> bool {
        matches!(self, TestStatus::Running)
    }

    /// Check if the test passed
    pub fn is_passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }

    /// Check if the test failed
    pub fn is_failed(&self) -> bool {
        matches!(self, TestStatus::Failed)
    }

    /// Check if the status can no longer change in this pass
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

