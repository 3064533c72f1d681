//! Status-change notifications.

use crate::node::Node;
use crate::style::Styler;
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{error, warn};

/// What a stuck test does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Abort the process naming the test
    #[default]
    Exit,
    /// Return [`core_types::EasyTestsError::Timeout`] from the test's task
    Error,
}

impl TimeoutPolicy {
    /// React to `test` missing its deadline
    pub fn apply(self, test: &str) {
        match self {
            TimeoutPolicy::Exit => abort_on_timeout(test),
            TimeoutPolicy::Error => warn!(test, "test timed out"),
        }
    }
}

/// Notified by tests as their status changes
pub trait Reporter {
    /// A test changed status
    fn changed(&self);

    /// A test did not settle within its timeout.
    ///
    /// Called at most once per test execution. The default ends the process.
    fn timed_out(&self, test: &str) {
        abort_on_timeout(test)
    }
}

/// Report a stuck test and terminate the process
pub fn abort_on_timeout(test: &str) -> ! {
    error!(test, "test timed out, aborting run");
    eprintln!("Test {test} timed out.");
    std::process::exit(1)
}

/// Repaints the whole tree on every change
pub struct RenderReporter {
    root: Node,
    surface: Rc<dyn Surface>,
    styler: Styler,
    policy: TimeoutPolicy,
}

impl RenderReporter {
    /// Render `root` onto `surface` on every change
    pub fn new(root: Node, surface: Rc<dyn Surface>, styler: Styler, policy: TimeoutPolicy) -> Self {
        Self {
            root,
            surface,
            styler,
            policy,
        }
    }
}

impl Reporter for RenderReporter {
    fn changed(&self) {
        self.surface.render(&self.root.render(&self.styler));
    }

    fn timed_out(&self, test: &str) {
        self.policy.apply(test)
    }
}
