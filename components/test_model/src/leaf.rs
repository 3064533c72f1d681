//! The `Test` leaf.

use crate::callback::{CallbackFuture, TestCallback};
use crate::elapsed::{format_elapsed, PLACEHOLDER};
use crate::reporter::Reporter;
use crate::status::TestStatus;
use crate::style::Styler;
use core_types::{EasyTestsError, EasyTestsResult};
use std::cell::RefCell;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Seconds a test may run when no timeout is given
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;

#[derive(Debug)]
struct LeafState {
    status: TestStatus,
    time_str: String,
}

/// An individually timed unit of work
pub struct Test {
    name: String,
    callback: Box<dyn TestCallback>,
    timeout: Duration,
    state: RefCell<LeafState>,
}

impl Test {
    /// Create a test with the default 30 second timeout
    pub fn new(name: impl Into<String>, callback: impl TestCallback + 'static) -> Self {
        Self {
            name: name.into(),
            callback: Box::new(callback),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS),
            state: RefCell::new(LeafState {
                status: TestStatus::Running,
                time_str: PLACEHOLDER.to_string(),
            }),
        }
    }

    /// Set the timeout in seconds.
    ///
    /// Negative or NaN values mean no time at all; values too large for a
    /// [`Duration`] mean no limit.
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = if seconds.is_nan() || seconds <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
        };
        self
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current status
    pub fn status(&self) -> TestStatus {
        self.state.borrow().status
    }

    /// Elapsed-time display, or the placeholder before completion
    pub fn time_str(&self) -> String {
        self.state.borrow().time_str.clone()
    }

    /// `"<glyph> <time> <name>"`
    pub fn render(&self, styler: &Styler) -> String {
        let state = self.state.borrow();
        format!(
            "{} {} {}",
            styler.glyph(state.status),
            styler.dim(&state.time_str),
            styler.bold(&self.name)
        )
    }

    /// Run the callback once.
    ///
    /// Marks the test running and notifies `reporter`, awaits the callback
    /// for at most the timeout, then records the outcome and elapsed time
    /// since `start` and notifies again.
    ///
    /// # Errors
    /// [`EasyTestsError::Timeout`] after calling [`Reporter::timed_out`]
    /// when the callback does not settle in time; the callback's own error
    /// if it fails, leaving the status `Running`.
    pub async fn execute(&self, start: Instant, reporter: &dyn Reporter) -> EasyTestsResult<()> {
        let pending = self.begin(reporter);
        self.finish(start, pending, reporter).await
    }

    /// First half of [`Test::execute`]: mark running, notify, and invoke the
    /// callback. The timeout clock starts here.
    pub fn begin(&self, reporter: &dyn Reporter) -> PendingResult {
        {
            let mut state = self.state.borrow_mut();
            state.status = TestStatus::Running;
            state.time_str = PLACEHOLDER.to_string();
        }
        reporter.changed();

        let deadline = Instant::now().checked_add(self.timeout);
        PendingResult {
            deadline,
            result: self.callback.call(),
        }
    }

    /// Second half of [`Test::execute`]: wait for a begun callback
    pub async fn finish(
        &self,
        start: Instant,
        pending: PendingResult,
        reporter: &dyn Reporter,
    ) -> EasyTestsResult<()> {
        let settled = match pending.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, pending.result).await,
            None => Ok(pending.result.await),
        };
        let passed = match settled {
            Ok(result) => result?,
            Err(_) => {
                reporter.timed_out(&self.name);
                return Err(EasyTestsError::Timeout {
                    test: self.name.clone(),
                });
            }
        };

        {
            let mut state = self.state.borrow_mut();
            state.status = TestStatus::from_outcome(passed);
            state.time_str = format_elapsed(start.elapsed());
        }
        debug!(test = %self.name, passed, "test settled");
        reporter.changed();
        Ok(())
    }
}

/// A callback that has been invoked but not yet awaited
pub struct PendingResult {
    deadline: Option<Instant>,
    result: CallbackFuture,
}

impl std::fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResult")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Test {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("state", &self.state)
            .finish()
    }
}
