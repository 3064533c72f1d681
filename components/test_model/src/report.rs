//! Run summaries.

use crate::node::Node;
use crate::status::TestStatus;

/// Separator between group and test names in failure paths
pub const PATH_SEPARATOR: &str = " > ";

/// Counts of test outcomes plus the names of failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestReport {
    /// Number of tests
    pub total: usize,
    /// Tests that passed
    pub passed: usize,
    /// Tests that failed
    pub failed: usize,
    /// Tests that never settled
    pub running: usize,
    /// Full names of failed tests, `Group > Test`
    pub failures: Vec<String>,
}

impl TestReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one test
    pub fn add_status(&mut self, name: &str, status: TestStatus) {
        self.total += 1;
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => {
                self.failed += 1;
                self.failures.push(name.to_string());
            }
            TestStatus::Running => self.running += 1,
        }
    }

    /// Report on every leaf of a tree as it is now
    pub fn from_tree(root: &Node) -> Self {
        let mut report = Self::new();
        for (path, test) in root.leaves() {
            report.add_status(&path.join(PATH_SEPARATOR), test.status());
        }
        report
    }

    /// Percentage of tests that passed
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Human-readable totals
    pub fn summary(&self) -> String {
        format!(
            "Tests: {} total, {} passed, {} failed, {} unsettled ({:.1}% passed)",
            self.total,
            self.passed,
            self.failed,
            self.running,
            self.pass_rate()
        )
    }

    /// Totals followed by every failure
    pub fn detailed_summary(&self) -> String {
        let mut output = self.summary();
        if !self.failures.is_empty() {
            output.push_str("\n\nFailures:\n");
            for name in &self.failures {
                output.push_str(&format!("  - {name}\n"));
            }
        }
        output
    }

    /// Add another report's counts and failures to this one
    pub fn merge(&mut self, other: &TestReport) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.running += other.running;
        self.failures.extend(other.failures.iter().cloned());
    }

    /// Check if every test passed
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.running == 0
    }
}
