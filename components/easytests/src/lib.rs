//! EasyTests Entry Component
//!
//! Runs a script or annotated-script test file inside an isolated,
//! window-like sandbox and renders its test tree while it executes.
//!
//! # Overview
//!
//! - [`RunOptions`] - Markup, window options and module lookup settings
//! - [`Runner`] - Links, evaluates and executes one file per call
//! - [`execute_in_test_context`] - One-call async entry point
//! - [`run_blocking`] - Same, on a private current-thread runtime
//! - [`run_directory`] - Every `*.test.*` file under a directory
//!
//! Test files reach the test API through the `$EASYTESTS` global:
//!
//! ```text
//! const { Test, Group } = $EASYTESTS;
//! new Group("math",
//!     new Test("adds", () => 1 + 1 === 2),
//!     new Test("waits", () => new Promise((r) => setTimeout(() => r(true), 10))),
//! ).executeAsMain();
//! ```
//!
//! # Example
//!
//! ```no_run
//! use easytests::{run_blocking, RunOptions};
//!
//! let report = run_blocking("tests/math.test.ts", RunOptions::default()).unwrap();
//! assert!(report.is_success());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod options;
pub mod runner;

pub use bridge::Settled;
pub use options::RunOptions;
pub use runner::{discover_test_files, Runner, TEST_FILE_SUFFIXES};
pub use sandbox::TEST_API_BINDING;
pub use test_model::{TestReport, TimeoutPolicy};

use core_types::{ensure_supported, EasyTestsResult};
use std::path::Path;
use tokio::task::LocalSet;

/// Run one test file with console output.
///
/// The extension is checked before anything is read. The run itself happens
/// on a fresh [`LocalSet`], so this can be awaited from any current-thread
/// runtime.
///
/// # Errors
/// See [`Runner::execute`].
pub async fn execute_in_test_context(
    path: impl AsRef<Path>,
    options: RunOptions,
) -> EasyTestsResult<TestReport> {
    let path = path.as_ref();
    ensure_supported(path)?;
    let runner = Runner::new(options);
    LocalSet::new().run_until(runner.execute(path)).await
}

/// Run one test file to completion on a private current-thread runtime
///
/// # Errors
/// [`core_types::EasyTestsError::Io`] if the runtime cannot start, otherwise
/// see [`Runner::execute`].
pub fn run_blocking(path: impl AsRef<Path>, options: RunOptions) -> EasyTestsResult<TestReport> {
    let path = path.as_ref();
    ensure_supported(path)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute_in_test_context(path, options))
}

/// Run every test file under `dir` in its own sandbox, merging the reports
///
/// # Errors
/// The first error from any file run.
pub async fn run_directory(dir: impl AsRef<Path>, options: RunOptions) -> EasyTestsResult<TestReport> {
    let runner = Runner::new(options);
    LocalSet::new().run_until(runner.run_directory(dir)).await
}
