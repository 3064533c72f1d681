//! Test Entity Model
//!
//! A fixed-shape tree of named tests and groups. Tests run concurrently on
//! one thread, each under its own timeout, and the whole tree is repainted
//! every time any test changes status.
//!
//! # Overview
//!
//! - [`TestStatus`] - Running, passed or failed
//! - [`Test`] - Timed leaf with a pass/fail callback
//! - [`Group`] - Container rendering its children
//! - [`Node`] - Either of the above, with the main-execution entry point
//! - [`ExecutionHandle`] - Waits for a started tree to settle
//! - [`Reporter`] / [`Surface`] / [`Styler`] - Rendering on change
//! - [`TestReport`] - Outcome counts
//!
//! Execution spawns local tasks, so it must run inside a
//! [`tokio::task::LocalSet`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callback;
pub mod elapsed;
pub mod group;
pub mod handle;
pub mod leaf;
pub mod node;
pub mod report;
pub mod reporter;
pub mod status;
pub mod style;
pub mod surface;

pub use callback::{CallbackFuture, FnCallback, TestCallback};
pub use elapsed::{format_elapsed, PLACEHOLDER};
pub use group::Group;
pub use handle::ExecutionHandle;
pub use leaf::{PendingResult, Test, DEFAULT_TIMEOUT_SECONDS};
pub use node::Node;
pub use report::TestReport;
pub use reporter::{abort_on_timeout, RenderReporter, Reporter, TimeoutPolicy};
pub use status::TestStatus;
pub use style::Styler;
pub use surface::{ConsoleSurface, MemorySurface, Surface};
