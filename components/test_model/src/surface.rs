//! Clear-and-rewrite output surfaces.

use std::cell::RefCell;
use std::io::{IsTerminal, Write};
use tracing::warn;

/// Receives one full snapshot of the test tree per render
pub trait Surface {
    /// Replace whatever was shown with `snapshot`
    fn render(&self, snapshot: &str);
}

/// Standard output. Clears the screen first when it is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSurface {
    clear: bool,
}

impl ConsoleSurface {
    /// Console surface that clears only on terminals
    pub fn new() -> Self {
        Self {
            clear: std::io::stdout().is_terminal(),
        }
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for ConsoleSurface {
    fn render(&self, snapshot: &str) {
        let mut out = std::io::stdout().lock();
        let clear = if self.clear { "\x1b[2J\x1b[H" } else { "" };
        let written = writeln!(out, "{clear}{snapshot}").and_then(|_| out.flush());
        if let Err(error) = written {
            warn!(%error, "cannot write test output");
        }
    }
}

/// Keeps every snapshot in memory
#[derive(Debug, Default)]
pub struct MemorySurface {
    snapshots: RefCell<Vec<String>>,
}

impl MemorySurface {
    /// Create an empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot rendered so far, oldest first
    pub fn snapshots(&self) -> Vec<String> {
        self.snapshots.borrow().clone()
    }

    /// Most recent snapshot
    pub fn last(&self) -> Option<String> {
        self.snapshots.borrow().last().cloned()
    }

    /// Number of renders
    pub fn len(&self) -> usize {
        self.snapshots.borrow().len()
    }

    /// Check if nothing was rendered
    pub fn is_empty(&self) -> bool {
        self.snapshots.borrow().is_empty()
    }
}

impl Surface for MemorySurface {
    fn render(&self, snapshot: &str) {
        self.snapshots.borrow_mut().push(snapshot.to_string());
    }
}
