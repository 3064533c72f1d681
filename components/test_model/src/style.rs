//! Status glyphs and text decoration.

use crate::status::TestStatus;
use std::io::{IsTerminal, Write};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// Glyph for a running test
pub const RUNNING_GLYPH: &str = "⏳";
/// Glyph for a failed test, before the trailing space
pub const FAILED_GLYPH: &str = "✖";
/// Glyph for a passed test, before the trailing space
pub const PASSED_GLYPH: &str = "✔";

/// Decorates rendered output, with or without ANSI colors.
///
/// # Examples
///
/// ```
/// use test_model::{Styler, TestStatus};
///
/// let styler = Styler::plain();
/// assert_eq!(styler.glyph(TestStatus::Passed), "✔ ");
/// assert_eq!(styler.bold("name"), "name");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styler {
    color: bool,
}

impl Styler {
    /// Styler emitting ANSI escape codes
    pub fn colored() -> Self {
        Self { color: true }
    }

    /// Styler emitting bare text
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Colored when standard output is a terminal
    pub fn detect() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    /// Check if output is colored
    pub fn is_colored(&self) -> bool {
        self.color
    }

    /// Decorated glyph for a status
    pub fn glyph(&self, status: TestStatus) -> String {
        match status {
            TestStatus::Running => RUNNING_GLYPH.to_string(),
            TestStatus::Failed => {
                self.paint(FAILED_GLYPH, ColorSpec::new().set_fg(Some(Color::Red))) + " "
            }
            TestStatus::Passed => {
                self.paint(PASSED_GLYPH, ColorSpec::new().set_fg(Some(Color::Green))) + " "
            }
        }
    }

    /// Bold text
    pub fn bold(&self, text: &str) -> String {
        self.paint(text, ColorSpec::new().set_bold(true))
    }

    /// Dimmed text
    pub fn dim(&self, text: &str) -> String {
        self.paint(text, ColorSpec::new().set_dimmed(true))
    }

    fn paint(&self, text: &str, spec: &ColorSpec) -> String {
        let mut buffer = if self.color {
            Buffer::ansi()
        } else {
            Buffer::no_color()
        };
        // Writes into an in-memory buffer cannot fail.
        let _ = buffer.set_color(spec);
        let _ = buffer.write_all(text.as_bytes());
        let _ = buffer.reset();
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

impl Default for Styler {
    fn default() -> Self {
        Self::detect()
    }
}
