//! Lexical and syntactic failures found while transforming source text.

use core_types::{EasyTestsError, SourcePosition};
use std::path::Path;
use thiserror::Error;

/// A syntax error with the location it was detected at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({position})")]
pub struct SyntaxError {
    /// Description of the problem
    pub message: String,
    /// Where the problem was detected
    pub position: SourcePosition,
}

impl SyntaxError {
    /// Create a new syntax error
    pub fn new(message: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Attach the file path, turning this into a workspace compile error
    pub fn into_compile(self, path: &Path) -> EasyTestsError {
        EasyTestsError::Compile {
            path: path.to_path_buf(),
            message: self.message,
            position: Some(self.position),
        }
    }
}
