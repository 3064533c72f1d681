//! Error type shared by every component of a run.
//!
//! Each variant corresponds to one failure class of a test-file run. None of
//! them is recovered below the entry operation; they propagate with `?` up to
//! the caller.

use crate::source::SourcePosition;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, compiling, evaluating or executing a test file.
///
/// # Examples
///
/// ```
/// use core_types::EasyTestsError;
/// use std::path::PathBuf;
///
/// let error = EasyTestsError::UnsupportedExtension {
///     path: PathBuf::from("data.json"),
/// };
///
/// assert!(error.is_usage());
/// assert!(error.to_string().contains("data.json"));
/// ```
#[derive(Debug, Error)]
pub enum EasyTestsError {
    /// The entry file is not a recognized script or annotated-script module
    #[error(
        "test file must be a JavaScript module (`.js` or `.mjs`) or a TypeScript module (`.ts` or `.mts`): {}",
        path.display()
    )]
    UnsupportedExtension {
        /// Offending entry file
        path: PathBuf,
    },

    /// A module could not be read at its resolved location
    #[error("cannot load module `{specifier}` from {}: {source}", path.display())]
    Resolution {
        /// Specifier as written in the importing module
        specifier: String,
        /// Location the specifier resolved to
        path: PathBuf,
        /// Underlying filesystem error, unchanged
        #[source]
        source: std::io::Error,
    },

    /// Source text could not be turned into executable code
    #[error("failed to compile {}{}: {message}", path.display(), position.map(|p| format!(":{}", p)).unwrap_or_default())]
    Compile {
        /// File being compiled
        path: PathBuf,
        /// Description of the failure
        message: String,
        /// Where in the file the failure was detected
        position: Option<SourcePosition>,
    },

    /// Script code threw or rejected
    #[error("evaluation failed: {message}")]
    Evaluation {
        /// Engine rendering of the thrown value
        message: String,
    },

    /// A test did not settle within its timeout
    #[error("Test {test} timed out.")]
    Timeout {
        /// Name of the stuck test
        test: String,
    },

    /// Option or manifest files could not be parsed
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Any other I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EasyTestsError {
    /// Build a compile error without a position
    pub fn compile(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EasyTestsError::Compile {
            path: path.into(),
            message: message.into(),
            position: None,
        }
    }

    /// Build an evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        EasyTestsError::Evaluation {
            message: message.into(),
        }
    }

    /// Check if this is a usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, EasyTestsError::UnsupportedExtension { .. })
    }

    /// Check if this is a resolution error
    pub fn is_resolution(&self) -> bool {
        matches!(self, EasyTestsError::Resolution { .. })
    }

    /// Check if this is a compile error
    pub fn is_compile(&self) -> bool {
        matches!(self, EasyTestsError::Compile { .. })
    }

    /// Check if this is an evaluation error
    pub fn is_evaluation(&self) -> bool {
        matches!(self, EasyTestsError::Evaluation { .. })
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, EasyTestsError::Timeout { .. })
    }
}

/// Result type for EasyTests operations
pub type EasyTestsResult<T> = Result<T, EasyTestsError>;
