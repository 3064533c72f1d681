//! Script grammar selection and the supported entry-file extensions.

use crate::error::{EasyTestsError, EasyTestsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extensions accepted as test entry files.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["js", "mjs", "ts", "mts"];

/// The grammar a module is parsed with.
///
/// `Annotated` is a superset of `Script`: type annotations are erased before
/// the code reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Plain ECMAScript module grammar
    Script,
    /// ECMAScript plus type annotations
    Annotated,
}

impl Dialect {
    /// Pick the dialect implied by a file extension.
    ///
    /// Returns `None` for extensions that are not test modules.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("js") | Some("mjs") => Some(Dialect::Script),
            Some("ts") | Some("mts") => Some(Dialect::Annotated),
            _ => None,
        }
    }

    /// Whether annotations must be erased for this dialect
    pub fn is_annotated(self) -> bool {
        matches!(self, Dialect::Annotated)
    }
}

/// Reject entry files whose extension is not one of [`SUPPORTED_EXTENSIONS`].
///
/// Only the path string is inspected; the filesystem is never touched.
pub fn ensure_supported(path: &Path) -> EasyTestsResult<Dialect> {
    Dialect::from_path(path).ok_or_else(|| EasyTestsError::UnsupportedExtension {
        path: path.to_path_buf(),
    })
}
