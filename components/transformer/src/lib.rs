//! Source Transformer Component
//!
//! Turns module source text, optionally written in the type-annotated
//! dialect, into code the execution engine can run directly.
//!
//! # Overview
//!
//! - [`Lexer`] - Span-preserving tokenizer
//! - [`strip_types`] - Erases annotations while keeping line/column positions
//! - [`scan_imports`] - Finds the module specifiers of compiled code
//! - [`SourceTransformer`] - Pluggable file-to-code compilation
//! - [`TypeStripper`] - Default transformer
//!
//! # Example
//!
//! ```
//! use transformer::transform_source;
//! use core_types::Dialect;
//! use std::path::Path;
//!
//! let code = transform_source(
//!     "export const twice = (n: number): number => n * 2;",
//!     Path::new("math.ts"),
//!     Dialect::Annotated,
//! )
//! .unwrap();
//! assert!(!code.contains("number"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod imports;
pub mod lexer;
pub mod strip;
mod tree;

pub use error::SyntaxError;
pub use imports::{scan_imports, ImportKind, ImportRef};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use strip::{is_declaration_file, strip_types};

use core_types::{Dialect, EasyTestsResult};
use std::path::Path;
use tracing::debug;
use tree::TokenTree;

/// Compiles one file into executable module code
pub trait SourceTransformer {
    /// Read `path` and produce executable code for the given dialect.
    ///
    /// # Errors
    /// Read failures are returned as [`core_types::EasyTestsError::Io`] with
    /// the underlying error unchanged; parse failures as
    /// [`core_types::EasyTestsError::Compile`] naming `path`.
    fn compile(&self, path: &Path, dialect: Dialect) -> EasyTestsResult<String>;
}

/// Default transformer: validates plain modules and erases annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeStripper;

impl TypeStripper {
    /// Create a new type stripper
    pub fn new() -> Self {
        Self
    }
}

impl SourceTransformer for TypeStripper {
    fn compile(&self, path: &Path, dialect: Dialect) -> EasyTestsResult<String> {
        let source = std::fs::read_to_string(path)?;
        transform_source(&source, path, dialect)
    }
}

/// Transform already-loaded source text.
///
/// Script-dialect input is checked for lexical and bracket errors and
/// returned unchanged. Annotated input has its annotations erased.
///
/// # Errors
/// Returns [`core_types::EasyTestsError::Compile`] with the position of the
/// first problem.
pub fn transform_source(source: &str, path: &Path, dialect: Dialect) -> EasyTestsResult<String> {
    let result = match dialect {
        Dialect::Script => tokenize(source)
            .and_then(TokenTree::build)
            .map(|_| source.to_string()),
        Dialect::Annotated => strip_types(source),
    };
    let code = result.map_err(|e| e.into_compile(path))?;
    debug!(
        path = %path.display(),
        ?dialect,
        bytes = code.len(),
        "transformed module"
    );
    Ok(code)
}
