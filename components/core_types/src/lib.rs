//! Shared types for the EasyTests module runner.
//!
//! This crate provides the vocabulary every other component speaks: where a
//! module lives, what a compiled module looks like, which grammar a file is
//! written in, and the single error type that flows out of a run.
//!
//! # Overview
//!
//! - [`ModuleLocation`] - Resolved source of an import specifier
//! - [`ModuleId`] - Graph node identity of a module
//! - [`CompiledUnit`] - Executable code plus identity
//! - [`Dialect`] - Plain script or type-annotated script
//! - [`EasyTestsError`] - Usage, resolution, compile, evaluation and timeout errors
//! - [`SourcePosition`] - Source code location
//!
//! # Examples
//!
//! ```
//! use core_types::{CompiledUnit, Dialect, ModuleId};
//! use std::path::Path;
//!
//! assert_eq!(Dialect::from_path(Path::new("suite.ts")), Some(Dialect::Annotated));
//!
//! let unit = CompiledUnit::empty(ModuleId::from("./types.d.ts"));
//! assert!(unit.code.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod dialect;
mod error;
mod module;
mod source;

pub use dialect::{ensure_supported, Dialect, SUPPORTED_EXTENSIONS};
pub use error::{EasyTestsError, EasyTestsResult};
pub use module::{normalize_path, CompiledUnit, ModuleId, ModuleLocation};
pub use source::SourcePosition;
