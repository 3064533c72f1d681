//! Module Graph Component
//!
//! Resolves import specifiers, compiles each reachable module once and hands
//! the result to the execution engine.
//!
//! # Overview
//!
//! - [`SpecifierKind`] - Tagged classification of a specifier
//! - [`SpecifierResolver`] - Relative, package and declaration-only resolution
//! - [`ModuleGraph`] - Visited-set cache of compiled units for one run
//! - [`GraphLoader`] - Engine module loader serving units from the graph
//!
//! # Example
//!
//! ```no_run
//! use module_graph::{ModuleGraph, SpecifierResolver};
//! use transformer::TypeStripper;
//! use std::path::Path;
//! use std::rc::Rc;
//!
//! let mut graph = ModuleGraph::new(Rc::new(TypeStripper::new()), SpecifierResolver::new("."));
//! let entry = graph.link_entry(Path::new("tests/math.test.ts")).unwrap();
//! println!("{} modules, entry {}", graph.len(), entry);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod loader;
pub mod resolver;

pub use graph::ModuleGraph;
pub use loader::GraphLoader;
pub use resolver::{probe, SpecifierKind, SpecifierResolver, PROBE_EXTENSIONS};
