//! The per-run module graph.
//!
//! Every reachable module is compiled at most once, keyed by [`ModuleId`].
//! Static import literals are rewritten to the id they resolve to, so the
//! engine's loader can look modules up without knowing who imported them.

use crate::resolver::SpecifierResolver;
use core_types::{
    CompiledUnit, Dialect, EasyTestsError, EasyTestsResult, ModuleId, ModuleLocation,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;
use transformer::{scan_imports, ImportKind, SourceTransformer};

/// A module waiting to be compiled
struct Pending {
    id: ModuleId,
    location: ModuleLocation,
    specifier: String,
}

/// Compiled units reachable from one entry file
pub struct ModuleGraph {
    transformer: Rc<dyn SourceTransformer>,
    resolver: SpecifierResolver,
    dialect: Option<Dialect>,
    entry: Option<PathBuf>,
    units: HashMap<ModuleId, CompiledUnit>,
    paths: HashMap<ModuleId, PathBuf>,
    visited: HashSet<ModuleId>,
    compiles: usize,
}

impl ModuleGraph {
    /// Create an empty graph
    ///
    /// # Arguments
    /// * `transformer` - Turns each file into executable code
    /// * `resolver` - Maps import specifiers to locations
    pub fn new(transformer: Rc<dyn SourceTransformer>, resolver: SpecifierResolver) -> Self {
        Self {
            transformer,
            resolver,
            dialect: None,
            entry: None,
            units: HashMap::new(),
            paths: HashMap::new(),
            visited: HashSet::new(),
            compiles: 0,
        }
    }

    /// Compile every module with `dialect` instead of choosing by extension
    pub fn with_dialect(mut self, dialect: Option<Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Compile `entry` and everything it statically imports.
    ///
    /// # Errors
    /// Resolution and compile errors of any reachable module; the graph is
    /// left partially built.
    pub fn link_entry(&mut self, entry: &Path) -> EasyTestsResult<ModuleId> {
        let id = ModuleId::from_path(entry);
        self.entry = Some(entry.to_path_buf());
        self.link_from(Pending {
            id: id.clone(),
            location: ModuleLocation::File(entry.to_path_buf()),
            specifier: entry.display().to_string(),
        })?;
        Ok(id)
    }

    /// Link a specifier requested at run time, such as a dynamic import.
    ///
    /// Resolves against `base_file` when known, otherwise against the entry.
    pub fn link_specifier(
        &mut self,
        specifier: &str,
        base_file: Option<&Path>,
    ) -> EasyTestsResult<ModuleId> {
        let base = base_file
            .map(Path::to_path_buf)
            .or_else(|| self.entry.clone())
            .unwrap_or_else(|| self.resolver.base_path().join("index.js"));
        let location = self.resolver.resolve(specifier, &base)?;
        let id = id_for(&location, specifier);
        self.link_from(Pending {
            id: id.clone(),
            location,
            specifier: specifier.to_string(),
        })?;
        Ok(id)
    }

    fn link_from(&mut self, root: Pending) -> EasyTestsResult<()> {
        if !self.visited.insert(root.id.clone()) {
            debug!(id = %root.id, "module already linked");
            return Ok(());
        }

        let mut worklist = vec![root];
        while let Some(pending) = worklist.pop() {
            let unit = match &pending.location {
                ModuleLocation::Empty => CompiledUnit::empty(pending.id.clone()),
                ModuleLocation::File(path) => {
                    let (unit, discovered) = self.compile_file(&pending, path)?;
                    self.paths.insert(pending.id.clone(), path.clone());
                    for next in discovered {
                        if self.visited.insert(next.id.clone()) {
                            worklist.push(next);
                        }
                    }
                    unit
                }
            };
            self.units.insert(pending.id, unit);
        }
        Ok(())
    }

    fn compile_file(
        &mut self,
        pending: &Pending,
        path: &Path,
    ) -> EasyTestsResult<(CompiledUnit, Vec<Pending>)> {
        let dialect = self
            .dialect
            .or_else(|| Dialect::from_path(path))
            .unwrap_or(Dialect::Script);

        let mut code = self
            .transformer
            .compile(path, dialect)
            .map_err(|e| match e {
                EasyTestsError::Io(source) => EasyTestsError::Resolution {
                    specifier: pending.specifier.clone(),
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })?;
        self.compiles += 1;
        debug!(id = %pending.id, ?dialect, "compiled module");

        let imports = scan_imports(&code).map_err(|e| e.into_compile(path))?;
        let mut dependencies = Vec::new();
        let mut discovered = Vec::new();

        // Back to front, so earlier spans stay valid after each splice.
        for import in imports.iter().rev() {
            if import.kind == ImportKind::Dynamic {
                continue;
            }
            let location = self.resolver.resolve(&import.specifier, path)?;
            let id = id_for(&location, &import.specifier);
            let literal = serde_json::to_string(id.as_str())
                .map_err(|e| EasyTestsError::compile(path, e.to_string()))?;
            code.replace_range(import.span.0..import.span.1, &literal);

            dependencies.push(id.clone());
            discovered.push(Pending {
                id,
                location,
                specifier: import.specifier.clone(),
            });
        }
        dependencies.reverse();
        discovered.reverse();

        Ok((
            CompiledUnit::new(pending.id.clone(), code, dependencies),
            discovered,
        ))
    }

    /// Compiled unit for `id`
    pub fn unit(&self, id: &ModuleId) -> Option<&CompiledUnit> {
        self.units.get(id)
    }

    /// File a unit was read from; `None` for empty units
    pub fn path_of(&self, id: &ModuleId) -> Option<&Path> {
        self.paths.get(id).map(PathBuf::as_path)
    }

    /// Entry file, once linked
    pub fn entry(&self) -> Option<&Path> {
        self.entry.as_deref()
    }

    /// How many files were compiled
    pub fn compile_count(&self) -> usize {
        self.compiles
    }

    /// Number of units in the graph
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if nothing has been linked
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn id_for(location: &ModuleLocation, specifier: &str) -> ModuleId {
    match location {
        ModuleLocation::File(path) => ModuleId::from_path(path),
        ModuleLocation::Empty => ModuleId::from(specifier),
    }
}

impl std::fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("entry", &self.entry)
            .field("units", &self.units.len())
            .field("compiles", &self.compiles)
            .finish()
    }
}
