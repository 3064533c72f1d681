//! Module identity, resolved locations and compiled units.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Where the code for an import specifier comes from.
///
/// `Empty` marks type-declaration files, which contribute no runtime code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleLocation {
    /// Source text on disk
    File(PathBuf),
    /// No code to execute
    Empty,
}

impl ModuleLocation {
    /// Check if this location carries no code
    pub fn is_empty(&self) -> bool {
        matches!(self, ModuleLocation::Empty)
    }

    /// The file path, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ModuleLocation::File(path) => Some(path),
            ModuleLocation::Empty => None,
        }
    }
}

/// Identity of a node in the module graph.
///
/// For file locations this is the normalized path; for empty locations it is
/// the specifier as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Identity of a module read from `path`
    pub fn from_path(path: &Path) -> Self {
        ModuleId(normalize_path(path).to_string_lossy().into_owned())
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        ModuleId(value.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(value: String) -> Self {
        ModuleId(value)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Executable code plus the identity it is linked under.
///
/// Immutable once produced. `dependencies` lists the ids this unit imports,
/// in source order; the graph owns the units themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Graph identity
    pub id: ModuleId,
    /// Executable module source
    pub code: String,
    /// Ids of the modules this unit imports
    pub dependencies: Vec<ModuleId>,
}

impl CompiledUnit {
    /// Create a unit from compiled code
    pub fn new(id: ModuleId, code: String, dependencies: Vec<ModuleId>) -> Self {
        Self {
            id,
            code,
            dependencies,
        }
    }

    /// A unit with no code, used for empty locations
    pub fn empty(id: ModuleId) -> Self {
        Self {
            id,
            code: String::new(),
            dependencies: Vec::new(),
        }
    }
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// Two spellings of the same file (`dir/./a.ts`, `dir/sub/../a.ts`) normalize
/// to one path, so they share a [`ModuleId`].
///
/// # Examples
///
/// ```
/// use core_types::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     normalize_path(Path::new("tests/./sub/../a.ts")),
///     PathBuf::from("tests/a.ts")
/// );
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_in_normal = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_in_normal {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
