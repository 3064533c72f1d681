//! Specifier classification and resolution.
//!
//! A specifier is first tagged with a [`SpecifierKind`], then resolved by the
//! rule for that kind. Nothing is cached here; the graph caches by id.

use core_types::{normalize_path, EasyTestsError, EasyTestsResult, ModuleLocation};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use transformer::is_declaration_file;

/// Extensions tried, in order, when a specifier omits one
pub const PROBE_EXTENSIONS: [&str; 4] = ["ts", "mts", "js", "mjs"];

const MANIFEST_FILE: &str = "package.json";

/// How a specifier is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `.d.ts` / `.d.mts` file: declarations only, no runtime code
    TypeDeclarationOnly,
    /// Path relative to the importing module (`./`, `../`) or absolute
    RelativeFile,
    /// Third-party package under `node_modules`
    PackageEntry,
}

impl SpecifierKind {
    /// Classify a specifier as written.
    ///
    /// The declaration-file suffix is checked first, so `./types.d.ts` is a
    /// declaration and not a relative file.
    ///
    /// # Examples
    ///
    /// ```
    /// use module_graph::SpecifierKind;
    ///
    /// assert_eq!(SpecifierKind::classify("./types.d.ts"), SpecifierKind::TypeDeclarationOnly);
    /// assert_eq!(SpecifierKind::classify("../util.js"), SpecifierKind::RelativeFile);
    /// assert_eq!(SpecifierKind::classify("left-pad"), SpecifierKind::PackageEntry);
    /// ```
    pub fn classify(specifier: &str) -> Self {
        if is_declaration_file(specifier) {
            SpecifierKind::TypeDeclarationOnly
        } else if specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier.starts_with('/')
            || specifier == "."
            || specifier == ".."
        {
            SpecifierKind::RelativeFile
        } else {
            SpecifierKind::PackageEntry
        }
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    main: Option<serde_json::Value>,
}

/// Maps specifiers to module locations
#[derive(Debug, Clone)]
pub struct SpecifierResolver {
    base_path: PathBuf,
}

impl SpecifierResolver {
    /// Create a resolver that looks for packages under `base_path/node_modules`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory package lookups start from
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve `specifier` as imported from `base_file`.
    ///
    /// Missing files are not an error here: the unprobed path is returned
    /// and the read that follows reports the failure.
    ///
    /// # Errors
    /// Returns [`EasyTestsError::Config`] when a package manifest exists but
    /// is not valid JSON, and I/O errors from reading it.
    pub fn resolve(&self, specifier: &str, base_file: &Path) -> EasyTestsResult<ModuleLocation> {
        let kind = SpecifierKind::classify(specifier);
        let location = match kind {
            SpecifierKind::TypeDeclarationOnly => ModuleLocation::Empty,
            SpecifierKind::RelativeFile => {
                let dir = base_file.parent().unwrap_or_else(|| Path::new(""));
                ModuleLocation::File(probe(&normalize_path(&dir.join(specifier))))
            }
            SpecifierKind::PackageEntry => ModuleLocation::File(self.package_entry(specifier)?),
        };
        debug!(specifier, ?kind, ?location, "resolved specifier");
        Ok(location)
    }

    fn package_entry(&self, specifier: &str) -> EasyTestsResult<PathBuf> {
        let mut path = self.base_path.join("node_modules").join(specifier);

        if path.is_dir() {
            let manifest_path = path.join(MANIFEST_FILE);
            if manifest_path.is_file() {
                let text = std::fs::read_to_string(&manifest_path)?;
                let manifest: PackageManifest =
                    serde_json::from_str(&text).map_err(|e| EasyTestsError::Config {
                        message: format!("{}: {}", manifest_path.display(), e),
                    })?;
                if let Some(serde_json::Value::String(main)) = manifest.main {
                    path = path.join(main);
                }
            }
        }

        Ok(probe(&normalize_path(&path)))
    }
}

/// Find the file a path most likely names.
///
/// Tries the path itself, then each of [`PROBE_EXTENSIONS`] appended, then
/// `index.*` inside it. Falls back to the path unchanged.
pub fn probe(path: &Path) -> PathBuf {
    if path.is_file() {
        return path.to_path_buf();
    }

    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    if let Some(name) = name {
        for ext in PROBE_EXTENSIONS {
            let candidate = path.with_file_name(format!("{name}.{ext}"));
            if candidate.is_file() {
                return candidate;
            }
        }
    }

    if path.is_dir() {
        for ext in PROBE_EXTENSIONS {
            let candidate = path.join(format!("index.{ext}"));
            if candidate.is_file() {
                return candidate;
            }
        }
    }

    path.to_path_buf()
}
