//! Unit tests for module identity and locations

use core_types::{normalize_path, CompiledUnit, ModuleId, ModuleLocation};
use std::path::{Path, PathBuf};

#[cfg(test)]
mod module_tests {
    use super::*;

    #[test]
    fn test_empty_location() {
        assert!(ModuleLocation::Empty.is_empty());
        assert_eq!(ModuleLocation::Empty.path(), None);
    }

    #[test]
    fn test_file_location() {
        let location = ModuleLocation::File(PathBuf::from("dir/x.ts"));
        assert!(!location.is_empty());
        assert_eq!(location.path(), Some(Path::new("dir/x.ts")));
    }

    #[test]
    fn test_module_id_normalizes_paths() {
        let a = ModuleId::from_path(Path::new("dir/./b.ts"));
        let b = ModuleId::from_path(Path::new("dir/sub/../b.ts"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "dir/b.ts");
    }

    #[test]
    fn test_normalize_keeps_leading_parent() {
        assert_eq!(normalize_path(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize_path(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_empty_unit() {
        let unit = CompiledUnit::empty(ModuleId::from("./types.d.ts"));
        assert_eq!(unit.id.as_str(), "./types.d.ts");
        assert!(unit.code.is_empty());
        assert!(unit.dependencies.is_empty());
    }
}
