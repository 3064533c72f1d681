//! Unit tests for specifier resolution against a real directory layout

use core_types::{EasyTestsError, ModuleLocation};
use module_graph::SpecifierResolver;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn test_relative_to_importing_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "dir/entry.ts", "");
    write(dir.path(), "dir/x.ts", "");

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver
        .resolve("./x", &dir.path().join("dir/entry.ts"))
        .unwrap();
    assert_eq!(location, ModuleLocation::File(dir.path().join("dir/x.ts")));
}

#[test]
fn test_exact_file_wins_over_probing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x", "");
    write(dir.path(), "x.ts", "");

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver.resolve("./x", &dir.path().join("entry.js")).unwrap();
    assert_eq!(location, ModuleLocation::File(dir.path().join("x")));
}

#[test]
fn test_directory_index() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lib/index.mjs", "");

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver.resolve("./lib", &dir.path().join("entry.js")).unwrap();
    assert_eq!(location, ModuleLocation::File(dir.path().join("lib/index.mjs")));
}

#[test]
fn test_parent_directory_specifier() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shared.js", "");

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver
        .resolve("../shared.js", &dir.path().join("tests/a.test.js"))
        .unwrap();
    assert_eq!(location, ModuleLocation::File(dir.path().join("shared.js")));
}

#[test]
fn test_package_main_field() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "node_modules/adder/package.json",
        r#"{ "name": "adder", "main": "dist/adder.js" }"#,
    );
    write(dir.path(), "node_modules/adder/dist/adder.js", "");

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver.resolve("adder", Path::new("anywhere.js")).unwrap();
    assert_eq!(
        location,
        ModuleLocation::File(dir.path().join("node_modules/adder/dist/adder.js"))
    );
}

#[test]
fn test_package_without_main_uses_index() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "node_modules/bare/package.json", r#"{ "name": "bare" }"#);
    write(dir.path(), "node_modules/bare/index.js", "");

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver.resolve("bare", Path::new("a.js")).unwrap();
    assert_eq!(
        location,
        ModuleLocation::File(dir.path().join("node_modules/bare/index.js"))
    );
}

#[test]
fn test_package_non_string_main_ignored() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "node_modules/odd/package.json", r#"{ "main": 3 }"#);

    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver.resolve("odd", Path::new("a.js")).unwrap();
    assert_eq!(location, ModuleLocation::File(dir.path().join("node_modules/odd")));
}

#[test]
fn test_malformed_manifest_is_config_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "node_modules/broken/package.json", "{ main: ");

    let resolver = SpecifierResolver::new(dir.path());
    let err = resolver.resolve("broken", Path::new("a.js")).unwrap_err();
    match err {
        EasyTestsError::Config { message } => assert!(message.contains("package.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_package_path_returned() {
    let dir = TempDir::new().unwrap();
    let resolver = SpecifierResolver::new(dir.path());
    let location = resolver.resolve("ghost", Path::new("a.js")).unwrap();
    assert_eq!(location, ModuleLocation::File(dir.path().join("node_modules/ghost")));
}
