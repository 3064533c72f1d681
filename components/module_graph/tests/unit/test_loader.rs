//! Unit tests for the engine loader

use boa_engine::{builtins::promise::PromiseState, context::ContextBuilder, js_string, Context};
use core_types::EasyTestsError;
use module_graph::{GraphLoader, ModuleGraph, SpecifierResolver};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;
use transformer::TypeStripper;

fn loader_in(dir: &TempDir) -> Rc<GraphLoader> {
    Rc::new(GraphLoader::new(ModuleGraph::new(
        Rc::new(TypeStripper),
        SpecifierResolver::new(dir.path()),
    )))
}

fn evaluate(loader: &Rc<GraphLoader>, entry: &Path) -> (Context, PromiseState) {
    let mut context = ContextBuilder::default()
        .module_loader(loader.clone())
        .build()
        .unwrap();
    let id = loader.link_entry(entry).unwrap();
    let module = loader.module(&id, &mut context).unwrap();
    let promise = module.load_link_evaluate(&mut context);
    context.run_jobs().unwrap();
    let state = promise.state();
    (context, state)
}

#[test]
fn test_evaluates_linked_graph() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("entry.ts"),
        "import { double } from './math';\nglobalThis.result = double(21);\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("math.ts"),
        "export function double(n: number): number { return n * 2; }\n",
    )
    .unwrap();

    let loader = loader_in(&dir);
    let (mut context, state) = evaluate(&loader, &dir.path().join("entry.ts"));
    assert!(matches!(state, PromiseState::Fulfilled(_)));

    let result = context
        .global_object()
        .get(js_string!("result"), &mut context)
        .unwrap();
    assert_eq!(result.as_number(), Some(42.0));
}

#[test]
fn test_engine_module_cached_by_id() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("entry.js"), "export const x = 1;\n").unwrap();

    let loader = loader_in(&dir);
    let mut context = ContextBuilder::default()
        .module_loader(loader.clone())
        .build()
        .unwrap();
    let id = loader.link_entry(&dir.path().join("entry.js")).unwrap();
    let first = loader.module(&id, &mut context).unwrap();
    let second = loader.module(&id, &mut context).unwrap();
    assert!(first == second);
}

#[test]
fn test_dynamic_import_linked_lazily() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("entry.js"),
        "const mod = await import('./lazy.js');\nglobalThis.result = mod.default;\n",
    )
    .unwrap();
    fs::write(dir.path().join("lazy.js"), "export default 'late';\n").unwrap();

    let loader = loader_in(&dir);
    let (mut context, state) = evaluate(&loader, &dir.path().join("entry.js"));
    assert!(matches!(state, PromiseState::Fulfilled(_)));
    assert_eq!(loader.graph().len(), 2);

    let result = context
        .global_object()
        .get(js_string!("result"), &mut context)
        .unwrap();
    assert_eq!(result.to_string(&mut context).unwrap().to_std_string_escaped(), "late");
}

#[test]
fn test_late_failure_keeps_its_kind() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("entry.js"),
        "await import('./missing.js');\n",
    )
    .unwrap();

    let loader = loader_in(&dir);
    let (_context, state) = evaluate(&loader, &dir.path().join("entry.js"));
    assert!(matches!(state, PromiseState::Rejected(_)));

    match loader.take_failure() {
        Some(EasyTestsError::Resolution { specifier, .. }) => assert_eq!(specifier, "./missing.js"),
        other => panic!("unexpected failure: {other:?}"),
    }
    assert!(loader.take_failure().is_none());
}
