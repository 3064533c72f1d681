//! Transformer + Module Graph Integration Tests
//!
//! Tests the flow: annotated source -> TypeStripper -> ModuleGraph -> GraphLoader -> Sandbox

use boa_engine::builtins::promise::PromiseState;
use core_types::Dialect;
use integration_tests::Fixture;
use module_graph::{GraphLoader, ModuleGraph, SpecifierResolver};
use sandbox::{Sandbox, WindowOptions};
use std::path::Path;
use std::rc::Rc;
use transformer::{SourceTransformer, TypeStripper};

/// Helper: link and evaluate `entry`, then read `globalThis.result`
fn evaluate(fixture: &Fixture, entry: &Path) -> (String, Rc<GraphLoader>) {
    let graph = ModuleGraph::new(Rc::new(TypeStripper), SpecifierResolver::new(fixture.root()));
    let loader = Rc::new(GraphLoader::new(graph));
    let id = loader.link_entry(entry).expect("link failed");

    let mut sandbox =
        Sandbox::build(None, &WindowOptions::default(), loader.clone()).expect("sandbox failed");
    let module = loader.module(&id, sandbox.context_mut()).expect("module failed");
    let promise = module.load_link_evaluate(sandbox.context_mut());
    sandbox.tick().expect("tick failed");
    match promise.state() {
        PromiseState::Fulfilled(_) => {}
        other => panic!("entry did not evaluate: {other:?}"),
    }

    let result = sandbox.eval("String(globalThis.result)").expect("eval failed");
    (sandbox.render_value(&result), loader)
}

/// Test: annotations, enums and parameter properties work across modules
#[test]
fn test_annotated_modules_evaluate() {
    let fixture = Fixture::new().unwrap();
    fixture
        .write(
            "src/shapes.ts",
            r#"export enum Kind { Circle, Square }

export class Shape {
  constructor(public readonly kind: Kind, private size: number) {}

  area(): number {
    return this.kind === Kind.Square ? this.size * this.size : 3 * this.size * this.size;
  }
}

export function first<T>(items: T[]): T {
  return items[0]!;
}
"#,
        )
        .unwrap();
    let entry = fixture
        .write(
            "src/entry.ts",
            r#"import { Kind, Shape, first } from "./shapes";
import { Config } from "./config.d.ts";

const shapes: Shape[] = [new Shape(Kind.Square, 2), new Shape(Kind.Circle, 1)];
const config = { scale: 2 } as Config;
globalThis.result = [first<Shape>(shapes).area() * config.scale, Kind[Kind.Circle], shapes.length].join(",");
"#,
        )
        .unwrap();

    let (result, _) = evaluate(&fixture, &entry);
    assert_eq!(result, "8,Circle,2");
}

/// Test: two spellings of one dependency load it once
#[test]
fn test_shared_dependency_evaluated_once() {
    let fixture = Fixture::new().unwrap();
    fixture
        .write(
            "counter.js",
            "globalThis.loads = (globalThis.loads || 0) + 1;\nexport const tag = 'counter';\n",
        )
        .unwrap();
    fixture
        .write("a/left.js", "import { tag } from '../counter.js';\nexport const left = tag;\n")
        .unwrap();
    fixture
        .write("a/right.js", "import { tag } from './../counter';\nexport const right = tag;\n")
        .unwrap();
    let entry = fixture
        .write(
            "main.js",
            "import { left } from './a/left.js';\nimport { right } from './a/right.js';\nglobalThis.result = globalThis.loads + ':' + left + ':' + right;\n",
        )
        .unwrap();

    let (result, loader) = evaluate(&fixture, &entry);
    assert_eq!(result, "1:counter:counter");
    assert_eq!(loader.graph().compile_count(), 4);
}

/// Test: import cycles link and evaluate
#[test]
fn test_cycle_evaluates() {
    let fixture = Fixture::new().unwrap();
    fixture
        .write("ping.ts", "import { pong } from './pong';\nexport const ping = (): string => 'ping' + pong();\n")
        .unwrap();
    fixture
        .write("pong.ts", "import { ping } from './ping';\nexport const pong = (): string => typeof ping;\n")
        .unwrap();
    let entry = fixture
        .write("entry.ts", "import { ping } from './ping';\nglobalThis.result = ping();\n")
        .unwrap();

    let (result, _) = evaluate(&fixture, &entry);
    assert_eq!(result, "pingfunction");
}

/// Test: erased output keeps every line in place
#[test]
fn test_erasure_preserves_lines() {
    let fixture = Fixture::new().unwrap();
    let source = "interface Point {\n  x: number;\n  y: number;\n}\nconst p: Point = { x: 1, y: 2 };\nexport default p;\n";
    let path = fixture.write("point.ts", source).unwrap();

    let code = TypeStripper::new().compile(&path, Dialect::Annotated).unwrap();
    assert_eq!(code.lines().count(), source.lines().count());
    assert_eq!(code.lines().nth(4).unwrap().trim_end(), "const p        = { x: 1, y: 2 };");
}
