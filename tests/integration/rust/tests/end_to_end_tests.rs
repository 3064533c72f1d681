//! End-to-End Tests
//!
//! Tests complete test-file runs through the public entry points:
//! file on disk -> link -> sandbox -> evaluate -> execute tree -> report

use easytests::{execute_in_test_context, run_blocking, run_directory, RunOptions, Runner, TimeoutPolicy};
use integration_tests::Fixture;
use std::rc::Rc;
use test_model::{MemorySurface, Styler};
use tokio::task::LocalSet;

const SUITE: &str = r#"import { slugify } from "./lib/slug";
const { Test, Group } = $EASYTESTS;

interface Case { input: string; expected: string }
const cases: Case[] = [
  { input: "Hello World", expected: "hello-world" },
  { input: "  Trim me ", expected: "trim-me" },
];

new Group("slugify",
  ...cases.map((c: Case) => new Test(c.input.trim(), (): boolean => slugify(c.input) === c.expected)),
  new Group("async",
    new Test("resolves", async (): Promise<boolean> => {
      await new Promise<void>((resolve) => setTimeout(resolve, 5));
      return slugify("A B") === "a-b";
    }),
  ),
).executeAsMain();
"#;

const SLUG: &str = r#"export function slugify(text: string): string {
  return text.trim().toLowerCase().split(/\s+/).join("-");
}
"#;

fn suite() -> Fixture {
    let fixture = Fixture::new().unwrap();
    fixture.write("lib/slug.ts", SLUG).unwrap();
    fixture.write("slug.test.ts", SUITE).unwrap();
    fixture
}

/// Test: blocking entry point runs a whole annotated suite
#[test]
fn test_run_blocking_suite() {
    let fixture = suite();
    let options = RunOptions::new().with_base_path(fixture.root());

    let report = run_blocking(fixture.root().join("slug.test.ts"), options).unwrap();

    assert_eq!(report.total, 3);
    assert!(report.is_success());
    assert_eq!(
        report.summary(),
        "Tests: 3 total, 3 passed, 0 failed, 0 unsettled (100.0% passed)"
    );
}

/// Test: rendered tree of the same suite
#[tokio::test]
async fn test_suite_rendering() {
    let fixture = suite();
    let surface = Rc::new(MemorySurface::new());
    let runner = Runner::new(RunOptions::new().with_base_path(fixture.root()))
        .with_surface(surface.clone())
        .with_styler(Styler::plain());

    LocalSet::new()
        .run_until(runner.execute(fixture.root().join("slug.test.ts")))
        .await
        .unwrap();

    assert_eq!(
        surface.last().unwrap(),
        "slugify:\n ✔  00s Hello World\n ✔  00s Trim me\n async:\n  ✔  00s resolves"
    );
}

/// Test: async entry point rejects bad extensions without reading
#[tokio::test]
async fn test_execute_in_test_context_usage_error() {
    let error = execute_in_test_context("/nowhere/suite.coffee", RunOptions::default())
        .await
        .unwrap_err();
    assert!(error.is_usage());
}

/// Test: directory runs use a fresh sandbox per file
#[tokio::test]
async fn test_run_directory_isolates_files() {
    let fixture = Fixture::new().unwrap();
    let body = r#"globalThis.seen = (globalThis.seen || 0) + 1;
const { Test } = $EASYTESTS;
new Test("fresh", () => globalThis.seen === 1).executeAsMain();
"#;
    fixture.write("one.test.js", body).unwrap();
    fixture.write("two.test.mjs", body).unwrap();
    fixture.write("deep/three.test.mts", body).unwrap();
    fixture.write("deep/README.md", "not a test").unwrap();

    let options = RunOptions::new()
        .with_base_path(fixture.root())
        .with_timeout_policy(TimeoutPolicy::Error);
    let report = run_directory(fixture.root(), options).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.passed, 3);
}

/// Test: a failing file stops the directory run with its error
#[tokio::test]
async fn test_run_directory_surfaces_errors() {
    let fixture = Fixture::new().unwrap();
    fixture
        .write("bad.test.js", "import './gone.js';\n")
        .unwrap();

    let error = run_directory(fixture.root(), RunOptions::new().with_base_path(fixture.root()))
        .await
        .unwrap_err();
    assert!(error.is_resolution());
}
