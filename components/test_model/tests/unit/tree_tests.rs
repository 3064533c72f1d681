//! Unit tests for groups, rendering and concurrent execution

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use test_model::{
    FnCallback, Group, MemorySurface, Node, Styler, Test, TestStatus, TimeoutPolicy,
};
use tokio::task::LocalSet;
use tokio::time::sleep;

fn after(secs: u64, result: bool) -> FnCallback {
    FnCallback::new(move || async move {
        sleep(Duration::from_secs(secs)).await;
        result
    })
}

fn leaf(node: &Node) -> Rc<Test> {
    match node {
        Node::Test(test) => test.clone(),
        Node::Group(_) => panic!("expected a test"),
    }
}

#[test]
fn test_group_render_nested_indentation() {
    let root = Node::from(Group::new(
        "outer",
        vec![
            Test::new("x", FnCallback::sync(|| true)).into(),
            Group::new("inner", vec![Test::new("y", FnCallback::sync(|| true)).into()]).into(),
        ],
    ));
    assert_eq!(
        root.render(&Styler::plain()),
        "outer:\n ⏳ --s x\n inner:\n  ⏳ --s y"
    );
}

#[test]
fn test_empty_group_renders_header_only() {
    let group = Group::new("empty", Vec::new());
    assert_eq!(group.render(&Styler::plain()), "empty:");
}

#[tokio::test(start_paused = true)]
async fn test_declaration_order_kept_regardless_of_completion() {
    let root = Node::from(Group::new(
        "G",
        vec![
            Test::new("a", after(3, true)).into(),
            Test::new("b", after(1, false)).into(),
        ],
    ));
    let surface = Rc::new(MemorySurface::new());

    LocalSet::new()
        .run_until(async {
            let handle = root.execute_as_main_with(surface.clone(), Styler::plain(), TimeoutPolicy::Error);
            assert_eq!(handle.len(), 2);
            handle.wait().await.unwrap();
        })
        .await;

    let snapshots = surface.snapshots();
    assert_eq!(snapshots.len(), 4);
    assert_eq!(snapshots[2], "G:\n ⏳ --s a\n ✖  01s b");
    assert_eq!(snapshots[3], "G:\n ✔  03s a\n ✖  01s b");
}

#[tokio::test(start_paused = true)]
async fn test_children_run_concurrently() {
    let root = Node::from(Group::new(
        "parallel",
        vec![
            Test::new("one", after(5, true)).into(),
            Group::new("nested", vec![Test::new("two", after(5, true)).into()]).into(),
        ],
    ));
    let surface = Rc::new(MemorySurface::new());

    LocalSet::new()
        .run_until(async {
            root.execute_as_main_with(surface.clone(), Styler::plain(), TimeoutPolicy::Error)
                .wait()
                .await
                .unwrap();
        })
        .await;

    for (_, test) in root.leaves() {
        assert_eq!(test.status(), TestStatus::Passed);
        assert_eq!(test.time_str(), "05s");
    }
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_does_not_wait_for_children() {
    let root = Node::from(Group::new("G", vec![Test::new("slow", after(10, true)).into()]));
    let surface = Rc::new(MemorySurface::new());

    LocalSet::new()
        .run_until(async {
            let handle = root.execute_as_main_with(surface.clone(), Styler::plain(), TimeoutPolicy::Error);
            assert_eq!(surface.len(), 1);
            tokio::task::yield_now().await;
            assert!(!handle.is_finished());
            handle.wait().await.unwrap();
        })
        .await;
    assert_eq!(surface.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_callbacks_invoked_before_dispatch_returns() {
    let calls = Rc::new(Cell::new(0));
    let counted = |calls: &Rc<Cell<u32>>| {
        let calls = calls.clone();
        FnCallback::sync(move || {
            calls.set(calls.get() + 1);
            true
        })
    };
    let root = Node::from(Group::new(
        "G",
        vec![
            Test::new("a", counted(&calls)).into(),
            Group::new("inner", vec![Test::new("b", counted(&calls)).into()]).into(),
        ],
    ));
    let surface = Rc::new(MemorySurface::new());

    LocalSet::new()
        .run_until(async {
            let handle = root.execute_as_main_with(surface.clone(), Styler::plain(), TimeoutPolicy::Error);
            assert_eq!(calls.get(), 2);
            assert_eq!(surface.last().unwrap(), "G:\n ⏳ --s a\n inner:\n  ⏳ --s b");
            handle.wait().await.unwrap();
        })
        .await;
    assert_eq!(surface.last().unwrap(), "G:\n ✔  00s a\n inner:\n  ✔  00s b");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_reported_without_stopping_siblings() {
    let root = Node::from(Group::new(
        "G",
        vec![
            Test::new("stuck", FnCallback::new(std::future::pending::<bool>))
                .with_timeout(2.0)
                .into(),
            Test::new("fine", after(1, true)).into(),
        ],
    ));
    let surface = Rc::new(MemorySurface::new());

    let result = LocalSet::new()
        .run_until(async {
            root.execute_as_main_with(surface.clone(), Styler::plain(), TimeoutPolicy::Error)
                .wait()
                .await
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.is_timeout());
    let Node::Group(group) = &root else {
        panic!("expected group");
    };
    assert_eq!(leaf(&group.children()[0]).status(), TestStatus::Running);
    assert_eq!(leaf(&group.children()[1]).status(), TestStatus::Passed);
}

#[tokio::test(start_paused = true)]
async fn test_single_test_as_root() {
    let root = Node::from(Test::new("alone", FnCallback::sync(|| true)));
    let surface = Rc::new(MemorySurface::new());

    LocalSet::new()
        .run_until(async {
            root.execute_as_main(surface.clone(), Styler::plain())
                .wait()
                .await
                .unwrap();
        })
        .await;

    assert_eq!(surface.last().unwrap(), "✔  00s alone");
}

#[test]
fn test_leaves_carry_paths() {
    let root = Node::from(Group::new(
        "a",
        vec![Group::new("b", vec![Test::new("c", FnCallback::sync(|| true)).into()]).into()],
    ));
    let leaves = root.leaves();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].0, vec!["a", "b", "c"]);
}
