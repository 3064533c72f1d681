//! Unit tests for the default timeout policy, which ends the process
//!
//! The aborting run happens in a child copy of this test binary.

use std::process::Command;
use std::rc::Rc;
use test_model::{FnCallback, MemorySurface, Node, Styler, Test};
use tokio::task::LocalSet;

const CHILD_ENV: &str = "TEST_MODEL_TIMEOUT_CHILD";

fn run_stuck_tree() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let root = Node::from(
        Test::new("stuck forever", FnCallback::new(std::future::pending::<bool>)).with_timeout(0.05),
    );
    let surface = Rc::new(MemorySurface::new());
    let result = LocalSet::new().block_on(&runtime, async {
        root.execute_as_main(surface, Styler::plain()).wait().await
    });
    panic!("run returned instead of exiting: {result:?}");
}

#[test]
fn test_default_policy_exits_naming_the_test() {
    if std::env::var_os(CHILD_ENV).is_some() {
        run_stuck_tree();
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args([
            "abort_tests::test_default_policy_exits_naming_the_test",
            "--exact",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "{stderr}");
    assert!(stderr.contains("Test stuck forever timed out."), "{stderr}");
}
