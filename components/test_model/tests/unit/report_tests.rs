//! Unit tests for report generation

use test_model::{FnCallback, Group, Node, Test, TestReport, TestStatus};

#[test]
fn test_new_report() {
    let report = TestReport::new();
    assert_eq!(report.total, 0);
    assert_eq!(report.passed, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.running, 0);
    assert!(report.failures.is_empty());
    assert!(report.is_success());
}

#[test]
fn test_add_statuses() {
    let mut report = TestReport::new();
    report.add_status("ok", TestStatus::Passed);
    report.add_status("bad", TestStatus::Failed);
    report.add_status("hung", TestStatus::Running);
    assert_eq!(report.total, 3);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.running, 1);
    assert_eq!(report.failures, vec!["bad".to_string()]);
    assert!(!report.is_success());
}

#[test]
fn test_from_unrun_tree() {
    let root = Node::from(Group::new(
        "suite",
        vec![
            Test::new("a", FnCallback::sync(|| true)).into(),
            Test::new("b", FnCallback::sync(|| true)).into(),
        ],
    ));
    let report = TestReport::from_tree(&root);
    assert_eq!(report.total, 2);
    assert_eq!(report.running, 2);
}

#[test]
fn test_merge() {
    let mut first = TestReport::new();
    first.add_status("x", TestStatus::Passed);
    let mut second = TestReport::new();
    second.add_status("y", TestStatus::Failed);

    first.merge(&second);
    assert_eq!(first.total, 2);
    assert_eq!(first.failures, vec!["y".to_string()]);
}

#[test]
fn test_summary_and_details() {
    let mut report = TestReport::new();
    report.add_status("suite > ok", TestStatus::Passed);
    report.add_status("suite > broken", TestStatus::Failed);

    assert!(report.summary().contains("2 total"));
    assert!(report.summary().contains("50.0%"));
    assert!(report.detailed_summary().contains("  - suite > broken"));
}
