//! Workspace-wide architectural checks

use architectural_enforcement::{find_violations, report, rust_sources, workspace_root};

const PRODUCTION_TREES: [&str; 2] = ["pulse/core/src", "pulse/daemon/src"];

#[test]
fn test_sources_found() {
    let root = workspace_root();
    for tree in PRODUCTION_TREES {
        assert!(
            !rust_sources(&root.join(tree)).is_empty(),
            "no sources under {tree}"
        );
    }
}

#[test]
fn test_no_blocking_sleep() {
    let root = workspace_root();
    for tree in PRODUCTION_TREES {
        let violations = find_violations(&root.join(tree), &["std::thread::sleep", "thread::sleep("]);
        assert!(
            violations.is_empty(),
            "blocking sleep in async code:\n{}",
            report(&violations)
        );
    }
}

#[test]
fn test_core_does_not_panic_on_errors() {
    let violations = find_violations(&workspace_root().join("pulse/core/src"), &[".unwrap()", ".expect("]);
    assert!(
        violations.is_empty(),
        "propagate errors instead of panicking:\n{}",
        report(&violations)
    );
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = std::fs::read_to_string(workspace_root().join("pulse/core/Cargo.toml"))
        .expect("core manifest readable");
    for forbidden in ["ratatui", "crossterm", "clap", "tracing-subscriber"] {
        assert!(
            !manifest.contains(forbidden),
            "pulse-core must stay headless but depends on {forbidden}"
        );
    }
}
