//! E2E tests for the `completions` command.

mod common;

use common::cli::{BridgeWorkspace, read, run_bridge};

const SUBCOMMANDS: [&str; 6] = ["fields", "whoami", "extract", "resolve", "import", "run"];

#[test]
fn e2e_completions_each_shell() {
    let _log = common::test_log("e2e_completions_each_shell");
    let workspace = BridgeWorkspace::new();

    for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
        let run = run_bridge(&workspace, ["completions", shell], &format!("completions_{shell}"));
        assert!(run.status.success(), "{shell} failed: {}", run.stderr);
        for command in SUBCOMMANDS {
            assert!(
                run.stdout.contains(command),
                "{shell} completions should contain '{command}'"
            );
        }
    }
}

#[test]
fn e2e_completions_work_without_config() {
    let _log = common::test_log("e2e_completions_work_without_config");
    let workspace = BridgeWorkspace::new();

    let run = run_bridge(
        &workspace,
        ["--config", "absent.yaml", "completions", "bash"],
        "completions_no_config",
    );
    assert!(run.status.success(), "stderr: {}", run.stderr);
    assert!(run.stdout.contains("--max-failure-rate"));
}

#[test]
fn e2e_completions_to_directory() {
    let _log = common::test_log("e2e_completions_to_directory");
    let workspace = BridgeWorkspace::new();
    std::fs::create_dir_all(workspace.path("completions")).expect("dir");

    let run = run_bridge(
        &workspace,
        ["completions", "zsh", "-o", "completions"],
        "completions_dir",
    );
    assert!(run.status.success(), "stderr: {}", run.stderr);
    let script = read(&workspace.path("completions/_asset-bridge"));
    assert!(script.contains("#compdef asset-bridge"));
}

#[test]
fn e2e_completions_unknown_shell_fails() {
    let _log = common::test_log("e2e_completions_unknown_shell_fails");
    let workspace = BridgeWorkspace::new();

    let run = run_bridge(&workspace, ["completions", "tcsh"], "completions_unknown");
    assert!(!run.status.success());
    assert!(run.stderr.contains("invalid value"), "stderr: {}", run.stderr);
}
