/// Integration test suite that drives the compiled `overmind` binary via
/// subprocess. `CARGO_BIN_EXE_overmind` is set by Cargo during `cargo test`
/// and points at the binary for the current profile.
///
/// The long-running supervision loop itself is exercised in the unit tests
/// (`supervisor`, `watcher`, `orchestrator` modules) with millisecond
/// intervals; these tests cover the launch surface: argument validation
/// and the fail-fast startup errors that must fire before any lane starts.
use std::path::PathBuf;
use std::process::Command;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_overmind"))
}

/// Run overmind and assert a non-zero exit. Returns (stdout, stderr).
fn run_failure(args: &[&str], cwd: &std::path::Path) -> (String, String) {
    let out = Command::new(binary())
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to invoke overmind binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        !out.status.success(),
        "command {:?} expected to fail but exited successfully\nstdout: {}\nstderr: {}",
        args,
        stdout,
        stderr
    );
    (stdout, stderr)
}

#[test]
fn test_no_args_prints_usage_and_does_no_work() {
    let dir = tempfile::tempdir().unwrap();
    let (_stdout, stderr) = run_failure(&[], dir.path());
    assert!(
        stderr.contains("Usage"),
        "expected usage text, got: {stderr}"
    );
}

#[test]
fn test_missing_worker_arg_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let (_stdout, stderr) = run_failure(&["workers.toml"], dir.path());
    assert!(
        stderr.contains("Usage"),
        "expected usage text, got: {stderr}"
    );
}

#[test]
fn test_help_mentions_launch_surface() {
    let out = Command::new(binary())
        .arg("--help")
        .output()
        .expect("failed to invoke overmind binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--runner"));
    assert!(stdout.contains("--dual"));
}

#[test]
fn test_missing_unit_file_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let (_stdout, stderr) = run_failure(&["nowhere.toml", "unit-tests"], dir.path());
    assert!(
        stderr.contains("nowhere.toml"),
        "expected the unit file in the error, got: {stderr}"
    );
}

#[test]
fn test_unknown_worker_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("workers.toml"),
        "[workers.present]\ncommand = [\"true\"]\n",
    )
    .unwrap();

    let (_stdout, stderr) = run_failure(&["workers.toml", "absent"], dir.path());
    assert!(
        stderr.contains("absent"),
        "expected the worker name in the error, got: {stderr}"
    );
}

#[test]
fn test_empty_command_worker_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("workers.toml"), "[workers.hollow]\n").unwrap();

    let (_stdout, stderr) = run_failure(&["workers.toml", "hollow"], dir.path());
    assert!(
        stderr.contains("empty command"),
        "expected the empty-command error, got: {stderr}"
    );
}
