//! End-to-end tests for the `up` binary

mod common;

use assert_cmd::Command;
use common::{create_playbook, write_file};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// The `up` binary, run inside `dir` so relative paths stay in the test's tempdir
fn up(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("up").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("UP_FILES_PATH");
    cmd
}

const GREET: &str = r#"
- doc: Greet a host
- args:
    - name: host
      description: Host to greet
    - name: greeting
      default: hello
    - name: times
      type: int
      default: 1
- echo: "{{ greeting }} {{ host }} x{{ times }}"
"#;

#[test]
fn test_declared_arguments() {
    let (temp_dir, playbook) = create_playbook(GREET);

    up(temp_dir.path()).arg(&playbook)
        .arg("web1")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello web1 x1"));

    up(temp_dir.path()).arg(&playbook)
        .args(["web2", "--greeting", "hi", "--times", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hi web2 x3"));
}

#[test]
fn test_missing_positional_fails() {
    let (temp_dir, playbook) = create_playbook(GREET);

    up(temp_dir.path()).arg(&playbook)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HOST"));
}

#[test]
fn test_help_lists_declared_arguments() {
    let (temp_dir, playbook) = create_playbook(GREET);

    up(temp_dir.path()).arg(&playbook)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Greet a host"))
        .stdout(predicate::str::contains("Host to greet"))
        .stdout(predicate::str::contains("--greeting"));
}

#[test]
fn test_no_playbook_is_a_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    up(temp_dir.path()).assert().failure();
}

#[test]
fn test_unknown_command_exits_one() {
    let (temp_dir, playbook) = create_playbook("- echo: before\n- frobnicate: now\n- echo: after\n");

    up(temp_dir.path()).arg(&playbook)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("before"))
        .stdout(predicate::str::contains("after").not())
        .stderr(predicate::str::contains("frobnicate"));
}

#[test]
fn test_exit_statement_sets_code() {
    let (temp_dir, playbook) = create_playbook("- exit: 3\n- echo: unreachable\n");

    up(temp_dir.path()).arg(&playbook)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("unreachable").not())
        .stderr(predicate::str::contains("Error:").not());

    let (temp_dir, playbook) = create_playbook("- exit:\n  msg: done\n");
    up(temp_dir.path()).arg(&playbook).assert().success();
}

#[test]
fn test_unreadable_playbook() {
    let temp_dir = TempDir::new().unwrap();
    up(temp_dir.path()).arg("/nonexistent/playbook.yml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read playbook"));
}

#[test]
fn test_env_file() {
    let (temp_dir, playbook) = create_playbook("- echo: \"stage={{ env.UPRUN_CLI_STAGE }}\"\n");
    let env_file = write_file(temp_dir.path(), "stage.env", "UPRUN_CLI_STAGE=staging\n");

    up(temp_dir.path()).arg("--env-file")
        .arg(&env_file)
        .arg(&playbook)
        .assert()
        .success()
        .stdout(predicate::str::contains("stage=staging"));
}

#[test]
fn test_ask_prompts_on_stdin() {
    let (temp_dir, playbook) = create_playbook(GREET);

    up(temp_dir.path()).arg("--ask")
        .arg(&playbook)
        .write_stdin("db1\n\n2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello db1 x2"));
}

#[test]
fn test_quiet_hides_progress() {
    let (temp_dir, playbook) = create_playbook("- mkdir: made\n");

    up(temp_dir.path()).arg("-q")
        .arg(&playbook)
        .assert()
        .success()
        .stderr(predicate::str::contains("mkdir").not());
    assert!(temp_dir.path().join("made").is_dir());
}

#[test]
fn test_relative_destinations_use_working_dir() {
    let temp_dir = TempDir::new().unwrap();
    let playbook = write_file(temp_dir.path(), "books/site.yml", "- mkdir: out\n");
    let work = temp_dir.path().join("work");
    std::fs::create_dir(&work).unwrap();

    up(&work).arg(&playbook).assert().success();
    assert!(work.join("out").is_dir());
    assert!(!temp_dir.path().join("books/out").exists());
}

#[test]
fn test_declared_option_before_playbook() {
    let (temp_dir, playbook) = create_playbook(GREET);

    up(temp_dir.path())
        .arg("--greeting")
        .arg("hey")
        .arg(&playbook)
        .arg("web3")
        .assert()
        .success()
        .stdout(predicate::str::contains("hey web3 x1"));
}
