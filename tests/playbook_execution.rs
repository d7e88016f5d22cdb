//! Integration tests for statement execution: scoping, conditions, exit codes

mod common;

use common::{create_playbook, run_playbook};
use serde_yaml::Value;
use uprun::error::{DocumentError, ExecutionError, UpError};

fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

#[test]
fn test_vars_visible_only_inside_statement() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- set:
    seen: "{{ local | default('none') }}"
- block:
    - set:
        inner: "{{ local }}"
  vars:
    local: frame
- set:
    after: "{{ local | default('none') }}"
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    result.unwrap();
    assert_eq!(text(engine.ctx.get_var("seen")), Some("none"));
    assert_eq!(text(engine.ctx.get_var("inner")), Some("frame"));
    assert_eq!(text(engine.ctx.get_var("after")), Some("none"));
    assert_eq!(engine.ctx.scope.depth(), 0);
}

#[test]
fn test_inner_frame_shadows_outer() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- set:
    name: global
- block:
    - block:
        - set:
            result: "{{ name }}"
      vars:
        name: inner
  vars:
    name: outer
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    result.unwrap();
    assert_eq!(text(engine.ctx.get_var("result")), Some("inner"));
    assert_eq!(text(engine.ctx.get_var("name")), Some("global"));
}

#[test]
fn test_elif_chain_takes_first_true_branch() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- set:
    size: 7
- if: "size > 10"
  block:
    - set: {branch: large}
- elif: "size > 5"
  block:
    - set: {branch: medium}
- elif: "size > 1"
  block:
    - set: {branch: small}
- else:
  block:
    - set: {branch: tiny}
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    result.unwrap();
    assert_eq!(text(engine.ctx.get_var("branch")), Some("medium"));
}

#[test]
fn test_else_when_nothing_matches() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- if: "env_name is defined and env_name == 'prod'"
  block:
    - set: {branch: prod}
- else:
  block:
    - set: {branch: other}
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    result.unwrap();
    assert_eq!(text(engine.ctx.get_var("branch")), Some("other"));
}

#[test]
fn test_taken_chain_skips_broken_conditions() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- if: true
  block:
    - set: {branch: first}
- elif: "this is not ( valid"
  block:
    - set: {branch: second}
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    result.unwrap();
    assert_eq!(text(engine.ctx.get_var("branch")), Some("first"));
}

#[test]
fn test_misplaced_else() {
    let (_temp_dir, playbook) = create_playbook("- echo: hi\n- else:\n  block: []\n");

    let (_, result) = run_playbook(&playbook);
    assert!(matches!(
        result,
        Err(UpError::Document(DocumentError::MisplacedBranch { .. }))
    ));
}

#[test]
fn test_unknown_command_halts() {
    let (_temp_dir, playbook) = create_playbook(
        "- set: {a: 1}\n- frobnicate: now\n- set: {a: 2}\n",
    );

    let (engine, result) = run_playbook(&playbook);
    match result {
        Err(UpError::Execution(ExecutionError::UnknownCommand(name))) => {
            assert_eq!(name, "frobnicate")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(engine.ctx.get_var("a"), Some(&Value::Number(1.into())));
}

#[test]
fn test_exit_inside_block_stops_everything() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- block:
    - exit: 4
    - set: {inner: reached}
- set: {outer: reached}
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(engine.ctx.get_var("inner").is_none());
    assert!(engine.ctx.get_var("outer").is_none());
    assert_eq!(engine.ctx.scope.depth(), 0);
}

#[test]
fn test_loop_over_conditions() {
    let (_temp_dir, playbook) = create_playbook(
        r#"
- set:
    picked: ""
- if: "n % 2 == 0"
  block:
    - set:
        picked: "{{ picked }}{{ n }}"
  loop:
    - vars: {n: 1}
    - vars: {n: 2}
    - vars: {n: 3}
    - vars: {n: 4}
"#,
    );

    let (engine, result) = run_playbook(&playbook);
    result.unwrap();
    assert_eq!(text(engine.ctx.get_var("picked")), Some("24"));
}
