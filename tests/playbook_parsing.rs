//! Integration tests for playbook loading

mod common;

use common::create_playbook;
use uprun::config::{parse_playbook, parse_playbook_file, ArgType};
use uprun::error::{DocumentError, UpError};

#[test]
fn test_parse_complete_playbook() {
    let yaml = r#"
- doc: Set up a web host
- args:
    - name: host
      description: Host name
    - name: port
      type: int
      default: 8080
    - name: dry_run
      type: bool
      default: false
- set:
    root: /srv/{{ host }}
- mkdir: "{{ root }}"
  mode: "u=rwx,go=rx"
- if: "port < 1024"
  block:
    - fail: privileged port
- else:
  block:
    - echo: "listening on {{ port }}"
"#;

    let playbook = parse_playbook(yaml, None).unwrap();
    assert_eq!(playbook.doc.as_deref(), Some("Set up a web host"));
    assert_eq!(playbook.args.len(), 3);
    assert!(playbook.args[0].is_positional());
    assert_eq!(playbook.args[1].arg_type, ArgType::Int);
    assert!(!playbook.args[2].is_positional());

    let commands: Vec<&str> = playbook
        .statements
        .iter()
        .map(|s| s.command.as_str())
        .collect();
    assert_eq!(commands, ["doc", "args", "set", "mkdir", "if", "else"]);
    assert_eq!(playbook.statements[4].body.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_loop_unrolled_before_execution() {
    let yaml = r#"
- echo: "{{ pkg }}"
  vars:
    pkg: base
  loop:
    - vars:
        pkg: nginx
    - msg: extra
"#;

    let playbook = parse_playbook(yaml, None).unwrap();
    assert_eq!(playbook.statements.len(), 2);
    let first = &playbook.statements[0];
    assert_eq!(first.vars.get("pkg").and_then(|v| v.as_str()), Some("nginx"));
    let second = &playbook.statements[1];
    assert_eq!(second.vars.get("pkg").and_then(|v| v.as_str()), Some("base"));
    assert_eq!(second.arg("msg").and_then(|v| v.as_str()), Some("extra"));
}

#[test]
fn test_loops_inside_blocks() {
    let yaml = r#"
- block:
    - mkdir: "{{ d }}"
      loop:
        - vars: {d: a}
        - vars: {d: b}
        - vars: {d: c}
"#;

    let playbook = parse_playbook(yaml, None).unwrap();
    let body = playbook.statements[0].body.as_ref().unwrap();
    assert_eq!(body.len(), 3);
    assert!(body.iter().all(|s| s.command == "mkdir"));
}

#[test]
fn test_empty_playbook() {
    let playbook = parse_playbook("[]", None).unwrap();
    assert!(playbook.statements.is_empty());
    assert!(playbook.doc.is_none());
}

#[test]
fn test_parse_from_file() {
    let (_temp_dir, path) = create_playbook("- echo: hi\n");
    let playbook = parse_playbook_file(&path).unwrap();
    assert_eq!(playbook.path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_invalid_documents() {
    assert!(matches!(
        parse_playbook("echo: hi\n", None),
        Err(UpError::Document(DocumentError::NotAList))
    ));
    assert!(matches!(
        parse_playbook("- echo: hi\n- just text\n", None),
        Err(UpError::Document(DocumentError::NotAMapping(1)))
    ));
    assert!(matches!(
        parse_playbook("- echo: hi\n  loop: nope\n", None),
        Err(UpError::Document(DocumentError::InvalidLoop))
    ));
    assert!(matches!(
        parse_playbook("- echo: [unclosed\n", None),
        Err(UpError::Yaml(_))
    ));
}

#[test]
fn test_invalid_arg_declarations() {
    let duplicate = "- args:\n    - name: a\n    - name: a\n";
    assert!(matches!(
        parse_playbook(duplicate, None),
        Err(UpError::Document(DocumentError::InvalidArgs(_)))
    ));

    let bad_default = "- args:\n    - name: n\n      type: int\n      default: many\n";
    assert!(matches!(
        parse_playbook(bad_default, None),
        Err(UpError::Document(DocumentError::InvalidArgs(_)))
    ));
}
