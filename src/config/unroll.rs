//! Loop unrolling
//!
//! A statement carrying `loop: [ {..}, {..} ]` is replaced by one copy of itself
//! per loop entry, each copy shallow-merged with that entry. This runs before
//! execution, on every nested `block` list as well as the top level.

use crate::config::types::BLOCK_KEY;
use crate::error::{DocumentError, DocumentResult};
use serde_yaml::{Mapping, Value};

/// Unroll every loop-bearing statement in a raw statement list
pub fn unroll(statements: &[Value]) -> DocumentResult<Vec<Value>> {
    let mut result = Vec::with_capacity(statements.len());

    for statement in statements {
        let Value::Mapping(mapping) = statement else {
            // Left for statement validation to report
            result.push(statement.clone());
            continue;
        };

        match mapping.get("loop") {
            None => result.push(Value::Mapping(unroll_nested(mapping.clone())?)),
            Some(spec) => {
                let base: Mapping = mapping
                    .iter()
                    .filter(|(key, _)| key.as_str() != Some("loop"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();

                for entry in loop_entries(spec)? {
                    let mut merged = base.clone();
                    for (key, value) in entry {
                        merged.insert(key.clone(), value.clone());
                    }
                    result.push(Value::Mapping(unroll_nested(merged)?));
                }
            }
        }
    }

    Ok(result)
}

/// Unroll the nested list under `block`, if there is one
fn unroll_nested(mut mapping: Mapping) -> DocumentResult<Mapping> {
    if let Some(Value::Sequence(nested)) = mapping.get(BLOCK_KEY) {
        let unrolled = unroll(nested)?;
        mapping.insert(Value::String(BLOCK_KEY.to_string()), Value::Sequence(unrolled));
    }
    Ok(mapping)
}

fn loop_entries(spec: &Value) -> DocumentResult<Vec<&Mapping>> {
    match spec {
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| entry.as_mapping().ok_or(DocumentError::InvalidLoop))
            .collect(),
        _ => Err(DocumentError::InvalidLoop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Vec<Value> {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_no_loop() {
        let input = yaml("- {a: 1, b: 2}\n- {c: 3, d: 4}\n");
        assert_eq!(unroll(&input).unwrap(), input);
    }

    #[test]
    fn test_loop() {
        let input = yaml("- {a: 1, b: 2, loop: [{c: 3}, {d: 4}]}\n");
        let expected = yaml("- {a: 1, b: 2, c: 3}\n- {a: 1, b: 2, d: 4}\n");
        assert_eq!(unroll(&input).unwrap(), expected);
    }

    #[test]
    fn test_loop_override() {
        let input = yaml("- {a: 1, b: 2, loop: [{c: 3}, {b: 5, d: 4}]}\n");
        let expected = yaml("- {a: 1, b: 2, c: 3}\n- {a: 1, b: 5, d: 4}\n");
        let output = unroll(&input).unwrap();
        assert_eq!(output, expected);

        // override keeps the original key position
        let keys: Vec<_> = output[1]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(unroll(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_expansions_replace_position() {
        let input = yaml(
            r#"
- echo: first
- echo: "{{ item }}"
  loop:
    - item: a
    - item: b
    - item: c
- echo: last
"#,
        );
        let output = unroll(&input).unwrap();
        assert_eq!(output.len(), 5);
        assert_eq!(output[0]["echo"], Value::String("first".to_string()));
        assert_eq!(output[2]["item"], Value::String("b".to_string()));
        assert_eq!(output[4]["echo"], Value::String("last".to_string()));
        assert!(output.iter().all(|s| s.get("loop").is_none()));
    }

    #[test]
    fn test_empty_loop_removes_statement() {
        let input = yaml("- {echo: hi, loop: []}\n- {echo: after}\n");
        assert_eq!(unroll(&input).unwrap(), yaml("- {echo: after}\n"));
    }

    #[test]
    fn test_nested_block_unrolled() {
        let input = yaml(
            r#"
- if: "true"
  block:
    - block:
        - echo: "{{ n }}"
          loop: [{n: 1}, {n: 2}]
"#,
        );
        let output = unroll(&input).unwrap();
        let inner = &output[0]["block"][0]["block"];
        assert_eq!(inner.as_sequence().unwrap().len(), 2);
        assert_eq!(inner[1]["n"], Value::Number(2.into()));
    }

    #[test]
    fn test_invalid_loop() {
        assert!(matches!(
            unroll(&yaml("- {echo: hi, loop: 3}\n")),
            Err(DocumentError::InvalidLoop)
        ));
        assert!(matches!(
            unroll(&yaml("- {echo: hi, loop: [1, 2]}\n")),
            Err(DocumentError::InvalidLoop)
        ));
    }
}
