//! Variable scopes
//!
//! A [`Scope`] is the global namespace plus a stack of local frames, one per
//! statement being executed. Lookups walk the frames from the most recent one
//! down to the globals; nothing is merged in place.

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

/// A flat set of named values
pub type Vars = HashMap<String, Value>;

/// Anything names can be looked up in
pub trait Namespace {
    /// Look up a name, returning a copy of its value
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Namespace for Vars {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// A namespace with extra names layered over a base one
pub struct Layered<'a> {
    pub base: &'a dyn Namespace,
    pub extra: &'a Vars,
}

impl Namespace for Layered<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.extra
            .get(name)
            .cloned()
            .or_else(|| self.base.lookup(name))
    }
}

/// Global variables plus the local frame stack
#[derive(Debug, Clone, Default)]
pub struct Scope {
    globals: Vars,
    frames: Vec<Vars>,
}

impl Scope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope with initial globals
    pub fn with_globals(globals: Vars) -> Self {
        Scope {
            globals,
            frames: Vec::new(),
        }
    }

    /// Set a global variable
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Get the global variables
    pub fn globals(&self) -> &Vars {
        &self.globals
    }

    /// Push a local frame
    pub fn push_frame(&mut self, frame: Vars) {
        self.frames.push(frame);
    }

    /// Pop the most recent local frame
    pub fn pop_frame(&mut self) -> Option<Vars> {
        self.frames.pop()
    }

    /// Number of local frames currently pushed
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Get a variable; later frames win over earlier ones, frames over globals
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// Compute the effective namespace
    pub fn merged(&self) -> Vars {
        let mut merged = self.globals.clone();
        for frame in &self.frames {
            merged.extend(frame.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

impl Namespace for Scope {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Convert a YAML mapping into variables, keeping scalar keys as text
pub fn vars_from_mapping(mapping: &Mapping) -> Vars {
    mapping
        .iter()
        .filter_map(|(key, value)| key_name(key).map(|name| (name, value.clone())))
        .collect()
}

/// Text form of a mapping key
pub fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    fn frame(pairs: &[(&str, &str)]) -> Vars {
        pairs.iter().map(|(k, v)| (k.to_string(), s(v))).collect()
    }

    #[test]
    fn test_frames_override_globals() {
        let mut scope = Scope::new();
        scope.set_global("name", s("global"));
        assert_eq!(scope.get("name"), Some(&s("global")));

        scope.push_frame(frame(&[("name", "outer")]));
        scope.push_frame(frame(&[("other", "x")]));
        assert_eq!(scope.get("name"), Some(&s("outer")));

        scope.push_frame(frame(&[("name", "inner")]));
        assert_eq!(scope.get("name"), Some(&s("inner")));
        assert_eq!(scope.depth(), 3);

        scope.pop_frame();
        scope.pop_frame();
        assert_eq!(scope.get("name"), Some(&s("outer")));

        scope.pop_frame();
        assert_eq!(scope.get("name"), Some(&s("global")));
        assert!(scope.get("other").is_none());
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn test_merged_view_does_not_mutate() {
        let mut scope = Scope::with_globals(frame(&[("a", "1"), ("b", "1")]));
        scope.push_frame(frame(&[("b", "2")]));

        let merged = scope.merged();
        assert_eq!(merged.get("a"), Some(&s("1")));
        assert_eq!(merged.get("b"), Some(&s("2")));

        scope.pop_frame();
        assert_eq!(scope.globals().get("b"), Some(&s("1")));
    }

    #[test]
    fn test_layered_lookup() {
        let mut scope = Scope::new();
        scope.set_global("a", s("global"));
        scope.set_global("b", s("global"));
        let extra = frame(&[("b", "extra")]);

        let layered = Layered {
            base: &scope,
            extra: &extra,
        };
        assert_eq!(layered.lookup("a"), Some(s("global")));
        assert_eq!(layered.lookup("b"), Some(s("extra")));
        assert_eq!(layered.lookup("c"), None);
    }

    #[test]
    fn test_vars_from_mapping() {
        let mapping: Mapping = serde_yaml::from_str("name: x\n1: one\n").unwrap();
        let vars = vars_from_mapping(&mapping);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("1"), Some(&s("one")));
        assert_eq!(key_name(&Value::Sequence(vec![])), None);
    }
}
