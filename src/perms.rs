//! Permission expression resolution
//!
//! Turns chmod-style expressions such as `u=rwx,g=rx,o=r`, `a+X`, `g=u` or
//! `0755` into a numeric mode, including the setuid, setgid and sticky bits and
//! the umask rule for clauses without an explicit "who".

use crate::error::{PermissionError, PermissionResult};
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

const USER: usize = 0;
const GROUP: usize = 1;
const OTHER: usize = 2;

/// Bit offset of each class within a mode
const SHIFT: [u32; 3] = [6, 3, 0];

/// Mode being built up clause by clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModeState {
    classes: [u32; 3],
    setuid: bool,
    setgid: bool,
    sticky: bool,
}

impl ModeState {
    fn from_mode(mode: u32) -> Self {
        ModeState {
            classes: [(mode >> 6) & 7, (mode >> 3) & 7, mode & 7],
            setuid: mode & 0o4000 != 0,
            setgid: mode & 0o2000 != 0,
            sticky: mode & 0o1000 != 0,
        }
    }

    fn to_mode(self) -> u32 {
        let special =
            u32::from(self.setuid) * 4 + u32::from(self.setgid) * 2 + u32::from(self.sticky);
        special << 9
            | self.classes[USER] << 6
            | self.classes[GROUP] << 3
            | self.classes[OTHER]
    }
}

fn clause_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([ugoa]*)((?:[=+-][rwxXstugo]*)+)$").expect("valid clause pattern")
    })
}

fn action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[=+-][rwxXstugo]*").expect("valid action pattern"))
}

/// Resolve a mode given as a YAML value.
///
/// Numbers are returned unchanged; strings go through [`resolve`].
pub fn resolve_value(
    value: &Value,
    initial: u32,
    is_directory: bool,
    umask: Option<u32>,
) -> PermissionResult<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|mode| u32::try_from(mode).ok())
            .ok_or_else(|| PermissionError::InvalidExpression(n.to_string())),
        Value::String(s) => resolve(s, initial, is_directory, umask),
        other => Err(PermissionError::InvalidExpression(format!("{:?}", other))),
    }
}

/// Resolve a permission expression to a numeric mode.
///
/// * all-digit strings are octal (`"0755"`)
/// * otherwise the string is a comma separated list of `<who><op><perm>` clauses,
///   applied in order starting from `initial`
///
/// `umask` only matters for `=` clauses without a "who"; when it is `None`
/// the process umask is probed and restored.
pub fn resolve(
    expression: &str,
    initial: u32,
    is_directory: bool,
    umask: Option<u32>,
) -> PermissionResult<u32> {
    let expression = expression.trim();
    if !expression.is_empty() && expression.bytes().all(|b| b.is_ascii_digit()) {
        return u32::from_str_radix(expression, 8)
            .map_err(|_| PermissionError::InvalidExpression(expression.to_string()));
    }

    let mut umask = umask;
    let mut state = ModeState::from_mode(initial & 0o7777);
    for clause in expression.split(',') {
        apply_clause(&mut state, clause, is_directory, &mut umask)?;
    }

    Ok(state.to_mode())
}

fn apply_clause(
    state: &mut ModeState,
    clause: &str,
    is_directory: bool,
    umask: &mut Option<u32>,
) -> PermissionResult<()> {
    let invalid = || PermissionError::InvalidExpression(clause.to_string());

    let caps = clause_pattern().captures(clause).ok_or_else(invalid)?;
    let who = caps.get(1).map_or("", |m| m.as_str());
    let actions = caps.get(2).map_or("", |m| m.as_str());

    let implicit = who.is_empty();
    let all = implicit || who.contains('a');
    let classes = [
        all || who.contains('u'),
        all || who.contains('g'),
        all || who.contains('o'),
    ];

    // `X` and class copies read the classes as they were before the clause
    let before = state.classes;
    for action in action_pattern().find_iter(actions) {
        let (op, perm) = action.as_str().split_at(1);
        let group = Group {
            classes,
            implicit,
            op,
            perm,
        };
        group
            .apply(state, &before, is_directory, umask)
            .map_err(|_| invalid())?;
    }

    Ok(())
}

/// One `<op><perm>` group applied to a set of classes
struct Group<'a> {
    classes: [bool; 3],
    implicit: bool,
    op: &'a str,
    perm: &'a str,
}

impl Group<'_> {
    fn apply(
        &self,
        state: &mut ModeState,
        before: &[u32; 3],
        is_directory: bool,
        umask: &mut Option<u32>,
    ) -> Result<(), ()> {
        let copy_from = match self.perm {
            "u" => Some(USER),
            "g" => Some(GROUP),
            "o" => Some(OTHER),
            _ => None,
        };
        if copy_from.is_none() && self.perm.contains(['u', 'g', 'o']) {
            return Err(());
        }

        for class in (0..3).filter(|&c| self.classes[c]) {
            let mut bits = match copy_from {
                Some(source) => before[source],
                None => self.perm_bits(class, before[class], is_directory),
            };

            if self.implicit && self.op == "=" {
                let mask = *umask.get_or_insert_with(current_umask);
                bits &= !(mask >> SHIFT[class]) & 7;
            }

            state.classes[class] = match self.op {
                "=" => bits,
                "+" => state.classes[class] | bits,
                _ => state.classes[class] & !bits,
            };
        }

        self.apply_special(state, is_directory);
        Ok(())
    }

    fn perm_bits(&self, class: usize, current: u32, is_directory: bool) -> u32 {
        self.perm.chars().fold(0, |bits, c| {
            bits | match c {
                'r' => 4,
                'w' => 2,
                'x' => 1,
                'X' if is_directory || current & 1 != 0 => 1,
                // an owner `s` reads as setuid plus execute, like `ls -l`
                's' if class == USER && self.op != "-" => 1,
                _ => 0,
            }
        })
    }

    fn apply_special(&self, state: &mut ModeState, is_directory: bool) {
        let has_s = self.perm.contains('s');
        let has_t = self.perm.contains('t');
        let [user, group, other] = self.classes;

        match self.op {
            "=" => {
                // NOTE: on directories a plain `=` leaves setuid/setgid alone;
                // only an explicit `s` changes them there.
                if user && (has_s || !is_directory) {
                    state.setuid = has_s;
                }
                if group && (has_s || !is_directory) {
                    state.setgid = has_s;
                }
                if other {
                    state.sticky = has_t;
                }
            }
            "+" => {
                if has_s && user {
                    state.setuid = true;
                }
                if has_s && group {
                    state.setgid = true;
                }
                if has_t && other {
                    state.sticky = true;
                }
            }
            _ => {
                if has_s && user {
                    state.setuid = false;
                }
                if has_s && group {
                    state.setgid = false;
                }
                if has_t && other {
                    state.sticky = false;
                }
            }
        }
    }
}

/// Read the process umask without changing it
#[cfg(unix)]
pub fn current_umask() -> u32 {
    use nix::sys::stat::{umask, Mode};

    let previous = umask(Mode::empty());
    umask(previous);
    u32::from(previous.bits())
}

/// Read the process umask without changing it
#[cfg(not(unix))]
pub fn current_umask() -> u32 {
    0o022
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(expression: &str) -> u32 {
        resolve(expression, 0, false, Some(0o022)).unwrap()
    }

    fn sym_dir(expression: &str) -> u32 {
        resolve(expression, 0, true, Some(0o022)).unwrap()
    }

    #[test]
    fn test_basic_permissions() {
        assert_eq!(sym("u=rwx,g=rx,o=r"), 0o754);
        assert_eq!(sym("u=rw,g=r,o="), 0o640);
        assert_eq!(sym("u=rwx,g=,o="), 0o700);
        assert_eq!(sym("a=r"), 0o444);
        assert_eq!(sym("a=-,ug+r,u+w"), 0o640);
    }

    #[test]
    fn test_add_permissions() {
        assert_eq!(sym("u=rw,g=r,o=,ug+w"), 0o660);
        assert_eq!(sym("u=rwx,g=rx,o=r,u+w"), 0o754);
    }

    #[test]
    fn test_remove_permissions() {
        assert_eq!(sym("u=rw,g=r,o=,ug-w"), 0o440);
        assert_eq!(sym("u=rwx,g=rx,o=r,u-w"), 0o554);
        assert_eq!(sym("a=rwxs,u-s"), 0o2777);
    }

    #[test]
    fn test_conditional_execute() {
        assert_eq!(sym("u=rwX"), 0o600);
        assert_eq!(sym_dir("u=rwX"), 0o700);
        assert_eq!(sym_dir("u=rX,g=rX,o=rX"), 0o555);
        assert_eq!(sym("u=rX,g=rX,o=rX"), 0o444);
        // X looks at the class's own execute bit
        assert_eq!(resolve("a=rX", 0o100, false, Some(0)).unwrap(), 0o544);
    }

    #[test]
    fn test_setuid_setgid() {
        assert_eq!(sym("u=rws,g=rx,o=r"), 0o4754);
        assert_eq!(sym("u=rwx,g=rs,o=r"), 0o2744);
    }

    #[test]
    fn test_sticky() {
        assert_eq!(sym("u=rwx,g=rx,o=rt"), 0o1754);
        assert_eq!(sym("u=rwx,g=rt,o=rx"), 0o745);
        assert_eq!(sym_dir("u=rwx,g=rx,o=rt"), 0o1754);
        assert_eq!(sym_dir("u=rwx,g=rt,o=rx"), 0o745);
        assert_eq!(sym_dir("u=rwx,g=rx,o=r,a+t"), 0o1754);
    }

    #[test]
    fn test_multiple_groups_share_who() {
        assert_eq!(resolve("u=r+w-x", 0o700, false, Some(0)).unwrap(), 0o600);
        assert_eq!(resolve("go=rx-x", 0, false, Some(0)).unwrap(), 0o044);
    }

    #[test]
    fn test_later_groups_see_pre_clause_execute() {
        // u had x before the clause, so `+X` restores it after `=r`
        assert_eq!(resolve("u=r+X", 0o700, false, Some(0)).unwrap(), 0o500);
        assert_eq!(resolve("u=r+X", 0o600, false, Some(0)).unwrap(), 0o400);
        // a copy reads the pre-clause value too
        assert_eq!(resolve("g=+u", 0o750, false, Some(0)).unwrap(), 0o770);
        assert_eq!(resolve("u=,g=u", 0o750, false, Some(0)).unwrap(), 0o000);
    }

    #[test]
    fn test_copy_class() {
        assert_eq!(resolve("g=u", 0o750, false, Some(0)).unwrap(), 0o770);
        assert_eq!(resolve("o+g", 0o754, false, Some(0)).unwrap(), 0o755);
        assert_eq!(resolve("u-o", 0o701, false, Some(0)).unwrap(), 0o601);
    }

    #[test]
    fn test_implicit_who_uses_umask() {
        assert_eq!(resolve("=rw", 0o4777, false, Some(0o027)).unwrap(), 0o640);
        assert_eq!(resolve("=rwx", 0, false, Some(0o022)).unwrap(), 0o755);
        // + and - are never masked
        assert_eq!(resolve("+w", 0, false, Some(0o022)).unwrap(), 0o222);
        // explicit `a` is not masked either
        assert_eq!(resolve("a=rw", 0, false, Some(0o077)).unwrap(), 0o666);
    }

    #[test]
    fn test_equals_clears_special_bits() {
        assert_eq!(resolve("u=rw", 0o4700, false, Some(0)).unwrap(), 0o600);
        assert_eq!(resolve("o=r", 0o1007, false, Some(0)).unwrap(), 0o004);
        assert_eq!(resolve("g=r", 0o2070, false, Some(0)).unwrap(), 0o040);
    }

    #[test]
    fn test_directory_keeps_setuid_setgid_on_equals() {
        assert_eq!(resolve("u=rwx,g=rx", 0o6000, true, Some(0)).unwrap(), 0o6750);
        // sticky is still cleared
        assert_eq!(resolve("o=r", 0o1000, true, Some(0)).unwrap(), 0o004);
        assert_eq!(resolve("u=rwx", 0o4000, true, Some(0)).unwrap(), 0o4700);
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(resolve("755", 0, false, None).unwrap(), 0o755);
        assert_eq!(resolve("0640", 0o777, false, None).unwrap(), 0o640);
        assert_eq!(resolve("4755", 0, true, None).unwrap(), 0o4755);
        let value = Value::Number(0o644.into());
        assert_eq!(resolve_value(&value, 0o777, false, None).unwrap(), 0o644);
        let text = Value::String("u=rw".to_string());
        assert_eq!(resolve_value(&text, 0, false, Some(0)).unwrap(), 0o600);
    }

    #[test]
    fn test_invalid_expressions() {
        for bad in ["", "u=q", "z=r", "u", "u=rw,", "u=ur", "789", "u=rw;g=r"] {
            let result = resolve(bad, 0, false, Some(0o022));
            assert!(result.is_err(), "accepted {:?}", bad);
        }
        assert_eq!(
            resolve("u=rw,k+x", 0, false, Some(0)),
            Err(PermissionError::InvalidExpression("k+x".to_string()))
        );
        assert!(resolve_value(&Value::Bool(true), 0, false, None).is_err());
    }

    #[test]
    fn test_umask_probe_restores_state() {
        let first = current_umask();
        let second = current_umask();
        assert_eq!(first, second);
    }
}
