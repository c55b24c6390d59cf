// Structural validation of persisted documents.
//
// Documents are checked as a whole before any value is read from them; the
// first mismatch rejects the document with a JSON-pointer path to the
// offending value.

use std::fmt;

use serde_json::{Map, Value};

use crate::CoreError;

/// The kinds of document that can be validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Flat object mapping parameter names to numbers.
    Params,
    /// Transducer: `{"state": [{"id": .., "trans": [..]}, ..]}`.
    Machine,
    /// Weight expression.
    Weight,
}

impl SchemaKind {
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::Params => "params",
            SchemaKind::Machine => "machine",
            SchemaKind::Weight => "weight",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const STATE_KEYS: &[&str] = &["id", "trans"];
const TRANS_KEYS: &[&str] = &["in", "out", "to", "weight"];
const BINARY_OPS: &[&str] = &["+", "-", "*", "/"];
const UNARY_OPS: &[&str] = &["log", "exp", "not"];

/// Validate `doc` against the schema for `kind`.
pub fn validate(kind: SchemaKind, doc: &Value) -> Result<(), CoreError> {
    let checker = Checker { kind };
    match kind {
        SchemaKind::Params => checker.params(doc),
        SchemaKind::Machine => checker.machine(doc),
        SchemaKind::Weight => checker.weight(doc, ""),
    }
}

/// Escape a key for use as a JSON-pointer path segment.
fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

struct Checker {
    kind: SchemaKind,
}

impl Checker {
    fn fail(&self, path: &str, reason: impl Into<String>) -> CoreError {
        CoreError::SchemaViolation {
            kind: self.kind,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            reason: reason.into(),
        }
    }

    fn object<'a>(&self, value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, CoreError> {
        value
            .as_object()
            .ok_or_else(|| self.fail(path, format!("expected object, found {}", type_name(value))))
    }

    fn array<'a>(&self, value: &'a Value, path: &str) -> Result<&'a Vec<Value>, CoreError> {
        value
            .as_array()
            .ok_or_else(|| self.fail(path, format!("expected array, found {}", type_name(value))))
    }

    fn only_keys(&self, map: &Map<String, Value>, allowed: &[&str], path: &str) -> Result<(), CoreError> {
        match map.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(self.fail(path, format!("unexpected property {key:?}"))),
            None => Ok(()),
        }
    }

    fn params(&self, doc: &Value) -> Result<(), CoreError> {
        let map = self.object(doc, "")?;
        for (name, value) in map {
            if !value.is_number() {
                return Err(self.fail(
                    &format!("/{}", pointer_segment(name)),
                    format!("expected number, found {}", type_name(value)),
                ));
            }
        }
        Ok(())
    }

    fn machine(&self, doc: &Value) -> Result<(), CoreError> {
        let map = self.object(doc, "")?;
        self.only_keys(map, &["state"], "")?;
        let states = map
            .get("state")
            .ok_or_else(|| self.fail("", "missing required property \"state\""))?;
        for (s, state) in self.array(states, "/state")?.iter().enumerate() {
            let state_path = format!("/state/{s}");
            let state_map = self.object(state, &state_path)?;
            self.only_keys(state_map, STATE_KEYS, &state_path)?;
            let Some(trans) = state_map.get("trans") else {
                continue;
            };
            let trans_path = format!("{state_path}/trans");
            for (t, tr) in self.array(trans, &trans_path)?.iter().enumerate() {
                self.transition(tr, &format!("{trans_path}/{t}"))?;
            }
        }
        Ok(())
    }

    fn transition(&self, tr: &Value, path: &str) -> Result<(), CoreError> {
        let map = self.object(tr, path)?;
        self.only_keys(map, TRANS_KEYS, path)?;
        for key in ["in", "out"] {
            if let Some(sym) = map.get(key) {
                if !sym.is_string() {
                    return Err(self.fail(
                        &format!("{path}/{key}"),
                        format!("expected string, found {}", type_name(sym)),
                    ));
                }
            }
        }
        match map.get("to") {
            Some(to) if to.is_u64() => {}
            Some(to) => {
                return Err(self.fail(
                    &format!("{path}/to"),
                    format!("expected non-negative integer, found {to}"),
                ));
            }
            None => return Err(self.fail(path, "missing required property \"to\"")),
        }
        match map.get("weight") {
            Some(w) => self.weight(w, &format!("{path}/weight")),
            None => Ok(()),
        }
    }

    fn weight(&self, w: &Value, path: &str) -> Result<(), CoreError> {
        match w {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
            Value::Object(map) => {
                let mut entries = map.iter();
                let (op, arg) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => return Err(self.fail(path, "operator object must have exactly one key")),
                };
                let arg_path = format!("{path}/{}", pointer_segment(op));
                if BINARY_OPS.contains(&op.as_str()) {
                    let args = self.array(arg, &arg_path)?;
                    if args.len() != 2 {
                        return Err(self.fail(&arg_path, format!("expected 2 operands, found {}", args.len())));
                    }
                    for (i, a) in args.iter().enumerate() {
                        self.weight(a, &format!("{arg_path}/{i}"))?;
                    }
                    Ok(())
                } else if UNARY_OPS.contains(&op.as_str()) {
                    self.weight(arg, &arg_path)
                } else {
                    Err(self.fail(path, format!("unknown operator {op:?}")))
                }
            }
            Value::Null | Value::Array(_) => Err(self.fail(
                path,
                format!("expected weight expression, found {}", type_name(w)),
            )),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
