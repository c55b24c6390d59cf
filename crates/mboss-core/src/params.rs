// Parameter assignments: parameter name to numeric value.
// Origin: params.cpp

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreError;
use crate::jsonio::JsonDocument;
use crate::schema::SchemaKind;

/// A numeric value for each named parameter.
///
/// Stored as an ordered map so that the persisted form is deterministic.
/// The JSON form is a flat object, e.g. `{"p": 0.25, "q": 0.75}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    defs: BTreeMap<String, f64>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.defs.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Define or redefine a parameter, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.defs.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.defs.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Copy every definition of `other` into `self`, overriding clashes.
    pub fn merge(&mut self, other: &Params) {
        for (k, v) in other.iter() {
            self.defs.insert(k.to_string(), v);
        }
    }
}

impl FromIterator<(String, f64)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            defs: iter.into_iter().collect(),
        }
    }
}

impl JsonDocument for Params {
    type Error = CoreError;

    const SCHEMA: SchemaKind = SchemaKind::Params;

    fn from_validated_json(value: &Value) -> Result<Self, CoreError> {
        Ok(Params::deserialize(value)?)
    }

    fn to_json_value(&self) -> Result<Value, CoreError> {
        Ok(serde_json::to_value(self)?)
    }
}
