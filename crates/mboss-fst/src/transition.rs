// Machine transitions and transition accumulation.
// Origin: machine.h (MachineTransition, TransAccumulator)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{StateIndex, WeightExpr};

/// A weighted, labelled edge to a destination state.
///
/// The empty string is the empty symbol: a transition with an empty input
/// consumes nothing, one with an empty output emits nothing.
///
/// JSON form: `{"in": "a", "out": "b", "to": 3, "weight": ...}`, with `in`
/// and `out` omitted when empty and `weight` omitted when it is 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineTransition {
    #[serde(rename = "in", default, skip_serializing_if = "String::is_empty")]
    pub input: String,
    #[serde(rename = "out", default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(rename = "to")]
    pub dest: StateIndex,
    #[serde(default, skip_serializing_if = "WeightExpr::is_one")]
    pub weight: WeightExpr,
}

impl MachineTransition {
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        dest: StateIndex,
        weight: WeightExpr,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            dest,
            weight,
        }
    }

    /// A transition with empty input and output.
    pub fn silent(dest: StateIndex, weight: WeightExpr) -> Self {
        Self::new(String::new(), String::new(), dest, weight)
    }

    #[inline]
    pub fn input_empty(&self) -> bool {
        self.input.is_empty()
    }

    #[inline]
    pub fn output_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Neither consumes input nor emits output.
    #[inline]
    pub fn is_silent(&self) -> bool {
        self.input_empty() && self.output_empty()
    }

    #[inline]
    pub fn is_loud(&self) -> bool {
        !self.is_silent()
    }

    /// Same labels and weight, different destination.
    pub fn redirect(&self, dest: StateIndex) -> Self {
        Self {
            dest,
            ..self.clone()
        }
    }
}

/// Collects transitions, merging those with equal labels and destination.
///
/// Two transitions with the same `(dest, in, out)` are alternative paths
/// between the same pair of states, so their weights are added.
/// [`transitions`](Self::transitions) yields one transition per key, ordered
/// by destination, then input, then output.
#[derive(Debug, Default)]
pub struct TransAccumulator {
    t: BTreeMap<(StateIndex, String, String), WeightExpr>,
}

impl TransAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(
        &mut self,
        input: impl Into<String>,
        output: impl Into<String>,
        dest: StateIndex,
        weight: WeightExpr,
    ) {
        self.t
            .entry((dest, input.into(), output.into()))
            .and_modify(|w| *w = WeightExpr::add(w, &weight))
            .or_insert(weight);
    }

    pub fn accumulate_transition(&mut self, trans: &MachineTransition) {
        self.accumulate(
            trans.input.as_str(),
            trans.output.as_str(),
            trans.dest,
            trans.weight.clone(),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn transitions(self) -> Vec<MachineTransition> {
        self.t
            .into_iter()
            .map(|((dest, input, output), weight)| MachineTransition {
                input,
                output,
                dest,
                weight,
            })
            .collect()
    }
}
