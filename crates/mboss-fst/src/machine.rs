// States and machines: structure, queries and the persisted JSON form.
// Origin: machine.h (MachineState, Machine)

use std::collections::{BTreeSet, VecDeque};

use mboss_core::jsonio::JsonDocument;
use mboss_core::schema::SchemaKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CoreError, MachineError, MachineTransition, StateIndex, StateName};

/// A machine state: an optional name and its outgoing transitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineState {
    #[serde(rename = "id", default, skip_serializing_if = "Value::is_null")]
    pub name: StateName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trans: Vec<MachineTransition>,
}

impl MachineState {
    pub fn new(name: StateName) -> Self {
        Self {
            name,
            trans: Vec::new(),
        }
    }

    pub fn with_transitions(name: StateName, trans: Vec<MachineTransition>) -> Self {
        Self { name, trans }
    }

    pub fn transition(&self, index: usize) -> Option<&MachineTransition> {
        self.trans.get(index)
    }

    /// Has at least one transition that consumes input.
    pub fn exits_with_input(&self) -> bool {
        self.trans.iter().any(|t| !t.input_empty())
    }

    /// Has at least one transition that consumes no input.
    pub fn exits_without_input(&self) -> bool {
        self.trans.iter().any(|t| t.input_empty())
    }

    /// Has at least one transition with input and/or output.
    pub fn exits_with_io(&self) -> bool {
        self.trans.iter().any(|t| t.is_loud())
    }

    /// Has at least one silent transition.
    pub fn exits_without_io(&self) -> bool {
        self.trans.iter().any(|t| t.is_silent())
    }

    /// No outgoing transitions. The end state need not terminate.
    pub fn terminates(&self) -> bool {
        self.trans.is_empty()
    }

    /// Every exit consumes input (vacuously true for terminal states).
    pub fn waits(&self) -> bool {
        !self.exits_without_input()
    }

    /// Exits only without consuming input, and does exit.
    pub fn continues(&self) -> bool {
        !self.exits_with_input() && !self.terminates()
    }

    pub fn is_silent(&self) -> bool {
        !self.exits_with_io()
    }

    pub fn is_loud(&self) -> bool {
        self.exits_with_io() && !self.exits_without_io()
    }
}

/// A weighted finite-state transducer.
///
/// State 0 is the start state and the last state is the end state. Every
/// transition's destination is a valid state index; [`Machine::validate`]
/// checks this for machines assembled by hand, and every operator in this
/// crate preserves it.
///
/// Machines are values: operators take `&self` and build a new machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Machine {
    pub state: Vec<MachineState>,
}

impl Machine {
    /// Assemble a machine from states, checking transition destinations.
    pub fn from_states(state: Vec<MachineState>) -> Result<Self, MachineError> {
        let machine = Self { state };
        machine.validate()?;
        Ok(machine)
    }

    pub fn n_states(&self) -> usize {
        self.state.len()
    }

    pub fn n_transitions(&self) -> usize {
        self.state.iter().map(|ms| ms.trans.len()).sum()
    }

    pub fn start_state(&self) -> Result<StateIndex, MachineError> {
        if self.state.is_empty() {
            return Err(MachineError::NoStates);
        }
        Ok(0)
    }

    pub fn end_state(&self) -> Result<StateIndex, MachineError> {
        self.state.len().checked_sub(1).ok_or(MachineError::NoStates)
    }

    pub fn state(&self, s: StateIndex) -> Result<&MachineState, MachineError> {
        self.state.get(s).ok_or(MachineError::StateOutOfRange {
            state: s,
            n_states: self.n_states(),
        })
    }

    /// Iterate over `(source, transition)` pairs in state order.
    pub fn transitions(&self) -> impl Iterator<Item = (StateIndex, &MachineTransition)> {
        self.state
            .iter()
            .enumerate()
            .flat_map(|(s, ms)| ms.trans.iter().map(move |t| (s, t)))
    }

    /// Sorted distinct non-empty input symbols.
    pub fn input_alphabet(&self) -> Vec<String> {
        self.alphabet(|t| &t.input)
    }

    /// Sorted distinct non-empty output symbols.
    pub fn output_alphabet(&self) -> Vec<String> {
        self.alphabet(|t| &t.output)
    }

    fn alphabet<'a>(&'a self, label: impl Fn(&'a MachineTransition) -> &'a String) -> Vec<String> {
        let symbols: BTreeSet<&String> = self
            .transitions()
            .map(|(_, t)| label(t))
            .filter(|sym| !sym.is_empty())
            .collect();
        symbols.into_iter().cloned().collect()
    }

    /// States reachable from the start by any sequence of transitions.
    pub fn accessible_states(&self) -> BTreeSet<StateIndex> {
        let mut seen = vec![false; self.n_states()];
        let mut queue = VecDeque::new();
        if !self.state.is_empty() {
            seen[0] = true;
            queue.push_back(0);
        }
        while let Some(s) = queue.pop_front() {
            for t in &self.state[s].trans {
                if t.dest < seen.len() && !seen[t.dest] {
                    seen[t.dest] = true;
                    queue.push_back(t.dest);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(s, &reached)| reached.then_some(s))
            .collect()
    }

    /// States from which the end state can be reached.
    pub fn coaccessible_states(&self) -> BTreeSet<StateIndex> {
        let n = self.n_states();
        let mut incoming: Vec<Vec<StateIndex>> = vec![Vec::new(); n];
        for (src, t) in self.transitions() {
            if t.dest < n {
                incoming[t.dest].push(src);
            }
        }
        let mut seen = vec![false; n];
        let mut queue = VecDeque::new();
        if n > 0 {
            seen[n - 1] = true;
            queue.push_back(n - 1);
        }
        while let Some(d) = queue.pop_front() {
            for &s in &incoming[d] {
                if !seen[s] {
                    seen[s] = true;
                    queue.push_back(s);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(s, &reached)| reached.then_some(s))
            .collect()
    }

    /// Check that every transition destination is a valid state index.
    pub fn validate(&self) -> Result<(), MachineError> {
        let n_states = self.n_states();
        match self.transitions().find(|(_, t)| t.dest >= n_states) {
            Some((state, t)) => Err(MachineError::InvalidDestination {
                state,
                dest: t.dest,
                n_states,
            }),
            None => Ok(()),
        }
    }

    /// Copy of `self` with every state's transitions replaced by `f(state)`.
    pub(crate) fn map_transitions(
        &self,
        mut f: impl FnMut(&MachineTransition) -> MachineTransition,
    ) -> Machine {
        Machine {
            state: self
                .state
                .iter()
                .map(|ms| MachineState {
                    name: ms.name.clone(),
                    trans: ms.trans.iter().map(&mut f).collect(),
                })
                .collect(),
        }
    }
}

impl JsonDocument for Machine {
    type Error = MachineError;

    const SCHEMA: SchemaKind = SchemaKind::Machine;

    fn from_validated_json(value: &Value) -> Result<Self, MachineError> {
        let machine = Machine::deserialize(value).map_err(CoreError::from)?;
        machine.validate()?;
        Ok(machine)
    }

    fn to_json_value(&self) -> Result<Value, MachineError> {
        Ok(serde_json::to_value(self).map_err(CoreError::from)?)
    }
}
