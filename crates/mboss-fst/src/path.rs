// Explicit paths through a machine.
// Origin: machine.h (MachinePath)

use serde::{Deserialize, Serialize};

use crate::{Machine, MachineTransition, StateIndex, WeightExpr};

/// A sequence of transitions, each leaving the state the previous one
/// entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachinePath {
    pub trans: Vec<MachineTransition>,
}

impl MachinePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trans: MachineTransition) {
        self.trans.push(trans);
    }

    pub fn len(&self) -> usize {
        self.trans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trans.is_empty()
    }

    /// Non-empty input symbols consumed along the path.
    pub fn input_sequence(&self) -> Vec<&str> {
        self.trans
            .iter()
            .filter(|t| !t.input_empty())
            .map(|t| t.input.as_str())
            .collect()
    }

    /// Non-empty output symbols emitted along the path.
    pub fn output_sequence(&self) -> Vec<&str> {
        self.trans
            .iter()
            .filter(|t| !t.output_empty())
            .map(|t| t.output.as_str())
            .collect()
    }

    /// Product of the transition weights.
    pub fn weight(&self) -> WeightExpr {
        self.trans
            .iter()
            .fold(WeightExpr::one(), |w, t| WeightExpr::mul(&w, &t.weight))
    }

    /// State the path ends in when started from `start`.
    pub fn final_state(&self, start: StateIndex) -> StateIndex {
        self.trans.last().map_or(start, |t| t.dest)
    }
}

impl Machine {
    /// Whether every step of `path`, starting at `start`, is a transition of
    /// this machine.
    pub fn path_is_valid(&self, start: StateIndex, path: &MachinePath) -> bool {
        let mut s = start;
        for t in &path.trans {
            match self.state.get(s) {
                Some(ms) if ms.trans.contains(t) => s = t.dest,
                _ => return false,
            }
        }
        s < self.n_states()
    }
}
