// Normal forms: ergodic, waiting, advancing and aligning machines.
// Origin: machine.h

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use serde_json::json;

use crate::{
    Machine, MachineError, MachineState, MachineTransition, StateIndex, TransAccumulator,
    WeightExpr,
};

/// Tag used in the name of the input-consuming half of a split state.
pub const WAIT_TAG: &str = "wait";

impl Machine {
    /// Every state is reachable from the start.
    pub fn is_ergodic(&self) -> bool {
        self.accessible_states().len() == self.n_states()
    }

    /// Every state either waits for input or continues without it.
    pub fn is_waiting(&self) -> bool {
        self.state.iter().all(|ms| ms.waits() || ms.continues())
    }

    /// No silent transition goes from state `i` to a state `j <= i`.
    pub fn is_advancing(&self) -> bool {
        self.first_non_advancing().is_none()
    }

    pub(crate) fn first_non_advancing(&self) -> Option<(StateIndex, StateIndex)> {
        self.transitions()
            .find(|(src, t)| t.is_silent() && t.dest <= *src)
            .map(|(src, t)| (src, t.dest))
    }

    /// No state has two transitions with the same labels and destination.
    pub fn is_aligning(&self) -> bool {
        self.state.iter().all(|ms| {
            let mut seen = BTreeSet::new();
            ms.trans
                .iter()
                .all(|t| seen.insert((t.dest, t.input.as_str(), t.output.as_str())))
        })
    }

    /// Copy restricted to the states reachable from the start.
    ///
    /// The end state is kept even when unreachable, so that the copy still
    /// accepts exactly what the original accepts.
    pub fn ergodic_machine(&self) -> Machine {
        let accessible = self.accessible_states();
        let last = self.n_states().saturating_sub(1);
        self.retain_states(|s| s == last || accessible.contains(&s))
    }

    /// Split every state that exits both with and without input.
    ///
    /// The first half keeps the state's name and its input-free transitions,
    /// plus a silent transition into the second half, named
    /// `["wait", name]`, which holds the input-consuming transitions. The
    /// second half immediately follows the first, so silent transitions
    /// never go backwards because of the split.
    pub fn waiting_machine(&self) -> Machine {
        let mut old_to_new = Vec::with_capacity(self.n_states());
        let mut next = 0;
        for ms in &self.state {
            old_to_new.push(next);
            next += if ms.waits() || ms.continues() { 1 } else { 2 };
        }

        let mut state = Vec::with_capacity(next);
        for (s, ms) in self.state.iter().enumerate() {
            let remap = |t: &MachineTransition| t.redirect(old_to_new[t.dest]);
            if ms.waits() || ms.continues() {
                state.push(MachineState::with_transitions(
                    ms.name.clone(),
                    ms.trans.iter().map(remap).collect(),
                ));
            } else {
                let (no_input, input): (Vec<_>, Vec<_>) =
                    ms.trans.iter().partition(|t| t.input_empty());
                let mut continue_trans: Vec<MachineTransition> =
                    no_input.into_iter().map(remap).collect();
                continue_trans.push(MachineTransition::silent(old_to_new[s] + 1, WeightExpr::one()));
                state.push(MachineState::with_transitions(ms.name.clone(), continue_trans));
                state.push(MachineState::with_transitions(
                    json!([WAIT_TAG, ms.name]),
                    input.into_iter().map(remap).collect(),
                ));
            }
        }
        Machine { state }
    }

    /// Reorder states so that every silent transition goes forward.
    ///
    /// If a silent transition enters the start state, a fresh start state is
    /// prepended; if the end state has silent exits, a fresh end state is
    /// appended. The remaining states are sorted topologically along silent
    /// transitions, preferring lower original indices, with the start first
    /// and the end last. A machine that is already advancing is returned
    /// unchanged.
    ///
    /// Fails with [`MachineError::SilentCycle`] if silent transitions form a
    /// cycle (a silent self-loop counts as one).
    pub fn advancing_machine(&self) -> Result<Machine, MachineError> {
        if self.is_advancing() {
            return Ok(self.clone());
        }

        let mut m = self.clone();
        if m.transitions().any(|(_, t)| t.is_silent() && t.dest == 0) {
            m = m.with_fresh_start();
        }
        let end = m.n_states() - 1;
        if m.state[end].exits_without_io() {
            m.state[end]
                .trans
                .push(MachineTransition::silent(end + 1, WeightExpr::one()));
            m.state.push(MachineState::default());
        }

        let n = m.n_states();
        let end = n - 1;
        let mut in_degree = vec![0usize; n];
        for (_, t) in m.transitions().filter(|(_, t)| t.is_silent()) {
            in_degree[t.dest] += 1;
        }

        let mut ready: BinaryHeap<Reverse<StateIndex>> = (0..end)
            .filter(|&s| in_degree[s] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        while let Some(Reverse(s)) = ready.pop() {
            order.push(s);
            placed[s] = true;
            for t in m.state[s].trans.iter().filter(|t| t.is_silent()) {
                in_degree[t.dest] -= 1;
                if in_degree[t.dest] == 0 && t.dest != end {
                    ready.push(Reverse(t.dest));
                }
            }
        }
        if order.len() < end {
            let blocked: Vec<bool> = (0..n).map(|s| s != end && !placed[s]).collect();
            let state = m.state_on_silent_cycle(&blocked);
            return Err(MachineError::SilentCycle { state });
        }
        order.push(end);

        let mut new_index = vec![0; n];
        for (i, &s) in order.iter().enumerate() {
            new_index[s] = i;
        }
        let state = order
            .iter()
            .map(|&s| MachineState {
                name: m.state[s].name.clone(),
                trans: m.state[s]
                    .trans
                    .iter()
                    .map(|t| t.redirect(new_index[t.dest]))
                    .collect(),
            })
            .collect();
        let advancing = Machine { state };
        tracing::debug!(
            states = advancing.n_states(),
            added = advancing.n_states() - self.n_states(),
            "reordered machine into advancing form"
        );
        Ok(advancing)
    }

    /// Merge transitions that share labels and destination, summing their
    /// weights.
    pub fn aligning_machine(&self) -> Machine {
        let state = self
            .state
            .iter()
            .map(|ms| {
                let mut acc = TransAccumulator::new();
                for t in &ms.trans {
                    acc.accumulate_transition(t);
                }
                MachineState::with_transitions(ms.name.clone(), acc.transitions())
            })
            .collect();
        Machine { state }
    }

    /// A state lying on a silent cycle among the `blocked` states.
    ///
    /// Every blocked state has a blocked silent predecessor, so walking
    /// predecessors from any of them must revisit a state, and the first
    /// revisited state is on a cycle.
    fn state_on_silent_cycle(&self, blocked: &[bool]) -> StateIndex {
        let mut pred = vec![None; self.n_states()];
        for (src, t) in self.transitions() {
            if t.is_silent() && blocked[src] && blocked[t.dest] {
                pred[t.dest].get_or_insert(src);
            }
        }
        let mut seen = vec![false; self.n_states()];
        let mut s = blocked.iter().position(|&b| b).unwrap_or(0);
        while !seen[s] {
            seen[s] = true;
            match pred[s] {
                Some(p) => s = p,
                None => break,
            }
        }
        s
    }

    /// New unnamed start state with a silent unit transition to the old one.
    fn with_fresh_start(&self) -> Machine {
        let mut state = Vec::with_capacity(self.n_states() + 1);
        state.push(MachineState::with_transitions(
            serde_json::Value::Null,
            vec![MachineTransition::silent(1, WeightExpr::one())],
        ));
        state.extend(self.state.iter().map(|ms| MachineState {
            name: ms.name.clone(),
            trans: ms.trans.iter().map(|t| t.redirect(t.dest + 1)).collect(),
        }));
        Machine { state }
    }
}
