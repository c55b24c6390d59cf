// Machine constructors and operators.
// Origin: machine.h
//
// Every operator is pure: it reads its operands and builds a fresh machine
// whose transition destinations are all in range. Operands with no states
// are treated as the null machine.

use std::borrow::Cow;
use std::collections::VecDeque;

use hashbrown::HashMap;
use serde_json::{Value, json};

use crate::{Machine, MachineState, MachineTransition, StateIndex, TransAccumulator, WeightExpr};

fn or_null(m: &Machine) -> Cow<'_, Machine> {
    if m.state.is_empty() {
        Cow::Owned(Machine::null())
    } else {
        Cow::Borrowed(m)
    }
}

/// Copy of `ms` with every destination moved up by `offset`.
fn shifted(ms: &MachineState, offset: StateIndex) -> MachineState {
    MachineState {
        name: ms.name.clone(),
        trans: shifted_transitions(&ms.trans, offset),
    }
}

fn shifted_transitions(trans: &[MachineTransition], offset: StateIndex) -> Vec<MachineTransition> {
    trans.iter().map(|t| t.redirect(t.dest + offset)).collect()
}

impl Machine {
    /// The single-state machine with no transitions. It accepts only the
    /// empty input and emits the empty output.
    pub fn null() -> Machine {
        Machine {
            state: vec![MachineState::default()],
        }
    }

    /// Chain of states that emits `seq` and consumes nothing.
    pub fn generator<S: AsRef<str>>(name: &str, seq: &[S]) -> Machine {
        Self::chain(name, seq, |sym, dest| {
            MachineTransition::new(String::new(), sym, dest, WeightExpr::one())
        })
    }

    /// Chain of states that consumes `seq` and emits nothing.
    pub fn acceptor<S: AsRef<str>>(name: &str, seq: &[S]) -> Machine {
        Self::chain(name, seq, |sym, dest| {
            MachineTransition::new(sym, String::new(), dest, WeightExpr::one())
        })
    }

    fn chain<S: AsRef<str>>(
        name: &str,
        seq: &[S],
        step: impl Fn(&str, StateIndex) -> MachineTransition,
    ) -> Machine {
        let state = (0..=seq.len())
            .map(|i| MachineState {
                name: json!([name, i]),
                trans: seq
                    .get(i)
                    .map(|sym| vec![step(sym.as_ref(), i + 1)])
                    .unwrap_or_default(),
            })
            .collect();
        Machine { state }
    }

    /// Run `left`, then `right`.
    ///
    /// `right`'s states are renumbered to start at `left`'s end state, which
    /// absorbs `right`'s start state: it keeps `left`'s name and gains the
    /// start state's transitions.
    pub fn concatenate(left: &Machine, right: &Machine) -> Machine {
        let left = or_null(left);
        let right = or_null(right);
        let offset = left.n_states() - 1;

        let mut state = left.state.clone();
        if let Some(junction) = state.last_mut() {
            junction
                .trans
                .extend(shifted_transitions(&right.state[0].trans, offset));
        }
        state.extend(right.state[1..].iter().map(|ms| shifted(ms, offset)));
        Machine { state }
    }

    /// Choice between `first` and `second` with unit weights.
    pub fn union_of(first: &Machine, second: &Machine) -> Machine {
        Self::union_of_weights(first, second, &WeightExpr::one(), &WeightExpr::one())
    }

    /// Choice between `first` (probability `p_first`) and `second`
    /// (probability `1 - p_first`).
    pub fn union_of_weighted(first: &Machine, second: &Machine, p_first: &WeightExpr) -> Machine {
        Self::union_of_weights(first, second, p_first, &WeightExpr::complement(p_first))
    }

    /// Choice between `first` and `second` with explicit weights.
    ///
    /// A new start state branches silently into copies of both machines,
    /// whose end states both lead silently to a shared new end state.
    pub fn union_of_weights(
        first: &Machine,
        second: &Machine,
        p_first: &WeightExpr,
        p_second: &WeightExpr,
    ) -> Machine {
        let first = or_null(first);
        let second = or_null(second);
        let (n1, n2) = (first.n_states(), second.n_states());
        let first_offset = 1;
        let second_offset = 1 + n1;
        let end = 1 + n1 + n2;

        let mut state = Vec::with_capacity(end + 1);
        state.push(MachineState::with_transitions(
            Value::Null,
            vec![
                MachineTransition::silent(first_offset, p_first.clone()),
                MachineTransition::silent(second_offset, p_second.clone()),
            ],
        ));
        state.extend(first.state.iter().map(|ms| shifted(ms, first_offset)));
        state.extend(second.state.iter().map(|ms| shifted(ms, second_offset)));
        state.push(MachineState::default());

        for branch_end in [first_offset + n1 - 1, second_offset + n2 - 1] {
            state[branch_end]
                .trans
                .push(MachineTransition::silent(end, WeightExpr::one()));
        }
        Machine { state }
    }

    /// Zero or more repetitions of `self`, with unit weights.
    pub fn kleene_closure(&self) -> Machine {
        self.kleene_closure_weights(&WeightExpr::one(), &WeightExpr::one())
    }

    /// Zero or more repetitions; each pass is taken with probability
    /// `extend` and the loop is left with probability `1 - extend`.
    pub fn kleene_closure_weighted(&self, extend: &WeightExpr) -> Machine {
        self.kleene_closure_weights(extend, &WeightExpr::complement(extend))
    }

    /// Zero or more repetitions with explicit weights.
    ///
    /// A new start state either enters a copy of `self` (weight `extend`) or
    /// exits to a new end state (weight `end`). The copy's end state returns
    /// silently to the new start.
    pub fn kleene_closure_weights(&self, extend: &WeightExpr, end: &WeightExpr) -> Machine {
        let inner = or_null(self);
        let n = inner.n_states();
        let new_end = n + 1;

        let mut state = Vec::with_capacity(n + 2);
        state.push(MachineState::with_transitions(
            Value::Null,
            vec![
                MachineTransition::silent(1, extend.clone()),
                MachineTransition::silent(new_end, end.clone()),
            ],
        ));
        state.extend(inner.state.iter().map(|ms| shifted(ms, 1)));
        state.push(MachineState::default());
        state[n]
            .trans
            .push(MachineTransition::silent(0, WeightExpr::one()));
        Machine { state }
    }

    /// Transducer composition: `first`'s output feeds `second`'s input.
    ///
    /// Each state of the result is a pair `(s1, s2)` named `[name1, name2]`.
    /// `second` is brought into waiting form first, so that in every pair
    /// either `second` waits for input or `second` moves on its own:
    ///
    /// - if `s2` waits, `first` moves; a transition with empty output leaves
    ///   `s2` where it is, otherwise it pairs with every transition of `s2`
    ///   that consumes the same symbol;
    /// - otherwise `s2` moves alone along its input-free transitions.
    ///
    /// The result reads `first`'s input, writes `second`'s output and
    /// multiplies the weights. Transitions between the same pair of states
    /// with the same labels are summed. Pairs that are unreachable from the
    /// start or cannot reach the end are dropped; the start and end pairs are
    /// always kept.
    pub fn compose(first: &Machine, second: &Machine) -> Machine {
        debug_assert!(first.validate().is_ok(), "compose of an invalid machine");
        debug_assert!(second.validate().is_ok(), "compose of an invalid machine");
        let first = or_null(first);
        let second = or_null(second);
        let second = if second.is_waiting() {
            second
        } else {
            Cow::Owned(second.waiting_machine())
        };
        let n1 = first.n_states();
        let n2 = second.n_states();
        let start = (0, 0);
        let end = (n1 - 1, n2 - 1);

        // Explore pairs reachable from the start.
        let mut pair_trans: HashMap<(StateIndex, StateIndex), Vec<PairTransition>> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        pair_trans.insert(start, Vec::new());
        while let Some(pair) = queue.pop_front() {
            let trans = pair_transitions(&first.state[pair.0], &second.state[pair.1], pair);
            for t in &trans {
                if !pair_trans.contains_key(&t.dest) {
                    pair_trans.insert(t.dest, Vec::new());
                    queue.push_back(t.dest);
                }
            }
            pair_trans.insert(pair, trans);
        }
        pair_trans
            .entry(end)
            .or_insert_with(|| pair_transitions(&first.state[end.0], &second.state[end.1], end));

        // Order pairs as (s1, s2), which puts the start first and the end last.
        let mut pairs: Vec<(StateIndex, StateIndex)> = pair_trans.keys().copied().collect();
        pairs.sort_unstable();
        let index: HashMap<(StateIndex, StateIndex), StateIndex> =
            pairs.iter().enumerate().map(|(i, &p)| (p, i)).collect();

        let state = pairs
            .iter()
            .map(|pair| {
                let mut acc = TransAccumulator::new();
                for t in &pair_trans[pair] {
                    if let Some(&dest) = index.get(&t.dest) {
                        acc.accumulate(t.input, t.output, dest, t.weight.clone());
                    }
                }
                MachineState {
                    name: json!([first.state[pair.0].name, second.state[pair.1].name]),
                    trans: acc.transitions(),
                }
            })
            .collect();
        let product = Machine { state };

        let live = product.coaccessible_states();
        let last = product.n_states() - 1;
        product.retain_states(|s| s == 0 || s == last || live.contains(&s))
    }

    /// Run the machine backwards.
    ///
    /// Every transition `a -> b` becomes `b -> a` and the state order is
    /// reversed, so the old end state is the new start state.
    pub fn reverse(&self) -> Machine {
        debug_assert!(self.validate().is_ok(), "reverse of an invalid machine");
        let n = self.n_states();
        let mut state: Vec<MachineState> = self
            .state
            .iter()
            .rev()
            .map(|ms| MachineState::new(ms.name.clone()))
            .collect();
        for (src, t) in self.transitions() {
            state[n - 1 - t.dest].trans.push(t.redirect(n - 1 - src));
        }
        Machine { state }
    }

    /// Swap the input and output label of every transition.
    pub fn flip_in_out(&self) -> Machine {
        self.map_transitions(|t| MachineTransition {
            input: t.output.clone(),
            output: t.input.clone(),
            dest: t.dest,
            weight: t.weight.clone(),
        })
    }

    /// Copy keeping only the states for which `keep` holds, renumbered in
    /// their original order. Transitions into dropped states are dropped.
    pub(crate) fn retain_states(&self, keep: impl Fn(StateIndex) -> bool) -> Machine {
        let mut new_index = vec![None; self.n_states()];
        let mut next = 0;
        for (s, slot) in new_index.iter_mut().enumerate() {
            if keep(s) {
                *slot = Some(next);
                next += 1;
            }
        }
        let state = self
            .state
            .iter()
            .enumerate()
            .filter(|&(s, _)| new_index[s].is_some())
            .map(|(_, ms)| MachineState {
                name: ms.name.clone(),
                trans: ms
                    .trans
                    .iter()
                    .filter_map(|t| new_index[t.dest].map(|d| t.redirect(d)))
                    .collect(),
            })
            .collect();
        Machine { state }
    }
}

/// A transition of the pair machine, before renumbering.
struct PairTransition<'a> {
    input: &'a str,
    output: &'a str,
    dest: (StateIndex, StateIndex),
    weight: WeightExpr,
}

fn pair_transitions<'a>(
    ms1: &'a MachineState,
    ms2: &'a MachineState,
    (s1, s2): (StateIndex, StateIndex),
) -> Vec<PairTransition<'a>> {
    let mut out = Vec::new();
    if ms2.waits() {
        for t1 in &ms1.trans {
            if t1.output_empty() {
                out.push(PairTransition {
                    input: &t1.input,
                    output: "",
                    dest: (t1.dest, s2),
                    weight: t1.weight.clone(),
                });
            } else {
                for t2 in ms2.trans.iter().filter(|t2| t2.input == t1.output) {
                    out.push(PairTransition {
                        input: &t1.input,
                        output: &t2.output,
                        dest: (t1.dest, t2.dest),
                        weight: WeightExpr::mul(&t1.weight, &t2.weight),
                    });
                }
            }
        }
    } else {
        for t2 in &ms2.trans {
            out.push(PairTransition {
                input: "",
                output: &t2.output,
                dest: (s1, t2.dest),
                weight: t2.weight.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    fn params(defs: &[(&str, f64)]) -> Params {
        defs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn null_machine() {
        let m = Machine::null();
        assert_eq!(m.n_states(), 1);
        assert_eq!(m.n_transitions(), 0);
        assert_eq!(m.start_state().unwrap(), m.end_state().unwrap());
    }

    #[test]
    fn generator_emits_sequence() {
        let m = Machine::generator("gen", &["A", "B"]);
        assert_eq!(m.n_states(), 3);
        assert!(m.input_alphabet().is_empty());
        assert_eq!(m.output_alphabet(), vec!["A", "B"]);
        assert_eq!(m.state[1].name, json!(["gen", 1]));
        assert_eq!(m.state[0].trans[0].output, "A");
        assert!(m.state[0].trans[0].input_empty());
    }

    #[test]
    fn acceptor_consumes_sequence() {
        let m = Machine::acceptor("acc", &["x", "y", "z"]);
        assert_eq!(m.n_states(), 4);
        assert_eq!(m.input_alphabet(), vec!["x", "y", "z"]);
        assert!(m.output_alphabet().is_empty());
        assert!(m.state[3].terminates());
    }

    #[test]
    fn concatenate_merges_junction() {
        let a = Machine::generator("a", &["A"]);
        let b = Machine::generator("b", &["B", "C"]);
        let ab = Machine::concatenate(&a, &b);
        assert_eq!(ab.n_states(), a.n_states() + b.n_states() - 1);
        assert_eq!(ab.n_transitions(), a.n_transitions() + b.n_transitions());
        assert_eq!(ab.state[1].name, json!(["a", 1]));
        assert_eq!(ab.state[1].trans[0].output, "B");
        assert_eq!(ab.state[1].trans[0].dest, 2);
        assert!(ab.validate().is_ok());
    }

    #[test]
    fn concatenate_with_null_is_identity() {
        let a = Machine::acceptor("a", &["x"]);
        assert_eq!(Machine::concatenate(&a, &Machine::null()), a);
        assert_eq!(Machine::concatenate(&Machine::null(), &a).n_transitions(), 1);
    }

    #[test]
    fn union_branches_from_new_start() {
        let u = Machine::union_of_weights(
            &Machine::acceptor("x", &["a"]),
            &Machine::acceptor("y", &["a"]),
            &WeightExpr::constant(0.3),
            &WeightExpr::constant(0.7),
        );
        assert_eq!(u.n_states(), 6);
        let start = &u.state[0];
        assert_eq!(start.trans.len(), 2);
        assert!(start.trans.iter().all(MachineTransition::is_silent));
        let total: f64 = start.trans.iter().map(|t| t.weight.as_const().unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Both branch ends lead to the shared end.
        assert_eq!(u.state[2].trans[0].dest, 5);
        assert_eq!(u.state[4].trans[0].dest, 5);
        assert!(u.validate().is_ok());
    }

    #[test]
    fn union_weighted_uses_complement() {
        let u = Machine::union_of_weighted(
            &Machine::null(),
            &Machine::null(),
            &WeightExpr::param("p"),
        );
        let w = &u.state[0].trans[1].weight;
        assert_eq!(w.eval(&params(&[("p", 0.2)])).unwrap(), 0.8);
    }

    #[test]
    fn kleene_closure_loops_back() {
        let k = Machine::acceptor("a", &["x"]).kleene_closure_weighted(&WeightExpr::param("e"));
        assert_eq!(k.n_states(), 4);
        assert_eq!(k.state[0].trans[0].dest, 1);
        assert_eq!(k.state[0].trans[1].dest, 3);
        // Inner end (state 2) returns to the new start.
        assert!(k.state[2].trans[0].is_silent());
        assert_eq!(k.state[2].trans[0].dest, 0);
        let exit = k.state[0].trans[1].weight.eval(&params(&[("e", 0.9)])).unwrap();
        assert!((exit - 0.1).abs() < 1e-12);
        assert!(!k.is_advancing());
    }

    #[test]
    fn compose_generator_with_transducer() {
        // Emits "A", then maps A -> b.
        let g = Machine::generator("g", &["A"]);
        let t = Machine {
            state: vec![MachineState::with_transitions(
                Value::Null,
                vec![MachineTransition::new("A", "b", 0, WeightExpr::param("p"))],
            )],
        };
        let c = Machine::compose(&g, &t);
        assert_eq!(c.n_states(), 2);
        assert!(c.input_alphabet().is_empty());
        assert_eq!(c.output_alphabet(), vec!["b"]);
        assert_eq!(c.state[0].trans.len(), 1);
        assert_eq!(c.state[0].trans[0].weight, WeightExpr::param("p"));
        assert_eq!(c.state[0].name, json!([["g", 0], null]));
    }

    #[test]
    fn compose_generator_with_mismatched_acceptor() {
        let g = Machine::generator("g", &["A"]);
        let a = Machine::acceptor("a", &["B"]);
        let c = Machine::compose(&g, &a);
        // Only the start and end pairs remain, unconnected.
        assert_eq!(c.n_states(), 2);
        assert_eq!(c.n_transitions(), 0);
    }

    #[test]
    fn compose_sums_alternative_paths() {
        // first: input x, emits either "a" or "b" to the same state.
        let first = Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![
                        MachineTransition::new("x", "a", 1, WeightExpr::constant(0.25)),
                        MachineTransition::new("x", "b", 1, WeightExpr::constant(0.75)),
                    ],
                ),
                MachineState::default(),
            ],
        };
        // second: accepts a or b, emitting y either way.
        let second = Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![
                        MachineTransition::new("a", "y", 1, WeightExpr::constant(0.5)),
                        MachineTransition::new("b", "y", 1, WeightExpr::constant(0.5)),
                    ],
                ),
                MachineState::default(),
            ],
        };
        let c = Machine::compose(&first, &second);
        assert_eq!(c.n_states(), 2);
        assert_eq!(c.state[0].trans.len(), 1);
        let t = &c.state[0].trans[0];
        assert_eq!((t.input.as_str(), t.output.as_str()), ("x", "y"));
        assert_eq!(t.weight.as_const(), Some(0.5));
    }

    #[test]
    fn reverse_swaps_start_and_end() {
        let m = Machine::generator("g", &["A", "B"]);
        let r = m.reverse();
        assert_eq!(r.n_states(), 3);
        assert_eq!(r.state[0].name, json!(["g", 2]));
        assert_eq!(r.state[0].trans[0].output, "B");
        assert_eq!(r.state[0].trans[0].dest, 1);
        assert_eq!(r.state[1].trans[0].output, "A");
        assert_eq!(r.state[1].trans[0].dest, 2);
        assert_eq!(r.reverse(), m);
    }

    #[test]
    #[should_panic(expected = "reverse of an invalid machine")]
    fn reverse_rejects_out_of_range_destination() {
        let m = Machine {
            state: vec![MachineState::with_transitions(
                Value::Null,
                vec![MachineTransition::new("a", "", 5, WeightExpr::one())],
            )],
        };
        m.reverse();
    }

    #[test]
    fn flip_turns_generator_into_acceptor() {
        let g = Machine::generator("s", &["A", "C"]);
        let f = g.flip_in_out();
        assert_eq!(f.input_alphabet(), vec!["A", "C"]);
        assert!(f.output_alphabet().is_empty());
        assert_eq!(f.n_transitions(), g.n_transitions());
        assert_eq!(f.flip_in_out(), g);
    }
}
