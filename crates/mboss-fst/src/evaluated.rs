// Numerically evaluated machines.
// Origin: eval.cpp

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::config::EvalConfig;
use crate::linalg::{self, DenseMatrix, Inverter};
use crate::tokenizer::{EMPTY_TOKEN, Token, Tokenizer};
use crate::{
    Machine, MachineError, MachineState, MachineTransition, Params, StateIndex, StateName,
    WeightExpr,
};

pub type InputToken = Token;
pub type OutputToken = Token;
pub type LogWeight = f64;
/// Ordinal of a transition among its source state's transitions.
pub type TransIndex = usize;

/// A transition with its weight resolved to a log-probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatedTrans {
    pub log_weight: LogWeight,
    pub trans_index: TransIndex,
}

/// Neighbor state to transition.
pub type StateTransMap = BTreeMap<StateIndex, EvaluatedTrans>;

/// Transitions of one state keyed by `(input token, output token)`, then by
/// neighbor.
pub type TransTable = BTreeMap<(InputToken, OutputToken), StateTransMap>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluatedState {
    pub name: StateName,
    /// Keyed by source state.
    pub incoming: TransTable,
    /// Keyed by destination state.
    pub outgoing: TransTable,
    pub n_transitions: usize,
    /// Number of transitions in all preceding states.
    pub trans_offset: usize,
}

/// A machine whose weights have been resolved against a parameter
/// assignment and whose symbols have been tokenized.
///
/// Built from an advancing machine only: every silent transition goes from a
/// lower to a strictly higher state index, which makes the silent transition
/// matrix strictly upper triangular (see [`EvaluatedMachine::sum_in_trans`]).
///
/// Two transitions of a state with the same labels and destination are merged
/// into one whose probability is the sum of theirs, keeping the lower
/// [`TransIndex`].
#[derive(Debug, Clone)]
pub struct EvaluatedMachine {
    input_tokenizer: Tokenizer,
    output_tokenizer: Tokenizer,
    state: Vec<EvaluatedState>,
    n_transitions: usize,
    config: EvalConfig,
}

fn log_sum_exp(a: LogWeight, b: LogWeight) -> LogWeight {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}

fn insert_merged(
    table: &mut TransTable,
    key: (InputToken, OutputToken),
    neighbor: StateIndex,
    trans: EvaluatedTrans,
) {
    table
        .entry(key)
        .or_default()
        .entry(neighbor)
        .and_modify(|t| {
            t.log_weight = log_sum_exp(t.log_weight, trans.log_weight);
            t.trans_index = t.trans_index.min(trans.trans_index);
        })
        .or_insert(trans);
}

impl EvaluatedMachine {
    /// Evaluate `machine` with default settings.
    ///
    /// Without `params`, every transition gets log-weight 0.
    pub fn new(machine: &Machine, params: Option<&Params>) -> Result<Self, MachineError> {
        Self::with_config(machine, params, &EvalConfig::default(), |_, _| {})
    }

    /// Evaluate `machine`, reporting `(states done, total states)` to
    /// `progress` after each state.
    pub fn with_config(
        machine: &Machine,
        params: Option<&Params>,
        config: &EvalConfig,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Self, MachineError> {
        machine.validate()?;
        if let Some((src, dest)) = machine.first_non_advancing() {
            return Err(MachineError::NotAdvancing { src, dest });
        }

        let input_tokenizer = Tokenizer::new(&machine.input_alphabet());
        let output_tokenizer = Tokenizer::new(&machine.output_alphabet());
        let n_states = machine.n_states();
        let mut state: Vec<EvaluatedState> = machine
            .state
            .iter()
            .map(|ms| EvaluatedState {
                name: ms.name.clone(),
                ..EvaluatedState::default()
            })
            .collect();

        let mut offset = 0;
        for (s, ms) in machine.state.iter().enumerate() {
            for (ti, t) in ms.trans.iter().enumerate() {
                let key = (
                    input_tokenizer.sym2tok(&t.input)?,
                    output_tokenizer.sym2tok(&t.output)?,
                );
                let log_weight = match params {
                    Some(p) => {
                        let weight = t.weight.eval(p)?;
                        if !(weight >= 0.0) {
                            return Err(MachineError::InvalidWeight {
                                state: s,
                                trans: ti,
                                weight,
                            });
                        }
                        weight.ln()
                    }
                    None => 0.0,
                };
                let trans = EvaluatedTrans {
                    log_weight,
                    trans_index: ti,
                };
                insert_merged(&mut state[s].outgoing, key, t.dest, trans);
                insert_merged(&mut state[t.dest].incoming, key, s, trans);
            }
            state[s].n_transitions = ms.trans.len();
            state[s].trans_offset = offset;
            offset += ms.trans.len();
            progress(s + 1, n_states);
        }

        tracing::debug!(n_states, n_transitions = offset, "evaluated machine");
        Ok(Self {
            input_tokenizer,
            output_tokenizer,
            state,
            n_transitions: offset,
            config: config.clone(),
        })
    }

    pub fn n_states(&self) -> usize {
        self.state.len()
    }

    /// Total number of transitions in the source machine.
    pub fn n_transitions(&self) -> usize {
        self.n_transitions
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

    pub fn input_tokenizer(&self) -> &Tokenizer {
        &self.input_tokenizer
    }

    pub fn output_tokenizer(&self) -> &Tokenizer {
        &self.output_tokenizer
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn state(&self, s: StateIndex) -> Result<&EvaluatedState, MachineError> {
        self.state.get(s).ok_or(MachineError::StateOutOfRange {
            state: s,
            n_states: self.n_states(),
        })
    }

    pub fn states(&self) -> &[EvaluatedState] {
        &self.state
    }

    /// Log of the summed probability of all silent paths between each pair
    /// of states, using the configured solver.
    pub fn sum_in_trans(&self) -> Result<DenseMatrix, MachineError> {
        self.sum_in_trans_with(self.config.solver.inverter())
    }

    /// Log of `(I - P)^-1`, where `P[src][dest]` is the probability of the
    /// silent transition from `src` to `dest`.
    ///
    /// Entry `(i, j)` is the total probability of going from `i` to `j`
    /// through zero or more silent transitions. A state whose silent exits
    /// sum above the configured threshold is logged as a warning.
    pub fn sum_in_trans_with(&self, inverter: &dyn Inverter) -> Result<DenseMatrix, MachineError> {
        let n = self.n_states();
        let mut m = linalg::identity(n);
        for (src, es) in self.state.iter().enumerate() {
            let Some(silent) = es.outgoing.get(&(EMPTY_TOKEN, EMPTY_TOKEN)) else {
                continue;
            };
            let mut p_exit = 0.0;
            for (&dest, t) in silent {
                let p = t.log_weight.exp();
                m[src][dest] -= p;
                p_exit += p;
            }
            if p_exit > self.config.exit_warning_threshold {
                tracing::warn!(
                    state = src,
                    p_exit,
                    "silent exit probabilities sum above threshold"
                );
            }
        }
        let inv = inverter.invert(&m)?;
        Ok(linalg::log_matrix(&inv))
    }

    /// Rebuild a plain machine with constant weights `exp(log_weight)`.
    ///
    /// Each state's transitions come out ordered by input symbol token,
    /// output symbol token, then destination.
    pub fn explicit_machine(&self) -> Machine {
        let state = self
            .state
            .iter()
            .map(|es| {
                let trans = es
                    .outgoing
                    .iter()
                    .flat_map(|(&(i, o), by_dest)| {
                        by_dest.iter().map(move |(&dest, t)| {
                            MachineTransition::new(
                                self.input_tokenizer.tok2sym(i).unwrap_or_default(),
                                self.output_tokenizer.tok2sym(o).unwrap_or_default(),
                                dest,
                                WeightExpr::constant(t.log_weight.exp()),
                            )
                        })
                    })
                    .collect();
                MachineState::with_transitions(es.name.clone(), trans)
            })
            .collect();
        Machine { state }
    }

    /// Display label for a state: its name as compact JSON, or its index if
    /// the state is unnamed.
    pub fn state_name_json(&self, s: StateIndex) -> Result<String, MachineError> {
        let es = self.state(s)?;
        Ok(if es.name.is_null() {
            s.to_string()
        } else {
            es.name.to_string()
        })
    }

    fn trans_json(&self, table: &TransTable, neighbor_key: &str) -> Vec<Value> {
        table
            .iter()
            .flat_map(|(&(i, o), by_state)| {
                by_state.iter().map(move |(&neighbor, t)| {
                    let mut obj = Map::new();
                    obj.insert(neighbor_key.to_string(), json!(neighbor));
                    if i != EMPTY_TOKEN {
                        obj.insert("in".into(), json!(self.input_tokenizer.tok2sym(i)));
                    }
                    if o != EMPTY_TOKEN {
                        obj.insert("out".into(), json!(self.output_tokenizer.tok2sym(o)));
                    }
                    // Non-finite log-weights have no JSON number form and export as null.
                    obj.insert("logWeight".into(), json!(t.log_weight));
                    Value::Object(obj)
                })
            })
            .collect()
    }

    /// Debug export of states with their incoming and outgoing transitions.
    pub fn to_json_value(&self) -> Value {
        let states: Vec<Value> = self
            .state
            .iter()
            .enumerate()
            .map(|(s, es)| {
                let mut obj = Map::new();
                obj.insert("n".into(), json!(s));
                if !es.name.is_null() {
                    obj.insert("id".into(), es.name.clone());
                }
                let incoming = self.trans_json(&es.incoming, "from");
                if !incoming.is_empty() {
                    obj.insert("incoming".into(), Value::Array(incoming));
                }
                let outgoing = self.trans_json(&es.outgoing, "to");
                if !outgoing.is_empty() {
                    obj.insert("outgoing".into(), Value::Array(outgoing));
                }
                Value::Object(obj)
            })
            .collect();
        json!({ "state": states })
    }

    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SolverKind;
    use crate::CoreError;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn params(defs: &[(&str, f64)]) -> Params {
        defs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn silent_chain() -> Machine {
        Machine {
            state: vec![
                MachineState::with_transitions(
                    json!("s0"),
                    vec![MachineTransition::silent(1, WeightExpr::param("p1"))],
                ),
                MachineState::with_transitions(
                    json!("s1"),
                    vec![MachineTransition::silent(2, WeightExpr::param("p2"))],
                ),
                MachineState::new(json!("s2")),
            ],
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Two states joined by one silent transition of probability `p`.
    fn overfull_machine(p: f64) -> Machine {
        Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![MachineTransition::silent(1, WeightExpr::constant(p))],
                ),
                MachineState::new(Value::Null),
            ],
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` under a thread-local subscriber and return what it logged at
    /// warn level or above.
    fn captured_warnings(f: impl FnOnce()) -> String {
        let buf = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn silent_chain_sums_to_product() {
        let p = params(&[("p1", 0.5), ("p2", 0.4)]);
        let em = EvaluatedMachine::new(&silent_chain(), Some(&p)).unwrap();
        let sum = em.sum_in_trans().unwrap();
        assert!(close(sum[0][2], (0.5f64 * 0.4).ln()));
        assert!(close(sum[0][1], 0.5f64.ln()));
        assert!(close(sum[1][2], 0.4f64.ln()));
        for (s, row) in sum.iter().enumerate() {
            assert!(close(row[s], 0.0));
        }
    }

    #[test]
    fn triangular_solver_matches() {
        let p = params(&[("p1", 0.5), ("p2", 0.4)]);
        let config = EvalConfig::default().with_solver(SolverKind::UnitTriangular);
        let em =
            EvaluatedMachine::with_config(&silent_chain(), Some(&p), &config, |_, _| {}).unwrap();
        let sum = em.sum_in_trans().unwrap();
        assert!(close(sum[0][2], 0.2f64.ln()));
        assert_eq!(sum[2][0], f64::NEG_INFINITY);
        assert_eq!(sum[1][0], f64::NEG_INFINITY);
    }

    #[test]
    fn loud_transitions_are_not_summed() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![MachineTransition::new("a", "", 1, WeightExpr::constant(0.5))],
                ),
                MachineState::new(Value::Null),
            ],
        };
        let em = EvaluatedMachine::new(&m, Some(&Params::new())).unwrap();
        let sum = em.sum_in_trans_with(&linalg::LuInverter).unwrap();
        assert_eq!(sum[0][1], f64::NEG_INFINITY);
    }

    #[test]
    fn overfull_exit_still_inverts() {
        let em = EvaluatedMachine::new(&overfull_machine(1.5), Some(&Params::new())).unwrap();
        let sum = em.sum_in_trans().unwrap();
        assert!(close(sum[0][1], 1.5f64.ln()));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![
                        MachineTransition::new("a", "", 1, WeightExpr::param("p")),
                        MachineTransition::new("b", "", 1, WeightExpr::complement(&WeightExpr::param("p"))),
                    ],
                ),
                MachineState::new(Value::Null),
            ],
        };
        let err = EvaluatedMachine::new(&m, Some(&params(&[("p", 1.25)]))).unwrap_err();
        assert!(matches!(
            err,
            MachineError::InvalidWeight { state: 0, trans: 1, weight } if close(weight, -0.25)
        ));
        // Zero is a valid probability and evaluates to log-weight -inf.
        let em = EvaluatedMachine::new(&m, Some(&params(&[("p", 1.0)]))).unwrap();
        let b = em.input_tokenizer().sym2tok("b").unwrap();
        assert_eq!(
            em.state(0).unwrap().outgoing[&(b, EMPTY_TOKEN)][&1].log_weight,
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn overfull_exit_warns_once() {
        let logs = captured_warnings(|| {
            let em = EvaluatedMachine::new(&overfull_machine(1.5), Some(&Params::new())).unwrap();
            em.sum_in_trans().unwrap();
        });
        let warnings: Vec<&str> = logs
            .lines()
            .filter(|l| l.contains("silent exit probabilities sum above threshold"))
            .collect();
        assert_eq!(warnings.len(), 1, "{logs}");
        assert!(warnings[0].contains("WARN"));
        assert!(warnings[0].contains("state=0"));
        assert!(warnings[0].contains("p_exit=1.5"));
    }

    #[test]
    fn full_exit_does_not_warn() {
        let logs = captured_warnings(|| {
            let em = EvaluatedMachine::new(&overfull_machine(1.0), Some(&Params::new())).unwrap();
            em.sum_in_trans().unwrap();
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn raised_threshold_silences_warning() {
        let config = EvalConfig::default().with_exit_warning_threshold(2.0);
        let logs = captured_warnings(|| {
            let em = EvaluatedMachine::with_config(
                &overfull_machine(1.5),
                Some(&Params::new()),
                &config,
                |_, _| {},
            )
            .unwrap();
            em.sum_in_trans().unwrap();
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn tables_and_offsets() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    json!(["g", 0]),
                    vec![
                        MachineTransition::new("a", "x", 1, WeightExpr::param("p")),
                        MachineTransition::new("b", "", 2, WeightExpr::complement(&WeightExpr::param("p"))),
                    ],
                ),
                MachineState::with_transitions(
                    Value::Null,
                    vec![MachineTransition::silent(2, WeightExpr::one())],
                ),
                MachineState::new(Value::Null),
            ],
        };
        let em = EvaluatedMachine::new(&m, Some(&params(&[("p", 0.25)]))).unwrap();
        assert_eq!(em.n_states(), 3);
        assert_eq!(em.n_transitions(), 3);
        assert_eq!(em.start_state().unwrap(), 0);
        assert_eq!(em.end_state().unwrap(), 2);

        let a = em.input_tokenizer().sym2tok("a").unwrap();
        let b = em.input_tokenizer().sym2tok("b").unwrap();
        let x = em.output_tokenizer().sym2tok("x").unwrap();
        assert_eq!((a, b, x), (1, 2, 1));

        let s0 = em.state(0).unwrap();
        assert_eq!(s0.n_transitions, 2);
        assert_eq!(s0.trans_offset, 0);
        let t = s0.outgoing[&(a, x)][&1];
        assert!(close(t.log_weight, 0.25f64.ln()));
        assert_eq!(t.trans_index, 0);
        assert_eq!(s0.outgoing[&(b, EMPTY_TOKEN)][&2].trans_index, 1);

        let s1 = em.state(1).unwrap();
        assert_eq!(s1.trans_offset, 2);
        assert_eq!(s1.incoming[&(a, x)][&0], t);

        let s2 = em.state(2).unwrap();
        assert_eq!(s2.trans_offset, 3);
        assert_eq!(s2.incoming.len(), 2);
        assert!(close(s2.incoming[&(EMPTY_TOKEN, EMPTY_TOKEN)][&1].log_weight, 0.0));
    }

    #[test]
    fn duplicate_transitions_are_merged() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![
                        MachineTransition::silent(1, WeightExpr::constant(0.25)),
                        MachineTransition::new("a", "", 1, WeightExpr::one()),
                        MachineTransition::silent(1, WeightExpr::constant(0.5)),
                    ],
                ),
                MachineState::new(Value::Null),
            ],
        };
        let em = EvaluatedMachine::new(&m, Some(&Params::new())).unwrap();
        let merged = em.state(0).unwrap().outgoing[&(EMPTY_TOKEN, EMPTY_TOKEN)][&1];
        assert!(close(merged.log_weight, 0.75f64.ln()));
        assert_eq!(merged.trans_index, 0);
        let incoming = em.state(1).unwrap().incoming[&(EMPTY_TOKEN, EMPTY_TOKEN)][&0];
        assert_eq!(incoming, merged);
        assert_eq!(em.state(0).unwrap().n_transitions, 3);
    }

    #[test]
    fn without_params_weights_are_log_one() {
        let em = EvaluatedMachine::new(&silent_chain(), None).unwrap();
        assert_eq!(em.state(0).unwrap().outgoing[&(0, 0)][&1].log_weight, 0.0);
    }

    #[test]
    fn missing_param_fails() {
        let err = EvaluatedMachine::new(&silent_chain(), Some(&params(&[("p1", 0.5)]))).unwrap_err();
        assert!(matches!(err, MachineError::Core(CoreError::MissingParam(ref n)) if n == "p2"));
    }

    #[test]
    fn rejects_non_advancing() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    Value::Null,
                    vec![MachineTransition::new("a", "", 1, WeightExpr::one())],
                ),
                MachineState::with_transitions(
                    Value::Null,
                    vec![MachineTransition::silent(0, WeightExpr::one())],
                ),
            ],
        };
        let err = EvaluatedMachine::new(&m, None).unwrap_err();
        assert!(matches!(err, MachineError::NotAdvancing { src: 1, dest: 0 }));
    }

    #[test]
    fn state_out_of_range() {
        let em = EvaluatedMachine::new(&silent_chain(), None).unwrap();
        assert!(matches!(
            em.state(3),
            Err(MachineError::StateOutOfRange {
                state: 3,
                n_states: 3
            })
        ));
        assert!(em.state_name_json(7).is_err());
    }

    #[test]
    fn state_names() {
        let mut m = Machine::generator("g", &["A"]);
        m.state[1].name = Value::Null;
        let em = EvaluatedMachine::new(&m, None).unwrap();
        assert_eq!(em.state_name_json(0).unwrap(), r#"["g",0]"#);
        assert_eq!(em.state_name_json(1).unwrap(), "1");
    }

    #[test]
    fn explicit_machine_round_trip() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    json!("start"),
                    vec![
                        MachineTransition::new("", "x", 1, WeightExpr::param("p")),
                        MachineTransition::new("a", "", 1, WeightExpr::param("q")),
                        MachineTransition::new("a", "x", 2, WeightExpr::one()),
                    ],
                ),
                MachineState::with_transitions(
                    Value::Null,
                    vec![MachineTransition::silent(2, WeightExpr::param("q"))],
                ),
                MachineState::new(json!("end")),
            ],
        };
        let p = params(&[("p", 0.3), ("q", 0.6)]);
        let em = EvaluatedMachine::new(&m, Some(&p)).unwrap();
        let explicit = em.explicit_machine();
        assert_eq!(explicit.n_states(), m.n_states());
        for (orig, back) in m.state.iter().zip(&explicit.state) {
            assert_eq!(orig.name, back.name);
            assert_eq!(orig.trans.len(), back.trans.len());
            for (t, u) in orig.trans.iter().zip(&back.trans) {
                assert_eq!((&t.input, &t.output, t.dest), (&u.input, &u.output, u.dest));
                let w = u.weight.as_const().unwrap();
                assert!(close(w, t.weight.eval(&p).unwrap()));
            }
        }
    }

    #[test]
    fn json_export() {
        let m = Machine {
            state: vec![
                MachineState::with_transitions(
                    json!("s"),
                    vec![MachineTransition::new("a", "b", 1, WeightExpr::one())],
                ),
                MachineState::new(Value::Null),
            ],
        };
        let em = EvaluatedMachine::new(&m, None).unwrap();
        assert_eq!(
            em.to_json_value(),
            json!({"state": [
                {"n": 0, "id": "s", "outgoing": [{"to": 1, "in": "a", "out": "b", "logWeight": 0.0}]},
                {"n": 1, "incoming": [{"from": 0, "in": "a", "out": "b", "logWeight": 0.0}]}
            ]})
        );
        let reparsed: Value = serde_json::from_str(&em.to_json_string()).unwrap();
        assert_eq!(reparsed, em.to_json_value());
    }

    #[test]
    fn progress_is_reported_per_state() {
        let mut calls = Vec::new();
        EvaluatedMachine::with_config(&silent_chain(), None, &EvalConfig::default(), |done, total| {
            calls.push((done, total))
        })
        .unwrap();
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn empty_machine() {
        let em = EvaluatedMachine::new(&Machine::default(), None).unwrap();
        assert!(matches!(em.start_state(), Err(MachineError::NoStates)));
        assert!(em.sum_in_trans().unwrap().is_empty());
    }
}
