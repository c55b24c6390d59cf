//! Weighted finite-state transducer engine.
//!
//! Machines map input symbol sequences to output symbol sequences along
//! transitions whose weights are symbolic [`WeightExpr`]s. This crate builds
//! machines from primitives, combines them algebraically, brings them into
//! the normal forms required for evaluation, and resolves the weights under a
//! parameter assignment into a numeric [`EvaluatedMachine`].
//!
//! # Architecture
//!
//! - [`transition`] -- Transitions and transition accumulation
//! - [`machine`] -- States, machines, queries and the persisted JSON form
//! - [`path`] -- Explicit paths through a machine
//! - [`algebra`] -- Constructors and operators (compose, concatenate, union, closure, ...)
//! - [`normalize`] -- Normal forms (ergodic, waiting, advancing, aligning)
//! - [`tokenizer`] -- Symbol to dense token mapping
//! - [`linalg`] -- Dense matrix inversion
//! - [`config`] -- Evaluation settings
//! - [`evaluated`] -- Numerically evaluated machines

pub mod algebra;
pub mod config;
pub mod evaluated;
pub mod linalg;
pub mod machine;
pub mod normalize;
pub mod path;
pub mod tokenizer;
pub mod transition;

pub use config::{EvalConfig, SolverKind};
pub use evaluated::EvaluatedMachine;
pub use machine::{Machine, MachineState};
pub use mboss_core::{CoreError, Params, WeightExpr};
pub use path::MachinePath;
pub use transition::{MachineTransition, TransAccumulator};

/// Index of a state within a machine. State 0 is the start state.
pub type StateIndex = usize;

/// Arbitrary structured state name; `Null` means the state is unnamed.
pub type StateName = serde_json::Value;

/// Error type for machine construction and evaluation.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("machine is not advancing: silent transition from state {src} to state {dest}")]
    NotAdvancing { src: StateIndex, dest: StateIndex },
    #[error("silent cycle through state {state}")]
    SilentCycle { state: StateIndex },
    #[error("state {state} has a transition to {dest}, but the machine has {n_states} states")]
    InvalidDestination {
        state: StateIndex,
        dest: StateIndex,
        n_states: usize,
    },
    #[error("state {state} transition {trans} evaluates to weight {weight}, which is not a probability")]
    InvalidWeight {
        state: StateIndex,
        trans: usize,
        weight: f64,
    },
    #[error("state index {state} out of range ({n_states} states)")]
    StateOutOfRange { state: StateIndex, n_states: usize },
    #[error("unknown symbol: {0:?}")]
    UnknownSymbol(String),
    #[error("matrix is singular")]
    SingularMatrix,
    #[error("machine has no states")]
    NoStates,
}
