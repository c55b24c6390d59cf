// Evaluation settings

use crate::linalg::{Inverter, LuInverter, UnitTriangularInverter};

/// Default bound above which a state's summed silent exit probability is
/// reported as suspicious.
pub const DEFAULT_EXIT_WARNING_THRESHOLD: f64 = 1.01;

/// Linear solver used to sum over silent paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SolverKind {
    /// General inverse via LU decomposition.
    #[default]
    Lu,
    /// Back substitution. Valid for advancing machines, whose silent
    /// transition matrix is strictly upper triangular.
    UnitTriangular,
}

impl SolverKind {
    pub fn inverter(self) -> &'static dyn Inverter {
        match self {
            SolverKind::Lu => &LuInverter,
            SolverKind::UnitTriangular => &UnitTriangularInverter,
        }
    }
}

/// Tunables for [`EvaluatedMachine`](crate::EvaluatedMachine).
///
/// ```
/// use mboss_fst::{EvalConfig, SolverKind};
///
/// let config = EvalConfig::default()
///     .with_solver(SolverKind::UnitTriangular)
///     .with_exit_warning_threshold(1.1);
/// assert_eq!(config.solver, SolverKind::UnitTriangular);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// A state whose silent exit probabilities sum above this is logged.
    pub exit_warning_threshold: f64,
    pub solver: SolverKind,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            exit_warning_threshold: DEFAULT_EXIT_WARNING_THRESHOLD,
            solver: SolverKind::default(),
        }
    }
}

impl EvalConfig {
    pub fn with_exit_warning_threshold(mut self, threshold: f64) -> Self {
        self.exit_warning_threshold = threshold;
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }
}
