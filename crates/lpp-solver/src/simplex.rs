use thiserror::Error;
use tracing::info;

use crate::problem::Problem;
use crate::session::{Session, TerminationReason};
use crate::solution::Solution;
use crate::standard::{FramingError, StandardForm};
use crate::tableau::{CalculationError, Tableau};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("Calculation error: {source}")]
    Calculation {
        #[source]
        source: CalculationError,
        /// Tableaux produced before the failure
        tableaux: Vec<Tableau>,
    },
    #[error("No termination after {limit} iterations")]
    IterationLimit { limit: usize, tableaux: Vec<Tableau> },
}

impl SolveError {
    /// Termination reason the failed session ended with
    pub fn termination(&self) -> TerminationReason {
        match self {
            SolveError::Framing(_) => TerminationReason::FramingError,
            SolveError::Calculation { .. } => TerminationReason::CalculationError,
            SolveError::IterationLimit { .. } => TerminationReason::NotTerminated,
        }
    }

    /// Partial tableau history, empty for framing failures
    pub fn tableaux(&self) -> &[Tableau] {
        match self {
            SolveError::Framing(_) => &[],
            SolveError::Calculation { tableaux, .. }
            | SolveError::IterationLimit { tableaux, .. } => tableaux,
        }
    }
}

/// Everything a finished solve produced
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub standard_form: StandardForm,
    /// Every tableau, in iteration order
    pub tableaux: Vec<Tableau>,
    /// Either `Optimal` or `Unbounded`
    pub termination: TerminationReason,
    /// Present only when `termination` is `Optimal`
    pub solution: Option<Solution>,
}

impl Report {
    pub fn is_optimal(&self) -> bool {
        self.termination == TerminationReason::Optimal
    }

    pub fn final_tableau(&self) -> Option<&Tableau> {
        self.tableaux.last()
    }
}

/// Tableau simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// A fresh step-wise session for `problem`
    pub fn session(&self, problem: &Problem) -> Session {
        Session::new(problem.clone()).with_tolerance(self.tolerance)
    }

    /// Solve the problem, returning the whole tableau history
    pub fn solve(&self, problem: &Problem) -> Result<Report, SolveError> {
        let mut session = self.session(problem);
        session.frame()?;

        let termination = match session.run(self.max_iterations) {
            Ok(reason) => reason,
            Err(source) => {
                let (_, tableaux) = session.into_parts();
                return Err(SolveError::Calculation { source, tableaux });
            }
        };

        if termination == TerminationReason::NotTerminated {
            let (_, tableaux) = session.into_parts();
            return Err(SolveError::IterationLimit {
                limit: self.max_iterations,
                tableaux,
            });
        }

        let solution = session.solution();
        if let Some(solution) = &solution {
            info!(
                objective = solution.objective_value,
                iterations = session.tableaux().len(),
                "optimal solution found"
            );
        }

        let (standard_form, tableaux) = session.into_parts();
        let standard_form = standard_form.ok_or(SolveError::Calculation {
            source: CalculationError::NotFramed,
            tableaux: Vec::new(),
        })?;

        Ok(Report {
            standard_form,
            tableaux,
            termination,
            solution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Constraint, Direction, Relation, Term};
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-9;

    fn problem(
        direction: Direction,
        objective: &[(f64, &str)],
        constraints: &[(&[(f64, &str)], Relation, f64)],
    ) -> Problem {
        let terms = |ts: &[(f64, &str)]| {
            ts.iter().map(|&(c, v)| Term::new(c, v)).collect::<Vec<_>>()
        };
        let mut p = Problem::new(direction, terms(objective));
        for &(lhs, relation, rhs) in constraints {
            p.add_constraint(Constraint::new(terms(lhs), relation, rhs));
        }
        p
    }

    fn assert_history_invariants(report: &Report) {
        for (k, tableau) in report.tableaux.iter().enumerate() {
            assert_eq!(tableau.iteration, k + 1);
            assert_eq!(tableau.columns, report.tableaux[0].columns);
            assert_eq!(tableau.unit_basis_violation(TOL), None, "iteration {}", tableau.iteration);
        }
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let p = problem(
            Direction::Maximize,
            &[(3.0, "x"), (2.0, "y")],
            &[
                (&[(1.0, "x"), (1.0, "y")], Relation::Le, 4.0),
                (&[(1.0, "x")], Relation::Le, 3.0),
                (&[(1.0, "y")], Relation::Le, 3.0),
            ],
        );

        let report = Solver::new().solve(&p).unwrap();
        assert!(report.is_optimal());
        assert_history_invariants(&report);

        let solution = report.solution.as_ref().unwrap();
        assert_abs_diff_eq!(solution.value("x"), 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.value("y"), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.objective_value, 11.0, epsilon = 1e-6);
    }

    #[test]
    fn test_minimization() {
        // Minimize: x1 - 3x2 + 2x3
        // Subject to:
        //   3x1 - x2 + 3x3 <= 7
        //   -2x1 + 4x2 <= 12
        //   -4x1 + 3x2 + 8x3 <= 10
        // Optimal: x1=4, x2=5, x3=0, obj=-11
        let p = problem(
            Direction::Minimize,
            &[(1.0, "x1"), (-3.0, "x2"), (2.0, "x3")],
            &[
                (&[(3.0, "x1"), (-1.0, "x2"), (3.0, "x3")], Relation::Le, 7.0),
                (&[(-2.0, "x1"), (4.0, "x2")], Relation::Le, 12.0),
                (&[(-4.0, "x1"), (3.0, "x2"), (8.0, "x3")], Relation::Le, 10.0),
            ],
        );

        let report = Solver::new().solve(&p).unwrap();
        assert!(report.is_optimal());
        assert_history_invariants(&report);
        assert_eq!(report.tableaux.len(), 3);

        let solution = report.solution.as_ref().unwrap();
        assert_abs_diff_eq!(solution.value("x1"), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.value("x2"), 5.0, epsilon = 1e-9);
        assert_eq!(solution.value("x3"), 0.0);
        assert_abs_diff_eq!(solution.objective_value, -11.0, epsilon = 1e-9);

        let last = report.final_tableau().unwrap();
        assert!(last.relative_costs.iter().all(|&d| d >= -TOL));
    }

    #[test]
    fn test_unbounded() {
        let p = problem(
            Direction::Maximize,
            &[(1.0, "x1"), (1.0, "x2")],
            &[(&[(1.0, "x1"), (-1.0, "x2")], Relation::Le, 1.0)],
        );

        let report = Solver::new().solve(&p).unwrap();
        assert_eq!(report.termination, TerminationReason::Unbounded);
        assert!(report.solution.is_none());
        assert_history_invariants(&report);
    }

    #[test]
    fn test_unbounded_within_a_tight_iteration_limit() {
        let p = problem(
            Direction::Maximize,
            &[(1.0, "x1"), (1.0, "x2")],
            &[(&[(1.0, "x1"), (-1.0, "x2")], Relation::Le, 1.0)],
        );

        // One pivot, then the entering column has no positive ratio
        let report = Solver::new().with_max_iterations(1).solve(&p).unwrap();
        assert_eq!(report.termination, TerminationReason::Unbounded);
        assert_eq!(report.tableaux.len(), 2);
    }

    #[test]
    fn test_framing_error_has_no_tableaux() {
        let p = problem(Direction::Maximize, &[(1.0, "x")], &[]);
        let err = Solver::new().solve(&p).unwrap_err();
        assert_eq!(err, SolveError::Framing(FramingError::NoConstraints));
        assert_eq!(err.termination(), TerminationReason::FramingError);
        assert!(err.tableaux().is_empty());
    }

    #[test]
    fn test_iteration_limit() {
        let p = problem(
            Direction::Maximize,
            &[(3.0, "x"), (2.0, "y")],
            &[
                (&[(1.0, "x"), (1.0, "y")], Relation::Le, 4.0),
                (&[(1.0, "x")], Relation::Le, 3.0),
            ],
        );

        let err = Solver::new().with_max_iterations(0).solve(&p).unwrap_err();
        assert!(matches!(err, SolveError::IterationLimit { limit: 0, .. }));
        assert_eq!(err.termination(), TerminationReason::NotTerminated);
        assert_eq!(err.tableaux().len(), 1);
    }

    #[test]
    fn test_equality_constraint_without_slack() {
        // Maximize: x1 + 2x2
        // Subject to:
        //   x1 + x2 = 4
        //   x1 <= 3
        // x2 starts in the basis of the equality row; optimum x2=4, obj=8
        let p = problem(
            Direction::Maximize,
            &[(1.0, "x1"), (2.0, "x2")],
            &[
                (&[(1.0, "x1"), (1.0, "x2")], Relation::Eq, 4.0),
                (&[(1.0, "x1")], Relation::Le, 3.0),
            ],
        );

        let report = Solver::new().solve(&p).unwrap();
        assert!(report.is_optimal());
        assert_eq!(report.standard_form.slack_count, 1);
        assert_eq!(report.standard_form.constraints[0].slack, None);
        assert_history_invariants(&report);

        let solution = report.solution.as_ref().unwrap();
        assert_abs_diff_eq!(solution.value("x2"), 4.0);
        assert_eq!(solution.value("x1"), 0.0);
        assert_abs_diff_eq!(solution.objective_value, 8.0);
    }

    #[test]
    fn test_objective_constant_is_added() {
        let p = problem(
            Direction::Maximize,
            &[(1.0, "x")],
            &[(&[(1.0, "x")], Relation::Le, 2.0)],
        )
        .with_objective_constant(10.0);

        let report = Solver::new().solve(&p).unwrap();
        assert_abs_diff_eq!(report.solution.unwrap().objective_value, 12.0);
    }
}
