use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::problem::Problem;
use crate::solution::Solution;
use crate::standard::{FramingError, StandardForm, Symbol};
use crate::tableau::{CalculationError, PivotChoice, Tableau};

/// Why a session stopped computing
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Optimal,
    Unbounded,
    FramingError,
    CalculationError,
    NotTerminated,
}

impl TerminationReason {
    pub fn is_terminal(self) -> bool {
        self != TerminationReason::NotTerminated
    }

    pub fn message(self) -> &'static str {
        match self {
            TerminationReason::Optimal => "Optimal solution reached for the given problem.",
            TerminationReason::Unbounded => "Solution is unbounded.",
            TerminationReason::FramingError => "Error while framing the problem.",
            TerminationReason::CalculationError => "Error while calculating the solution.",
            TerminationReason::NotTerminated => "Calculation has not terminated.",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Building,
    Iterating,
    Optimal,
    Unbounded,
    Error,
}

/// Result of one [`Session::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// A pivot produced the tableau with this iteration number
    Pivoted { iteration: usize },
    Optimal,
    Unbounded { column: Symbol },
}

/// A single solve attempt, owning its problem and every tableau it produced.
pub struct Session {
    problem: Problem,
    tolerance: f64,
    state: EngineState,
    termination: TerminationReason,
    standard_form: Option<StandardForm>,
    tableaux: Vec<Tableau>,
}

impl Session {
    pub fn new(problem: Problem) -> Self {
        Self {
            problem,
            tolerance: 1e-9,
            state: EngineState::Building,
            termination: TerminationReason::NotTerminated,
            standard_form: None,
            tableaux: Vec::new(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn termination(&self) -> TerminationReason {
        self.termination
    }

    pub fn standard_form(&self) -> Option<&StandardForm> {
        self.standard_form.as_ref()
    }

    pub fn tableaux(&self) -> &[Tableau] {
        &self.tableaux
    }

    pub fn into_parts(self) -> (Option<StandardForm>, Vec<Tableau>) {
        (self.standard_form, self.tableaux)
    }

    /// Converts the problem to standard form and builds the first tableau.
    pub fn frame(&mut self) -> Result<&Tableau, FramingError> {
        if self.state != EngineState::Building {
            return Err(FramingError::AlreadyFramed);
        }

        let framed = StandardForm::from_problem(&self.problem)
            .and_then(|form| Tableau::initial(&form).map(|tableau| (form, tableau)));

        match framed {
            Ok((form, tableau)) => {
                debug!(
                    rows = tableau.rows.len(),
                    columns = tableau.columns.len(),
                    "built initial tableau"
                );
                self.standard_form = Some(form);
                self.tableaux.push(tableau);
                self.state = EngineState::Iterating;
                Ok(&self.tableaux[0])
            }
            Err(e) => {
                warn!(error = %e, "framing failed");
                self.state = EngineState::Error;
                self.termination = TerminationReason::FramingError;
                Err(e)
            }
        }
    }

    /// Evaluates the latest tableau and either terminates or pivots once.
    pub fn step(&mut self) -> Result<Step, CalculationError> {
        match self.state {
            EngineState::Iterating => {}
            EngineState::Building => return Err(CalculationError::NotFramed),
            _ => {
                return Err(CalculationError::Terminated {
                    reason: self.termination,
                });
            }
        }

        match self.advance() {
            Ok(step) => Ok(step),
            Err(e) => {
                warn!(error = %e, "calculation failed");
                self.state = EngineState::Error;
                self.termination = TerminationReason::CalculationError;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<Step, CalculationError> {
        let tolerance = self.tolerance;
        let (Some(form), Some(current)) = (self.standard_form.as_ref(), self.tableaux.last_mut())
        else {
            return Err(CalculationError::NotFramed);
        };

        current.evaluate();
        trace!(
            iteration = current.iteration,
            relative_costs = ?current.relative_costs,
            "evaluated tableau"
        );

        let pivot = match current.select_pivot(tolerance)? {
            PivotChoice::Pivot(pivot) => pivot,
            PivotChoice::Optimal => {
                let iteration = current.iteration;
                self.finish(EngineState::Optimal, TerminationReason::Optimal, iteration);
                return Ok(Step::Optimal);
            }
            PivotChoice::Unbounded { column } => {
                let iteration = current.iteration;
                self.finish(EngineState::Unbounded, TerminationReason::Unbounded, iteration);
                return Ok(Step::Unbounded { column });
            }
        };

        let next = current.pivoted(&form.symbols)?;
        if next.iteration <= current.iteration {
            return Err(CalculationError::IterationNotAdvanced {
                previous: current.iteration,
                next: next.iteration,
            });
        }
        if let Some(row) = next.unit_basis_violation(tolerance) {
            return Err(CalculationError::BrokenBasis {
                iteration: next.iteration,
                row,
            });
        }

        debug!(
            iteration = current.iteration,
            column = %pivot.column,
            row = pivot.row,
            element = pivot.element,
            "pivoted"
        );

        let iteration = next.iteration;
        self.tableaux.push(next);
        Ok(Step::Pivoted { iteration })
    }

    fn finish(&mut self, state: EngineState, reason: TerminationReason, iteration: usize) {
        info!(iteration, reason = ?reason, "simplex terminated");
        self.state = state;
        self.termination = reason;
    }

    /// Whether stepping the latest tableau would pivot rather than terminate.
    fn needs_pivot(&self) -> bool {
        let Some(latest) = self.tableaux.last() else {
            return false;
        };
        let mut lookahead = latest.clone();
        lookahead.evaluate();
        matches!(lookahead.select_pivot(self.tolerance), Ok(PivotChoice::Pivot(_)))
    }

    /// Steps until the session terminates or `max_iterations` pivots were made.
    ///
    /// Returns [`TerminationReason::NotTerminated`] when the cap stops it.
    pub fn run(&mut self, max_iterations: usize) -> Result<TerminationReason, CalculationError> {
        let mut pivots = 0;
        loop {
            if matches!(self.state, EngineState::Optimal | EngineState::Unbounded) {
                return Ok(self.termination);
            }
            let iterating = self.state == EngineState::Iterating;
            if pivots >= max_iterations && iterating && self.needs_pivot() {
                warn!(max_iterations, "iteration limit reached before termination");
                return Ok(TerminationReason::NotTerminated);
            }
            match self.step()? {
                Step::Pivoted { .. } => pivots += 1,
                Step::Optimal | Step::Unbounded { .. } => return Ok(self.termination),
            }
        }
    }

    /// The optimal solution, only once the session terminated as optimal.
    pub fn solution(&self) -> Option<Solution> {
        if self.termination != TerminationReason::Optimal {
            return None;
        }
        let form = self.standard_form.as_ref()?;
        let tableau = self.tableaux.last()?;
        Some(Solution::extract(form, tableau))
    }
}
