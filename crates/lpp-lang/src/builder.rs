use lpp_solver::{Direction, Problem};
use tracing::debug;

use crate::constraint::{merge_terms, normalize_constraint, partition};
use crate::error::{ParseError, PreProcessError};
use crate::expression::{parse_expression, strip_whitespace};

/// Collects the raw text of a problem and turns it into a [`Problem`].
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    objective: String,
    constraints: Vec<String>,
    direction: Option<String>,
}

impl ProblemBuilder {
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            ..Self::default()
        }
    }

    /// `"min"` or `"max"`, case-insensitive. Minimization when never set.
    pub fn direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.extend(constraints.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Problem, PreProcessError> {
        match self.try_build() {
            Ok(problem) => Ok(problem),
            Err(source) => Err(PreProcessError {
                direction: self.direction.unwrap_or_else(|| Direction::default().to_string()),
                objective: self.objective,
                constraints: self.constraints,
                source,
            }),
        }
    }

    fn try_build(&self) -> Result<Problem, ParseError> {
        let direction = match &self.direction {
            Some(d) => d.parse::<Direction>()?,
            None => Direction::default(),
        };

        let objective = parse_expression(&strip_whitespace(&self.objective))?;
        let (variables, constant) = partition(objective);

        if self.constraints.is_empty() {
            return Err(ParseError::NoConstraints);
        }

        let mut problem =
            Problem::new(direction, merge_terms(variables)).with_objective_constant(constant);
        for text in &self.constraints {
            problem.add_constraint(normalize_constraint(text)?);
        }

        debug!(
            direction = %direction,
            variables = problem.variables().len(),
            constraints = problem.num_constraints(),
            "built problem"
        );
        Ok(problem)
    }
}

/// Builds a problem from an objective, constraint strings and an optional
/// direction (`"min"` when absent).
pub fn build_problem<S: AsRef<str>>(
    objective: &str,
    constraints: &[S],
    direction: Option<&str>,
) -> Result<Problem, PreProcessError> {
    let builder = ProblemBuilder::new(objective)
        .constraints(constraints.iter().map(|c| c.as_ref().to_string()));
    match direction {
        Some(direction) => builder.direction(direction).build(),
        None => builder.build(),
    }
}
