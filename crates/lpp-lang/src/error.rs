use std::fmt;

use lpp_solver::UnknownDirection;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionIssue {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
    #[error("sign at position {position} is not followed by a variable")]
    DanglingSign { position: usize },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintIssue {
    #[error("no relational operator (<, <=, =, >=, >)")]
    MissingRelation,
    #[error("more than one relational operator")]
    ChainedRelation,
    #[error("{0} side is empty")]
    EmptySide(Side),
    #[error("{side} side: {issue}")]
    InvalidSide { side: Side, issue: ExpressionIssue },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid expression '{expression}': {issue}")]
    InvalidExpression {
        expression: String,
        issue: ExpressionIssue,
    },
    #[error("Invalid constraint '{constraint}': {issue}")]
    InvalidConstraint {
        constraint: String,
        issue: ConstraintIssue,
    },
    #[error(transparent)]
    InvalidDirection(#[from] UnknownDirection),
    #[error("At least one constraint is required")]
    NoConstraints,
}

/// A problem could not be built; carries the raw inputs for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Could not pre-process {direction} problem '{objective}' with {} constraint(s): {source}",
    .constraints.len()
)]
pub struct PreProcessError {
    pub objective: String,
    pub constraints: Vec<String>,
    pub direction: String,
    #[source]
    pub source: ParseError,
}
