use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single `coefficient * variable` term.
///
/// An empty variable name marks a constant contribution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub coefficient: f64,
    pub variable: String,
}

impl Term {
    pub fn new(coefficient: f64, variable: impl Into<String>) -> Self {
        Self {
            coefficient,
            variable: variable.into(),
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(value, "")
    }

    pub fn is_constant(&self) -> bool {
        self.variable.is_empty()
    }

    pub fn negated(&self) -> Self {
        Self::new(-self.coefficient, self.variable.clone())
    }
}

/// Relational operator of a constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Strictly less than (<), treated as <= by the engine
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Equal (=)
    Eq,
    /// Strictly greater than (>), treated as >= by the engine
    Gt,
    /// Greater than or equal (>=)
    Ge,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Eq => "=",
            Relation::Gt => ">",
            Relation::Ge => ">=",
        }
    }

    /// The relation obtained by multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            Relation::Lt => Relation::Gt,
            Relation::Le => Relation::Ge,
            Relation::Eq => Relation::Eq,
            Relation::Gt => Relation::Lt,
            Relation::Ge => Relation::Le,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown optimization direction '{0}', expected 'min' or 'max'")]
pub struct UnknownDirection(pub String);

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Direction::Minimize),
            "max" => Ok(Direction::Maximize),
            _ => Err(UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Minimize => f.write_str("min"),
            Direction::Maximize => f.write_str("max"),
        }
    }
}

/// A normalized constraint: variable terms on the left, a constant on the right
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Distinct variables with non-zero coefficients
    pub lhs: Vec<Term>,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(lhs: Vec<Term>, relation: Relation, rhs: f64) -> Self {
        Self { lhs, relation, rhs }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", format_terms(&self.lhs), self.relation, self.rhs)
    }
}

/// Represents a linear programming problem as entered by the user
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Whether to minimize or maximize
    pub direction: Direction,
    /// Variable terms of the objective function
    pub objective: Vec<Term>,
    /// Constant part of the objective function
    pub objective_constant: f64,
    /// Constraints, in input order
    pub constraints: Vec<Constraint>,
}

impl Problem {
    pub fn new(direction: Direction, objective: Vec<Term>) -> Self {
        Self {
            direction,
            objective,
            objective_constant: 0.0,
            constraints: Vec::new(),
        }
    }

    pub fn with_objective_constant(mut self, constant: f64) -> Self {
        self.objective_constant = constant;
        self
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Distinct user variables in order of first appearance
    /// (objective first, then constraints).
    pub fn variables(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let terms = self
            .objective
            .iter()
            .chain(self.constraints.iter().flat_map(|c| c.lhs.iter()));
        for term in terms {
            if !term.is_constant() && !seen.contains(&term.variable.as_str()) {
                seen.push(&term.variable);
            }
        }
        seen
    }
}

/// Renders terms as an expression, e.g. `x1 - 3x2 + 2x3`.
pub fn format_terms(terms: &[Term]) -> String {
    if terms.is_empty() {
        return "0".to_string();
    }

    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        let magnitude = term.coefficient.abs();
        let negative = term.coefficient.is_sign_negative();
        if i == 0 {
            if negative {
                out.push('-');
            }
        } else {
            out.push_str(if negative { " - " } else { " + " });
        }
        if term.is_constant() || magnitude != 1.0 {
            out.push_str(&magnitude.to_string());
        }
        out.push_str(&term.variable);
    }
    out
}
