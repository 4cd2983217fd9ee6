use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::problem::{Direction, Problem, Relation, Term};

/// Candidate slack letters, in preference order.
const SLACK_LETTERS: [std::ops::RangeInclusive<char>; 2] = ['d'..='z', 'D'..='Z'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("Problem has no constraints")]
    NoConstraints,
    #[error("Objective function has no variables")]
    EmptyObjective,
    #[error("No slack letter available: every letter d-z and D-Z starts a variable name")]
    NoSlackLetter,
    #[error("Session was already framed")]
    AlreadyFramed,
    #[error("Constraint {row} has no variable usable as an initial basis (needs a unit column)")]
    NoInitialBasis { row: usize },
}

/// Internal column symbol (`a1`, `a2`, ...)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(usize);

impl Symbol {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0 + 1)
    }
}

/// Bijection between net variables and internal symbols.
///
/// Variables are kept sorted by name, so a given set of variables always
/// maps to the same symbols.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMap {
    names: Vec<String>,
}

impl SymbolMap {
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = variables.into_iter().map(Into::into).collect();
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn to_internal(&self, variable: &str) -> Option<Symbol> {
        self.names
            .binary_search_by(|name| name.as_str().cmp(variable))
            .ok()
            .map(Symbol)
    }

    /// Original variable behind `symbol`. Symbols must come from this map.
    pub fn to_original(&self, symbol: Symbol) -> &str {
        &self.names[symbol.0]
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.names.len()).map(Symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (Symbol(i), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Dense row indexed by symbol; absent variables get 0.
    pub fn dense(&self, terms: &[Term]) -> Vec<f64> {
        let mut row = vec![0.0; self.len()];
        for term in terms {
            if let Some(symbol) = self.to_internal(&term.variable) {
                row[symbol.0] += term.coefficient;
            }
        }
        row
    }
}

/// An equality row of the standard form
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StandardConstraint {
    pub lhs: Vec<Term>,
    pub rhs: f64,
    /// Slack injected for an inequality row
    pub slack: Option<String>,
}

impl StandardConstraint {
    pub fn relation(&self) -> Relation {
        Relation::Eq
    }
}

impl fmt::Display for StandardConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}",
            crate::problem::format_terms(&self.lhs),
            self.rhs
        )?;
        if let Some(slack) = &self.slack {
            write!(f, " ; {}: slack variable", slack)?;
        }
        Ok(())
    }
}

/// Maximization, equality-constrained form consumed by the tableau engine
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StandardForm {
    /// Direction of the source problem, used to restore the objective sign
    pub direction: Direction,
    /// Sign-adjusted objective with zero-cost slack terms appended
    pub objective: Vec<Term>,
    pub objective_constant: f64,
    pub constraints: Vec<StandardConstraint>,
    pub slack_letter: char,
    pub slack_count: usize,
    pub symbols: SymbolMap,
}

impl StandardForm {
    pub fn from_problem(problem: &Problem) -> Result<Self, FramingError> {
        if problem.constraints.is_empty() {
            return Err(FramingError::NoConstraints);
        }
        if problem.objective.iter().all(Term::is_constant) {
            return Err(FramingError::EmptyObjective);
        }

        let mut objective: Vec<Term> = problem
            .objective
            .iter()
            .filter(|t| !t.is_constant())
            .map(|t| match problem.direction {
                Direction::Minimize => t.negated(),
                Direction::Maximize => t.clone(),
            })
            .collect();

        let slack_letter = pick_slack_letter(problem)?;
        let mut slack_count = 0;
        let mut constraints = Vec::with_capacity(problem.constraints.len());

        for constraint in &problem.constraints {
            let (mut lhs, relation, rhs) = match constraint.relation {
                Relation::Gt | Relation::Ge => (
                    constraint.lhs.iter().map(Term::negated).collect::<Vec<_>>(),
                    constraint.relation.flipped(),
                    -constraint.rhs,
                ),
                Relation::Lt | Relation::Le | Relation::Eq => {
                    (constraint.lhs.clone(), constraint.relation, constraint.rhs)
                }
            };

            let slack = match relation {
                Relation::Lt | Relation::Le => {
                    slack_count += 1;
                    let name = format!("{}{}", slack_letter, slack_count);
                    lhs.push(Term::new(1.0, name.clone()));
                    objective.push(Term::new(0.0, name.clone()));
                    Some(name)
                }
                _ => None,
            };

            constraints.push(StandardConstraint { lhs, rhs, slack });
        }

        let net_variables = objective
            .iter()
            .chain(constraints.iter().flat_map(|c| c.lhs.iter()))
            .map(|t| t.variable.clone());
        let symbols = SymbolMap::new(net_variables);

        debug!(
            slack_letter = %slack_letter,
            slack_count,
            columns = symbols.len(),
            "framed standard form"
        );

        Ok(Self {
            direction: problem.direction,
            objective,
            objective_constant: problem.objective_constant,
            constraints,
            slack_letter,
            slack_count,
            symbols,
        })
    }

    /// Cost row (Cj) indexed by symbol
    pub fn costs(&self) -> Vec<f64> {
        self.symbols.dense(&self.objective)
    }
}

fn pick_slack_letter(problem: &Problem) -> Result<char, FramingError> {
    let used: BTreeSet<char> = problem
        .objective
        .iter()
        .chain(problem.constraints.iter().flat_map(|c| c.lhs.iter()))
        .filter_map(|t| t.variable.chars().next())
        .collect();

    SLACK_LETTERS
        .into_iter()
        .flatten()
        .find(|c| !used.contains(c))
        .ok_or(FramingError::NoSlackLetter)
}
