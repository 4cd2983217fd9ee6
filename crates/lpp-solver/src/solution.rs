use std::collections::BTreeMap;

use crate::problem::Direction;
use crate::standard::StandardForm;
use crate::tableau::Tableau;

/// The optimal solution read off a terminal tableau
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Iteration of the tableau the solution was read from
    pub iteration: usize,
    /// Values of the basis variables (slacks included).
    /// Variables outside the basis are 0.
    pub assignment: BTreeMap<String, f64>,
    /// Optimal objective value in the problem's own direction
    pub objective_value: f64,
}

impl Solution {
    pub(crate) fn extract(form: &StandardForm, tableau: &Tableau) -> Self {
        let assignment: BTreeMap<String, f64> = tableau
            .rows
            .iter()
            .map(|row| (row.basis_variable.clone(), row.rhs))
            .collect();

        let raw: f64 = form
            .objective
            .iter()
            .map(|term| term.coefficient * assignment.get(&term.variable).copied().unwrap_or(0.0))
            .sum();

        let objective_value = match form.direction {
            Direction::Maximize => raw,
            Direction::Minimize => -raw,
        } + form.objective_constant;

        Self {
            iteration: tableau.iteration,
            assignment,
            objective_value,
        }
    }

    /// Value of `variable`, 0 when it is not in the basis.
    pub fn value(&self, variable: &str) -> f64 {
        self.assignment.get(variable).copied().unwrap_or(0.0)
    }

    pub fn is_basic(&self, variable: &str) -> bool {
        self.assignment.contains_key(variable)
    }
}
