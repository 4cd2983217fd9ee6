use thiserror::Error;

use crate::session::TerminationReason;
use crate::standard::{FramingError, StandardForm, Symbol, SymbolMap};

/// Internal invariant violations detected while iterating
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("Session has not been framed yet")]
    NotFramed,
    #[error("Session already terminated: {reason}")]
    Terminated { reason: TerminationReason },
    #[error("Relative costs of iteration {iteration} were not computed before choosing a pivot")]
    NotEvaluated { iteration: usize },
    #[error("Iteration {iteration} has no pivot to apply")]
    MissingPivot { iteration: usize },
    #[error("Pivot element {element} of iteration {iteration} cannot be used")]
    InvalidPivotElement { iteration: usize, element: f64 },
    #[error("Iteration counter did not advance ({previous} -> {next})")]
    IterationNotAdvanced { previous: usize, next: usize },
    #[error("Row {row} of iteration {iteration} lost its unit basis column")]
    BrokenBasis { iteration: usize, row: usize },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: usize,
    /// Basis column symbol (B)
    pub basis: Symbol,
    /// Original variable behind the basis symbol (XB)
    pub basis_variable: String,
    /// Cost of the basis variable (CB)
    pub basis_cost: f64,
    /// Right-hand side (b)
    pub rhs: f64,
    /// Coefficients indexed by symbol
    pub coefficients: Vec<f64>,
    /// rhs / coefficient in the pivot column; `None` when the coefficient is zero
    pub ratio: Option<f64>,
    pub is_pivot_row: bool,
}

impl Row {
    pub fn coefficient(&self, symbol: Symbol) -> f64 {
        self.coefficients[symbol.index()]
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    /// Index of the pivot row
    pub row: usize,
    pub column: Symbol,
    pub element: f64,
}

/// Outcome of inspecting an evaluated tableau
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PivotChoice {
    /// No column can improve the objective
    Optimal,
    /// The entering column has no positive ratio
    Unbounded { column: Symbol },
    Pivot(Pivot),
}

/// One snapshot of the simplex matrix
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    pub iteration: usize,
    pub columns: Vec<Symbol>,
    /// Cj, indexed by symbol
    pub costs: Vec<f64>,
    pub rows: Vec<Row>,
    /// Zj, empty until [`Tableau::evaluate`] runs
    pub zj: Vec<f64>,
    /// Zj - Cj, empty until [`Tableau::evaluate`] runs
    pub relative_costs: Vec<f64>,
    pub pivot: Option<Pivot>,
}

impl Tableau {
    /// Builds iteration 1 with its initial basis.
    ///
    /// Rows with a slack start with the slack in the basis. A row without
    /// one needs a variable whose column is exactly 1 in that row and 0 in
    /// every other row; the lhs is searched from its last term backwards.
    pub fn initial(form: &StandardForm) -> Result<Self, FramingError> {
        let symbols = &form.symbols;
        let costs = form.costs();
        let dense: Vec<Vec<f64>> = form
            .constraints
            .iter()
            .map(|c| symbols.dense(&c.lhs))
            .collect();

        let mut rows: Vec<Row> = Vec::with_capacity(dense.len());
        let paired = form.constraints.iter().zip(dense.iter());
        for (i, (constraint, coefficients)) in paired.enumerate() {
            let basis = match &constraint.slack {
                Some(slack) => symbols.to_internal(slack),
                None => constraint
                    .lhs
                    .iter()
                    .rev()
                    .filter_map(|t| symbols.to_internal(&t.variable))
                    .find(|&s| {
                        !rows.iter().any(|r| r.basis == s) && is_unit_column(&dense, i, s)
                    }),
            }
            .ok_or(FramingError::NoInitialBasis { row: i })?;

            rows.push(Row {
                index: i,
                basis,
                basis_variable: symbols.to_original(basis).to_string(),
                basis_cost: costs[basis.index()],
                rhs: constraint.rhs,
                coefficients: coefficients.clone(),
                ratio: None,
                is_pivot_row: false,
            });
        }

        Ok(Self {
            iteration: 1,
            columns: symbols.symbols().collect(),
            costs,
            rows,
            zj: Vec::new(),
            relative_costs: Vec::new(),
            pivot: None,
        })
    }

    pub fn is_evaluated(&self) -> bool {
        self.relative_costs.len() == self.columns.len()
    }

    /// Computes Zj and the relative costs Zj - Cj.
    pub fn evaluate(&mut self) {
        self.zj = self
            .columns
            .iter()
            .map(|&col| {
                self.rows
                    .iter()
                    .map(|row| row.basis_cost * row.coefficient(col))
                    .sum()
            })
            .collect();
        self.relative_costs = self
            .zj
            .iter()
            .zip(&self.costs)
            .map(|(zj, cj)| zj - cj)
            .collect();
    }

    /// Column with the most negative relative cost, first one on ties.
    /// `None` until the tableau is evaluated.
    pub fn entering_column(&self, tolerance: f64) -> Option<Symbol> {
        if !self.is_evaluated() {
            return None;
        }
        let mut most_negative = -tolerance;
        let mut entering = None;
        for &col in &self.columns {
            let delta = self.relative_costs[col.index()];
            if delta < most_negative {
                most_negative = delta;
                entering = Some(col);
            }
        }
        entering
    }

    /// Picks the pivot column and row, recording ratios on the rows and the
    /// pivot on the tableau.
    pub fn select_pivot(&mut self, tolerance: f64) -> Result<PivotChoice, CalculationError> {
        if !self.is_evaluated() {
            return Err(CalculationError::NotEvaluated {
                iteration: self.iteration,
            });
        }

        let Some(column) = self.entering_column(tolerance) else {
            return Ok(PivotChoice::Optimal);
        };

        let mut min_ratio = f64::INFINITY;
        let mut pivot_row = None;
        for row in &mut self.rows {
            let coefficient = row.coefficient(column);
            row.is_pivot_row = false;
            row.ratio = if coefficient.abs() > tolerance {
                Some(row.rhs / coefficient)
            } else {
                None
            };
            if let Some(ratio) = row.ratio {
                if ratio > 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    pivot_row = Some(row.index);
                }
            }
        }

        let Some(row) = pivot_row else {
            return Ok(PivotChoice::Unbounded { column });
        };

        self.rows[row].is_pivot_row = true;
        let pivot = Pivot {
            row,
            column,
            element: self.rows[row].coefficient(column),
        };
        self.pivot = Some(pivot);
        Ok(PivotChoice::Pivot(pivot))
    }

    pub fn pivot_row(&self) -> Option<&Row> {
        self.pivot.and_then(|p| self.rows.get(p.row))
    }

    /// Gauss-Jordan step around the recorded pivot, producing the next
    /// iteration.
    pub fn pivoted(&self, symbols: &SymbolMap) -> Result<Tableau, CalculationError> {
        let pivot = self.pivot.ok_or(CalculationError::MissingPivot {
            iteration: self.iteration,
        })?;
        let source = self.rows.get(pivot.row).ok_or(CalculationError::MissingPivot {
            iteration: self.iteration,
        })?;
        if pivot.element == 0.0 || !pivot.element.is_finite() {
            return Err(CalculationError::InvalidPivotElement {
                iteration: self.iteration,
                element: pivot.element,
            });
        }

        let col = pivot.column.index();
        let mut normalized: Vec<f64> = source
            .coefficients
            .iter()
            .map(|a| a / pivot.element)
            .collect();
        normalized[col] = 1.0;
        let normalized_rhs = source.rhs / pivot.element;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                if row.index == pivot.row {
                    return Row {
                        index: row.index,
                        basis: pivot.column,
                        basis_variable: symbols.to_original(pivot.column).to_string(),
                        basis_cost: self.costs[col],
                        rhs: normalized_rhs,
                        coefficients: normalized.clone(),
                        ratio: None,
                        is_pivot_row: false,
                    };
                }

                let factor = row.coefficients[col];
                let mut coefficients: Vec<f64> = row
                    .coefficients
                    .iter()
                    .zip(&normalized)
                    .map(|(a, p)| a - p * factor)
                    .collect();
                coefficients[col] = 0.0;

                Row {
                    index: row.index,
                    basis: row.basis,
                    basis_variable: row.basis_variable.clone(),
                    basis_cost: row.basis_cost,
                    rhs: row.rhs - normalized_rhs * factor,
                    coefficients,
                    ratio: None,
                    is_pivot_row: false,
                }
            })
            .collect();

        Ok(Tableau {
            iteration: self.iteration + 1,
            columns: self.columns.clone(),
            costs: self.costs.clone(),
            rows,
            zj: Vec::new(),
            relative_costs: Vec::new(),
            pivot: None,
        })
    }

    /// First row whose basis column is not a unit column, if any.
    pub fn unit_basis_violation(&self, tolerance: f64) -> Option<usize> {
        self.rows.iter().position(|row| {
            self.rows.iter().any(|other| {
                let expected = if other.index == row.index { 1.0 } else { 0.0 };
                (other.coefficient(row.basis) - expected).abs() > tolerance
            })
        })
    }

    /// Z for the current basis: sum of CB * b
    pub fn objective_value(&self) -> f64 {
        self.rows.iter().map(|r| r.basis_cost * r.rhs).sum()
    }
}

fn is_unit_column(rows: &[Vec<f64>], own: usize, symbol: Symbol) -> bool {
    rows.iter().enumerate().all(|(i, row)| {
        let expected = if i == own { 1.0 } else { 0.0 };
        row[symbol.index()] == expected
    })
}
