//! Human-readable output for problems, standard forms and tableaux.

use std::fmt::Write;

use lpp_solver::{format_terms, Problem, Report, Solution, StandardForm, Tableau};

/// Rounds to six decimals and drops trailing zeros, so `3.9999999999` prints as `4`.
pub fn number(value: f64) -> String {
    let rounded = format!("{:.6}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

pub fn problem(problem: &Problem) -> String {
    let mut out = String::new();
    let mut objective = format_terms(&problem.objective);
    if problem.objective_constant != 0.0 {
        let sign = if problem.objective_constant < 0.0 { '-' } else { '+' };
        objective = format!("{} {} {}", objective, sign, number(problem.objective_constant.abs()));
    }
    let _ = writeln!(out, "{} z = {}", problem.direction, objective);
    for constraint in &problem.constraints {
        let _ = writeln!(out, "  {}", constraint);
    }
    out
}

pub fn standard_form(form: &StandardForm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "max z' = {}", format_terms(&form.objective));
    for constraint in &form.constraints {
        let _ = writeln!(out, "  {}", constraint);
    }
    if form.slack_count > 0 {
        let _ = writeln!(
            out,
            "  {} slack variable(s) named {}1..{}{}",
            form.slack_count, form.slack_letter, form.slack_letter, form.slack_count
        );
    }
    let _ = writeln!(out, "Symbols:");
    for (symbol, name) in form.symbols.iter() {
        let _ = writeln!(out, "  {} = {}", symbol, name);
    }
    out
}

/// Lists every problem variable (0 when outside the basis), then the basic slacks.
pub fn solution(solution: &Solution, variables: &[&str]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Objective value: {}", number(solution.objective_value));
    let _ = writeln!(out, "Variables:");
    for name in variables {
        let marker = if solution.is_basic(name) { "" } else { " (non-basic)" };
        let value = number(solution.value(name));
        let _ = writeln!(out, "  {:12} {:>12}{}", name, value, marker);
    }
    let slacks: Vec<_> = solution
        .assignment
        .iter()
        .filter(|(name, _)| !variables.contains(&name.as_str()))
        .collect();
    if !slacks.is_empty() {
        let _ = writeln!(out, "Basic slacks:");
        for (name, value) in slacks {
            let _ = writeln!(out, "  {:12} {:>12}", name, number(*value));
        }
    }
    out
}

/// Prints one tableau as a grid: basis rows, then Cj, Zj and Zj - Cj.
pub fn tableau(tableau: &Tableau) -> String {
    const W: usize = 10;
    let mut out = String::new();

    let _ = writeln!(out, "Iteration {}", tableau.iteration);

    let _ = write!(out, "  {:>4} {:>8} {:>W$} {:>W$} |", "B", "XB", "CB", "b");
    for column in &tableau.columns {
        let _ = write!(out, " {:>W$}", column.to_string());
    }
    let _ = writeln!(out, " | {:>W$}", "ratio");

    let _ = write!(out, "  {:>4} {:>8} {:>W$} {:>W$} |", "", "", "", "Cj");
    for cost in &tableau.costs {
        let _ = write!(out, " {:>W$}", number(*cost));
    }
    let _ = writeln!(out, " |");

    for row in &tableau.rows {
        let basis = if row.is_pivot_row {
            format!("*{}", row.basis)
        } else {
            row.basis.to_string()
        };
        let _ = write!(
            out,
            "  {:>4} {:>8} {:>W$} {:>W$} |",
            basis,
            row.basis_variable,
            number(row.basis_cost),
            number(row.rhs)
        );
        for value in &row.coefficients {
            let _ = write!(out, " {:>W$}", number(*value));
        }
        let ratio = row.ratio.map(number).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, " | {:>W$}", ratio);
    }

    if tableau.is_evaluated() {
        for (label, values) in [("Zj", &tableau.zj), ("Zj-Cj", &tableau.relative_costs)] {
            let _ = write!(out, "  {:>4} {:>8} {:>W$} {:>W$} |", "", "", "", label);
            for value in values {
                let _ = write!(out, " {:>W$}", number(*value));
            }
            let _ = writeln!(out, " |");
        }
    }

    if let Some(pivot) = tableau.pivot {
        let _ = writeln!(
            out,
            "  pivot: row {}, column {}, element {}",
            pivot.row + 1,
            pivot.column,
            number(pivot.element)
        );
    }
    out
}

pub fn tableaux(tableaux: &[Tableau]) -> String {
    tableaux.iter().map(tableau).collect::<Vec<_>>().join("\n")
}

pub fn report(report: &Report, variables: &[&str], show_tableaux: bool) -> String {
    let mut out = String::new();
    if show_tableaux {
        out.push_str(&tableaux(&report.tableaux));
        out.push('\n');
    }
    match &report.solution {
        Some(solution) => {
            let _ = writeln!(out, "Status: OPTIMAL");
            let _ = writeln!(out, "{}", report.termination);
            let _ = writeln!(out, "Iterations: {}", report.tableaux.len());
            out.push_str(&self::solution(solution, variables));
        }
        None => {
            let _ = writeln!(out, "Status: UNBOUNDED");
            let _ = writeln!(out, "{}", report.termination);
            let _ = writeln!(out, "Iterations: {}", report.tableaux.len());
        }
    }
    out
}
