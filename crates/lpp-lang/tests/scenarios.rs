use approx::assert_abs_diff_eq;
use lpp_lang::{build_problem, ParseError};
use lpp_solver::{Report, Solver, TerminationReason};

const TOL: f64 = 1e-9;

fn solve(objective: &str, constraints: &[&str], direction: &str) -> Report {
    let problem = build_problem(objective, constraints, Some(direction)).unwrap();
    Solver::new().solve(&problem).unwrap()
}

fn assert_history_invariants(report: &Report) {
    let columns = &report.tableaux[0].columns;
    for (k, tableau) in report.tableaux.iter().enumerate() {
        assert_eq!(tableau.iteration, k + 1);
        assert_eq!(&tableau.columns, columns);
        for row in &tableau.rows {
            assert_abs_diff_eq!(row.coefficient(row.basis), 1.0, epsilon = TOL);
            for other in tableau.rows.iter().filter(|r| r.index != row.index) {
                assert_abs_diff_eq!(other.coefficient(row.basis), 0.0, epsilon = TOL);
            }
        }
    }
}

fn assert_optimality_certificate(report: &Report) {
    let last = report.final_tableau().unwrap();
    assert!(last.relative_costs.iter().all(|&d| d >= -TOL), "{:?}", last.relative_costs);
}

#[test]
fn simple_two_variable_max() {
    let report = solve("x1+x2", &["x1+x2<=4", "x1+2x2<=5"], "max");
    assert_eq!(report.termination, TerminationReason::Optimal);
    assert_history_invariants(&report);
    assert_optimality_certificate(&report);

    let solution = report.solution.unwrap();
    assert_abs_diff_eq!(solution.objective_value, 4.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.value("x1") + solution.value("x2"), 4.0, epsilon = TOL);
}

#[test]
fn minimize_three_variables() {
    let report = solve(
        "x1-3x2+2x3",
        &["3x1-x2+3x3<=7", "-2x1+4x2<=12", "-4x1+3x2+8x3<=10"],
        "min",
    );
    assert_eq!(report.termination, TerminationReason::Optimal);
    assert_history_invariants(&report);
    assert_optimality_certificate(&report);

    let solution = report.solution.unwrap();
    assert_abs_diff_eq!(solution.objective_value, -11.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.value("x1"), 4.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.value("x2"), 5.0, epsilon = TOL);
    assert_eq!(solution.value("x3"), 0.0);
    assert!(solution.assignment.values().all(|&v| v >= -TOL));
}

#[test]
fn solving_twice_is_reproducible() {
    let constraints = ["3x1-x2+3x3<=7", "-2x1+4x2<=12", "-4x1+3x2+8x3<=10"];
    let first = solve("x1-3x2+2x3", &constraints, "min");
    let second = solve("x1-3x2+2x3", &constraints, "min");
    assert_eq!(first, second);
}

#[test]
fn unbounded_problem() {
    let report = solve("x1+x2", &["x1-x2<=1"], "max");
    assert_eq!(report.termination, TerminationReason::Unbounded);
    assert!(report.solution.is_none());
    assert_history_invariants(&report);
}

#[test]
fn zero_constraints_fail_before_solving() {
    let err = build_problem::<&str>("x1+x2", &[], Some("max")).unwrap_err();
    assert_eq!(err.source, ParseError::NoConstraints);
}

#[test]
fn equality_constraint_keeps_unit_basis() {
    let report = solve("x1+2x2", &["x1+x2=4", "x1<=3", "x1+x3<=5"], "max");
    assert_eq!(report.termination, TerminationReason::Optimal);
    assert_eq!(report.standard_form.slack_count, 2);
    assert_eq!(report.standard_form.constraints[0].slack, None);
    assert_history_invariants(&report);
    assert_optimality_certificate(&report);

    let solution = report.solution.unwrap();
    assert_abs_diff_eq!(solution.value("x1") + solution.value("x2"), 4.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.objective_value, 8.0, epsilon = TOL);
}

#[test]
fn greater_equal_with_negative_rhs() {
    // -x1 >= -3 is x1 <= 3 once flipped
    let report = solve("x1", &["x1<=5", "-x1>=-3"], "max");
    assert_eq!(report.termination, TerminationReason::Optimal);
    assert_history_invariants(&report);

    let solution = report.solution.unwrap();
    assert_abs_diff_eq!(solution.value("x1"), 3.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.objective_value, 3.0, epsilon = TOL);
}

#[test]
fn constants_on_both_sides_and_objective() {
    // max 2a + b + 1 s.t. a + 2 <= 6, b <= 10 - a  =>  a=4, b=6, value 15
    let report = solve("2a + b + 1", &["a + 2 <= 6", "b <= 10 - a"], "max");
    let solution = report.solution.unwrap();
    assert_abs_diff_eq!(solution.value("a"), 4.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.value("b"), 6.0, epsilon = TOL);
    assert_abs_diff_eq!(solution.objective_value, 15.0, epsilon = TOL);
}
