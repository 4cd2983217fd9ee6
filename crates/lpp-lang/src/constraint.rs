use lpp_solver::{Constraint, Relation, Term};

use crate::error::{ConstraintIssue, ParseError, Side};
use crate::expression::{parse_expression, strip_whitespace};

/// Parses `text` such as `x1-3x2+2x3>=12-x4` into a normalized constraint:
/// variables on the left (merged, zeros dropped), constants on the right.
pub fn normalize_constraint(text: &str) -> Result<Constraint, ParseError> {
    let invalid = |issue| ParseError::InvalidConstraint {
        constraint: text.to_string(),
        issue,
    };

    let compact = strip_whitespace(text);
    let (left, relation, right) =
        split_relation(&compact).ok_or_else(|| invalid(ConstraintIssue::MissingRelation))?;

    if starts_with_relation(left) || starts_with_relation(right) {
        return Err(invalid(ConstraintIssue::ChainedRelation));
    }

    let lhs = parse_side(left, Side::Left).map_err(invalid)?;
    let rhs = parse_side(right, Side::Right).map_err(invalid)?;

    let (left_vars, left_constant) = partition(lhs);
    let (right_vars, right_constant) = partition(rhs);

    let terms = merge_terms(
        left_vars
            .into_iter()
            .chain(right_vars.iter().map(Term::negated)),
    );

    Ok(Constraint::new(terms, relation, right_constant - left_constant))
}

/// Splits at the leftmost relational operator, preferring `<=`/`>=` over
/// `<`/`>` at the same position.
fn split_relation(text: &str) -> Option<(&str, Relation, &str)> {
    let (index, c) = text.char_indices().find(|(_, c)| matches!(c, '<' | '>' | '='))?;
    let or_equal = text[index + 1..].starts_with('=');

    let (relation, width) = match (c, or_equal) {
        ('<', true) => (Relation::Le, 2),
        ('>', true) => (Relation::Ge, 2),
        ('<', false) => (Relation::Lt, 1),
        ('>', false) => (Relation::Gt, 1),
        _ => (Relation::Eq, 1),
    };

    Some((&text[..index], relation, &text[index + width..]))
}

fn starts_with_relation(side: &str) -> bool {
    side.starts_with(['<', '>', '='])
}

fn parse_side(side: &str, which: Side) -> Result<Vec<Term>, ConstraintIssue> {
    if side.is_empty() {
        return Err(ConstraintIssue::EmptySide(which));
    }
    match parse_expression(side) {
        Ok(terms) => Ok(terms),
        Err(ParseError::InvalidExpression { issue, .. }) => {
            Err(ConstraintIssue::InvalidSide { side: which, issue })
        }
        Err(_) => Err(ConstraintIssue::EmptySide(which)),
    }
}

/// Splits terms into variable terms and the sum of the constants.
pub(crate) fn partition(terms: Vec<Term>) -> (Vec<Term>, f64) {
    let mut constant = 0.0;
    let mut variables = Vec::with_capacity(terms.len());
    for term in terms {
        if term.is_constant() {
            constant += term.coefficient;
        } else {
            variables.push(term);
        }
    }
    (variables, constant)
}

/// Sums terms by variable in order of first appearance and drops zero sums.
pub fn merge_terms<I>(terms: I) -> Vec<Term>
where
    I: IntoIterator<Item = Term>,
{
    let mut merged: Vec<Term> = Vec::new();
    for term in terms {
        match merged.iter_mut().find(|t| t.variable == term.variable) {
            Some(existing) => existing.coefficient += term.coefficient,
            None => merged.push(term),
        }
    }
    merged.retain(|t| t.coefficient != 0.0);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionIssue;

    fn issue(text: &str) -> ConstraintIssue {
        match normalize_constraint(text) {
            Err(ParseError::InvalidConstraint { issue, .. }) => issue,
            other => panic!("expected invalid constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_moves_variables_left_and_constants_right() {
        let c = normalize_constraint("x1 - 3x2 + 2x3 >= 12 - x4").unwrap();
        assert_eq!(
            c.lhs,
            vec![
                Term::new(1.0, "x1"),
                Term::new(-3.0, "x2"),
                Term::new(2.0, "x3"),
                Term::new(1.0, "x4"),
            ]
        );
        assert_eq!(c.relation, Relation::Ge);
        assert_eq!(c.rhs, 12.0);
    }

    #[test]
    fn test_merges_duplicates_and_drops_zeros() {
        let c = normalize_constraint("2x + 3 + y <= x + y + 10").unwrap();
        assert_eq!(c.lhs, vec![Term::new(1.0, "x")]);
        assert_eq!(c.rhs, 7.0);
    }

    #[test]
    fn test_relation_split_prefers_two_char_operators() {
        assert_eq!(normalize_constraint("x<=1").unwrap().relation, Relation::Le);
        assert_eq!(normalize_constraint("x>=1").unwrap().relation, Relation::Ge);
        assert_eq!(normalize_constraint("x<1").unwrap().relation, Relation::Lt);
        assert_eq!(normalize_constraint("x>1").unwrap().relation, Relation::Gt);
        assert_eq!(normalize_constraint("x=1").unwrap().relation, Relation::Eq);
    }

    #[test]
    fn test_malformed_constraints() {
        assert_eq!(issue("x + y"), ConstraintIssue::MissingRelation);
        assert_eq!(issue("x <== 3"), ConstraintIssue::ChainedRelation);
        assert_eq!(issue("x => 3"), ConstraintIssue::ChainedRelation);
        assert_eq!(issue("<= 3"), ConstraintIssue::EmptySide(Side::Left));
        assert_eq!(issue("x >= "), ConstraintIssue::EmptySide(Side::Right));
        assert_eq!(
            issue("x <= 3 <= 4"),
            ConstraintIssue::InvalidSide {
                side: Side::Right,
                issue: ExpressionIssue::UnexpectedChar { found: '<', position: 1 },
            }
        );
    }

    #[test]
    fn test_variables_cancelling_out_leave_empty_lhs() {
        let c = normalize_constraint("x + 1 <= x + 5").unwrap();
        assert!(c.lhs.is_empty());
        assert_eq!(c.rhs, 4.0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for text in [
            "x1-3x2+2x3>=12-x4",
            "3a + 2b - a < 7",
            "-2.5p + q = -4",
            "x + 1 <= x + 5",
        ] {
            let once = normalize_constraint(text).unwrap();
            let twice = normalize_constraint(&once.to_string()).unwrap();
            assert_eq!(once, twice, "{}", text);
        }
    }
}
