use std::str::Chars;

use lpp_solver::Term;

use crate::error::{ExpressionIssue, ParseError};

/// Parses a whitespace-free expression such as `x1-3x2+2.5e1x3+4` into terms.
///
/// Constants come back with an empty variable name. Terms are returned in
/// source order; nothing is merged here.
pub fn parse_expression(expression: &str) -> Result<Vec<Term>, ParseError> {
    let invalid = |issue| ParseError::InvalidExpression {
        expression: expression.to_string(),
        issue,
    };

    if expression.is_empty() {
        return Err(invalid(ExpressionIssue::Empty));
    }

    let mut scanner = Scanner::new(expression);
    let mut terms = Vec::new();
    while scanner.peek().is_some() {
        terms.push(scanner.next_term().map_err(invalid)?);
    }
    Ok(terms)
}

/// Removes every whitespace character.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

struct Scanner<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    /// Character `n` places after the current one.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn starts_number(&self) -> bool {
        match self.peek() {
            Some('+' | '-') => self.peek_nth(0).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    /// `[+-]?digits(.digits)?([eE][+-]?digits)?`
    fn read_number(&mut self) -> Option<&'a str> {
        if !self.starts_number() {
            return None;
        }
        let start = self.pos;

        if matches!(self.peek(), Some('+' | '-')) {
            self.advance();
        }
        self.eat_digits();

        // Decimal part only when a digit follows the dot
        if self.peek() == Some('.') && self.peek_nth(0).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.eat_digits();
        }

        // Exponent only when digits follow, otherwise `e` starts a variable
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent = match self.peek_nth(0) {
                Some('+' | '-') => self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent {
                self.advance(); // e
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        Some(&self.source[start..self.pos])
    }

    fn read_ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        &self.source[start..self.pos]
    }

    fn next_term(&mut self) -> Result<Term, ExpressionIssue> {
        let start = self.pos;

        let (coefficient, bare_sign) = match self.read_number() {
            Some(text) => {
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExpressionIssue::InvalidNumber(text.to_string()))?;
                (value, false)
            }
            None => match self.peek() {
                Some('+') => {
                    self.advance();
                    (1.0, true)
                }
                Some('-') => {
                    self.advance();
                    (-1.0, true)
                }
                _ => (1.0, false),
            },
        };

        let variable = self.read_ident();
        if variable.is_empty() && start == self.pos {
            // Neither a number, a sign nor a variable could start here
            return Err(self.unexpected());
        }
        if variable.is_empty() && bare_sign {
            return Err(match self.peek() {
                None | Some('+' | '-') => ExpressionIssue::DanglingSign { position: start },
                Some(_) => self.unexpected(),
            });
        }

        match self.peek() {
            None | Some('+' | '-') => Ok(Term::new(coefficient, variable)),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn unexpected(&self) -> ExpressionIssue {
        match self.peek() {
            Some(found) => ExpressionIssue::UnexpectedChar {
                found,
                position: self.pos,
            },
            None => ExpressionIssue::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpp_solver::format_terms;

    fn terms(expression: &str) -> Vec<(f64, String)> {
        parse_expression(expression)
            .unwrap()
            .into_iter()
            .map(|t| (t.coefficient, t.variable))
            .collect()
    }

    fn issue(expression: &str) -> ExpressionIssue {
        match parse_expression(expression) {
            Err(ParseError::InvalidExpression { issue, .. }) => issue,
            other => panic!("expected invalid expression, got {:?}", other),
        }
    }

    #[test]
    fn test_coefficients_and_variables() {
        assert_eq!(
            terms("x1-3x2+2x3"),
            vec![
                (1.0, "x1".to_string()),
                (-3.0, "x2".to_string()),
                (2.0, "x3".to_string()),
            ]
        );
    }

    #[test]
    fn test_constants_have_empty_variable() {
        assert_eq!(
            terms("12-x4"),
            vec![(12.0, String::new()), (-1.0, "x4".to_string())]
        );
        assert_eq!(terms("-7"), vec![(-7.0, String::new())]);
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(terms("2.5x"), vec![(2.5, "x".to_string())]);
        assert_eq!(terms("1e3y"), vec![(1000.0, "y".to_string())]);
        assert_eq!(terms("+2E-1z"), vec![(0.2, "z".to_string())]);
        // `e` without digits after it is a variable
        assert_eq!(terms("2e"), vec![(2.0, "e".to_string())]);
        assert_eq!(terms("3ex"), vec![(3.0, "ex".to_string())]);
    }

    #[test]
    fn test_implicit_and_signed_unit_coefficients() {
        assert_eq!(
            terms("a+b-c_1"),
            vec![
                (1.0, "a".to_string()),
                (1.0, "b".to_string()),
                (-1.0, "c_1".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_expressions() {
        assert_eq!(issue(""), ExpressionIssue::Empty);
        assert_eq!(
            issue("2x*y"),
            ExpressionIssue::UnexpectedChar { found: '*', position: 2 }
        );
        assert_eq!(
            issue("x+(y)"),
            ExpressionIssue::UnexpectedChar { found: '(', position: 2 }
        );
        assert_eq!(issue("x+"), ExpressionIssue::DanglingSign { position: 1 });
        assert_eq!(issue("x--3"), ExpressionIssue::DanglingSign { position: 1 });
        assert_eq!(
            issue(".5x"),
            ExpressionIssue::UnexpectedChar { found: '.', position: 0 }
        );
        assert_eq!(
            issue("x 1"),
            ExpressionIssue::UnexpectedChar { found: ' ', position: 1 }
        );
    }

    #[test]
    fn test_round_trip_through_rendering() {
        let original = vec![
            Term::new(1.0, "x1"),
            Term::new(-3.0, "x2"),
            Term::new(2.25, "x3"),
            Term::new(-0.5, "slack_7"),
            Term::new(1e-7, "tiny"),
        ];
        let rendered = strip_whitespace(&format_terms(&original));
        let parsed = parse_expression(&rendered).unwrap();

        assert_eq!(parsed.len(), original.len());
        for (p, o) in parsed.iter().zip(&original) {
            assert_eq!(p.variable, o.variable);
            approx::assert_abs_diff_eq!(p.coefficient, o.coefficient, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(" x1 -\t3 x2\n"), "x1-3x2");
    }
}
