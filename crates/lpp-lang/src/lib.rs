pub mod builder;
pub mod constraint;
pub mod error;
pub mod expression;

pub use builder::{build_problem, ProblemBuilder};
pub use constraint::{merge_terms, normalize_constraint};
pub use error::{ConstraintIssue, ExpressionIssue, ParseError, PreProcessError, Side};
pub use expression::{parse_expression, strip_whitespace};
