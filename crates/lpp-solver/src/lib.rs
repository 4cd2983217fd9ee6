mod problem;
mod session;
mod simplex;
mod solution;
mod standard;
mod tableau;

pub use problem::{format_terms, Constraint, Direction, Problem, Relation, Term, UnknownDirection};
pub use session::{EngineState, Session, Step, TerminationReason};
pub use simplex::{Report, SolveError, Solver};
pub use solution::Solution;
pub use standard::{FramingError, StandardConstraint, StandardForm, Symbol, SymbolMap};
pub use tableau::{CalculationError, Pivot, PivotChoice, Row, Tableau};
