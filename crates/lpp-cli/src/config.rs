//! Problem input: TOML problem files merged with command-line values.

use std::path::{Path, PathBuf};

use clap::Args;
use lpp_solver::Solver;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid problem file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("No objective given; pass --objective or set `objective` in the problem file")]
    MissingObjective,
    #[error("Tolerance must be a finite, non-negative number, got {0}")]
    InvalidTolerance(f64),
}

/// Problem file layout.
///
/// ```toml
/// direction = "max"
/// objective = "x1 + x2"
/// constraints = ["x1 + x2 <= 4", "x1 + 2x2 <= 5"]
///
/// [solver]
/// max_iterations = 500
/// tolerance = 1e-9
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProblemFile {
    pub direction: Option<String>,
    pub objective: Option<String>,
    pub constraints: Vec<String>,
    pub solver: SolverSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
}

impl ProblemFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Problem options shared by every subcommand
#[derive(Args, Debug, Default)]
pub struct ProblemArgs {
    /// TOML problem file
    pub file: Option<PathBuf>,
    /// Objective function, e.g. "x1 - 3x2 + 2x3"
    #[arg(short, long, allow_hyphen_values = true)]
    pub objective: Option<String>,
    /// Constraint, e.g. "3x1 - x2 <= 7" (repeatable; replaces the file's list)
    #[arg(short, long = "constraint", allow_hyphen_values = true)]
    pub constraints: Vec<String>,
    /// Optimization direction (min, max)
    #[arg(short, long)]
    pub direction: Option<String>,
    /// Maximum number of pivots before giving up
    #[arg(long)]
    pub max_iterations: Option<usize>,
    /// Numerical tolerance for sign and zero tests
    #[arg(long)]
    pub tolerance: Option<f64>,
}

/// Fully merged problem input
#[derive(Debug)]
pub struct ProblemInput {
    pub objective: String,
    pub constraints: Vec<String>,
    pub direction: Option<String>,
    pub solver: Solver,
}

impl ProblemArgs {
    pub fn resolve(self) -> Result<ProblemInput, ConfigError> {
        let file = match &self.file {
            Some(path) => ProblemFile::load(path)?,
            None => ProblemFile::default(),
        };
        self.merge(file)
    }

    /// Command-line values win over the file's.
    pub fn merge(self, file: ProblemFile) -> Result<ProblemInput, ConfigError> {
        let objective = self
            .objective
            .or(file.objective)
            .ok_or(ConfigError::MissingObjective)?;

        let constraints = if self.constraints.is_empty() {
            file.constraints
        } else {
            self.constraints
        };

        let mut solver = Solver::new();
        if let Some(max) = self.max_iterations.or(file.solver.max_iterations) {
            solver = solver.with_max_iterations(max);
        }
        if let Some(tol) = self.tolerance.or(file.solver.tolerance) {
            if !tol.is_finite() || tol < 0.0 {
                return Err(ConfigError::InvalidTolerance(tol));
            }
            solver = solver.with_tolerance(tol);
        }

        Ok(ProblemInput {
            objective,
            constraints,
            direction: self.direction.or(file.direction),
            solver,
        })
    }
}
