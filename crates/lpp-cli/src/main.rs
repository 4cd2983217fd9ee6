mod config;
mod logging;
mod render;

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use lpp_lang::build_problem;
use lpp_solver::{Problem, Report, SolveError, StandardForm, Tableau};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ProblemArgs, ProblemInput};

const EXIT_UNBOUNDED: i32 = 1;
const EXIT_PARSE: i32 = 2;
const EXIT_FRAMING: i32 = 3;
const EXIT_CALCULATION: i32 = 4;

#[derive(Parser)]
#[command(name = "lpp", version)]
#[command(about = "Solve linear programs with the tableau simplex method", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    /// Log format (pretty, json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and print the outcome
    Solve {
        #[command(flatten)]
        problem: ProblemArgs,
        /// Output format (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Print every iteration table
        #[arg(long)]
        tableaux: bool,
    },
    /// Parse and frame a problem without solving it
    Check {
        #[command(flatten)]
        problem: ProblemArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Solve {
            problem,
            format,
            tableaux,
        } => {
            let (input, problem) = load(problem);
            let json = format == "json";
            match input.solver.solve(&problem) {
                Ok(report) => print_report(&problem, &report, json, tableaux),
                Err(e) => fail_solve(&e, json, tableaux),
            }
        }
        Commands::Check { problem } => {
            let (_, problem) = load(problem);
            let form = match frame(&problem) {
                Ok(form) => form,
                Err(e) => {
                    eprintln!("✗ problem has errors:");
                    eprintln!("  Framing error: {}", e);
                    std::process::exit(EXIT_FRAMING);
                }
            };

            println!("✓ problem is valid");
            println!("  {} variables", problem.variables().len());
            println!("  {} constraints", problem.num_constraints());
            println!();
            print!("{}", render::problem(&problem));
            println!();
            println!("Standard form:");
            print!("{}", render::standard_form(&form));
        }
    }
}

/// Resolves the input and parses it, exiting on failure.
fn load(args: ProblemArgs) -> (ProblemInput, Problem) {
    let input = match args.resolve() {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_PARSE);
        }
    };

    match build_problem(&input.objective, &input.constraints, input.direction.as_deref()) {
        Ok(problem) => {
            debug!(
                direction = %problem.direction,
                constraints = problem.num_constraints(),
                max_iterations = input.solver.max_iterations(),
                tolerance = input.solver.tolerance(),
                "loaded problem"
            );
            (input, problem)
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(EXIT_PARSE);
        }
    }
}

/// Frames the problem and checks that an initial basis exists.
fn frame(problem: &Problem) -> Result<StandardForm, lpp_solver::FramingError> {
    let form = StandardForm::from_problem(problem)?;
    Tableau::initial(&form)?;
    Ok(form)
}

/// JSON body of a finished solve: the report plus every problem variable's value.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a Report,
    variables: BTreeMap<&'a str, f64>,
}

fn print_report(problem: &Problem, report: &Report, json: bool, tableaux: bool) {
    let names = problem.variables();
    info!(
        termination = ?report.termination,
        iterations = report.tableaux.len(),
        "solve finished"
    );

    if json {
        let variables = names
            .iter()
            .map(|&name| {
                let value = report.solution.as_ref().map_or(0.0, |s| s.value(name));
                (name, value)
            })
            .collect();
        match serde_json::to_string_pretty(&JsonReport { report, variables }) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                std::process::exit(EXIT_CALCULATION);
            }
        }
    } else {
        print!("{}", render::report(report, &names, tableaux));
    }

    if !report.is_optimal() {
        std::process::exit(EXIT_UNBOUNDED);
    }
}

fn fail_solve(error: &SolveError, json: bool, tableaux: bool) -> ! {
    let code = match error {
        SolveError::Framing(_) => EXIT_FRAMING,
        SolveError::Calculation { .. } | SolveError::IterationLimit { .. } => EXIT_CALCULATION,
    };

    if json {
        let body = serde_json::json!({
            "termination": error.termination(),
            "message": error.termination().message(),
            "error": error.to_string(),
            "tableaux": error.tableaux(),
        });
        match serde_json::to_string_pretty(&body) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error serializing report: {}", e),
        }
    } else {
        if tableaux && !error.tableaux().is_empty() {
            println!("{}", render::tableaux(error.tableaux()));
        }
        println!("Status: ERROR");
        println!("{}", error.termination());
        eprintln!("{}", error);
    }

    std::process::exit(code);
}
