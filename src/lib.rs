//! Least-cost blending of raw resources into target mixtures
//!
//! Given a catalog of raw resources (cost per kg, limited supply, nutrient
//! composition) and a catalog of target mixtures (fixed mass, per-nutrient
//! percentage bands), this library finds how many kilograms of each resource
//! go into each mixture so that every constraint holds at minimum total cost.
//!
//! # Overview
//!
//! The problem is a continuous linear program:
//!
//! - one non-negative variable per (mixture, resource) pair;
//! - **supply caps**: a resource's total use across mixtures stays within its
//!   availability;
//! - **mass balance**: each mixture weighs exactly its target mass;
//! - **nutrient bands**: each nutrient's share of each mixture stays within its
//!   `[min_pct, max_pct]` band;
//! - objective: total purchase cost.
//!
//! Solving is delegated to an external LP solver through [`lp_solver`].
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use blend::{BlendOutcome, Catalog, solve};
//! use blend::lp_solver::SolverOptions;
//!
//! let catalog = Catalog::reference();
//! match solve(&catalog, &SolverOptions::default())? {
//!     BlendOutcome::Optimal(allocation) => {
//!         println!("total cost: {:.2}", allocation.total_cost());
//!         for (mixture, resource, kg) in allocation.iter() {
//!             println!("{mixture}: {kg:.2} kg of {resource}");
//!         }
//!     }
//!     BlendOutcome::Infeasible(diagnosis) => println!("infeasible: {diagnosis}"),
//!     BlendOutcome::Unbounded => println!("unbounded"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **[`catalog`]**: nutrients, resources and mixtures; validation; the
//!   built-in reference instance
//! - **[`blend`]**: the blend optimizer, its result types and the reporting
//!   helpers
//! - **[`lp_solver`]**: linear programming solver abstraction layer

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod blend;
pub mod catalog;
pub mod lp_solver;

pub use blend::{
    Allocation, BlendOutcome, ConstraintClass, Infeasibility, InfeasibilityCause, SolveArgs,
    solve, solve_main,
};
pub use catalog::commands::{CatalogArgs, CheckArgs, catalog_main, check_main};
pub use catalog::{Catalog, CatalogError, Mixture, NutrientBounds, Resource};

/// Outcomes the command line treats as failures even though the optimizer
/// returned normally.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum AppError {
    /// No allocation satisfies the catalog's constraints.
    #[error("Problem Infeasible")]
    Infeasible,
    /// The solver reported an unbounded objective.
    #[error("Problem Unbounded")]
    Unbounded,
}

/// Ways the backend can fail to deliver a verdict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverFailure {
    #[error("solver backend error: {0}")]
    Backend(String),
    #[error("solver hit its time limit before reaching a verdict")]
    TimeLimit,
    #[error("solver returned an unrecognised status: {0}")]
    UnrecognisedStatus(String),
}

/// Errors of a blend solve. Infeasibility is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlendError {
    /// The catalog is incomplete or holds out-of-range values.
    #[error("invalid model: {0}")]
    InvalidModel(#[from] CatalogError),
    /// The solver crashed, timed out or answered with an unknown status.
    #[error(transparent)]
    SolverFailure(#[from] SolverFailure),
}

/// Reads and parses a JSON catalog.
///
/// The catalog is not validated here; [`solve`] and [`check_main`] do that.
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use blend::read_catalog;
/// use std::path::Path;
///
/// let catalog = read_catalog(Path::new("media.json"))?;
/// # Ok(())
/// # }
/// ```
pub fn read_catalog(file_name: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(file_name)
        .with_context(|| format!("cannot read catalog {}", file_name.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("cannot parse catalog {}", file_name.display()))
}

/// Writes a catalog as pretty-printed JSON.
pub fn write_catalog(file_name: &Path, catalog: &Catalog) -> Result<()> {
    let file = fs::File::create(file_name)
        .with_context(|| format!("cannot create {}", file_name.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, catalog)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Command-line interface arguments for the blend tools.
#[derive(Debug, Parser)]
#[clap(
    name = "blend",
    about = "Least-cost blending of raw resources into target mixtures"
)]
pub struct CLIArguments {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[clap(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve a catalog (the built-in culture-media instance by default) and report the allocation.
    Solve(SolveArgs),
    /// Write the built-in culture-media catalog as JSON, as a template for new catalogs.
    Catalog(CatalogArgs),
    /// Validate a catalog file and summarise the model it produces.
    Check(CheckArgs),
}

impl CLIArguments {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = CLIArguments::parse_from(["blend", "-vv", "solve"]);
        assert_eq!(args.log_level(), log::LevelFilter::Debug);

        let args = CLIArguments::parse_from(["blend", "check", "media.json", "-q"]);
        assert_eq!(args.log_level(), log::LevelFilter::Error);

        let args = CLIArguments::parse_from(["blend", "catalog"]);
        assert_eq!(args.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_error_messages_name_the_cause() {
        let err = BlendError::from(CatalogError::Empty("resources"));
        assert_eq!(err.to_string(), "invalid model: catalog declares no resources");

        let err = BlendError::from(SolverFailure::TimeLimit);
        assert!(err.to_string().contains("time limit"));
    }

    #[test]
    fn test_catalog_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("media.json");

        write_catalog(&path, &Catalog::reference()).unwrap();
        assert_eq!(read_catalog(&path).unwrap(), Catalog::reference());

        assert!(read_catalog(&dir.path().join("missing.json")).is_err());
    }
}
