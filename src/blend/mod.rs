//! Least-cost blend optimizer and the `solve` command.
//!
//! [`solve`] turns a validated [`Catalog`] into a linear program, hands it to
//! the configured LP backend and maps the answer back to named quantities.
//! [`solve_main`] wraps it for the command line: it loads the catalog, prints
//! the text report and writes the optional CSV and JSON files.
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use blend::blend::{SolveArgs, solve_main};
//!
//! let args = SolveArgs {
//!     catalog: Some("media.json".into()),
//!     report: None,          // print the text report to stdout
//!     csv: Some("allocation.csv".into()),
//!     json: None,
//!     time_limit: Some(30.0),
//!     solver: None,          // BLEND_LP_SOLVER or the compiled-in default
//!     solver_output: false,
//! };
//!
//! solve_main(args)?;
//! # Ok(())
//! # }
//! ```

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use crate::catalog::Catalog;
use crate::lp_solver::{SolverBackend, SolverOptions};
use crate::{AppError, read_catalog};

mod allocation;
mod model;
pub mod report;

pub use allocation::Allocation;
pub use model::{
    BlendOutcome, ConstraintClass, Infeasibility, InfeasibilityCause, ModelSummary, diagnose,
    model_summary, solve,
};

/// Command-line arguments for the solve command.
#[derive(Parser, Debug)]
pub struct SolveArgs {
    /// JSON catalog to solve (the built-in culture-media instance if omitted)
    pub catalog: Option<PathBuf>,

    /// Write the text report to this file instead of stdout
    #[clap(long)]
    pub report: Option<PathBuf>,

    /// Output CSV file with one row per (mixture, resource)
    #[clap(long)]
    pub csv: Option<PathBuf>,

    /// Output JSON file with the full-precision allocation and profiles
    #[clap(long)]
    pub json: Option<PathBuf>,

    /// Solver time limit in seconds
    #[clap(short('t'), long)]
    pub time_limit: Option<f64>,

    /// LP backend (gurobi, coin_cbc); overrides BLEND_LP_SOLVER
    #[clap(long)]
    pub solver: Option<SolverBackend>,

    /// Let the solver print its own log
    #[clap(long)]
    pub solver_output: bool,
}

impl SolveArgs {
    fn solver_options(&self) -> Result<SolverOptions> {
        let time_limit = match self.time_limit {
            Some(secs) if !secs.is_finite() || secs <= 0.0 => {
                bail!("time limit must be a positive number of seconds, got {secs}")
            }
            Some(secs) => Some(Duration::from_secs_f64(secs)),
            None => None,
        };

        Ok(SolverOptions {
            backend: self.solver,
            time_limit,
            show_solver_output: self.solver_output,
        })
    }
}

/// Solve a catalog and report the allocation.
///
/// Every requested output is written before an infeasible or unbounded
/// outcome is turned into an [`AppError`].
pub fn solve_main(args: SolveArgs) -> Result<()> {
    let options = args.solver_options()?;

    let catalog = match &args.catalog {
        Some(path) => read_catalog(path)?,
        None => {
            info!("no catalog given, using the built-in culture-media instance");
            Catalog::reference()
        }
    };

    let outcome = solve(&catalog, &options)?;

    match &args.report {
        Some(path) => {
            let mut out_file = BufWriter::new(
                fs::File::create(path)
                    .with_context(|| format!("cannot create {}", path.display()))?,
            );
            report::write_report(&mut out_file, &catalog, &outcome)?;
            out_file.flush()?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            report::write_report(&mut stdout, &catalog, &outcome)?;
        }
    }

    if let Some(path) = &args.json {
        let mut out_file = BufWriter::new(
            fs::File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        );
        report::write_json(&mut out_file, &catalog, &outcome)?;
        out_file.flush()?;
    }

    match outcome {
        BlendOutcome::Optimal(allocation) => {
            if let Some(path) = &args.csv {
                let mut out_file = BufWriter::new(
                    fs::File::create(path)
                        .with_context(|| format!("cannot create {}", path.display()))?,
                );
                report::write_csv(&mut out_file, &catalog, &allocation)?;
                out_file.flush()?;
            }
            Ok(())
        }
        BlendOutcome::Infeasible(_) => {
            if args.csv.is_some() {
                warn!("no allocation to write to CSV");
            }
            Err(AppError::Infeasible.into())
        }
        BlendOutcome::Unbounded => Err(AppError::Unbounded.into()),
    }
}
