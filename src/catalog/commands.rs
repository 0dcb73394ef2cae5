//! The `catalog` and `check` commands.

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use prettytable::*;

use crate::blend::{ConstraintClass, model_summary};
use crate::{Catalog, read_catalog, write_catalog};

/// Command-line arguments for the catalog command.
#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Write the catalog to this file instead of stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

/// Write the built-in culture-media catalog as JSON.
pub fn catalog_main(args: CatalogArgs) -> Result<()> {
    let catalog = Catalog::reference();

    match args.output {
        Some(path) => {
            write_catalog(&path, &catalog)?;
            info!("reference catalog written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &catalog)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

/// Command-line arguments for the check command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// JSON catalog to validate
    pub catalog: PathBuf,
}

/// Validate a catalog file and print the size of the model it produces.
pub fn check_main(args: CheckArgs) -> Result<()> {
    let catalog = read_catalog(&args.catalog)?;
    let summary = model_summary(&catalog)
        .with_context(|| format!("{} is not a valid catalog", args.catalog.display()))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "{}: {} nutrients, {} resources, {} mixtures",
        args.catalog.display(),
        catalog.nutrients.len(),
        catalog.resources.len(),
        catalog.mixtures.len()
    )?;
    writeln!(
        stdout,
        "Demand {:.2} kg, supply {:.2} kg",
        catalog.total_target_kg(),
        catalog.total_available_kg()
    )?;

    let mut table = Table::new();
    table.set_titles(row!["Constraint class", "Rows"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for class in [
        ConstraintClass::SupplyCap,
        ConstraintClass::MassBalance,
        ConstraintClass::NutrientBand,
    ] {
        table.add_row(row![class.to_string(), r->summary.count(class)]);
    }
    table.add_row(row!["variables", r->summary.variables]);
    table.print(&mut stdout)?;

    Ok(())
}
