//! Human and machine readable renderings of a blend outcome.
//!
//! The text report prints one prettytable per mixture with resource
//! quantities and the nutrient profile against its band, rounded to two
//! decimals. CSV and JSON keep full precision.

use std::io::Write;

use anyhow::Result;
use prettytable::*;
use serde::Serialize;

use crate::blend::{Allocation, BlendOutcome, Infeasibility};
use crate::catalog::{Catalog, NutrientBounds};

/// Percentage slack when checking a profile against its band
const BAND_TOLERANCE_PCT: f64 = 1e-6;

/// Mass of one resource inside a mixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceShare {
    pub resource: String,
    pub kg: f64,
    pub cost: f64,
}

/// Achieved share of one nutrient against the band it had to meet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientShare {
    pub nutrient: String,
    pub pct: f64,
    pub bounds: Option<NutrientBounds>,
}

impl NutrientShare {
    pub fn within_band(&self) -> bool {
        self.bounds
            .is_none_or(|bounds| bounds.contains(self.pct, BAND_TOLERANCE_PCT))
    }
}

/// Composition of a blended mixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixtureProfile {
    pub mixture: String,
    pub total_kg: f64,
    pub cost: f64,
    pub resources: Vec<ResourceShare>,
    pub nutrients: Vec<NutrientShare>,
    pub residual_pct: f64,
}

/// Build one profile per mixture of `allocation`, in catalog order.
///
/// Names the catalog does not know contribute nothing, so a profile built
/// against a different catalog stays well defined.
pub fn mixture_profiles(catalog: &Catalog, allocation: &Allocation) -> Vec<MixtureProfile> {
    allocation
        .mixtures()
        .iter()
        .map(|mixture| {
            let resources = allocation
                .resources()
                .iter()
                .map(|resource| {
                    let kg = allocation.quantity(mixture, resource).unwrap_or(0.0);
                    let cost_per_kg = catalog
                        .resource(resource)
                        .map_or(0.0, |r| r.cost_per_kg);
                    ResourceShare {
                        resource: resource.clone(),
                        kg,
                        cost: kg * cost_per_kg,
                    }
                })
                .collect();

            let nutrients = catalog
                .nutrients
                .iter()
                .map(|nutrient| NutrientShare {
                    nutrient: nutrient.clone(),
                    pct: allocation
                        .nutrient_percentage(catalog, mixture, nutrient)
                        .unwrap_or(0.0),
                    bounds: catalog
                        .mixture(mixture)
                        .and_then(|m| m.bounds_for(nutrient)),
                })
                .collect();

            MixtureProfile {
                mixture: mixture.clone(),
                total_kg: allocation.mixture_total(mixture).unwrap_or(0.0),
                cost: allocation.mixture_cost(catalog, mixture).unwrap_or(0.0),
                resources,
                nutrients,
                residual_pct: allocation
                    .residual_percentage(catalog, mixture)
                    .unwrap_or(0.0),
            }
        })
        .collect()
}

fn write_infeasibility(writer: &mut impl Write, diagnosis: &Infeasibility) -> Result<()> {
    writeln!(writer, "Status: INFEASIBLE")?;
    if diagnosis.is_undetermined() {
        writeln!(writer, "No single constraint class could be isolated.")?;
        return Ok(());
    }

    let mut table = Table::new();
    table.set_titles(row!["Class", "Cause"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for cause in &diagnosis.causes {
        table.add_row(row![cause.constraint_class().to_string(), cause.to_string()]);
    }
    table.print(writer)?;
    Ok(())
}

/// Write the text report of a solve outcome.
pub fn write_report(
    writer: &mut impl Write,
    catalog: &Catalog,
    outcome: &BlendOutcome,
) -> Result<()> {
    let allocation = match outcome {
        BlendOutcome::Optimal(allocation) => allocation,
        BlendOutcome::Infeasible(diagnosis) => return write_infeasibility(writer, diagnosis),
        BlendOutcome::Unbounded => {
            writeln!(writer, "Status: UNBOUNDED")?;
            return Ok(());
        }
    };

    writeln!(writer, "Status: OPTIMAL")?;
    writeln!(writer, "Total cost: {:.2}", allocation.total_cost())?;

    for profile in mixture_profiles(catalog, allocation) {
        writeln!(
            writer,
            "\n{}: {:.2} kg, cost {:.2}",
            profile.mixture, profile.total_kg, profile.cost
        )?;

        let mut resources = Table::new();
        resources.set_titles(row!["Resource", "kg", "Cost"]);
        resources.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for share in profile.resources.iter().filter(|share| share.kg > 0.0) {
            resources.add_row(row![
                share.resource,
                r->format!("{:.2}", share.kg),
                r->format!("{:.2}", share.cost),
            ]);
        }
        resources.print(writer)?;

        let mut nutrients = Table::new();
        nutrients.set_titles(row!["Nutrient", "%", "Min %", "Max %", ""]);
        nutrients.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for share in &profile.nutrients {
            let (min, max) = match share.bounds {
                Some(bounds) => (
                    format!("{:.2}", bounds.min_pct),
                    format!("{:.2}", bounds.max_pct),
                ),
                None => ("-".to_string(), "-".to_string()),
            };
            nutrients.add_row(row![
                share.nutrient,
                r->format!("{:.2}", share.pct),
                r->min,
                r->max,
                if share.within_band() { "" } else { "!" },
            ]);
        }
        nutrients.add_row(row![
            "(residual)",
            r->format!("{:.2}", profile.residual_pct),
            "",
            "",
            "",
        ]);
        nutrients.print(writer)?;
    }

    Ok(())
}

/// Write the allocation as `mixture,resource,kg,cost` rows, zeros included.
pub fn write_csv(
    writer: &mut impl Write,
    catalog: &Catalog,
    allocation: &Allocation,
) -> Result<()> {
    writeln!(writer, "mixture,resource,kg,cost")?;
    for (mixture, resource, kg) in allocation.iter() {
        let cost_per_kg = catalog.resource(resource).map_or(0.0, |r| r.cost_per_kg);
        writeln!(
            writer,
            "{},{},{},{}",
            csv_field(mixture),
            csv_field(resource),
            kg,
            kg * cost_per_kg
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JsonReport<'a> {
    Optimal {
        total_cost: f64,
        allocation: &'a Allocation,
        profiles: Vec<MixtureProfile>,
    },
    Infeasible {
        causes: Vec<JsonCause>,
    },
    Unbounded,
}

#[derive(Serialize)]
struct JsonCause {
    class: String,
    message: String,
}

/// Write the outcome as a JSON document with full precision values.
pub fn write_json(
    writer: &mut impl Write,
    catalog: &Catalog,
    outcome: &BlendOutcome,
) -> Result<()> {
    let report = match outcome {
        BlendOutcome::Optimal(allocation) => JsonReport::Optimal {
            total_cost: allocation.total_cost(),
            allocation,
            profiles: mixture_profiles(catalog, allocation),
        },
        BlendOutcome::Infeasible(diagnosis) => JsonReport::Infeasible {
            causes: diagnosis
                .causes
                .iter()
                .map(|cause| JsonCause {
                    class: cause.constraint_class().to_string(),
                    message: cause.to_string(),
                })
                .collect(),
        },
        BlendOutcome::Unbounded => JsonReport::Unbounded,
    };

    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
