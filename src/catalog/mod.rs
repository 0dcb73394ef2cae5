//! Static problem data for blend optimisation.
//!
//! A [`Catalog`] bundles the three inputs of a blend problem:
//!
//! - **nutrients**: the tracked constituents, identified by name;
//! - **resources**: purchasable raw materials with a cost, a supply cap and a
//!   composition (percentage of the resource's mass that is each nutrient);
//! - **mixtures**: the products to blend, each with a target mass and a
//!   `[min_pct, max_pct]` band per nutrient.
//!
//! Catalogs are plain data. They are usually loaded from JSON with
//! [`crate::read_catalog`] or taken from [`Catalog::reference`], and must pass
//! [`Catalog::validate`] before a model is built from them.
//!
//! # Example
//!
//! ```
//! use blend::catalog::Catalog;
//!
//! let catalog = Catalog::reference();
//! catalog.validate().expect("reference catalog is well formed");
//! assert_eq!(catalog.mixtures.len(), 4);
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod commands;
mod reference;

/// Tolerance on a composition summing past 100 %.
const COMPOSITION_SLACK_PCT: f64 = 1e-9;

/// A purchasable raw material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub cost_per_kg: f64,
    pub available_kg: f64,
    /// Percentage of this resource's mass that is each nutrient
    pub composition: BTreeMap<String, f64>,
}

impl Resource {
    /// Percentage of `nutrient` in this resource. Zero when absent.
    pub fn composition_pct(&self, nutrient: &str) -> f64 {
        self.composition.get(nutrient).copied().unwrap_or(0.0)
    }

    /// Share of the resource mass carried by no tracked nutrient
    pub fn residual_pct(&self) -> f64 {
        100.0 - self.composition.values().sum::<f64>()
    }
}

/// Inclusive percentage band for one nutrient in one mixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientBounds {
    pub min_pct: f64,
    pub max_pct: f64,
}

impl NutrientBounds {
    pub fn new(min_pct: f64, max_pct: f64) -> Self {
        Self { min_pct, max_pct }
    }

    /// Nutrient mass range, in kg, for a mixture of `mass_kg`
    pub fn mass_range_kg(&self, mass_kg: f64) -> (f64, f64) {
        (
            self.min_pct / 100.0 * mass_kg,
            self.max_pct / 100.0 * mass_kg,
        )
    }

    pub fn is_inverted(&self) -> bool {
        self.min_pct > self.max_pct
    }

    pub fn contains(&self, pct: f64, tolerance: f64) -> bool {
        pct >= self.min_pct - tolerance && pct <= self.max_pct + tolerance
    }
}

/// A product to blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mixture {
    pub name: String,
    pub target_mass_kg: f64,
    pub bounds: BTreeMap<String, NutrientBounds>,
}

impl Mixture {
    pub fn bounds_for(&self, nutrient: &str) -> Option<NutrientBounds> {
        self.bounds.get(nutrient).copied()
    }
}

/// Nutrients, resources and mixtures of one blend problem.
///
/// Declaration order is significant: variables, constraints and reports follow
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub nutrients: Vec<String>,
    pub resources: Vec<Resource>,
    pub mixtures: Vec<Mixture>,
}

/// Why a catalog cannot be turned into a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog declares no {0}")]
    Empty(&'static str),

    #[error("{kind} '{name}' is declared more than once")]
    Duplicate { kind: &'static str, name: String },

    #[error("resource '{resource}' has no composition entry for nutrient '{nutrient}'")]
    MissingComposition { resource: String, nutrient: String },

    #[error("resource '{resource}' lists undeclared nutrient '{nutrient}' in its composition")]
    UnknownCompositionNutrient { resource: String, nutrient: String },

    #[error("mixture '{mixture}' has no bounds for nutrient '{nutrient}'")]
    MissingBounds { mixture: String, nutrient: String },

    #[error("mixture '{mixture}' bounds undeclared nutrient '{nutrient}'")]
    UnknownBoundsNutrient { mixture: String, nutrient: String },

    #[error("{field} of '{owner}' is out of range: {value}")]
    InvalidValue {
        field: &'static str,
        owner: String,
        value: f64,
    },

    #[error("composition of resource '{resource}' adds up to {total_pct}%, above 100%")]
    CompositionOverflow { resource: String, total_pct: f64 },
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CatalogError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_value(
    field: &'static str,
    owner: &str,
    value: f64,
    valid: impl Fn(f64) -> bool,
) -> Result<(), CatalogError> {
    if value.is_finite() && valid(value) {
        Ok(())
    } else {
        Err(CatalogError::InvalidValue {
            field,
            owner: owner.to_string(),
            value,
        })
    }
}

fn is_percentage(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

impl Catalog {
    pub fn new(nutrients: Vec<String>, resources: Vec<Resource>, mixtures: Vec<Mixture>) -> Self {
        Self {
            nutrients,
            resources,
            mixtures,
        }
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn mixture(&self, name: &str) -> Option<&Mixture> {
        self.mixtures.iter().find(|m| m.name == name)
    }

    pub fn resource_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.name == name)
    }

    pub fn mixture_mut(&mut self, name: &str) -> Option<&mut Mixture> {
        self.mixtures.iter_mut().find(|m| m.name == name)
    }

    pub fn total_available_kg(&self) -> f64 {
        self.resources.iter().map(|r| r.available_kg).sum()
    }

    pub fn total_target_kg(&self) -> f64 {
        self.mixtures.iter().map(|m| m.target_mass_kg).sum()
    }

    /// Check that the catalog is complete and every number is in range.
    ///
    /// An inverted band (`min_pct > max_pct`) passes: it is a well-formed but
    /// unsatisfiable model, reported as infeasible by the solver.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.nutrients.is_empty() {
            return Err(CatalogError::Empty("nutrients"));
        }
        if self.resources.is_empty() {
            return Err(CatalogError::Empty("resources"));
        }
        if self.mixtures.is_empty() {
            return Err(CatalogError::Empty("mixtures"));
        }

        check_unique("nutrient", self.nutrients.iter().map(String::as_str))?;
        check_unique("resource", self.resources.iter().map(|r| r.name.as_str()))?;
        check_unique("mixture", self.mixtures.iter().map(|m| m.name.as_str()))?;

        let declared: HashSet<&str> = self.nutrients.iter().map(String::as_str).collect();

        for resource in &self.resources {
            check_value("cost_per_kg", &resource.name, resource.cost_per_kg, |v| {
                v > 0.0
            })?;
            check_value("available_kg", &resource.name, resource.available_kg, |v| {
                v >= 0.0
            })?;

            if let Some(unknown) = resource
                .composition
                .keys()
                .find(|n| !declared.contains(n.as_str()))
            {
                return Err(CatalogError::UnknownCompositionNutrient {
                    resource: resource.name.clone(),
                    nutrient: unknown.clone(),
                });
            }
            for nutrient in &self.nutrients {
                let pct = resource.composition.get(nutrient).ok_or_else(|| {
                    CatalogError::MissingComposition {
                        resource: resource.name.clone(),
                        nutrient: nutrient.clone(),
                    }
                })?;
                check_value("composition", &resource.name, *pct, is_percentage)?;
            }

            let total_pct: f64 = resource.composition.values().sum();
            if total_pct > 100.0 + COMPOSITION_SLACK_PCT {
                return Err(CatalogError::CompositionOverflow {
                    resource: resource.name.clone(),
                    total_pct,
                });
            }
        }

        for mixture in &self.mixtures {
            check_value(
                "target_mass_kg",
                &mixture.name,
                mixture.target_mass_kg,
                |v| v > 0.0,
            )?;

            if let Some(unknown) = mixture
                .bounds
                .keys()
                .find(|n| !declared.contains(n.as_str()))
            {
                return Err(CatalogError::UnknownBoundsNutrient {
                    mixture: mixture.name.clone(),
                    nutrient: unknown.clone(),
                });
            }
            for nutrient in &self.nutrients {
                let bounds =
                    mixture
                        .bounds
                        .get(nutrient)
                        .ok_or_else(|| CatalogError::MissingBounds {
                            mixture: mixture.name.clone(),
                            nutrient: nutrient.clone(),
                        })?;
                check_value("min_pct", &mixture.name, bounds.min_pct, is_percentage)?;
                check_value("max_pct", &mixture.name, bounds.max_pct, is_percentage)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalog_is_valid() {
        let catalog = Catalog::reference();
        assert_eq!(catalog.validate(), Ok(()));
        assert_eq!(catalog.nutrients.len(), 5);
        assert_eq!(catalog.resources.len(), 5);
        assert_eq!(catalog.total_target_kg(), 1200.0);
        assert_eq!(catalog.total_available_kg(), 1301.0);
    }

    #[test]
    fn test_reference_lookup() {
        let catalog = Catalog::reference();
        let aminoacids = catalog.resource("Aminoácidos").expect("declared");
        assert_eq!(aminoacids.composition_pct("Peptona"), 48.0);
        assert_eq!(aminoacids.composition_pct("Fosfato"), 52.0);
        assert_eq!(aminoacids.residual_pct(), 0.0);

        let lb = catalog.mixture("LB").expect("declared");
        assert_eq!(lb.bounds_for("NaCl"), Some(NutrientBounds::new(3.0, 10.0)));
        assert!(catalog.mixture("YPD").is_none());
    }

    #[test]
    fn test_bounds_mass_range() {
        let (lo, hi) = NutrientBounds::new(8.4, 19.0).mass_range_kg(300.0);
        assert!((lo - 25.2).abs() < 1e-9);
        assert!((hi - 57.0).abs() < 1e-9);
        assert!(NutrientBounds::new(5.0, 1.0).is_inverted());
        assert!(NutrientBounds::new(0.0, 0.0).contains(1e-9, 1e-6));
    }

    #[test]
    fn test_empty_sections_rejected() {
        let mut catalog = Catalog::reference();
        catalog.mixtures.clear();
        assert_eq!(catalog.validate(), Err(CatalogError::Empty("mixtures")));

        let mut catalog = Catalog::reference();
        catalog.nutrients.clear();
        assert_eq!(catalog.validate(), Err(CatalogError::Empty("nutrients")));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut catalog = Catalog::reference();
        let copy = catalog.resources[0].clone();
        catalog.resources.push(copy);

        assert_eq!(
            catalog.validate(),
            Err(CatalogError::Duplicate {
                kind: "resource",
                name: "Fosfato".into()
            })
        );
    }

    #[test]
    fn test_missing_composition_rejected() {
        let mut catalog = Catalog::reference();
        catalog
            .resource_mut("Agar")
            .unwrap()
            .composition
            .remove("NaCl");

        assert_eq!(
            catalog.validate(),
            Err(CatalogError::MissingComposition {
                resource: "Agar".into(),
                nutrient: "NaCl".into()
            })
        );
    }

    #[test]
    fn test_dangling_nutrient_rejected() {
        let mut catalog = Catalog::reference();
        catalog
            .resource_mut("Agar")
            .unwrap()
            .composition
            .insert("Glucosa".into(), 1.0);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::UnknownCompositionNutrient { .. })
        ));

        let mut catalog = Catalog::reference();
        catalog
            .mixture_mut("SDA")
            .unwrap()
            .bounds
            .insert("Glucosa".into(), NutrientBounds::new(0.0, 40.0));
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::UnknownBoundsNutrient { .. })
        ));
    }

    #[test]
    fn test_missing_bounds_rejected() {
        let mut catalog = Catalog::reference();
        catalog.mixture_mut("MRS").unwrap().bounds.remove("Agar");

        assert_eq!(
            catalog.validate(),
            Err(CatalogError::MissingBounds {
                mixture: "MRS".into(),
                nutrient: "Agar".into()
            })
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut catalog = Catalog::reference();
        catalog.resource_mut("Agar").unwrap().cost_per_kg = 0.0;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidValue {
                field: "cost_per_kg",
                ..
            })
        ));

        let mut catalog = Catalog::reference();
        catalog.resource_mut("Agar").unwrap().available_kg = f64::NAN;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidValue {
                field: "available_kg",
                ..
            })
        ));

        let mut catalog = Catalog::reference();
        catalog.mixture_mut("LB").unwrap().target_mass_kg = -300.0;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidValue {
                field: "target_mass_kg",
                ..
            })
        ));

        let mut catalog = Catalog::reference();
        catalog
            .mixture_mut("LB")
            .unwrap()
            .bounds
            .insert("Agar".into(), NutrientBounds::new(8.4, 119.0));
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidValue {
                field: "max_pct",
                ..
            })
        ));
    }

    #[test]
    fn test_composition_overflow_rejected() {
        let mut catalog = Catalog::reference();
        catalog
            .resource_mut("Agar")
            .unwrap()
            .composition
            .insert("Peptona".into(), 20.0);

        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::CompositionOverflow { ref resource, .. }) if resource == "Agar"
        ));
    }

    #[test]
    fn test_inverted_band_passes_validation() {
        let mut catalog = Catalog::reference();
        catalog
            .mixture_mut("TSA")
            .unwrap()
            .bounds
            .insert("Peptona".into(), NutrientBounds::new(50.0, 46.0));

        assert_eq!(catalog.validate(), Ok(()));
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let catalog = Catalog::reference();
        let text = serde_json::to_string_pretty(&catalog).unwrap();
        let parsed: Catalog = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, catalog);
        let names: Vec<_> = parsed.mixtures.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["LB", "TSA", "MRS", "SDA"]);
    }
}
