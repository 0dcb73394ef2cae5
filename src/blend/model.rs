//! Blend model construction, solving and infeasibility diagnosis.
//!
//! The model is assembled by iterating over the catalog, so nothing here knows
//! any mixture, resource or nutrient by name. Constraints are added in three
//! classes, in this order:
//!
//! 1. supply cap per resource: `Σ_m x[m,r] <= available_kg[r]`
//! 2. mass balance per mixture: `Σ_r x[m,r] == target_mass_kg[m]`
//! 3. nutrient band per (mixture, nutrient):
//!    `min_pct·target/100 <= Σ_r x[m,r]·comp[r,n]/100 <= max_pct·target/100`
//!
//! and the objective is `min Σ_{m,r} x[m,r]·cost_per_kg[r]`.

use std::fmt;

use itertools::{Itertools, MinMaxResult};
use log::{debug, info, warn};
use serde::Serialize;

use crate::blend::Allocation;
use crate::catalog::Catalog;
use crate::lp_solver::*;
use crate::{BlendError, SolverFailure, constraint, lp_model_builder};

/// Percentage slack used when comparing bands against compositions
const PCT_TOLERANCE: f64 = 1e-9;

/// The three families of constraints in a blend model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstraintClass {
    SupplyCap,
    MassBalance,
    NutrientBand,
}

impl fmt::Display for ConstraintClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintClass::SupplyCap => write!(f, "supply cap"),
            ConstraintClass::MassBalance => write!(f, "mass balance"),
            ConstraintClass::NutrientBand => write!(f, "nutrient band"),
        }
    }
}

/// A reason a blend model admits no allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InfeasibilityCause {
    /// The band's minimum lies above its maximum.
    InvertedBand {
        mixture: String,
        nutrient: String,
        min_pct: f64,
        max_pct: f64,
    },
    /// No blend of the resources can land inside the band: a mixture's
    /// nutrient share always lies between the lowest and the highest
    /// composition among the resources.
    NutrientOutOfReach {
        mixture: String,
        nutrient: String,
        min_pct: f64,
        max_pct: f64,
        lowest_pct: f64,
        highest_pct: f64,
    },
    /// The mixture's bands cannot hold together even with unlimited supply.
    BandConflict { mixture: String },
    /// Total supply is smaller than the total mass to produce.
    SupplyShortfall { required_kg: f64, available_kg: f64 },
    /// Every mixture can be blended on its own, but the supply caps cannot
    /// serve all of them at once.
    SupplyContention,
}

impl InfeasibilityCause {
    pub fn constraint_class(&self) -> ConstraintClass {
        match self {
            InfeasibilityCause::InvertedBand { .. }
            | InfeasibilityCause::NutrientOutOfReach { .. }
            | InfeasibilityCause::BandConflict { .. } => ConstraintClass::NutrientBand,
            InfeasibilityCause::SupplyShortfall { .. } | InfeasibilityCause::SupplyContention => {
                ConstraintClass::SupplyCap
            }
        }
    }
}

impl fmt::Display for InfeasibilityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibilityCause::InvertedBand {
                mixture,
                nutrient,
                min_pct,
                max_pct,
            } => write!(
                f,
                "{mixture}/{nutrient}: minimum {min_pct}% exceeds maximum {max_pct}%"
            ),
            InfeasibilityCause::NutrientOutOfReach {
                mixture,
                nutrient,
                min_pct,
                max_pct,
                lowest_pct,
                highest_pct,
            } => write!(
                f,
                "{mixture}/{nutrient}: band [{min_pct}%, {max_pct}%] is outside the \
                 reachable range [{lowest_pct}%, {highest_pct}%]"
            ),
            InfeasibilityCause::BandConflict { mixture } => write!(
                f,
                "{mixture}: nutrient bands conflict even with unlimited supply"
            ),
            InfeasibilityCause::SupplyShortfall {
                required_kg,
                available_kg,
            } => write!(
                f,
                "total supply {available_kg} kg is below the {required_kg} kg to produce"
            ),
            InfeasibilityCause::SupplyContention => write!(
                f,
                "each mixture is feasible alone but supply cannot serve all of them"
            ),
        }
    }
}

/// Diagnosis attached to an infeasible outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Infeasibility {
    pub causes: Vec<InfeasibilityCause>,
}

impl Infeasibility {
    /// No cause could be isolated.
    pub fn is_undetermined(&self) -> bool {
        self.causes.is_empty()
    }

    /// Constraint classes involved, without repeats, in order of appearance.
    pub fn classes(&self) -> Vec<ConstraintClass> {
        self.causes
            .iter()
            .map(InfeasibilityCause::constraint_class)
            .unique()
            .collect()
    }
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.causes.is_empty() {
            return write!(f, "no single constraint class could be isolated");
        }
        write!(
            f,
            "{}",
            self.causes
                .iter()
                .map(|cause| format!("[{}] {}", cause.constraint_class(), cause))
                .join("; ")
        )
    }
}

/// Result of a blend solve that reached a verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendOutcome {
    Optimal(Allocation),
    Infeasible(Infeasibility),
    Unbounded,
}

impl BlendOutcome {
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            BlendOutcome::Optimal(allocation) => Some(allocation),
            _ => None,
        }
    }
}

/// Size of the model built from a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModelSummary {
    pub variables: usize,
    pub supply_caps: usize,
    pub mass_balances: usize,
    pub nutrient_bands: usize,
}

impl ModelSummary {
    pub fn constraints(&self) -> usize {
        self.supply_caps + self.mass_balances + self.nutrient_bands
    }

    pub fn count(&self, class: ConstraintClass) -> usize {
        match class {
            ConstraintClass::SupplyCap => self.supply_caps,
            ConstraintClass::MassBalance => self.mass_balances,
            ConstraintClass::NutrientBand => self.nutrient_bands,
        }
    }
}

/// Which part of the catalog goes into a model.
#[derive(Debug, Clone)]
struct Scope {
    /// Indices into `catalog.mixtures`
    mixtures: Vec<usize>,
    supply_caps: bool,
}

impl Scope {
    fn full(catalog: &Catalog) -> Self {
        Self {
            mixtures: (0..catalog.mixtures.len()).collect(),
            supply_caps: true,
        }
    }

    fn single_uncapped(mixture: usize) -> Self {
        Self {
            mixtures: vec![mixture],
            supply_caps: false,
        }
    }
}

/// Allocation variables, `vars[k][r]` for the k-th mixture of the scope.
type AllocationVars<Brand> = Vec<Vec<VariableId<Brand>>>;

/// `Σ coefficient·x`, leaving out zero coefficients so rows stay sparse.
fn weighted<Brand>(
    terms: impl IntoIterator<Item = (f64, VariableId<Brand>)>,
) -> LinearExpression<Brand> {
    terms
        .into_iter()
        .filter(|&(coefficient, _)| coefficient != 0.0)
        .fold(LinearExpression::new(0.0), |expr, (coefficient, x)| {
            expr + coefficient * x
        })
}

fn assemble<Brand>(
    builder: &mut LPModelBuilder<Brand>,
    catalog: &Catalog,
    scope: &Scope,
) -> (AllocationVars<Brand>, ModelSummary) {
    let mut summary = ModelSummary::default();

    let mut vars: AllocationVars<Brand> = Vec::with_capacity(scope.mixtures.len());
    for &m in &scope.mixtures {
        let mixture = &catalog.mixtures[m];
        let row = catalog
            .resources
            .iter()
            .map(|resource| {
                builder.add_variable(
                    format!("x[{},{}]", mixture.name, resource.name),
                    0.0,
                    f64::INFINITY,
                )
            })
            .collect();
        vars.push(row);
    }
    summary.variables = builder.num_variables();

    if scope.supply_caps {
        for (r, resource) in catalog.resources.iter().enumerate() {
            let used: LinearExpression<_> = vars.iter().map(|row| row[r]).sum();
            builder.add_constraint(constraint!(
                format!("supply[{}]", resource.name),
                (used) <= resource.available_kg
            ));
            summary.supply_caps += 1;
        }
    }

    for (row, &m) in vars.iter().zip(&scope.mixtures) {
        let mixture = &catalog.mixtures[m];
        let mass: LinearExpression<_> = row.iter().copied().sum();
        builder.add_constraint(constraint!(
            format!("mass[{}]", mixture.name),
            (mass) == mixture.target_mass_kg
        ));
        summary.mass_balances += 1;
    }

    for (row, &m) in vars.iter().zip(&scope.mixtures) {
        let mixture = &catalog.mixtures[m];
        for nutrient in &catalog.nutrients {
            let Some(bounds) = mixture.bounds_for(nutrient) else {
                continue;
            };
            let (min_kg, max_kg) = bounds.mass_range_kg(mixture.target_mass_kg);
            let contribution = weighted(
                catalog
                    .resources
                    .iter()
                    .zip(row)
                    .map(|(resource, &x)| (resource.composition_pct(nutrient) / 100.0, x)),
            );

            builder.add_constraint(constraint!(
                format!("band_min[{},{}]", mixture.name, nutrient),
                (contribution.clone()) >= min_kg
            ));
            builder.add_constraint(constraint!(
                format!("band_max[{},{}]", mixture.name, nutrient),
                (contribution) <= max_kg
            ));
            summary.nutrient_bands += 2;
        }
    }

    let cost = weighted(vars.iter().flat_map(|row| {
        catalog
            .resources
            .iter()
            .zip(row)
            .map(|(resource, &x)| (resource.cost_per_kg, x))
    }));
    builder.set_objective(cost, OptimizationSense::Minimize);

    (vars, summary)
}

/// Size of the model [`solve`] would build, after validating the catalog.
pub fn model_summary(catalog: &Catalog) -> Result<ModelSummary, BlendError> {
    catalog.validate()?;
    let mut builder = lp_model_builder!(BlendModel);
    let (_, summary) = assemble(&mut builder, catalog, &Scope::full(catalog));
    Ok(summary)
}

/// Find the least-cost allocation of the catalog's resources to its mixtures.
///
/// The catalog is validated before any model is built; a malformed catalog
/// yields [`BlendError::InvalidModel`]. Infeasible and unbounded models are
/// outcomes, and an infeasible outcome carries a diagnosis naming the
/// constraint class at fault when one can be isolated.
pub fn solve(catalog: &Catalog, options: &SolverOptions) -> Result<BlendOutcome, BlendError> {
    catalog.validate()?;

    let mut builder = lp_model_builder!(BlendModel);
    let (vars, _) = assemble(&mut builder, catalog, &Scope::full(catalog));
    debug!(
        "blend model: {} variables, {} constraints",
        builder.num_variables(),
        builder.num_constraints()
    );

    let solution = builder
        .solve(options)
        .map_err(|err| SolverFailure::Backend(format!("{err:#}")))?;

    outcome(
        solution.status,
        || {
            let quantities_kg = vars
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|&x| solution.get_value(x).unwrap_or(0.0).max(0.0))
                        .collect()
                })
                .collect();
            Allocation::new(
                catalog.mixtures.iter().map(|m| m.name.clone()).collect(),
                catalog.resources.iter().map(|r| r.name.clone()).collect(),
                quantities_kg,
                solution.objective_value,
            )
        },
        || diagnose(catalog, options),
    )
}

/// Map a backend status to a blend outcome.
///
/// `allocation` is only read back on an optimal status and `diagnosis` only
/// runs on an infeasible one.
pub(crate) fn outcome(
    status: OptimizationStatus,
    allocation: impl FnOnce() -> Allocation,
    diagnosis: impl FnOnce() -> Infeasibility,
) -> Result<BlendOutcome, BlendError> {
    match status {
        OptimizationStatus::Optimal => {
            let allocation = allocation();
            info!("optimal blend found, total cost {:.2}", allocation.total_cost());
            Ok(BlendOutcome::Optimal(allocation))
        }
        OptimizationStatus::Infeasible | OptimizationStatus::InfeasibleOrUnbounded => {
            let diagnosis = diagnosis();
            warn!("blend model is infeasible: {}", diagnosis);
            Ok(BlendOutcome::Infeasible(diagnosis))
        }
        OptimizationStatus::Unbounded => {
            warn!("solver reported an unbounded blend model");
            Ok(BlendOutcome::Unbounded)
        }
        OptimizationStatus::TimeLimit => Err(SolverFailure::TimeLimit.into()),
        OptimizationStatus::Other(status) => {
            Err(SolverFailure::UnrecognisedStatus(status.to_string()).into())
        }
    }
}

/// Causes visible from the catalog alone, without solving anything.
fn static_causes(catalog: &Catalog) -> Vec<InfeasibilityCause> {
    let mut causes = Vec::new();

    for mixture in &catalog.mixtures {
        for nutrient in &catalog.nutrients {
            let Some(bounds) = mixture.bounds_for(nutrient) else {
                continue;
            };
            if bounds.is_inverted() {
                causes.push(InfeasibilityCause::InvertedBand {
                    mixture: mixture.name.clone(),
                    nutrient: nutrient.clone(),
                    min_pct: bounds.min_pct,
                    max_pct: bounds.max_pct,
                });
                continue;
            }

            let (lowest_pct, highest_pct) = match catalog
                .resources
                .iter()
                .map(|r| r.composition_pct(nutrient))
                .minmax_by(f64::total_cmp)
            {
                MinMaxResult::NoElements => continue,
                MinMaxResult::OneElement(pct) => (pct, pct),
                MinMaxResult::MinMax(lo, hi) => (lo, hi),
            };
            if highest_pct < bounds.min_pct - PCT_TOLERANCE
                || lowest_pct > bounds.max_pct + PCT_TOLERANCE
            {
                causes.push(InfeasibilityCause::NutrientOutOfReach {
                    mixture: mixture.name.clone(),
                    nutrient: nutrient.clone(),
                    min_pct: bounds.min_pct,
                    max_pct: bounds.max_pct,
                    lowest_pct,
                    highest_pct,
                });
            }
        }
    }

    let required_kg = catalog.total_target_kg();
    let available_kg = catalog.total_available_kg();
    if available_kg < required_kg {
        causes.push(InfeasibilityCause::SupplyShortfall {
            required_kg,
            available_kg,
        });
    }

    causes
}

/// Whether a status proves the model admits an allocation.
/// `None` when the solver gave no verdict.
pub(crate) fn feasibility(status: OptimizationStatus) -> Option<bool> {
    match status {
        OptimizationStatus::Optimal | OptimizationStatus::Unbounded => Some(true),
        OptimizationStatus::Infeasible | OptimizationStatus::InfeasibleOrUnbounded => Some(false),
        OptimizationStatus::TimeLimit | OptimizationStatus::Other(_) => None,
    }
}

/// Solve the m-th mixture alone with the supply caps lifted.
fn isolated_feasibility(catalog: &Catalog, m: usize, options: &SolverOptions) -> Option<bool> {
    let mut builder = lp_model_builder!(IsolatedModel);
    assemble(&mut builder, catalog, &Scope::single_uncapped(m));

    match builder.solve(options) {
        Ok(solution) => {
            let verdict = feasibility(solution.status);
            if verdict.is_none() {
                warn!(
                    "no verdict for {} on its own: {:?}",
                    catalog.mixtures[m].name, solution.status
                );
            }
            verdict
        }
        Err(err) => {
            warn!(
                "solving {} on its own failed: {err:#}",
                catalog.mixtures[m].name
            );
            None
        }
    }
}

/// Work out which constraint class makes the catalog infeasible.
///
/// Static checks come first. Then each mixture is solved on its own with the
/// supply caps lifted: a mixture that is still infeasible has conflicting
/// bands. When every mixture passes, the supply caps are to blame.
pub fn diagnose(catalog: &Catalog, options: &SolverOptions) -> Infeasibility {
    diagnose_with(catalog, |m| isolated_feasibility(catalog, m, options))
}

/// [`diagnose`] with the per-mixture feasibility check supplied by the caller.
pub(crate) fn diagnose_with(
    catalog: &Catalog,
    mut feasible_alone: impl FnMut(usize) -> Option<bool>,
) -> Infeasibility {
    let mut causes = static_causes(catalog);

    let flagged: Vec<&str> = causes
        .iter()
        .filter_map(|cause| match cause {
            InfeasibilityCause::InvertedBand { mixture, .. }
            | InfeasibilityCause::NutrientOutOfReach { mixture, .. } => Some(mixture.as_str()),
            _ => None,
        })
        .collect();

    let mut all_mixtures_feasible = flagged.is_empty();
    let mut conflicts = Vec::new();
    for (m, mixture) in catalog.mixtures.iter().enumerate() {
        if flagged.contains(&mixture.name.as_str()) {
            continue;
        }
        match feasible_alone(m) {
            Some(true) => {}
            Some(false) => {
                all_mixtures_feasible = false;
                conflicts.push(InfeasibilityCause::BandConflict {
                    mixture: mixture.name.clone(),
                });
            }
            None => all_mixtures_feasible = false,
        }
    }
    causes.extend(conflicts);

    let shortfall = causes
        .iter()
        .any(|cause| matches!(cause, InfeasibilityCause::SupplyShortfall { .. }));
    if all_mixtures_feasible && !shortfall {
        causes.push(InfeasibilityCause::SupplyContention);
    }

    Infeasibility { causes }
}
