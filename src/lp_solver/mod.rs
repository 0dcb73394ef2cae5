//! Linear Programming (LP) solver abstraction layer
//!
//! This module provides a narrow, solver-agnostic model builder. Blend models are
//! assembled through four operations (`add_variable`, `add_constraint`,
//! `set_objective` and `solve`) and handed to whichever backend is compiled in:
//! COIN-OR CBC (default) or Gurobi.
//!
//! # Type Safety with Branded Types
//!
//! All core types (`VariableId`, `LinearExpression`, `Constraint`, `LPModelBuilder`)
//! use a generic `Brand` type parameter:
//!
//! - Variables from one builder cannot be used with another builder
//! - Constraints only accept variables from their own builder
//! - The brand is a zero-sized phantom type, so there is no runtime overhead
//!
//! Use the `lp_model_builder!()` macro to create builders with unique brands:
//!
//! ```rust
//! use blend::constraint;
//! use blend::lp_model_builder;
//!
//! let mut builder1 = lp_model_builder!();
//! let mut builder2 = lp_model_builder!();
//!
//! let x = builder1.add_variable("x", 0.0, 10.0);
//! let _y = builder2.add_variable("y", 0.0, 10.0);
//!
//! builder1.add_constraint(constraint!((x) <= 5.0));
//!
//! // This would NOT compile (type error):
//! // builder1.add_constraint(constraint!((_y) <= 5.0));
//! ```
//!
//! # Building LP Models
//!
//! ```rust,no_run
//! use blend::constraint;
//! use blend::lp_model_builder;
//! use blend::lp_solver::{OptimizationSense, SolverOptions};
//!
//! let mut builder = lp_model_builder!();
//! let x = builder.add_variable("x", 0.0, f64::INFINITY);
//! let y = builder.add_variable("y", 0.0, f64::INFINITY);
//!
//! builder.add_constraint(constraint!("total", (x + y) == 10.0));
//! builder.add_constraint(constraint!((2.0 * x - y) <= 5.0));
//!
//! builder.set_objective(x + 2.0 * y, OptimizationSense::Minimize);
//! let _solution = builder.solve(&SolverOptions::default());
//! ```
//!
//! # Solver Selection
//!
//! The backend is taken from [`SolverOptions::backend`] when set, otherwise from
//! the `BLEND_LP_SOLVER` environment variable:
//! - `"gurobi"` - Use Gurobi (requires `gurobi` feature)
//! - `"coin_cbc"` or `"cbc"` - Use COIN-OR CBC (requires `coin_cbc` feature)
//!
//! If neither is given, the solver defaults to Gurobi if available, otherwise CBC.

use anyhow::Result;
use log::debug;
use std::env;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable consulted when no backend is requested explicitly
pub const SOLVER_ENV_VAR: &str = "BLEND_LP_SOLVER";

/// Constraint sense for linear constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// Less than or equal to (≤)
    LessEqual,
    /// Equal to (=)
    Equal,
    /// Greater than or equal to (≥)
    GreaterEqual,
}

/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationSense {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status of the optimization process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationStatus {
    /// Optimal solution found
    Optimal,
    /// Problem is infeasible (no solution exists)
    Infeasible,
    /// Problem is unbounded
    Unbounded,
    /// Problem is infeasible or unbounded
    InfeasibleOrUnbounded,
    /// The time limit expired before the solver reached a conclusion
    TimeLimit,
    /// Other status (solver-specific)
    Other(&'static str),
}

/// Available LP solver backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    #[cfg(feature = "gurobi")]
    /// Gurobi commercial solver
    Gurobi,
    #[cfg(feature = "coin_cbc")]
    /// Coin CBC open-source solver
    CoinCbc,
}

impl FromStr for SolverBackend {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "gurobi" => {
                #[cfg(feature = "gurobi")]
                return Ok(SolverBackend::Gurobi);
                #[cfg(not(feature = "gurobi"))]
                return Err(anyhow::anyhow!(
                    "Gurobi solver requested but gurobi feature not enabled"
                ));
            }
            "coin_cbc" | "coin-cbc" | "cbc" => {
                #[cfg(feature = "coin_cbc")]
                return Ok(SolverBackend::CoinCbc);
                #[cfg(not(feature = "coin_cbc"))]
                return Err(anyhow::anyhow!(
                    "Coin CBC solver requested but coin_cbc feature not enabled"
                ));
            }
            _ => Err(anyhow::anyhow!(
                "Invalid solver '{}'. Valid options: gurobi, coin_cbc",
                name
            )),
        }
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            #[cfg(feature = "gurobi")]
            SolverBackend::Gurobi => write!(f, "gurobi"),
            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => write!(f, "coin_cbc"),
        }
    }
}

impl SolverBackend {
    /// Get the solver backend from environment variable or use fallback logic
    fn from_env_or_default() -> Result<Self> {
        if let Ok(solver_name) = env::var(SOLVER_ENV_VAR) {
            return solver_name.parse();
        }

        // Fallback logic: prefer gurobi if available, then coin_cbc
        #[cfg(feature = "gurobi")]
        return Ok(SolverBackend::Gurobi);

        #[allow(unreachable_code)]
        #[cfg(feature = "coin_cbc")]
        return Ok(SolverBackend::CoinCbc);

        #[cfg(not(any(feature = "gurobi", feature = "coin_cbc")))]
        Err(anyhow::anyhow!(
            "No LP solver backend available. Please enable a solver feature (e.g., 'gurobi' or 'coin_cbc')"
        ))
    }
}

/// Options forwarded to the solver backend on every solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverOptions {
    /// Backend to use; `None` defers to `BLEND_LP_SOLVER` and the compiled-in default
    pub backend: Option<SolverBackend>,
    /// Wall-clock limit handed to the backend
    pub time_limit: Option<Duration>,
    /// Let the backend print its log to stdout instead of gagging it
    pub show_solver_output: bool,
}

impl SolverOptions {
    fn resolve_backend(&self) -> Result<SolverBackend> {
        match self.backend {
            Some(backend) => Ok(backend),
            None => SolverBackend::from_env_or_default(),
        }
    }
}

/// A linear expression term: coefficient * variable
#[derive(Debug)]
pub struct LinearTerm<Brand> {
    pub coefficient: f64,
    pub variable: VariableId<Brand>,
}

impl<Brand> Clone for LinearTerm<Brand> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Brand> Copy for LinearTerm<Brand> {}

/// A linear expression: sum of terms plus constant
#[derive(Debug)]
pub struct LinearExpression<Brand> {
    pub terms: Vec<LinearTerm<Brand>>,
    pub constant: f64,
}

impl<Brand> Clone for LinearExpression<Brand> {
    fn clone(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            constant: self.constant,
        }
    }
}

impl<Brand> LinearExpression<Brand> {
    /// Create a new linear expression with a constant term
    pub fn new(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// Add a term to the expression
    pub fn add_term(&mut self, coefficient: f64, variable: VariableId<Brand>) {
        self.terms.push(LinearTerm {
            coefficient,
            variable,
        });
    }

    /// Create a linear expression from a single variable
    pub fn from_variable(variable: VariableId<Brand>) -> Self {
        Self {
            terms: vec![LinearTerm {
                coefficient: 1.0,
                variable,
            }],
            constant: 0.0,
        }
    }
}

impl<Brand> From<VariableId<Brand>> for LinearExpression<Brand> {
    fn from(variable: VariableId<Brand>) -> Self {
        Self::from_variable(variable)
    }
}

impl<Brand> std::iter::Sum<VariableId<Brand>> for LinearExpression<Brand> {
    fn sum<I: Iterator<Item = VariableId<Brand>>>(iter: I) -> Self {
        let mut expr = Self::new(0.0);
        for variable in iter {
            expr.add_term(1.0, variable);
        }
        expr
    }
}

/// Unique identifier for a variable in the LP model
///
/// The `Brand` type parameter ensures that variables can only be used with the
/// builder that created them. This is enforced at compile time.
pub struct VariableId<Brand> {
    id: usize,
    _brand: PhantomData<fn() -> Brand>,
}

// Manual trait implementations that don't require Brand to implement anything
impl<Brand> fmt::Debug for VariableId<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableId").field("id", &self.id).finish()
    }
}

impl<Brand> Clone for VariableId<Brand> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Brand> Copy for VariableId<Brand> {}

impl<Brand> PartialEq for VariableId<Brand> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Brand> Eq for VariableId<Brand> {}

impl<Brand> std::hash::Hash for VariableId<Brand> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A linear constraint representation
///
/// ```rust,no_run
/// use blend::constraint;
/// use blend::lp_model_builder;
/// use blend::lp_solver::{Constraint, ConstraintSense};
///
/// let mut builder = lp_model_builder!();
/// let x = builder.add_variable("x", 0.0, 10.0);
/// let y = builder.add_variable("y", 0.0, 10.0);
///
/// let _c = constraint!((x + y) == 10.0);
/// let _c = constraint!("cap", (x + y) <= 10.0);
/// let _c = Constraint::new("cap", x + y, ConstraintSense::Equal, 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct Constraint<Brand> {
    name: Arc<str>,
    expression: LinearExpression<Brand>,
    sense: ConstraintSense,
    rhs: f64,
}

impl<Brand> Constraint<Brand> {
    /// Create a new constraint
    pub fn new(
        name: impl Into<Arc<str>>,
        expression: impl Into<LinearExpression<Brand>>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            sense,
            rhs,
        }
    }
}

/// Variable information stored in the model
#[derive(Debug, Clone)]
struct VariableInfo {
    #[cfg_attr(not(feature = "gurobi"), allow(dead_code))]
    name: Arc<str>,
    lower_bound: f64,
    upper_bound: f64,
}

/// Objective function information
#[derive(Debug, Clone)]
struct ObjectiveInfo<Brand> {
    expression: LinearExpression<Brand>,
    sense: OptimizationSense,
}

/// Result of solving an LP model
#[derive(Debug, Clone)]
pub struct LPSolution<Brand> {
    pub status: OptimizationStatus,
    pub objective_value: f64,
    variable_values: Vec<f64>,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> LPSolution<Brand> {
    /// Get the value of a variable from the solution
    pub fn get_value(&self, var_id: VariableId<Brand>) -> Option<f64> {
        self.variable_values.get(var_id.id).copied()
    }
}

/// Builder for LP models that can work with different backends
///
/// ```rust,no_run
/// use blend::lp_model_builder;
/// use blend::lp_solver::LPModelBuilder;
///
/// struct MyModel;
/// let mut builder1 = LPModelBuilder::<MyModel>::new();
/// let _x = builder1.add_variable("x", 0.0, 10.0);
///
/// let mut _builder2 = lp_model_builder!();
/// ```
pub struct LPModelBuilder<Brand> {
    variables: Vec<VariableInfo>,
    constraints: Vec<Constraint<Brand>>,
    objective: Option<ObjectiveInfo<Brand>>,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> LPModelBuilder<Brand> {
    /// Create a new LP model builder
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            _brand: PhantomData,
        }
    }

    /// Add a continuous variable to the model
    pub fn add_variable(
        &mut self,
        name: impl Into<Arc<str>>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> VariableId<Brand> {
        let var_id = VariableId {
            id: self.variables.len(),
            _brand: PhantomData,
        };
        self.variables.push(VariableInfo {
            name: name.into(),
            lower_bound,
            upper_bound,
        });
        var_id
    }

    /// Add a constraint to the model
    pub fn add_constraint(&mut self, constraint: Constraint<Brand>) {
        self.constraints.push(constraint);
    }

    /// Set the objective function
    pub fn set_objective(
        &mut self,
        expression: impl Into<LinearExpression<Brand>>,
        sense: OptimizationSense,
    ) {
        self.objective = Some(ObjectiveInfo {
            expression: expression.into(),
            sense,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Solve the model using the backend selected by `options`
    pub fn solve(&self, options: &SolverOptions) -> Result<LPSolution<Brand>> {
        let solver = options.resolve_backend()?;
        debug!(
            "solving LP with {}: {} variables, {} constraints, time limit {:?}",
            solver,
            self.variables.len(),
            self.constraints.len(),
            options.time_limit
        );

        match solver {
            #[cfg(feature = "gurobi")]
            SolverBackend::Gurobi => crate::lp_solver::gurobi::solve_gurobi(self, options),

            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => crate::lp_solver::coin_cbc::solve_coin_cbc(self, options),
        }
    }
}

impl<Brand> Default for LPModelBuilder<Brand> {
    fn default() -> Self {
        Self::new()
    }
}

// Macros for convenient syntax
pub mod macros;

// Operator overloading for linear expressions
pub mod ops;

// Silences backend console output while a solve is running
pub mod output_suppression;

#[cfg(feature = "gurobi")]
pub mod gurobi;

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constraint, lp_model_builder};

    #[test]
    fn test_constraint_macro() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);
        let y = builder.add_variable("y", 0.0, 10.0);

        let c = constraint!((x + y) == 10.0);
        assert_eq!(c.sense, ConstraintSense::Equal);
        assert_eq!(c.rhs, 10.0);
        assert_eq!(&*c.name, "");

        let c = constraint!((2.0 * x) <= 5.0);
        assert_eq!(c.sense, ConstraintSense::LessEqual);
        assert_eq!(c.rhs, 5.0);

        let c = constraint!("spread", (x - y) >= 0.0);
        assert_eq!(c.sense, ConstraintSense::GreaterEqual);
        assert_eq!(c.rhs, 0.0);
        assert_eq!(&*c.name, "spread");
    }

    #[test]
    fn test_constant_moves_into_expression() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);

        let c = constraint!("shifted", (x + 5.0) == 10.0);
        assert_eq!(c.expression.terms.len(), 1);
        assert_eq!(c.expression.constant, 5.0);
        assert_eq!(c.rhs, 10.0);
    }

    #[test]
    fn test_builder_bookkeeping() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x[LB,Agar]", 0.0, f64::INFINITY);
        let y = builder.add_variable("y", 0.0, f64::INFINITY);

        builder.add_constraint(constraint!("mass[LB]", (x + y) == 300.0));

        assert_eq!(builder.num_variables(), 2);
        assert_eq!(builder.num_constraints(), 1);
        assert_eq!(&*builder.variables[0].name, "x[LB,Agar]");
        assert_eq!(&*builder.constraints[0].name, "mass[LB]");
    }

    #[test]
    fn test_sum_of_variables() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);
        let y = builder.add_variable("y", 0.0, 10.0);
        let z = builder.add_variable("z", 0.0, 10.0);

        let total: LinearExpression<_> = [x, y, z].into_iter().sum();
        assert_eq!(total.terms.len(), 3);
        assert_eq!(total.terms[2].variable, z);
        assert!(total.terms.iter().all(|t| t.coefficient == 1.0));
        assert_eq!(total.constant, 0.0);

        let empty: LinearExpression<_> = [x, y, z].into_iter().take(0).sum();
        assert!(empty.terms.is_empty());
    }

    #[test]
    fn test_add_variable_to_linear_expression() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);
        let y = builder.add_variable("y", 0.0, 10.0);

        let expr = 2.0 * x + 5.0;
        assert_eq!(expr.terms.len(), 1);
        assert_eq!(expr.terms[0].coefficient, 2.0);
        assert_eq!(expr.constant, 5.0);

        let result = expr + y;
        assert_eq!(result.terms.len(), 2);
        assert_eq!(result.constant, 5.0);
        assert_eq!(result.terms[1].coefficient, 1.0);
        assert_eq!(result.terms[1].variable, y);
    }

    #[test]
    fn test_backend_names() {
        assert!("simplex".parse::<SolverBackend>().is_err());
        #[cfg(feature = "coin_cbc")]
        {
            assert_eq!(
                "CBC".parse::<SolverBackend>().ok(),
                Some(SolverBackend::CoinCbc)
            );
            assert_eq!(SolverBackend::CoinCbc.to_string(), "coin_cbc");
        }
    }

    #[cfg(feature = "coin_cbc")]
    #[test]
    fn test_solve_small_lp() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, f64::INFINITY);
        let y = builder.add_variable("y", 0.0, f64::INFINITY);

        builder.add_constraint(constraint!((x + y) == 10.0));
        builder.add_constraint(constraint!((x) <= 4.0));
        builder.set_objective(3.0 * x + 5.0 * y, OptimizationSense::Minimize);

        let options = SolverOptions {
            backend: Some(SolverBackend::CoinCbc),
            ..SolverOptions::default()
        };
        let solution = builder.solve(&options).expect("CBC should solve");

        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.get_value(x).unwrap() - 4.0).abs() < 1e-6);
        assert!((solution.get_value(y).unwrap() - 6.0).abs() < 1e-6);
        assert!((solution.objective_value - 42.0).abs() < 1e-6);
    }

    #[cfg(feature = "coin_cbc")]
    #[test]
    fn test_solve_infeasible_lp() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, f64::INFINITY);

        builder.add_constraint(constraint!((x) >= 5.0));
        builder.add_constraint(constraint!((x) <= 2.0));
        builder.set_objective(x, OptimizationSense::Minimize);

        let options = SolverOptions {
            backend: Some(SolverBackend::CoinCbc),
            time_limit: Some(Duration::from_secs(10)),
            show_solver_output: false,
        };
        let solution = builder.solve(&options).expect("CBC should run");
        assert_ne!(solution.status, OptimizationStatus::Optimal);
    }
}
