use std::collections::HashMap;

use crate::lp_solver::output_suppression::silence_solver;
use crate::lp_solver::*;
use ::coin_cbc::{Model, Sense, raw};

/// Map CBC's status flags onto a solver-agnostic status
fn optimization_status(model: &raw::Model) -> OptimizationStatus {
    if model.is_proven_optimal() {
        OptimizationStatus::Optimal
    } else if model.is_continuous_unbounded() {
        OptimizationStatus::Unbounded
    } else if model.is_proven_infeasible() || model.is_initial_solve_proven_primal_infeasible() {
        OptimizationStatus::Infeasible
    } else if model.is_seconds_limit_reached() {
        OptimizationStatus::TimeLimit
    } else if model.is_abandoned() || model.is_initial_solve_abandoned() {
        OptimizationStatus::Other("CBC abandoned the search (numerical difficulties)")
    } else {
        OptimizationStatus::Other("Unknown status")
    }
}

/// Solve an LP model using Coin CBC
pub fn solve_coin_cbc<Brand>(
    builder: &LPModelBuilder<Brand>,
    options: &SolverOptions,
) -> Result<LPSolution<Brand>> {
    let _gag_handle = silence_solver(options.show_solver_output)?;
    let mut model = Model::default();
    let mut var_map = HashMap::new();

    if let Some(limit) = options.time_limit {
        model.set_parameter("seconds", &format!("{}", limit.as_secs_f64()));
    }

    for (idx, var_info) in builder.variables.iter().enumerate() {
        let col = model.add_col();
        model.set_col_lower(col, var_info.lower_bound);
        model.set_col_upper(col, var_info.upper_bound);
        let var_id = VariableId {
            id: idx,
            _brand: std::marker::PhantomData,
        };
        var_map.insert(var_id, col);
    }

    for constraint in &builder.constraints {
        let row = model.add_row();

        for term in &constraint.expression.terms {
            if let Some(&col) = var_map.get(&term.variable) {
                model.set_weight(row, col, term.coefficient);
            } else {
                return Err(anyhow::anyhow!(
                    "Variable {:?} in constraint '{}' not found in model",
                    term.variable,
                    constraint.name
                ));
            }
        }

        // Handle constant term
        let rhs_adjusted = constraint.rhs - constraint.expression.constant;

        match constraint.sense {
            ConstraintSense::LessEqual => {
                model.set_row_upper(row, rhs_adjusted);
            }
            ConstraintSense::Equal => {
                model.set_row_equal(row, rhs_adjusted);
            }
            ConstraintSense::GreaterEqual => {
                model.set_row_lower(row, rhs_adjusted);
            }
        }
    }

    if let Some(obj_info) = &builder.objective {
        for term in &obj_info.expression.terms {
            if let Some(&col) = var_map.get(&term.variable) {
                model.set_obj_coeff(col, term.coefficient);
            } else {
                return Err(anyhow::anyhow!(
                    "Variable {:?} not found in model",
                    term.variable
                ));
            }
        }

        let sense = match obj_info.sense {
            OptimizationSense::Minimize => Sense::Minimize,
            OptimizationSense::Maximize => Sense::Maximize,
        };

        model.set_obj_sense(sense);
    }

    let solution = model.solve();
    let status = optimization_status(solution.raw());

    let num_vars = builder.variables.len();
    let mut variable_values = vec![0.0; num_vars];
    let mut objective_value = 0.0;

    if status == OptimizationStatus::Optimal {
        for (var_id, col) in var_map.iter() {
            variable_values[var_id.id] = solution.col(*col);
        }

        if let Some(obj_info) = &builder.objective {
            let mut obj_val = obj_info.expression.constant;
            for term in &obj_info.expression.terms {
                obj_val += term.coefficient * variable_values[term.variable.id];
            }
            objective_value = obj_val;
        }
    }

    Ok(LPSolution {
        status,
        objective_value,
        variable_values,
        _brand: std::marker::PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use crate::lp_solver::*;
    use crate::{constraint, lp_model_builder};

    fn cbc() -> SolverOptions {
        SolverOptions {
            backend: Some(SolverBackend::CoinCbc),
            ..SolverOptions::default()
        }
    }

    #[test]
    fn test_unbounded_lp() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, f64::INFINITY);
        builder.add_constraint(constraint!((x) >= 1.0));
        builder.set_objective(-1.0 * x, OptimizationSense::Minimize);

        let solution = builder.solve(&cbc()).expect("CBC should run");
        assert_eq!(solution.status, OptimizationStatus::Unbounded);
    }

    #[test]
    fn test_values_keep_full_precision() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, f64::INFINITY);
        builder.add_constraint(constraint!((3.0 * x) == 1.0));
        builder.set_objective(x, OptimizationSense::Minimize);

        let solution = builder.solve(&cbc()).expect("CBC should solve");
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.get_value(x).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((solution.objective_value - 1.0 / 3.0).abs() < 1e-12);
    }
}
