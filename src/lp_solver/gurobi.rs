use std::collections::HashMap;

use ::gurobi::{ConstrSense, Env, LinExpr, Model, ModelSense, Status, VarType, attr, param};

use crate::lp_solver::output_suppression::silence_solver;
use crate::lp_solver::*;

/// Solve an LP model using Gurobi
pub fn solve_gurobi<Brand>(
    builder: &LPModelBuilder<Brand>,
    options: &SolverOptions,
) -> Result<LPSolution<Brand>> {
    let _gag_handle = silence_solver(options.show_solver_output)?;
    let mut env = Env::new("")?;
    if let Some(limit) = options.time_limit {
        env.set(param::TimeLimit, limit.as_secs_f64())?;
    }
    let mut model = Model::new("blend", &env)?;

    let mut var_map = HashMap::new();
    for (idx, var_info) in builder.variables.iter().enumerate() {
        let var = model.add_var(
            &var_info.name,
            VarType::Continuous,
            0.0, // objective coefficient
            var_info.lower_bound,
            var_info.upper_bound,
            &[], // coefficients for existing constraints
            &[], // constraint indices
        )?;

        let var_id = VariableId {
            id: idx,
            _brand: std::marker::PhantomData,
        };
        var_map.insert(var_id, var);
    }

    for constraint in &builder.constraints {
        let mut gurobi_expr = LinExpr::new();

        for term in &constraint.expression.terms {
            if let Some(var) = var_map.get(&term.variable) {
                gurobi_expr = gurobi_expr.add_term(term.coefficient, var.clone());
            } else {
                return Err(anyhow::anyhow!(
                    "Variable {:?} in constraint '{}' not found in model",
                    term.variable,
                    constraint.name
                ));
            }
        }
        gurobi_expr = gurobi_expr.add_constant(constraint.expression.constant);

        let sense = match constraint.sense {
            ConstraintSense::LessEqual => ConstrSense::Less,
            ConstraintSense::Equal => ConstrSense::Equal,
            ConstraintSense::GreaterEqual => ConstrSense::Greater,
        };

        model.add_constr(&constraint.name, gurobi_expr, sense, constraint.rhs)?;
    }

    // Update the model before setting objective
    model.update()?;

    if let Some(obj_info) = &builder.objective {
        let mut gurobi_expr = LinExpr::new();

        for term in &obj_info.expression.terms {
            if let Some(var) = var_map.get(&term.variable) {
                gurobi_expr = gurobi_expr.add_term(term.coefficient, var.clone());
            } else {
                return Err(anyhow::anyhow!(
                    "Variable {:?} not found in model",
                    term.variable
                ));
            }
        }
        gurobi_expr = gurobi_expr.add_constant(obj_info.expression.constant);

        let sense = match obj_info.sense {
            OptimizationSense::Minimize => ModelSense::Minimize,
            OptimizationSense::Maximize => ModelSense::Maximize,
        };

        model.set_objective(gurobi_expr, sense)?;
    }

    model.optimize()?;

    let optimization_status = match model.status()? {
        Status::Optimal => OptimizationStatus::Optimal,
        Status::Infeasible => OptimizationStatus::Infeasible,
        Status::Unbounded => OptimizationStatus::Unbounded,
        Status::InfOrUnbd => OptimizationStatus::InfeasibleOrUnbounded,
        Status::TimeLimit => OptimizationStatus::TimeLimit,
        Status::Numeric => OptimizationStatus::Other("Gurobi hit numerical trouble"),
        _ => OptimizationStatus::Other("Unknown status"),
    };

    let num_vars = builder.variables.len();
    let mut variable_values = vec![0.0; num_vars];
    let objective_value = match optimization_status {
        OptimizationStatus::Optimal => {
            for (var_id, var) in &var_map {
                variable_values[var_id.id] = var.get(&model, attr::X)?;
            }

            model.get(attr::ObjVal)?
        }
        _ => 0.0,
    };

    Ok(LPSolution {
        status: optimization_status,
        objective_value,
        variable_values,
        _brand: std::marker::PhantomData,
    })
}
