//! Macros for the LP solver module
//!
//! This module contains all the macros used by the LP solver, providing
//! convenient syntax for creating models and constraints.

/// Create a new LP model builder with a unique brand
///
/// Each invocation creates a distinct type-level brand, so variables from one
/// model cannot leak into another.
///
/// # Examples
///
/// ```rust
/// use blend::lp_model_builder;
///
/// // Anonymous brand (each call creates unique anonymous type)
/// let mut builder = lp_model_builder!();
/// let _x = builder.add_variable("x", 0.0, 10.0);
///
/// // Named brand (easier to identify in type errors)
/// let mut blend_model = lp_model_builder!(BlendModel);
/// let mut isolated_model = lp_model_builder!(IsolatedModel);
///
/// let _kg = blend_model.add_variable("x[LB,Agar]", 0.0, f64::INFINITY);
/// let _p = isolated_model.add_variable("p", 0.0, 1.0);
///
/// // This would cause a compile-time error due to different brands:
/// // isolated_model.add_constraint(constraint!((_kg) <= 50.0)); // ERROR!
/// ```
#[macro_export]
macro_rules! lp_model_builder {
    // Named brand - user provides the brand name
    ($brand_name:ident) => {{
        struct $brand_name;
        $crate::lp_solver::LPModelBuilder::<$brand_name>::new()
    }};

    // Anonymous brand - the `UniqueBrand` struct is defined locally within the `{{ ... }}` block,
    // so each macro invocation creates a fresh scope with its own distinct `UniqueBrand` type
    () => {{
        struct UniqueBrand;
        $crate::lp_solver::LPModelBuilder::<UniqueBrand>::new()
    }};
}

/// Create constraints using natural comparison syntax
///
/// The left-hand side must be in parentheses. An optional leading name labels
/// the constraint in logs and in backends that keep row names.
///
/// # Examples
///
/// ```rust
/// use blend::constraint;
/// use blend::lp_model_builder;
///
/// let mut builder = lp_model_builder!(BlendModel);
/// let x = builder.add_variable("x", 0.0, 10.0);
/// let y = builder.add_variable("y", 0.0, 10.0);
///
/// // Unnamed constraints
/// let _c1 = constraint!((x + y) == 10.0);
/// let _c2 = constraint!((2.0 * x) <= 5.0);
/// let _c3 = constraint!((x - y) >= 0.0);
///
/// // Named constraints
/// builder.add_constraint(constraint!("mass[LB]", (x + y) == 10.0));
/// ```
#[macro_export]
macro_rules! constraint {
    // Unnamed constraints
    (($lhs:expr) == $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            "",
            $lhs,
            $crate::lp_solver::ConstraintSense::Equal,
            $rhs as f64,
        )
    };
    (($lhs:expr) <= $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            "",
            $lhs,
            $crate::lp_solver::ConstraintSense::LessEqual,
            $rhs as f64,
        )
    };
    (($lhs:expr) >= $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            "",
            $lhs,
            $crate::lp_solver::ConstraintSense::GreaterEqual,
            $rhs as f64,
        )
    };

    // Named constraints
    ($name:expr, ($lhs:expr) == $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $name,
            $lhs,
            $crate::lp_solver::ConstraintSense::Equal,
            $rhs as f64,
        )
    };
    ($name:expr, ($lhs:expr) <= $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $name,
            $lhs,
            $crate::lp_solver::ConstraintSense::LessEqual,
            $rhs as f64,
        )
    };
    ($name:expr, ($lhs:expr) >= $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $name,
            $lhs,
            $crate::lp_solver::ConstraintSense::GreaterEqual,
            $rhs as f64,
        )
    };
}
