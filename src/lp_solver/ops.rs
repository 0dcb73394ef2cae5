//! Operator overloading for linear programming expressions
//!
//! This module provides convenient operator overloading for building linear expressions
//! using natural mathematical notation.
//!
//! # Expression Building
//!
//! Variables and expressions support natural arithmetic operators:
//!
//! ```rust
//! use blend::lp_model_builder;
//!
//! let mut builder = lp_model_builder!();
//! let x = builder.add_variable("x", 0.0, 10.0);
//! let y = builder.add_variable("y", 0.0, 10.0);
//!
//! let _sum = x + y;
//! let _diff = x - y;
//! let _scaled = 0.84 * x;
//! let _mixed = x + 2.0 * y + 5.0;
//! let _grouped = (x + y) * 3.0;
//! ```
//!
//! # Type Safety
//!
//! All operations maintain the brand type parameter, ensuring variables from different
//! models cannot be accidentally mixed.

use super::{LinearExpression, LinearTerm, VariableId};

// ============================================================================
// Operators for LinearExpression
// ============================================================================

impl<Brand> std::ops::Add<LinearExpression<Brand>> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: LinearExpression<Brand>) -> Self::Output {
        let mut terms = self.terms;
        terms.extend(other.terms);
        LinearExpression {
            terms,
            constant: self.constant + other.constant,
        }
    }
}

impl<Brand> std::ops::Add<f64> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: f64) -> Self::Output {
        LinearExpression {
            terms: self.terms,
            constant: self.constant + other,
        }
    }
}

impl<Brand> std::ops::Sub<LinearExpression<Brand>> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: LinearExpression<Brand>) -> Self::Output {
        let mut terms = self.terms;
        terms.extend(other.terms.into_iter().map(|term| LinearTerm {
            coefficient: -term.coefficient,
            variable: term.variable,
        }));
        LinearExpression {
            terms,
            constant: self.constant - other.constant,
        }
    }
}

impl<Brand> std::ops::Add<VariableId<Brand>> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: VariableId<Brand>) -> Self::Output {
        self + LinearExpression::from_variable(other)
    }
}

impl<Brand> std::ops::Sub<VariableId<Brand>> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: VariableId<Brand>) -> Self::Output {
        self - LinearExpression::from_variable(other)
    }
}

impl<Brand> std::ops::Sub<f64> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: f64) -> Self::Output {
        LinearExpression {
            terms: self.terms,
            constant: self.constant - other,
        }
    }
}

impl<Brand> std::ops::Mul<f64> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn mul(self, other: f64) -> Self::Output {
        LinearExpression {
            terms: self
                .terms
                .into_iter()
                .map(|term| LinearTerm {
                    coefficient: term.coefficient * other,
                    variable: term.variable,
                })
                .collect(),
            constant: self.constant * other,
        }
    }
}

impl<Brand> std::ops::Mul<LinearExpression<Brand>> for f64 {
    type Output = LinearExpression<Brand>;

    fn mul(self, other: LinearExpression<Brand>) -> Self::Output {
        other * self
    }
}

// ============================================================================
// Operators for VariableId
// ============================================================================

impl<Brand> std::ops::Add<LinearExpression<Brand>> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: LinearExpression<Brand>) -> Self::Output {
        LinearExpression::from_variable(self) + other
    }
}

impl<Brand> std::ops::Add<VariableId<Brand>> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: VariableId<Brand>) -> Self::Output {
        LinearExpression::from_variable(self) + LinearExpression::from_variable(other)
    }
}

impl<Brand> std::ops::Add<f64> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: f64) -> Self::Output {
        LinearExpression::from_variable(self) + other
    }
}

impl<Brand> std::ops::Sub<VariableId<Brand>> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: VariableId<Brand>) -> Self::Output {
        LinearExpression::from_variable(self) - LinearExpression::from_variable(other)
    }
}

impl<Brand> std::ops::Sub<LinearExpression<Brand>> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: LinearExpression<Brand>) -> Self::Output {
        LinearExpression::from_variable(self) - other
    }
}

impl<Brand> std::ops::Sub<f64> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: f64) -> Self::Output {
        LinearExpression::from_variable(self) - other
    }
}

impl<Brand> std::ops::Mul<f64> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn mul(self, other: f64) -> Self::Output {
        LinearExpression::from_variable(self) * other
    }
}

impl<Brand> std::ops::Mul<VariableId<Brand>> for f64 {
    type Output = LinearExpression<Brand>;

    fn mul(self, other: VariableId<Brand>) -> Self::Output {
        other * self
    }
}

// ============================================================================
// Reverse operators for f64
// ============================================================================

impl<Brand> std::ops::Add<VariableId<Brand>> for f64 {
    type Output = LinearExpression<Brand>;

    fn add(self, other: VariableId<Brand>) -> Self::Output {
        LinearExpression::from_variable(other) + self
    }
}

impl<Brand> std::ops::Sub<VariableId<Brand>> for f64 {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: VariableId<Brand>) -> Self::Output {
        LinearExpression::new(self) - other
    }
}

#[cfg(test)]
mod tests {
    use crate::lp_model_builder;

    #[test]
    fn test_expression_operations() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);
        let y = builder.add_variable("y", 0.0, 10.0);

        let expr = 2.0 * x + 3.0 * y + 5.0;
        assert_eq!(expr.constant, 5.0);
        assert_eq!(expr.terms.len(), 2);

        assert_eq!((x + y).terms.len(), 2);
        assert_eq!((x - y).terms.len(), 2);
        assert_eq!((2.0 * x).terms.len(), 1);
        assert_eq!((x * 2.0).terms.len(), 1);
    }

    #[test]
    fn test_subtraction_signs() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);
        let y = builder.add_variable("y", 0.0, 10.0);

        let expr = x - 0.5 * y;
        assert_eq!(expr.terms[0].coefficient, 1.0);
        assert_eq!(expr.terms[1].coefficient, -0.5);

        let expr = 300.0 - x;
        assert_eq!(expr.constant, 300.0);
        assert_eq!(expr.terms[0].coefficient, -1.0);
        assert_eq!(expr.terms[0].variable, x);
    }

    #[test]
    fn test_scaling_distributes_over_constant() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);

        let expr = (x + 4.0) * 0.25;
        assert_eq!(expr.terms[0].coefficient, 0.25);
        assert_eq!(expr.constant, 1.0);
    }

    #[test]
    fn test_variable_id_debug() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", 0.0, 10.0);

        let debug_str = format!("{:?}", x);
        assert!(debug_str.contains("VariableId"));
    }
}
