//! # Curve
//!
//! Candidate trajectories are lateral offset functions of arc length. This
//! module defines the contract those functions must meet ([`Curve`]) and the
//! [`Polynomial`] implementation used throughout the planner.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use util::maths::poly_val;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A scalar function of arc length which returns a signed lateral offset.
pub trait Curve: Clone {
    /// Evaluate the curve at arc length `s`.
    ///
    /// Behaviour outside the range the curve was built for is whatever the implementation
    /// defines, no validation is performed.
    fn at(&self, s: f64) -> f64;

    /// Differentiate the curve with respect to arc length, returning a new independent curve.
    fn derivative(&self) -> Self;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A polynomial in arc length.
///
/// Coefficients are ordered highest power first, so `[a, b, c, d]` is the cubic
/// `a*s^3 + b*s^2 + c*s + d`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Polynomial {
    /// Create a new polynomial from its coefficients, highest power first.
    ///
    /// An empty coefficient list is the zero polynomial.
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    /// A polynomial that is constant at `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// The coefficients of the polynomial, highest power first.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// The degree of the polynomial (number of coefficients minus one, zero for an empty
    /// polynomial).
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl Curve for Polynomial {
    fn at(&self, s: f64) -> f64 {
        poly_val(s, &self.coeffs)
    }

    fn derivative(&self) -> Self {
        let degree = self.degree();

        // Derivative of a constant is the zero polynomial
        if degree == 0 {
            return Self::constant(0.0);
        }

        let coeffs = self.coeffs[..degree]
            .iter()
            .enumerate()
            .map(|(i, c)| c * (degree - i) as f64)
            .collect();

        Self { coeffs }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_polynomial_at() {
        // s^3 - 2s + 4
        let p = Polynomial::new(vec![1.0, 0.0, -2.0, 4.0]);

        assert_eq!(p.at(0.0), 4.0);
        assert_eq!(p.at(2.0), 8.0);
        assert_eq!(p.at(-1.0), 5.0);
        assert_eq!(Polynomial::new(vec![]).at(12.0), 0.0);
    }

    #[test]
    fn test_polynomial_derivative() {
        let p = Polynomial::new(vec![1.0, 0.0, -2.0, 4.0]);

        let d1 = p.derivative();
        assert_eq!(d1.coeffs(), &[3.0, 0.0, -2.0]);

        let d2 = d1.derivative();
        assert_eq!(d2.coeffs(), &[6.0, 0.0]);

        let d4 = d2.derivative().derivative();
        assert_eq!(d4, Polynomial::constant(0.0));

        // Differentiating does not touch the original
        assert_eq!(p.coeffs(), &[1.0, 0.0, -2.0, 4.0]);
    }
}
