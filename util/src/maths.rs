//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Apply polynomial coefficients to a value.
///
/// Coefficients are ordered highest power first, i.e. `[a, b, c]` evaluates
/// `a*x^2 + b*x + c`. An empty coefficient slice evaluates to zero.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float
{
    // Horner's scheme
    coeffs
        .iter()
        .fold(T::zero(), |acc, c| acc * value + *c)
}

/// Unsigned curvature of a planar function `y(x)` given its first and second
/// derivatives at a point.
pub fn curvature<T>(first_deriv: T, second_deriv: T) -> T
where
    T: Float
{
    let one = T::one();
    let three_halves = T::from(1.5).unwrap_or(one);

    second_deriv.abs() / (one + first_deriv * first_deriv).powf(three_halves)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 10f64), (0f64, 100f64), 2.5), 25.0);
        assert_eq!(lin_map((-1f64, 1f64), (100f64, 0f64), 1.0), 0.0);
    }

    #[test]
    fn test_poly_val() {
        // 2x^2 - 3x + 1
        let coeffs = [2f64, -3f64, 1f64];
        assert_eq!(poly_val(0f64, &coeffs), 1.0);
        assert_eq!(poly_val(2f64, &coeffs), 3.0);
        assert_eq!(poly_val(-1f64, &coeffs), 6.0);
        assert_eq!(poly_val(5f64, &[]), 0.0);
    }

    #[test]
    fn test_curvature() {
        // Straight line has no curvature whatever the slope
        assert_eq!(curvature(3f64, 0f64), 0.0);

        // At the vertex of y = x^2 the curvature is 2
        assert_eq!(curvature(0f64, 2f64), 2.0);

        // Sign of the second derivative does not matter
        assert_eq!(curvature(1f64, -2f64), curvature(1f64, 2f64));
    }
}
