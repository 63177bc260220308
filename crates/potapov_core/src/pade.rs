//! Symmetric Padé approximants of `e^z`, the rational stand-in for a pure
//! delay `e^{-zT}` in a finite-dimensional network model.

use num_complex::Complex64;

/// Numerator coefficients of the order-`n` symmetric Padé approximant of
/// `e^z`, highest power first. The coefficient of `z^k` is
/// `(2n-k)! n! / ((2n)! k! (n-k)!)`.
pub fn pade_coefficients(n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n + 1];
    let mut coefficient = 1.0;
    for k in 0..=n {
        out[n - k] = coefficient;
        if k < n {
            coefficient *= (n - k) as f64 / ((2 * n - k) as f64 * (k + 1) as f64);
        }
    }
    out
}

/// Numerator `Q_n(z)` of the approximant.
pub fn pade_numerator(z: Complex64, n: usize) -> Complex64 {
    pade_coefficients(n)
        .iter()
        .fold(Complex64::new(0.0, 0.0), |acc, &coefficient| acc * z + coefficient)
}

/// `Q_n(z) / Q_n(-z) ≈ e^z`. Unimodular on the imaginary axis.
pub fn pade(n: usize, z: Complex64) -> Complex64 {
    pade_numerator(z, n) / pade_numerator(-z, n)
}
