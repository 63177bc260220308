//! Numerical limits and derivatives of matrix-valued functions.

use std::f64::consts::PI;

use anyhow::anyhow;
use log::warn;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PotapovError, Result};
use crate::traits::{CMatrix, TransferFunction};

/// Contour used to estimate a limit: `points` samples on a circle of
/// radius `radius` around the limit point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitSettings {
    pub points: usize,
    pub radius: f64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            points: 10,
            radius: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DerivativeSettings {
    pub step: f64,
}

impl Default for DerivativeSettings {
    fn default() -> Self {
        Self { step: 1e-5 }
    }
}

/// Central difference `(f(z + h) - f(z - h)) / 2h`.
pub fn derivative<F>(f: &F, z: Complex64, settings: DerivativeSettings) -> Result<CMatrix>
where
    F: TransferFunction + ?Sized,
{
    let h = settings.step;
    if h == 0.0 || !h.is_finite() {
        return Err(PotapovError::invalid("derivative step must be finite and nonzero"));
    }
    let forward = f
        .evaluate(z + h)
        .map_err(|e| PotapovError::estimation(format!("at z = {}", z + h), e))?;
    let backward = f
        .evaluate(z - h)
        .map_err(|e| PotapovError::estimation(format!("at z = {}", z - h), e))?;
    if forward.shape() != backward.shape() {
        return Err(PotapovError::invalid("function changed shape between samples"));
    }
    Ok((forward - backward) / Complex64::new(2.0 * h, 0.0))
}

/// Estimates `lim_{z -> z0} f(z)` by averaging `f` over a circle around `z0`.
///
/// `f` must be analytic on a punctured neighbourhood of `z0` with at most a
/// removable singularity there; for a simple pole of `T` pass
/// `z -> (z - z0) T(z)`. The mean over `N` equally spaced points cancels
/// every Taylor term below order `N`.
pub fn pole_limit<F>(f: &F, z0: Complex64, settings: LimitSettings) -> Result<CMatrix>
where
    F: TransferFunction + ?Sized,
{
    if settings.points == 0 {
        return Err(PotapovError::invalid("contour needs at least one point"));
    }
    if !(settings.radius > 0.0) || !settings.radius.is_finite() {
        return Err(PotapovError::invalid("contour radius must be positive and finite"));
    }

    let n = settings.points;
    let mut sum: Option<CMatrix> = None;
    for k in 0..n {
        let angle = 2.0 * PI * k as f64 / n as f64;
        let z = z0 + Complex64::from_polar(settings.radius, angle);
        let value = f
            .evaluate(z)
            .map_err(|e| PotapovError::estimation(format!("on contour at z = {z}"), e))?;
        if value.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
            warn!("non-finite sample on limit contour at z = {}", z);
            return Err(PotapovError::estimation(
                format!("on contour at z = {z}"),
                anyhow!("non-finite sample"),
            ));
        }
        sum = Some(match sum {
            None => value,
            Some(acc) => {
                if acc.shape() != value.shape() {
                    return Err(PotapovError::invalid(format!(
                        "function changed shape on contour at z = {z}"
                    )));
                }
                acc + value
            }
        });
    }

    // n > 0, so the loop ran at least once.
    let sum = sum.ok_or_else(|| PotapovError::invalid("empty contour"))?;
    Ok(sum / Complex64::new(n as f64, 0.0))
}

/// Limit of `(z - pole) T(z)` as `z -> pole`, the residue of `T` at a
/// simple pole.
pub fn residue<T>(transfer: &T, pole: Complex64, settings: LimitSettings) -> Result<CMatrix>
where
    T: TransferFunction + ?Sized,
{
    let scaled = |z: Complex64| -> anyhow::Result<CMatrix> {
        let value = transfer.evaluate(z)?;
        Ok(value * (z - pole))
    };
    pole_limit(&scaled, pole, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Infallible;
    use anyhow::bail;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn derivative_of_quadratic_is_linear() {
        let f = Infallible(|z: Complex64| CMatrix::from_element(1, 1, z * z));
        let z = c(1.0, -2.0);
        let d = derivative(&f, z, DerivativeSettings::default()).expect("derivative");
        assert!((d[(0, 0)] - z * 2.0).norm() < 1e-8);
    }

    #[test]
    fn derivative_rejects_zero_step() {
        let f = Infallible(|z: Complex64| CMatrix::from_element(1, 1, z));
        assert_err_contains(
            derivative(&f, c(0.0, 0.0), DerivativeSettings { step: 0.0 }),
            "nonzero",
        );
    }

    #[test]
    fn pole_limit_recovers_residue_of_simple_pole() {
        let pole = c(-1.0, 2.0);
        let f = Infallible(move |z: Complex64| {
            CMatrix::from_row_slice(
                2,
                2,
                &[c(3.0, 0.0) / (z - pole), z, c(0.0, 0.0), c(1.0, 1.0) / (z - pole) + z * z],
            )
        });
        let r = residue(&f, pole, LimitSettings::default()).expect("residue");
        assert!((r[(0, 0)] - c(3.0, 0.0)).norm() < 1e-10);
        assert!(r[(0, 1)].norm() < 1e-10);
        assert!((r[(1, 1)] - c(1.0, 1.0)).norm() < 1e-10);
    }

    #[test]
    fn pole_limit_of_analytic_function_is_its_value() {
        let f = Infallible(|z: Complex64| CMatrix::from_element(1, 1, z.exp()));
        let z0 = c(0.3, 0.7);
        let value = pole_limit(&f, z0, LimitSettings::default()).expect("limit");
        assert!((value[(0, 0)] - z0.exp()).norm() < 1e-12);
    }

    #[test]
    fn pole_limit_reports_failing_samples() {
        let f = |z: Complex64| -> anyhow::Result<CMatrix> {
            if z.im > 0.0 {
                bail!("evaluation blew up");
            }
            Ok(CMatrix::from_element(1, 1, z))
        };
        assert_err_contains(
            pole_limit(&f, c(0.0, 0.0), LimitSettings::default()),
            "evaluation blew up",
        );
    }

    #[test]
    fn pole_limit_rejects_non_finite_samples() {
        let f = Infallible(|z: Complex64| {
            let value = if z.im > 0.0 { c(f64::NAN, f64::NAN) } else { z };
            CMatrix::from_element(1, 1, value)
        });
        let err = pole_limit(&f, c(-1.0, 0.0), LimitSettings::default()).expect_err("NaN sample");
        assert!(matches!(err, PotapovError::EstimationFailure { .. }), "got {err}");
        assert!(format!("{err}").contains("non-finite sample"));
    }

    #[test]
    fn pole_limit_rejects_bad_settings() {
        let f = Infallible(|z: Complex64| CMatrix::from_element(1, 1, z));
        assert_err_contains(
            pole_limit(&f, c(0.0, 0.0), LimitSettings { points: 0, radius: 1e-3 }),
            "at least one point",
        );
        assert_err_contains(
            pole_limit(&f, c(0.0, 0.0), LimitSettings { points: 4, radius: -1.0 }),
            "radius",
        );
    }
}
