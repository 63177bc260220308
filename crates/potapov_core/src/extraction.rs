//! Residue extraction at known poles with iterative deflation.

use log::debug;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PotapovError, Result};
use crate::limits::{residue, LimitSettings};
use crate::linalg::dominant_eigenpair;
use crate::potapov::BlaschkePotapov;
use crate::traits::{CMatrix, CVector, TransferFunction};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExtractionSettings {
    pub limit: LimitSettings,
}

/// Dimension of a transfer function's range, read off its value at the origin.
pub fn transfer_dimension<T>(transfer: &T) -> Result<usize>
where
    T: TransferFunction + ?Sized,
{
    let value = evaluate_at_origin(transfer)?;
    Ok(value.nrows())
}

pub(crate) fn evaluate_at_origin<T>(transfer: &T) -> Result<CMatrix>
where
    T: TransferFunction + ?Sized,
{
    let origin = Complex64::new(0.0, 0.0);
    let value = transfer
        .evaluate(origin)
        .map_err(|e| PotapovError::estimation("at z = 0", e))?;
    if value.nrows() != value.ncols() || value.nrows() == 0 {
        return Err(PotapovError::invalid(format!(
            "transfer function must return a non-empty square matrix, got {}x{}",
            value.nrows(),
            value.ncols()
        )));
    }
    Ok(value)
}

/// Finds one projector-generating vector per pole.
///
/// Poles are processed in the given order. For pole `i` the residue of
/// `transfer` is left-divided by the product of the factors already found,
/// `L = B_i(p_i)^{-1} lim_{z -> p_i} (z - p_i) T(z)`, and the eigenvector of
/// `L` with the largest-magnitude eigenvalue becomes `v_i`. Each step
/// re-evaluates all earlier factors, so the cost is quadratic in the number
/// of poles.
pub fn extract_vectors<T>(
    transfer: &T,
    poles: &[Complex64],
    settings: ExtractionSettings,
) -> Result<Vec<CVector>>
where
    T: TransferFunction + ?Sized,
{
    if poles.is_empty() {
        return Err(PotapovError::invalid("at least one pole is required"));
    }
    for (j, pole) in poles.iter().enumerate() {
        if let Some(i) = poles[..j].iter().position(|earlier| earlier == pole) {
            return Err(PotapovError::invalid(format!(
                "poles {i} and {j} coincide at z = {pole}"
            )));
        }
    }
    let dim = transfer_dimension(transfer)?;
    let mut found: Vec<CVector> = Vec::with_capacity(poles.len());

    for (i, &pole) in poles.iter().enumerate() {
        let deflation = BlaschkePotapov::new(&poles[..i], &found, dim)?.evaluate_at(pole);
        let deflation_inv = deflation.try_inverse().ok_or_else(|| {
            PotapovError::Singular(format!(
                "deflation product at pole {i} (z = {pole}) is not invertible"
            ))
        })?;

        let local = residue(transfer, pole, settings.limit).map_err(|err| match err {
            PotapovError::EstimationFailure { context, source } => PotapovError::EstimationFailure {
                context: format!("for pole {i} (z = {pole}) {context}"),
                source,
            },
            other => other,
        })?;
        if local.shape() != (dim, dim) {
            return Err(PotapovError::invalid(format!(
                "residue at pole {i} has shape {:?}, expected ({dim}, {dim})",
                local.shape()
            )));
        }

        let operator = deflation_inv * local;
        let pair = dominant_eigenpair(&operator).map_err(|err| match err {
            PotapovError::Convergence(message) => {
                PotapovError::Convergence(format!("pole {i} (z = {pole}): {message}"))
            }
            other => other,
        })?;
        debug!(
            "pole {} at {}: dominant residue eigenvalue {} (|.| = {:.3e})",
            i,
            pole,
            pair.value,
            pair.value.norm()
        );
        found.push(pair.vector);
    }

    Ok(found)
}
