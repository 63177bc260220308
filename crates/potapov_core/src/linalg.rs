//! Dense complex linear-algebra helpers.
//!
//! nalgebra offers a complex Schur decomposition but no general complex
//! eigenvector routine, so eigenvectors are recovered as the right singular
//! vector of `M - λI` belonging to the smallest singular value.

use log::warn;
use nalgebra::linalg::{Schur, SVD};
use num_complex::Complex64;
use num_traits::Zero;

use crate::error::{PotapovError, Result};
use crate::traits::{CMatrix, CVector};

const MAX_DECOMPOSITION_ITERATIONS: usize = 10_000;
const TRIANGULAR_TOLERANCE: f64 = 1e-10;

/// An eigenvalue with a unit-norm eigenvector.
#[derive(Debug, Clone)]
pub struct EigenPair {
    pub value: Complex64,
    pub vector: CVector,
}

pub fn identity(dim: usize) -> CMatrix {
    CMatrix::identity(dim, dim)
}

/// Rank-1 projector `v v^H`. Idempotent only for unit-norm `v`.
pub fn projector(vector: &CVector) -> CMatrix {
    vector * vector.adjoint()
}

/// Eigenvalues of a square complex matrix, in Schur diagonal order.
pub fn eigenvalues(matrix: &CMatrix) -> Result<Vec<Complex64>> {
    if matrix.nrows() != matrix.ncols() {
        return Err(PotapovError::invalid(format!(
            "eigenvalues need a square matrix, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if matrix.nrows() == 0 {
        return Ok(Vec::new());
    }
    if matrix.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
        return Err(PotapovError::Convergence(
            "matrix contains non-finite entries".to_string(),
        ));
    }

    let schur = Schur::try_new(matrix.clone(), f64::EPSILON, MAX_DECOMPOSITION_ITERATIONS)
        .ok_or_else(|| PotapovError::Convergence("Schur iteration limit reached".to_string()))?;
    if let Some(values) = schur.eigenvalues() {
        return Ok(values.iter().cloned().collect());
    }

    // Subdiagonal entries that are tiny but not exactly zero.
    let (_, t) = schur.unpack();
    let scale = t.norm().max(1.0);
    for i in 1..t.nrows() {
        if t[(i, i - 1)].norm() > TRIANGULAR_TOLERANCE * scale {
            return Err(PotapovError::Convergence(
                "Schur form is not triangular".to_string(),
            ));
        }
    }
    Ok((0..t.nrows()).map(|i| t[(i, i)]).collect())
}

/// Unit-norm eigenvector of `matrix` for a known eigenvalue.
pub fn eigenvector(matrix: &CMatrix, value: Complex64) -> Result<CVector> {
    let dim = matrix.nrows();
    let mut shifted = matrix.clone();
    for i in 0..dim {
        shifted[(i, i)] -= value;
    }

    let svd = SVD::try_new(shifted, false, true, f64::EPSILON, MAX_DECOMPOSITION_ITERATIONS)
        .ok_or_else(|| PotapovError::Convergence(format!("SVD failed for eigenvalue {value}")))?;
    let v_t = svd.v_t.as_ref().ok_or_else(|| {
        PotapovError::Convergence(format!("no right singular vectors for eigenvalue {value}"))
    })?;

    let mut min_idx = 0;
    for (i, &sigma) in svd.singular_values.iter().enumerate() {
        if sigma < svd.singular_values[min_idx] {
            min_idx = i;
        }
    }

    // Rows of V^H are conjugated right singular vectors.
    let mut vector: CVector = v_t.row(min_idx).adjoint();
    let norm = vector.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(PotapovError::Convergence(format!(
            "degenerate eigenvector for eigenvalue {value}"
        )));
    }
    vector /= Complex64::new(norm, 0.0);
    Ok(vector)
}

/// Eigenpair whose eigenvalue has the largest magnitude.
///
/// Exactly tied magnitudes keep the first eigenvalue in Schur order.
pub fn dominant_eigenpair(matrix: &CMatrix) -> Result<EigenPair> {
    let values = eigenvalues(matrix)?;
    let mut best: Option<(usize, f64)> = None;
    for (i, value) in values.iter().enumerate() {
        let magnitude = value.norm();
        match best {
            None => best = Some((i, magnitude)),
            Some((_, current)) if magnitude > current => best = Some((i, magnitude)),
            Some((first, current)) if magnitude == current && !magnitude.is_zero() => {
                warn!(
                    "eigenvalues {} and {} tie in magnitude {}; keeping the first",
                    first, i, current
                );
            }
            _ => {}
        }
    }
    let (index, _) =
        best.ok_or_else(|| PotapovError::invalid("cannot take eigenpair of empty matrix"))?;
    let value = values[index];
    let vector = eigenvector(matrix, value)?;
    Ok(EigenPair { value, vector })
}

/// Eigenpair whose eigenvalue lies nearest to `target`.
pub fn eigenpair_nearest(matrix: &CMatrix, target: Complex64) -> Result<EigenPair> {
    let values = eigenvalues(matrix)?;
    let mut best: Option<(usize, f64)> = None;
    for (i, value) in values.iter().enumerate() {
        let distance = (value - target).norm();
        if best.map_or(true, |(_, current)| distance < current) {
            best = Some((i, distance));
        }
    }
    let (index, _) =
        best.ok_or_else(|| PotapovError::invalid("cannot take eigenpair of empty matrix"))?;
    let value = values[index];
    let vector = eigenvector(matrix, value)?;
    Ok(EigenPair { value, vector })
}

/// Scales `vector` to unit Euclidean norm.
pub fn normalize(vector: &CVector) -> Result<CVector> {
    let norm = vector.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(PotapovError::invalid(
            "cannot normalize a zero or non-finite vector",
        ));
    }
    Ok(vector.map(|c| c / norm))
}
