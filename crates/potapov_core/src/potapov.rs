//! Blaschke-Potapov products.
//!
//! A product is built from an ordered list of poles `p_i` and vectors `v_i`:
//!
//! `B(z) = U * F_0(z) * F_1(z) * ... * F_{k-1}(z)`,
//! `F_i(z) = I - P_i + P_i (z + conj(p_i)) / (z - p_i)`, `P_i = v_i v_i^H`.
//!
//! Factors are always applied by right-multiplication in list order. The
//! residue extractor and the state-space cascade rely on this order.

use num_complex::Complex64;

use crate::error::{PotapovError, Result};
use crate::linalg::{identity, projector};
use crate::traits::{CMatrix, CVector, TransferFunction};

/// Single factor `I - P + P (z + conj(pole)) / (z - pole)`.
pub fn potapov_factor(z: Complex64, pole: Complex64, vector: &CVector) -> CMatrix {
    debug_assert!(z != pole, "Blaschke-Potapov factor evaluated at its pole");
    let dim = vector.len();
    let p = projector(vector);
    let ratio = (z + pole.conj()) / (z - pole);
    identity(dim) - &p + p * ratio
}

/// A validated Blaschke-Potapov product with a constant unitary prefactor.
#[derive(Debug, Clone)]
pub struct BlaschkePotapov {
    unitary: CMatrix,
    poles: Vec<Complex64>,
    vectors: Vec<CVector>,
}

impl BlaschkePotapov {
    /// Product seeded with the `dim x dim` identity.
    pub fn new(poles: &[Complex64], vectors: &[CVector], dim: usize) -> Result<Self> {
        Self::with_unitary(identity(dim), vectors, poles)
    }

    /// Product seeded with a general (unitary) matrix `U`.
    pub fn with_unitary(unitary: CMatrix, vectors: &[CVector], poles: &[Complex64]) -> Result<Self> {
        if unitary.nrows() != unitary.ncols() {
            return Err(PotapovError::invalid(format!(
                "unitary factor must be square, got {}x{}",
                unitary.nrows(),
                unitary.ncols()
            )));
        }
        if poles.len() != vectors.len() {
            return Err(PotapovError::invalid(format!(
                "got {} poles but {} vectors",
                poles.len(),
                vectors.len()
            )));
        }
        let dim = unitary.nrows();
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dim {
                return Err(PotapovError::invalid(format!(
                    "vector {} has dimension {}, expected {}",
                    i,
                    vector.len(),
                    dim
                )));
            }
        }
        Ok(Self {
            unitary,
            poles: poles.to_vec(),
            vectors: vectors.to_vec(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.unitary.nrows()
    }

    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    pub fn vectors(&self) -> &[CVector] {
        &self.vectors
    }

    pub fn unitary(&self) -> &CMatrix {
        &self.unitary
    }

    /// Evaluates the product at `z`. `z` must not coincide with a pole.
    pub fn evaluate_at(&self, z: Complex64) -> CMatrix {
        self.poles
            .iter()
            .zip(&self.vectors)
            .fold(self.unitary.clone(), |acc, (&pole, vector)| {
                acc * potapov_factor(z, pole, vector)
            })
    }

    /// The product built from the first `count` factors only.
    pub fn truncated(&self, count: usize) -> Self {
        let count = count.min(self.poles.len());
        Self {
            unitary: self.unitary.clone(),
            poles: self.poles[..count].to_vec(),
            vectors: self.vectors[..count].to_vec(),
        }
    }
}

impl TransferFunction for BlaschkePotapov {
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix> {
        Ok(self.evaluate_at(z))
    }
}

/// Evaluates `F_0(z) ... F_{k-1}(z)` seeded with the `dim x dim` identity.
///
/// An empty pole list yields the identity.
pub fn potapov_product(
    z: Complex64,
    poles: &[Complex64],
    vectors: &[CVector],
    dim: usize,
) -> Result<CMatrix> {
    Ok(BlaschkePotapov::new(poles, vectors, dim)?.evaluate_at(z))
}

/// Evaluates `U F_0(z) ... F_{k-1}(z)`.
///
/// Equivalent to peeling the last factor off recursively,
/// `prod(z, U, v[..k-1], p[..k-1]) * F_{k-1}(z)`, with `U` as the empty case.
pub fn product_with_unitary(
    z: Complex64,
    unitary: &CMatrix,
    vectors: &[CVector],
    poles: &[Complex64],
) -> Result<CMatrix> {
    Ok(BlaschkePotapov::with_unitary(unitary.clone(), vectors, poles)?.evaluate_at(z))
}

/// A product wrapped as a callable transfer function.
pub fn finite_transfer_function(
    unitary: CMatrix,
    vectors: &[CVector],
    poles: &[Complex64],
) -> Result<BlaschkePotapov> {
    BlaschkePotapov::with_unitary(unitary, vectors, poles)
}
