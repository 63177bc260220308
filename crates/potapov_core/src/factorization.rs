//! Rational approximation of a transfer function by a Blaschke-Potapov
//! product, matched to the transfer function at the origin.

use num_complex::Complex64;

use crate::error::{PotapovError, Result};
use crate::extraction::{evaluate_at_origin, extract_vectors, ExtractionSettings};
use crate::potapov::BlaschkePotapov;
use crate::realization::{cascade, StateSpaceRealization};
use crate::traits::{CMatrix, CVector, TransferFunction};

/// `z -> T(0) B(0)^H B(z)`, where `B` is the product built from the poles
/// and vectors. Equals `T` at `z = 0` whenever `B(0)` is unitary.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    scale: CMatrix,
    product: BlaschkePotapov,
}

impl Reconstruction {
    pub fn product(&self) -> &BlaschkePotapov {
        &self.product
    }

    /// The constant prefactor `T(0) B(0)^H`.
    pub fn scale(&self) -> &CMatrix {
        &self.scale
    }

    pub fn evaluate_at(&self, z: Complex64) -> CMatrix {
        &self.scale * self.product.evaluate_at(z)
    }
}

impl TransferFunction for Reconstruction {
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix> {
        Ok(self.evaluate_at(z))
    }
}

/// Builds the origin-matched reconstruction of `transfer`.
pub fn reconstruct<T>(transfer: &T, poles: &[Complex64], vectors: &[CVector]) -> Result<Reconstruction>
where
    T: TransferFunction + ?Sized,
{
    let at_origin = evaluate_at_origin(transfer)?;
    let product = BlaschkePotapov::new(poles, vectors, at_origin.nrows())?;
    let origin = Complex64::new(0.0, 0.0);
    let scale = at_origin * product.evaluate_at(origin).adjoint();
    Ok(Reconstruction { scale, product })
}

/// Poles together with their extracted vectors.
#[derive(Debug, Clone)]
pub struct Factorization {
    poles: Vec<Complex64>,
    vectors: Vec<CVector>,
    dim: usize,
}

impl Factorization {
    /// Runs residue extraction for every pole of `transfer`.
    pub fn extract<T>(transfer: &T, poles: &[Complex64], settings: ExtractionSettings) -> Result<Self>
    where
        T: TransferFunction + ?Sized,
    {
        let vectors = extract_vectors(transfer, poles, settings)?;
        Self::from_parts(poles, vectors)
    }

    pub fn from_parts(poles: &[Complex64], vectors: Vec<CVector>) -> Result<Self> {
        if poles.is_empty() {
            return Err(PotapovError::invalid("at least one pole is required"));
        }
        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        // Validates lengths and dimensions.
        BlaschkePotapov::new(poles, &vectors, dim)?;
        Ok(Self {
            poles: poles.to_vec(),
            vectors,
            dim,
        })
    }

    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    pub fn vectors(&self) -> &[CVector] {
        &self.vectors
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn product(&self) -> Result<BlaschkePotapov> {
        BlaschkePotapov::new(&self.poles, &self.vectors, self.dim)
    }

    pub fn reconstruct<T>(&self, transfer: &T) -> Result<Reconstruction>
    where
        T: TransferFunction + ?Sized,
    {
        reconstruct(transfer, &self.poles, &self.vectors)
    }

    /// State-space realization of the product. With `fit = Some((T, z))`
    /// the feed-through is fitted to `T` at `z`.
    pub fn realization(
        &self,
        fit: Option<(&dyn TransferFunction, Complex64)>,
    ) -> Result<StateSpaceRealization> {
        cascade(&self.poles, &self.vectors, fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Infallible;

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
    fn reconstruction_matches_exact_product_everywhere() {
        let s = 0.5_f64.sqrt();
        let poles = vec![c(-1.0, 2.0), c(-0.5, -1.0)];
        let vectors = vec![
            CVector::from_vec(vec![c(1.0, 0.0), c(0.0, 0.0)]),
            CVector::from_vec(vec![c(s, 0.0), c(0.0, s)]),
        ];
        let target = BlaschkePotapov::new(&poles, &vectors, 2).expect("target");
        let factorization =
            Factorization::extract(&target, &poles, ExtractionSettings::default()).expect("factorization");
        let rebuilt = factorization.reconstruct(&target).expect("reconstruction");

        let origin = c(0.0, 0.0);
        assert!((rebuilt.evaluate_at(origin) - target.evaluate_at(origin)).norm() < 1e-12);
        for z in [c(0.0, 0.8), c(2.0, -1.0)] {
            assert!((rebuilt.evaluate_at(z) - target.evaluate_at(z)).norm() < 1e-7);
        }
    }

    #[test]
    fn reconstruction_absorbs_constant_unitary() {
        // T(z) = U B(z): the prefactor T(0) B(0)^H recovers U.
        let pole = c(-0.7, 1.3);
        let u = CMatrix::from_row_slice(2, 2, &[c(0.0, 0.0), c(0.0, 1.0), c(1.0, 0.0), c(0.0, 0.0)]);
        let vectors = vec![CVector::from_vec(vec![c(0.6, 0.0), c(0.8, 0.0)])];
        let inner = BlaschkePotapov::new(&[pole], &vectors, 2).expect("inner");
        let u_clone = u.clone();
        let transfer = Infallible(move |z: Complex64| &u_clone * inner.evaluate_at(z));

        let rebuilt = reconstruct(&transfer, &[pole], &vectors).expect("reconstruction");
        assert!((rebuilt.scale() - &u).norm() < 1e-12);
        let z = c(0.3, -2.0);
        let expected = transfer.evaluate(z).expect("value");
        assert!((rebuilt.evaluate_at(z) - expected).norm() < 1e-12);
    }

    #[test]
    fn extracted_realization_fits_target_feedthrough() {
        let s = 0.5_f64.sqrt();
        let poles = vec![c(-1.0, 2.0), c(-0.5, -1.0), c(-0.8, 0.3)];
        let vectors = vec![
            CVector::from_vec(vec![c(1.0, 0.0), c(0.0, 0.0)]),
            CVector::from_vec(vec![c(s, 0.0), c(0.0, s)]),
            CVector::from_vec(vec![c(0.6, 0.0), c(0.8, 0.0)]),
        ];
        let target = BlaschkePotapov::new(&poles, &vectors, 2).expect("target");
        let factorization =
            Factorization::extract(&target, &poles, ExtractionSettings::default()).expect("factorization");

        let z = c(0.0, 0.9);
        let fit: (&dyn TransferFunction, Complex64) = (&target, z);
        let fitted = factorization.realization(Some(fit)).expect("fitted");
        assert_eq!(fitted.order(), 3);
        assert!((fitted.transfer(z).expect("transfer") - target.evaluate_at(z)).norm() < 1e-12);
        assert!((&fitted.d - CMatrix::identity(2, 2)).norm() < 1e-7);

        let plain = factorization.realization(None).expect("plain");
        for w in [c(0.0, 0.0), c(1.0, -2.0)] {
            assert!((plain.transfer(w).expect("transfer") - target.evaluate_at(w)).norm() < 1e-7);
        }
    }

    #[test]
    fn factorization_requires_poles() {
        assert_err_contains(Factorization::from_parts(&[], Vec::new()), "at least one pole");
        let v = CVector::from_vec(vec![c(1.0, 0.0)]);
        assert_err_contains(
            Factorization::from_parts(&[c(-1.0, 0.0), c(-2.0, 0.0)], vec![v]),
            "2 poles but 1",
        );
    }
}
