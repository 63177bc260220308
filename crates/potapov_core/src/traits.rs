use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// Dense complex matrix used for transfer-function values and realizations.
pub type CMatrix = DMatrix<Complex64>;

/// Dense complex column vector (mode profiles, projector generators).
pub type CVector = DVector<Complex64>;

/// A matrix-valued function of one complex variable.
///
/// Evaluation may fail; the error reaches the caller wrapped in
/// [`PotapovError::EstimationFailure`](crate::error::PotapovError).
pub trait TransferFunction {
    /// Evaluates the function at `z`, returning a square matrix.
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix>;
}

impl<F> TransferFunction for F
where
    F: Fn(Complex64) -> anyhow::Result<CMatrix>,
{
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix> {
        self(z)
    }
}

/// Adapter for closures that cannot fail.
pub struct Infallible<F>(pub F);

impl<F> TransferFunction for Infallible<F>
where
    F: Fn(Complex64) -> CMatrix,
{
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix> {
        Ok((self.0)(z))
    }
}

#[cfg(test)]
mod tests {
    use super::{CMatrix, Infallible, TransferFunction};
    use anyhow::bail;
    use num_complex::Complex64;

    #[test]
    fn closures_act_as_transfer_functions() {
        let scalar = |z: Complex64| -> anyhow::Result<CMatrix> {
            if z.re > 10.0 {
                bail!("out of range");
            }
            Ok(CMatrix::from_element(1, 1, z * 2.0))
        };
        let value = scalar.evaluate(Complex64::new(1.0, 1.0)).expect("value");
        assert!((value[(0, 0)] - Complex64::new(2.0, 2.0)).norm() < 1e-15);
        assert!(scalar.evaluate(Complex64::new(11.0, 0.0)).is_err());
    }

    #[test]
    fn infallible_adapter_wraps_plain_closures() {
        let f = Infallible(|z: Complex64| CMatrix::from_element(2, 2, z));
        let value = f.evaluate(Complex64::new(0.0, 3.0)).expect("value");
        assert_eq!(value.nrows(), 2);
        assert!((value[(1, 0)] - Complex64::new(0.0, 3.0)).norm() < 1e-15);
    }
}
