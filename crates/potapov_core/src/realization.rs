//! State-space realizations of Blaschke-Potapov products.
//!
//! The realization satisfies
//!   x' = A x + B u
//!   y  = C x + D u
//! with transfer function `D + C (zI - A)^{-1} B`.

use log::debug;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PotapovError, Result};
use crate::traits::{CMatrix, CVector, TransferFunction};

/// State-space matrices `(A, B, C, D)`.
#[derive(Debug, Clone)]
pub struct StateSpaceRealization {
    /// System matrix [order, order]
    pub a: CMatrix,
    /// Input matrix [order, ports]
    pub b: CMatrix,
    /// Output matrix [ports, order]
    pub c: CMatrix,
    /// Feed-through matrix [ports, ports]
    pub d: CMatrix,
}

/// Row-major snapshot of a realization for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealizationData {
    pub order: usize,
    pub ports: usize,
    pub a: Vec<Complex64>,
    pub b: Vec<Complex64>,
    pub c: Vec<Complex64>,
    pub d: Vec<Complex64>,
}

fn row_major(matrix: &CMatrix) -> Vec<Complex64> {
    let mut out = Vec::with_capacity(matrix.len());
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            out.push(matrix[(i, j)]);
        }
    }
    out
}

impl StateSpaceRealization {
    /// Number of internal states.
    pub fn order(&self) -> usize {
        self.a.nrows()
    }

    pub fn ports(&self) -> usize {
        self.d.nrows()
    }

    /// Evaluates `D + C (zI - A)^{-1} B`.
    pub fn transfer(&self, z: Complex64) -> Result<CMatrix> {
        let n = self.order();
        let mut shifted = -self.a.clone();
        for i in 0..n {
            shifted[(i, i)] += z;
        }
        let solved = shifted.lu().solve(&self.b).ok_or_else(|| {
            PotapovError::Singular(format!("zI - A is singular at z = {z}"))
        })?;
        Ok(&self.d + &self.c * solved)
    }

    pub fn to_data(&self) -> RealizationData {
        RealizationData {
            order: self.order(),
            ports: self.ports(),
            a: row_major(&self.a),
            b: row_major(&self.b),
            c: row_major(&self.c),
            d: row_major(&self.d),
        }
    }
}

impl TransferFunction for StateSpaceRealization {
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix> {
        Ok(self.transfer(z)?)
    }
}

/// Realization of the single factor `I - P + P (z + conj(pole)) / (z - pole)`:
/// `A = pole v^H v`, `B = -q v^H`, `C = q v`, `D = I` with
/// `q = sqrt(-2 Re(pole))`.
///
/// Requires `Re(pole) < 0`.
pub fn single_pole_realization(pole: Complex64, vector: &CVector) -> Result<StateSpaceRealization> {
    if !(pole.re < 0.0) {
        return Err(PotapovError::PreconditionViolation(format!(
            "pole {pole} must have a negative real part"
        )));
    }
    let n = vector.len();
    if n == 0 {
        return Err(PotapovError::invalid("vector for single-pole realization is empty"));
    }

    let q = (-(pole + pole.conj()).re).sqrt();
    let a = CMatrix::from_element(1, 1, pole * vector.norm_squared());
    let b = CMatrix::from_fn(1, n, |_, j| vector[j].conj() * (-q));
    let c = CMatrix::from_fn(n, 1, |i, _| vector[i] * q);
    let d = CMatrix::identity(n, n);
    Ok(StateSpaceRealization { a, b, c, d })
}

/// Series connection: `tail` drives `head`, realizing `head(z) * tail(z)`.
///
///   A = [[A1, 0], [B2 C1, A2]]
///   B = [[B1], [B2 D1]]
///   C = [D2 C1, C2]
///   D = D2 D1
fn series(tail: &StateSpaceRealization, head: &StateSpaceRealization) -> Result<StateSpaceRealization> {
    if tail.ports() != head.ports() {
        return Err(PotapovError::invalid(format!(
            "cannot connect realizations with {} and {} ports",
            tail.ports(),
            head.ports()
        )));
    }
    let n1 = tail.order();
    let n2 = head.order();
    let ports = tail.ports();

    let mut a = CMatrix::zeros(n1 + n2, n1 + n2);
    a.view_mut((0, 0), (n1, n1)).copy_from(&tail.a);
    a.view_mut((n1, 0), (n2, n1)).copy_from(&(&head.b * &tail.c));
    a.view_mut((n1, n1), (n2, n2)).copy_from(&head.a);

    let mut b = CMatrix::zeros(n1 + n2, ports);
    b.view_mut((0, 0), (n1, ports)).copy_from(&tail.b);
    b.view_mut((n1, 0), (n2, ports)).copy_from(&(&head.b * &tail.d));

    let mut c = CMatrix::zeros(ports, n1 + n2);
    c.view_mut((0, 0), (ports, n1)).copy_from(&(&head.d * &tail.c));
    c.view_mut((0, n1), (ports, n2)).copy_from(&head.c);

    let d = &head.d * &tail.d;
    Ok(StateSpaceRealization { a, b, c, d })
}

/// Feed-through that makes `D + C (zI - A)^{-1} B` agree with `T` at `z`:
/// `T(z) + C (A - zI)^{-1} B`.
pub fn estimate_feedthrough<T>(
    a: &CMatrix,
    b: &CMatrix,
    c: &CMatrix,
    transfer: &T,
    z: Complex64,
) -> Result<CMatrix>
where
    T: TransferFunction + ?Sized,
{
    let n = a.nrows();
    let mut shifted = a.clone();
    for i in 0..n {
        shifted[(i, i)] -= z;
    }
    let solved = shifted
        .lu()
        .solve(b)
        .ok_or_else(|| PotapovError::Singular(format!("A - zI is singular at z = {z}")))?;
    let value = transfer
        .evaluate(z)
        .map_err(|e| PotapovError::estimation(format!("fitting feed-through at z = {z}"), e))?;
    let correction = c * solved;
    if value.shape() != correction.shape() {
        return Err(PotapovError::invalid(format!(
            "transfer function has shape {:?}, realization has {:?}",
            value.shape(),
            correction.shape()
        )));
    }
    Ok(value + correction)
}

/// Realization of the product `F_0 F_1 ... F_{k-1}` obtained by cascading
/// single-pole realizations.
///
/// Factors are folded from the last one towards the first, each new factor
/// being connected after the running realization. With `fit = Some((T, z))`
/// and at least two poles, the final feed-through is fitted to `T` at `z`
/// instead of taking the product of the per-factor identities.
pub fn cascade(
    poles: &[Complex64],
    vectors: &[CVector],
    fit: Option<(&dyn TransferFunction, Complex64)>,
) -> Result<StateSpaceRealization> {
    if poles.is_empty() || vectors.is_empty() {
        return Err(PotapovError::invalid("cascade needs at least one pole"));
    }
    if poles.len() != vectors.len() {
        return Err(PotapovError::invalid(format!(
            "got {} poles but {} vectors",
            poles.len(),
            vectors.len()
        )));
    }

    let k = poles.len();
    let mut realization = single_pole_realization(poles[k - 1], &vectors[k - 1])?;
    for i in (0..k - 1).rev() {
        let head = single_pole_realization(poles[i], &vectors[i])?;
        realization = series(&realization, &head)?;
    }

    if k > 1 {
        if let Some((transfer, z)) = fit {
            realization.d =
                estimate_feedthrough(&realization.a, &realization.b, &realization.c, transfer, z)?;
        }
    }
    debug!(
        "cascaded {} poles into a realization of order {} with {} ports",
        k,
        realization.order(),
        realization.ports()
    );
    Ok(realization)
}
