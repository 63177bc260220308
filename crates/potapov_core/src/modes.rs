//! Spatial eigenmodes distributed over a network of delay lines.
//!
//! Each node of the network is followed by a delay segment. A mode assigns a
//! complex amplitude to every node and oscillates at the imaginary part of
//! its root, so overlaps are integrals of `exp(i Δω t)` along each segment.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PotapovError, Result};
use crate::linalg::eigenpair_nearest;
use crate::traits::{CMatrix, CVector, TransferFunction};

/// Ordered, non-negative delay durations, one per network node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayNetwork {
    delays: Vec<f64>,
}

impl DelayNetwork {
    pub fn new(delays: Vec<f64>) -> Result<Self> {
        for (i, &delay) in delays.iter().enumerate() {
            if !delay.is_finite() || delay < 0.0 {
                return Err(PotapovError::invalid(format!(
                    "delay {i} must be finite and non-negative, got {delay}"
                )));
            }
        }
        Ok(Self { delays })
    }

    pub fn delays(&self) -> &[f64] {
        &self.delays
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    pub fn delay(&self, index: usize) -> Option<f64> {
        self.delays.get(index).copied()
    }
}

/// Frequencies closer than `eps` are treated as coincident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverlapSettings {
    pub eps: f64,
}

impl Default for OverlapSettings {
    fn default() -> Self {
        Self { eps: 1e-7 }
    }
}

impl OverlapSettings {
    /// Tighter cutoff used when assembling the full overlap matrix.
    pub fn for_matrix() -> Self {
        Self { eps: 1e-12 }
    }
}

fn check_mode(mode: &CVector, network: &DelayNetwork, label: &str) -> Result<()> {
    if mode.len() != network.len() {
        return Err(PotapovError::invalid(format!(
            "{label} has {} entries but the network has {} delays",
            mode.len(),
            network.len()
        )));
    }
    Ok(())
}

/// Overlap of two modes integrated along every delay segment.
///
/// With `Δω = Im(root1 - root2)`, segment `i` contributes
/// `v1[i] conj(v2[i]) delay[i]` when `|Δω| < eps` and
/// `v1[i] conj(v2[i]) i (exp(-i delay[i] Δω) - 1) / Δω` otherwise.
pub fn inner_product(
    root1: Complex64,
    root2: Complex64,
    v1: &CVector,
    v2: &CVector,
    network: &DelayNetwork,
    settings: OverlapSettings,
) -> Result<Complex64> {
    check_mode(v1, network, "first mode")?;
    check_mode(v2, network, "second mode")?;

    let delta = (root1 - root2).im;
    let i = Complex64::new(0.0, 1.0);
    let mut sum = Complex64::new(0.0, 0.0);
    for ((e1, e2), &delay) in v1.iter().zip(v2.iter()).zip(network.delays()) {
        let weight = e1 * e2.conj();
        if delta.abs() < settings.eps {
            sum += weight * delay;
        } else {
            let phase = Complex64::new(0.0, -delay * delta).exp();
            sum += weight * i * (phase - 1.0) / delta;
        }
    }
    Ok(sum)
}

/// `sqrt(<v, v>)` evaluated with coincident (zero) roots.
pub fn mode_norm(mode: &CVector, network: &DelayNetwork) -> Result<f64> {
    let zero = Complex64::new(0.0, 0.0);
    let self_overlap = inner_product(zero, zero, mode, mode, network, OverlapSettings::default())?;
    Ok(self_overlap.re.max(0.0).sqrt())
}

/// Scales `mode` to unit norm along the delay network.
pub fn normalize_mode(mode: &CVector, network: &DelayNetwork) -> Result<CVector> {
    let norm = mode_norm(mode, network)?;
    if norm == 0.0 || !norm.is_finite() {
        return Err(PotapovError::invalid("mode has zero norm on the delay network"));
    }
    Ok(mode.map(|c| c / norm))
}

/// Pairwise inner products, each divided by the geometric mean of the two
/// self-overlaps. The diagonal is one; the matrix is Hermitian.
pub fn normalized_overlap_matrix(
    roots: &[Complex64],
    modes: &[CVector],
    network: &DelayNetwork,
    settings: OverlapSettings,
) -> Result<CMatrix> {
    if roots.len() != modes.len() {
        return Err(PotapovError::invalid(format!(
            "got {} roots but {} modes",
            roots.len(),
            modes.len()
        )));
    }

    let dim = roots.len();
    let mut norms = Vec::with_capacity(dim);
    for (i, (&root, mode)) in roots.iter().zip(modes).enumerate() {
        let norm = inner_product(root, root, mode, mode, network, settings)?.re;
        if !(norm > 0.0) {
            return Err(PotapovError::invalid(format!("mode {i} has zero norm")));
        }
        norms.push(norm);
    }

    let mut overlaps = CMatrix::zeros(dim, dim);
    for i in 0..dim {
        for j in 0..dim {
            let value = inner_product(roots[i], roots[j], &modes[i], &modes[j], network, settings)?;
            overlaps[(i, j)] = value / (norms[i] * norms[j]).sqrt();
        }
    }
    Ok(overlaps)
}

/// Spatial profile of each eigenmode.
///
/// For every root, the mode is the eigenvector of `connectivity * E(root)`
/// whose eigenvalue is nearest to one. When `network` is given the modes are
/// normalized along it.
pub fn spatial_modes<E>(
    roots: &[Complex64],
    connectivity: &CMatrix,
    delay_matrix: &E,
    network: Option<&DelayNetwork>,
) -> Result<Vec<CVector>>
where
    E: TransferFunction + ?Sized,
{
    let one = Complex64::new(1.0, 0.0);
    let mut modes = Vec::with_capacity(roots.len());
    for (i, &root) in roots.iter().enumerate() {
        let delays = delay_matrix
            .evaluate(root)
            .map_err(|e| PotapovError::estimation(format!("for root {i} (z = {root})"), e))?;
        if connectivity.ncols() != delays.nrows() {
            return Err(PotapovError::invalid(format!(
                "connectivity is {}x{} but delay matrix is {}x{}",
                connectivity.nrows(),
                connectivity.ncols(),
                delays.nrows(),
                delays.ncols()
            )));
        }
        let pair = eigenpair_nearest(&(connectivity * delays), one)?;
        let mode = match network {
            Some(network) => normalize_mode(&pair.vector, network)?,
            None => pair.vector,
        };
        modes.push(mode);
    }
    Ok(modes)
}
