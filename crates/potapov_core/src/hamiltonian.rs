//! Numeric coefficients of the linear and nonlinear parts of a Hamiltonian.
//!
//! Operator algebra is left to the caller; this module only produces the
//! coupling matrix of the linear part and a table of weights keyed by which
//! modes take part in each nonlinear term and how.

use std::collections::BTreeMap;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PotapovError, Result};
use crate::modes::DelayNetwork;
use crate::nonlinear::{interaction_weight, InteractionSettings, NonlinearInteraction, Sign};
use crate::traits::{CMatrix, CVector};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HamiltonianSettings {
    /// Order of the susceptibility; terms have `chi_order + 1` operators.
    pub chi_order: usize,
    pub photons_annihilated: usize,
    /// Terms with `|weight| <= significance` are dropped.
    pub significance: f64,
    pub nonlinear_coefficient: f64,
    pub interaction: InteractionSettings,
}

impl Default for HamiltonianSettings {
    fn default() -> Self {
        Self {
            chi_order: 3,
            photons_annihilated: 2,
            significance: 1e-5,
            nonlinear_coefficient: 1.0,
            interaction: InteractionSettings::default(),
        }
    }
}

/// Which part of the linear dynamics the coupling matrix describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dynamics {
    /// `-i A`, not Hermitian in general.
    Full,
    /// `(A - A^H) / 2i`, the closed (Hermitian) part.
    Closed,
}

/// Coupling matrix `Ω` of the linear term `Σ Ω_ij a_i^† a_j`.
pub fn linear_coupling(a: &CMatrix, dynamics: Dynamics) -> CMatrix {
    let i = Complex64::new(0.0, 1.0);
    match dynamics {
        Dynamics::Full => a * (-i),
        Dynamics::Closed => (a - a.adjoint()) / (i * 2.0),
    }
}

/// Key of one nonlinear term: the mode of every operator and whether it
/// creates or annihilates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NonlinearTerm {
    pub modes: Vec<usize>,
    pub signs: Vec<Sign>,
}

/// Every placement of `photons_annihilated` annihilation operators among
/// `chi_order + 1` slots, each placement listed once.
pub fn sign_patterns(chi_order: usize, photons_annihilated: usize) -> Result<Vec<Vec<Sign>>> {
    let slots = chi_order + 1;
    if photons_annihilated > slots {
        return Err(PotapovError::invalid(format!(
            "cannot annihilate {photons_annihilated} photons with {slots} operators"
        )));
    }
    Ok(combinations(slots, photons_annihilated)
        .into_iter()
        .map(|picked| {
            let mut signs = vec![Sign::Creation; slots];
            for index in picked {
                signs[index] = Sign::Annihilation;
            }
            signs
        })
        .collect())
}

/// Increasing `k`-subsets of `0..n` in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    fn recurse(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            recurse(i + 1, n, k, current, out);
            current.pop();
        }
    }
    recurse(0, n, k, &mut current, &mut out);
    out
}

/// Non-decreasing length-`k` sequences over `0..m` in lexicographic order.
pub fn mode_combinations(m: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if m == 0 && k > 0 {
        return out;
    }
    let mut current = vec![0usize; k];
    loop {
        out.push(current.clone());
        // Rightmost slot that can still grow.
        let Some(pos) = (0..k).rev().find(|&p| current[p] + 1 < m) else {
            break;
        };
        let next = current[pos] + 1;
        for slot in &mut current[pos..] {
            *slot = next;
        }
    }
    out
}

/// Modes of a delay network together with one interaction region shared by
/// all nonlinear terms.
#[derive(Debug, Clone)]
pub struct HamiltonianModel {
    /// Frequency of each mode as it enters the phase mismatch.
    pub frequencies: Vec<Complex64>,
    pub modes: Vec<CVector>,
    pub network: DelayNetwork,
    pub delay_index: usize,
    pub start_offset: f64,
    pub length: f64,
    /// Refractive index seen by each mode.
    pub refractive_indices: Vec<f64>,
}

impl HamiltonianModel {
    fn interaction(&self, term: &NonlinearTerm) -> NonlinearInteraction {
        let count = term.modes.len();
        NonlinearInteraction {
            frequencies: term.modes.iter().map(|&m| self.frequencies[m]).collect(),
            modes: term.modes.iter().map(|&m| self.modes[m].clone()).collect(),
            delay_indices: vec![self.delay_index; count],
            start_offsets: vec![self.start_offset; count],
            length: self.length,
            signs: term.signs.clone(),
            refractive_indices: term.modes.iter().map(|&m| self.refractive_indices[m]).collect(),
        }
    }
}

/// Weight of every nonlinear term allowed by `settings`.
///
/// The number of terms grows combinatorially with the number of modes and
/// the susceptibility order.
pub fn nonlinear_weights(
    model: &HamiltonianModel,
    settings: &HamiltonianSettings,
) -> Result<BTreeMap<NonlinearTerm, Complex64>> {
    let m = model.frequencies.len();
    if model.modes.len() != m || model.refractive_indices.len() != m {
        return Err(PotapovError::invalid(format!(
            "model has {} frequencies, {} modes and {} refractive indices",
            m,
            model.modes.len(),
            model.refractive_indices.len()
        )));
    }

    let patterns = sign_patterns(settings.chi_order, settings.photons_annihilated)?;
    let combinations = mode_combinations(m, settings.chi_order + 1);
    let mut weights = BTreeMap::new();
    for signs in &patterns {
        for modes in &combinations {
            let term = NonlinearTerm {
                modes: modes.clone(),
                signs: signs.clone(),
            };
            let weight = interaction_weight(&model.interaction(&term), &model.network, settings.interaction)?;
            weights.insert(term, weight);
        }
    }
    Ok(weights)
}

/// Terms whose weight exceeds `significance` in magnitude.
pub fn significant_weights(
    weights: &BTreeMap<NonlinearTerm, Complex64>,
    significance: f64,
) -> BTreeMap<NonlinearTerm, Complex64> {
    weights
        .iter()
        .filter(|(_, weight)| weight.norm() > significance)
        .map(|(term, &weight)| (term.clone(), weight))
        .collect()
}

/// Significant nonlinear terms scaled by the nonlinear coefficient.
pub fn nonlinear_terms(
    model: &HamiltonianModel,
    settings: &HamiltonianSettings,
) -> Result<BTreeMap<NonlinearTerm, Complex64>> {
    let weights = nonlinear_weights(model, settings)?;
    Ok(significant_weights(&weights, settings.significance)
        .into_iter()
        .map(|(term, weight)| (term, weight * settings.nonlinear_coefficient))
        .collect())
}
