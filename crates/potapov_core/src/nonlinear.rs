//! Coupling weights of nonlinear interactions placed along delay lines.
//!
//! An interaction region (a crystal, say) sits on one delay segment per
//! participating mode. Wave numbers are `k = n(ω) ω` with the speed of light
//! set to one, and the net mismatch `Δk = Σ n_i ω_i s_i` decides between
//! linear growth with the region length and an oscillating rolloff.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PotapovError, Result};
use crate::modes::DelayNetwork;
use crate::traits::CVector;

/// Whether a mode enters the interaction through a creation (`+1`) or an
/// annihilation (`-1`) operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sign {
    Creation,
    Annihilation,
}

impl Sign {
    pub fn value(self) -> f64 {
        match self {
            Sign::Creation => 1.0,
            Sign::Annihilation => -1.0,
        }
    }

    pub fn from_i32(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Sign::Creation),
            -1 => Ok(Sign::Annihilation),
            other => Err(PotapovError::invalid(format!(
                "sign must be 1 or -1, got {other}"
            ))),
        }
    }

    /// Field amplitude as it enters the product: conjugated on annihilation.
    fn apply(self, amplitude: Complex64) -> Complex64 {
        match self {
            Sign::Creation => amplitude,
            Sign::Annihilation => amplitude.conj(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InteractionSettings {
    /// Mismatch below which phase matching is treated as perfect.
    pub eps: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self { eps: 1e-12 }
    }
}

/// One nonlinear process among `M` participating modes.
///
/// All per-mode vectors have length `M`.
#[derive(Debug, Clone)]
pub struct NonlinearInteraction {
    pub frequencies: Vec<Complex64>,
    pub modes: Vec<CVector>,
    /// Delay line carrying the interaction region, per mode.
    pub delay_indices: Vec<usize>,
    /// Offset of the region from the start of its delay line, per mode.
    pub start_offsets: Vec<f64>,
    /// Duration of the region.
    pub length: f64,
    pub signs: Vec<Sign>,
    pub refractive_indices: Vec<f64>,
}

impl NonlinearInteraction {
    /// Interaction whose region sits at the same place on the same delay
    /// line for every mode, with unit refractive indices.
    pub fn uniform(
        frequencies: Vec<Complex64>,
        modes: Vec<CVector>,
        delay_index: usize,
        start_offset: f64,
        length: f64,
        signs: Vec<Sign>,
    ) -> Self {
        let m = frequencies.len();
        Self {
            frequencies,
            modes,
            delay_indices: vec![delay_index; m],
            start_offsets: vec![start_offset; m],
            length,
            signs,
            refractive_indices: vec![1.0; m],
        }
    }

    /// Net phase mismatch `Σ n_i ω_i s_i`.
    pub fn phase_mismatch(&self) -> Complex64 {
        self.refractive_indices
            .iter()
            .zip(&self.frequencies)
            .zip(&self.signs)
            .map(|((&n, &omega), sign)| omega * (n * sign.value()))
            .sum()
    }

    fn validate(&self, network: &DelayNetwork) -> Result<()> {
        let m = self.frequencies.len();
        if m == 0 {
            return Err(PotapovError::invalid("interaction needs at least one mode"));
        }
        let lengths = [
            ("modes", self.modes.len()),
            ("delay_indices", self.delay_indices.len()),
            ("start_offsets", self.start_offsets.len()),
            ("signs", self.signs.len()),
            ("refractive_indices", self.refractive_indices.len()),
        ];
        for (name, len) in lengths {
            if len != m {
                return Err(PotapovError::invalid(format!(
                    "{name} has {len} entries but there are {m} frequencies"
                )));
            }
        }
        if !self.length.is_finite() || self.length < 0.0 {
            return Err(PotapovError::invalid(format!(
                "interaction length must be non-negative, got {}",
                self.length
            )));
        }

        for i in 0..m {
            let index = self.delay_indices[i];
            let delay = network.delay(index).ok_or_else(|| {
                PotapovError::invalid(format!(
                    "mode {i} uses delay {index} but the network has {} delays",
                    network.len()
                ))
            })?;
            if self.modes[i].len() <= index {
                return Err(PotapovError::invalid(format!(
                    "mode {i} has no amplitude at node {index}"
                )));
            }
            let start = self.start_offsets[i];
            if !start.is_finite() || start < 0.0 {
                return Err(PotapovError::invalid(format!(
                    "start offset of mode {i} must be non-negative, got {start}"
                )));
            }
            if start + self.length > delay {
                return Err(PotapovError::invalid(format!(
                    "region of mode {i} ends at {} beyond delay {index} of length {delay}",
                    start + self.length
                )));
            }
        }
        Ok(())
    }
}

/// `L` for `|Δk| < eps`, otherwise `i (exp(-i Δk L) - 1) / Δk`, the
/// integral of `exp(-i Δk t)` over the region.
pub fn phase_matching_factor(delta_k: Complex64, length: f64, eps: f64) -> Complex64 {
    if delta_k.norm() < eps {
        Complex64::new(length, 0.0)
    } else {
        let i = Complex64::new(0.0, 1.0);
        i * ((-i * delta_k * length).exp() - 1.0) / delta_k
    }
}

/// Coupling weight of a single interaction.
///
/// The prefactor is the product over modes of the amplitude at the mode's
/// delay node, phase-shifted by `exp(-i Δk start)` and conjugated for
/// annihilation.
pub fn interaction_weight(
    interaction: &NonlinearInteraction,
    network: &DelayNetwork,
    settings: InteractionSettings,
) -> Result<Complex64> {
    interaction.validate(network)?;

    let delta_k = interaction.phase_mismatch();
    let i = Complex64::new(0.0, 1.0);
    let mut prefactor = Complex64::new(1.0, 0.0);
    for m in 0..interaction.frequencies.len() {
        let amplitude = interaction.modes[m][interaction.delay_indices[m]];
        let shifted = amplitude * (-i * delta_k * interaction.start_offsets[m]).exp();
        prefactor *= interaction.signs[m].apply(shifted);
    }

    Ok(prefactor * phase_matching_factor(delta_k, interaction.length, settings.eps))
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn two_mode_interaction(omega_a: f64, omega_b: f64) -> (NonlinearInteraction, DelayNetwork) {
        let network = DelayNetwork::new(vec![2.0, 3.0]).expect("network");
        let modes = vec![
            CVector::from_vec(vec![c(0.5, 0.0), c(1.0, 1.0)]),
            CVector::from_vec(vec![c(0.0, 0.0), c(2.0, -1.0)]),
        ];
        let interaction = NonlinearInteraction::uniform(
            vec![c(0.0, omega_a), c(0.0, omega_b)],
            modes,
            1,
            0.0,
            1.5,
            vec![Sign::Creation, Sign::Annihilation],
        );
        (interaction, network)
    }

    #[test]
    fn phase_matching_factor_is_continuous_at_zero() {
        let length = 1.5;
        let eps = 1e-12;
        let matched = phase_matching_factor(c(0.0, 0.0), length, eps);
        let nearly = phase_matching_factor(c(1e-6, 0.0), length, eps);
        assert!((matched - c(length, 0.0)).norm() < 1e-15);
        assert!((nearly - matched).norm() < 1e-5);
    }

    #[test]
    fn matched_weight_grows_linearly_with_length() {
        let (interaction, network) = two_mode_interaction(3.0, 3.0);
        let weight = interaction_weight(&interaction, &network, InteractionSettings::default())
            .expect("weight");
        // (1 + i) * conj(2 - i) * 1.5
        let expected = c(1.0, 1.0) * c(2.0, 1.0) * 1.5;
        assert!((weight - expected).norm() < 1e-12);
    }

    #[test]
    fn weight_is_continuous_in_mismatch() {
        let (matched, network) = two_mode_interaction(3.0, 3.0);
        let (mismatched, _) = two_mode_interaction(3.0, 3.0 + 1e-6);
        let settings = InteractionSettings::default();
        let a = interaction_weight(&matched, &network, settings).expect("matched");
        let b = interaction_weight(&mismatched, &network, settings).expect("mismatched");
        assert!(mismatched.phase_mismatch().norm() > settings.eps);
        assert!((a - b).norm() < 1e-5);
    }

    #[test]
    fn mismatched_weight_uses_closed_form() {
        let (mut interaction, network) = two_mode_interaction(1.0, 0.0);
        interaction.start_offsets = vec![0.5, 0.25];
        interaction.length = 1.0;
        let delta_k = interaction.phase_mismatch();
        let i = c(0.0, 1.0);
        let a = c(1.0, 1.0) * (-i * delta_k * 0.5).exp();
        let b = (c(2.0, -1.0) * (-i * delta_k * 0.25).exp()).conj();
        let expected = a * b * i * ((-i * delta_k).exp() - 1.0) / delta_k;
        let weight = interaction_weight(&interaction, &network, InteractionSettings::default())
            .expect("weight");
        assert!((weight - expected).norm() < 1e-12);
    }

    #[test]
    fn refractive_indices_scale_mismatch() {
        let (mut interaction, _) = two_mode_interaction(2.0, 1.0);
        interaction.refractive_indices = vec![1.5, 3.0];
        assert!((interaction.phase_mismatch() - c(0.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn invalid_regions_are_rejected() {
        let settings = InteractionSettings::default();

        let (mut interaction, network) = two_mode_interaction(1.0, 1.0);
        interaction.start_offsets = vec![-0.1, 0.0];
        assert_err_contains(interaction_weight(&interaction, &network, settings), "non-negative");

        let (mut interaction, network) = two_mode_interaction(1.0, 1.0);
        interaction.start_offsets = vec![2.0, 0.0];
        assert_err_contains(interaction_weight(&interaction, &network, settings), "beyond delay 1");

        let (mut interaction, network) = two_mode_interaction(1.0, 1.0);
        interaction.length = -1.0;
        assert_err_contains(interaction_weight(&interaction, &network, settings), "length");

        let (mut interaction, network) = two_mode_interaction(1.0, 1.0);
        interaction.delay_indices = vec![1, 5];
        assert_err_contains(interaction_weight(&interaction, &network, settings), "uses delay 5");

        let (mut interaction, network) = two_mode_interaction(1.0, 1.0);
        interaction.signs.pop();
        assert_err_contains(interaction_weight(&interaction, &network, settings), "signs has 1");
    }

    #[test]
    fn sign_conversion_accepts_only_unit_values() {
        assert_eq!(Sign::from_i32(1).expect("sign"), Sign::Creation);
        assert_eq!(Sign::from_i32(-1).expect("sign"), Sign::Annihilation);
        assert_err_contains(Sign::from_i32(0), "1 or -1");
    }
}
