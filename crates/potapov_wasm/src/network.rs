//! Mode overlaps and nonlinear weights on a delay network.

use crate::shared::{js_error, vector_from_wire, ComplexWire, MatrixWire};
use num_complex::Complex64;
use potapov_core::modes::{self, DelayNetwork, OverlapSettings};
use potapov_core::nonlinear::{self, InteractionSettings, NonlinearInteraction, Sign};
use potapov_core::traits::CMatrix;
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Debug, Deserialize)]
struct OverlapRequest {
    roots: Vec<ComplexWire>,
    modes: Vec<Vec<ComplexWire>>,
    delays: Vec<f64>,
    eps: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct InteractionRequest {
    frequencies: Vec<ComplexWire>,
    modes: Vec<Vec<ComplexWire>>,
    delays: Vec<f64>,
    delay_indices: Vec<usize>,
    start_offsets: Vec<f64>,
    length: f64,
    /// `1` for creation, `-1` for annihilation.
    signs: Vec<i32>,
    /// Defaults to one for every mode.
    refractive_indices: Option<Vec<f64>>,
    eps: Option<f64>,
}

fn overlap_matrix(request: &OverlapRequest) -> potapov_core::Result<CMatrix> {
    let network = DelayNetwork::new(request.delays.clone())?;
    let roots: Vec<Complex64> = request.roots.iter().map(|&r| r.into()).collect();
    let modes: Vec<_> = request.modes.iter().map(|m| vector_from_wire(m)).collect();
    let settings = request
        .eps
        .map(|eps| OverlapSettings { eps })
        .unwrap_or_else(OverlapSettings::for_matrix);
    modes::normalized_overlap_matrix(&roots, &modes, &network, settings)
}

fn weight(request: &InteractionRequest) -> potapov_core::Result<Complex64> {
    let network = DelayNetwork::new(request.delays.clone())?;
    let signs = request
        .signs
        .iter()
        .map(|&s| Sign::from_i32(s))
        .collect::<potapov_core::Result<Vec<_>>>()?;
    let interaction = NonlinearInteraction {
        frequencies: request.frequencies.iter().map(|&f| f.into()).collect(),
        modes: request.modes.iter().map(|m| vector_from_wire(m)).collect(),
        delay_indices: request.delay_indices.clone(),
        start_offsets: request.start_offsets.clone(),
        length: request.length,
        signs,
        refractive_indices: request
            .refractive_indices
            .clone()
            .unwrap_or_else(|| vec![1.0; request.frequencies.len()]),
    };
    let settings = request
        .eps
        .map(|eps| InteractionSettings { eps })
        .unwrap_or_default();
    nonlinear::interaction_weight(&interaction, &network, settings)
}

#[wasm_bindgen]
pub fn normalized_overlap_matrix(request_val: JsValue) -> Result<JsValue, JsValue> {
    let request: OverlapRequest =
        from_value(request_val).map_err(|e| js_error("Invalid overlap request", e))?;
    let overlaps = overlap_matrix(&request).map_err(|e| js_error("Overlap failed", e))?;
    to_value(&MatrixWire::from(&overlaps)).map_err(|e| js_error("Serialization error", e))
}

#[wasm_bindgen]
pub fn interaction_weight(request_val: JsValue) -> Result<JsValue, JsValue> {
    let request: InteractionRequest =
        from_value(request_val).map_err(|e| js_error("Invalid interaction request", e))?;
    let value = weight(&request).map_err(|e| js_error("Interaction weight failed", e))?;
    to_value(&ComplexWire::from(value)).map_err(|e| js_error("Serialization error", e))
}
