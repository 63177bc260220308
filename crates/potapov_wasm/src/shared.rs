//! Wire types and conversions shared by the bindings.

use anyhow::{anyhow, bail};
use js_sys::{Array, Float64Array, Function};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use potapov_core::traits::{CMatrix, CVector, TransferFunction};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct ComplexWire {
    pub re: f64,
    pub im: f64,
}

impl From<Complex64> for ComplexWire {
    fn from(value: Complex64) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

impl From<ComplexWire> for Complex64 {
    fn from(value: ComplexWire) -> Self {
        Complex64::new(value.re, value.im)
    }
}

/// Row-major matrix payload.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MatrixWire {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<ComplexWire>,
}

impl From<&CMatrix> for MatrixWire {
    fn from(matrix: &CMatrix) -> Self {
        let mut data = Vec::with_capacity(matrix.len());
        for i in 0..matrix.nrows() {
            for j in 0..matrix.ncols() {
                data.push(matrix[(i, j)].into());
            }
        }
        Self {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            data,
        }
    }
}

pub(crate) fn vector_from_wire(entries: &[ComplexWire]) -> CVector {
    DVector::from_iterator(entries.len(), entries.iter().map(|&c| Complex64::from(c)))
}

pub(crate) fn vector_to_wire(vector: &CVector) -> Vec<ComplexWire> {
    vector.iter().map(|&c| c.into()).collect()
}

pub(crate) fn complex_pairs(re: &[f64], im: &[f64]) -> Result<Vec<Complex64>, String> {
    if re.len() != im.len() {
        return Err(format!(
            "Mismatched parts: {} real vs {} imaginary",
            re.len(),
            im.len()
        ));
    }
    Ok(re.iter().zip(im).map(|(&r, &i)| Complex64::new(r, i)).collect())
}

/// Square matrix from `[re00, im00, re01, im01, ...]` in row-major order.
pub(crate) fn matrix_from_interleaved(flat: &[f64]) -> anyhow::Result<CMatrix> {
    if flat.is_empty() || flat.len() % 2 != 0 {
        bail!("expected a non-empty even number of values, got {}", flat.len());
    }
    let entries = flat.len() / 2;
    let n = (entries as f64).sqrt().round() as usize;
    if n * n != entries {
        bail!("{} complex entries do not form a square matrix", entries);
    }
    Ok(DMatrix::from_fn(n, n, |i, j| {
        let k = 2 * (i * n + j);
        Complex64::new(flat[k], flat[k + 1])
    }))
}

/// Transfer function backed by a JS callback `(re, im) => number[]`.
#[derive(Clone)]
pub(crate) struct JsTransfer {
    callback: Function,
}

impl JsTransfer {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl TransferFunction for JsTransfer {
    fn evaluate(&self, z: Complex64) -> anyhow::Result<CMatrix> {
        let value = self
            .callback
            .call2(&JsValue::NULL, &JsValue::from_f64(z.re), &JsValue::from_f64(z.im))
            .map_err(|e| anyhow!("transfer callback threw: {:?}", e))?;
        let flat = if let Some(typed) = value.dyn_ref::<Float64Array>() {
            typed.to_vec()
        } else if Array::is_array(&value) {
            Float64Array::new(&value).to_vec()
        } else {
            bail!(
                "transfer callback must return an array of numbers, got {:?}",
                value
            );
        };
        matrix_from_interleaved(&flat)
    }
}

pub(crate) fn js_error(prefix: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", prefix, e))
}
