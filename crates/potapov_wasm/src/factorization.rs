//! Factorization of a JS-supplied transfer function.

use crate::shared::{complex_pairs, js_error, vector_to_wire, JsTransfer, MatrixWire};
use js_sys::Function;
use num_complex::Complex64;
use potapov_core::extraction::ExtractionSettings;
use potapov_core::traits::TransferFunction;
use potapov_core::Factorization;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmFactorization {
    factorization: Factorization,
    transfer: JsTransfer,
}

fn parse_settings(settings_val: JsValue) -> Result<ExtractionSettings, JsValue> {
    if settings_val.is_undefined() || settings_val.is_null() {
        return Ok(ExtractionSettings::default());
    }
    from_value(settings_val).map_err(|e| js_error("Invalid extraction settings", e))
}

#[wasm_bindgen]
impl WasmFactorization {
    /// `transfer(re, im)` must return the interleaved row-major entries of
    /// `T(re + i im)`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        poles_re: Vec<f64>,
        poles_im: Vec<f64>,
        transfer: Function,
        settings_val: JsValue,
    ) -> Result<WasmFactorization, JsValue> {
        console_error_panic_hook::set_once();

        let poles = complex_pairs(&poles_re, &poles_im).map_err(|e| JsValue::from_str(&e))?;
        let settings = parse_settings(settings_val)?;
        let transfer = JsTransfer::new(transfer);
        let factorization = Factorization::extract(&transfer, &poles, settings)
            .map_err(|e| js_error("Extraction failed", e))?;

        Ok(WasmFactorization {
            factorization,
            transfer,
        })
    }

    pub fn dimension(&self) -> usize {
        self.factorization.dimension()
    }

    pub fn vectors(&self) -> Result<JsValue, JsValue> {
        let vectors: Vec<_> = self.factorization.vectors().iter().map(vector_to_wire).collect();
        to_value(&vectors).map_err(|e| js_error("Serialization error", e))
    }

    /// The Blaschke-Potapov product at `re + i im`.
    pub fn evaluate(&self, re: f64, im: f64) -> Result<JsValue, JsValue> {
        let product = self
            .factorization
            .product()
            .map_err(|e| js_error("Product failed", e))?;
        let value = product.evaluate_at(Complex64::new(re, im));
        to_value(&MatrixWire::from(&value)).map_err(|e| js_error("Serialization error", e))
    }

    /// The product rescaled to match the transfer function at the origin.
    pub fn reconstruct(&self, re: f64, im: f64) -> Result<JsValue, JsValue> {
        let reconstruction = self
            .factorization
            .reconstruct(&self.transfer)
            .map_err(|e| js_error("Reconstruction failed", e))?;
        let value = reconstruction.evaluate_at(Complex64::new(re, im));
        to_value(&MatrixWire::from(&value)).map_err(|e| js_error("Serialization error", e))
    }

    /// State-space realization; when both fit coordinates are given the
    /// feed-through is fitted to the transfer function there.
    pub fn realization(&self, fit_re: Option<f64>, fit_im: Option<f64>) -> Result<JsValue, JsValue> {
        let fit = match (fit_re, fit_im) {
            (Some(re), Some(im)) => {
                let fit: (&dyn TransferFunction, Complex64) = (&self.transfer, Complex64::new(re, im));
                Some(fit)
            }
            (None, None) => None,
            _ => {
                return Err(JsValue::from_str(
                    "Both fit_re and fit_im are required to fit the feed-through",
                ))
            }
        };
        let realization = self
            .factorization
            .realization(fit)
            .map_err(|e| js_error("Realization failed", e))?;
        to_value(&realization.to_data()).map_err(|e| js_error("Serialization error", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn single_pole_transfer() -> Function {
        // 1x1 Blaschke factor (z - 1 + 2i) / (z + 1 + 2i).
        Function::new_with_args(
            "re, im",
            "const nr = re - 1, ni = im + 2; const dr = re + 1, di = im + 2;\
             const d = dr * dr + di * di;\
             return [(nr * dr + ni * di) / d, (ni * dr - nr * di) / d];",
        )
    }

    #[wasm_bindgen_test]
    fn factorization_recovers_single_pole() {
        let factorization = WasmFactorization::new(
            vec![-1.0],
            vec![-2.0],
            single_pole_transfer(),
            JsValue::UNDEFINED,
        )
        .expect("factorization");
        assert_eq!(factorization.dimension(), 1);

        let vectors: Vec<Vec<crate::shared::ComplexWire>> =
            from_value(factorization.vectors().expect("vectors")).expect("decode");
        let entry = vectors[0][0];
        assert!(((entry.re * entry.re + entry.im * entry.im) - 1.0).abs() < 1e-8);
    }

    #[wasm_bindgen_test]
    fn factorization_rejects_mismatched_pole_parts() {
        let result = WasmFactorization::new(
            vec![-1.0, -2.0],
            vec![0.0],
            single_pole_transfer(),
            JsValue::UNDEFINED,
        );
        let message = result
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("Mismatched parts"));
    }

    #[wasm_bindgen_test]
    fn realization_requires_both_fit_coordinates() {
        let factorization = WasmFactorization::new(
            vec![-1.0],
            vec![-2.0],
            single_pole_transfer(),
            JsValue::UNDEFINED,
        )
        .expect("factorization");
        assert!(factorization.realization(None, None).is_ok());
        assert!(factorization.realization(Some(0.0), None).is_err());
    }
}
