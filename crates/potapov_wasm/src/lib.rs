//! WASM bindings for `potapov_core`.
//!
//! JS callers hand over transfer functions as callbacks and receive matrices
//! as row-major `{ rows, cols, data: [{ re, im }] }` payloads.

mod factorization;
mod network;
mod shared;

pub use factorization::WasmFactorization;
pub use network::{interaction_weight, normalized_overlap_matrix};
