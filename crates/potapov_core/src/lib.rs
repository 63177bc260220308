pub mod error;
pub mod extraction;
pub mod factorization;
pub mod hamiltonian;
pub mod limits;
pub mod linalg;
pub mod modes;
pub mod nonlinear;
pub mod pade;
pub mod potapov;
pub mod realization;
/// The `potapov_core` crate turns a passive linear network, given as a transfer function,
/// into a Blaschke–Potapov product and from there into a state-space model.
///
/// Key components:
/// - **Traits**: `TransferFunction` (matrix-valued callables) and the complex matrix aliases.
/// - **Potapov**: elementary factors, the finite product, and its truncations.
/// - **Extraction**: residue-based recovery of the factor vectors from known poles.
/// - **Realization**: per-pole state-space blocks cascaded in series.
/// - **Modes**: spatial modes along delay lines and their normalized overlaps.
/// - **Nonlinear / Hamiltonian**: phase-matched coupling weights of nonlinear interactions.
pub mod traits;

pub use error::{PotapovError, Result};
pub use factorization::{Factorization, Reconstruction};
pub use realization::StateSpaceRealization;
pub use traits::{CMatrix, CVector, TransferFunction};
