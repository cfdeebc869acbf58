//! Numerical verification for vecbench kernels.
//!
//! # Key Components
//!
//! - [`oracle`]: compensated extended-precision dot product and scalar
//!   element-wise references
//! - [`tolerance::Tolerance`]: fixed per-dtype and magnitude-adaptive bounds
//! - [`verifier::Verifier`]: re-runs a kernel on the initial state and grades it

pub mod oracle;
pub mod tolerance;
pub mod verifier;

pub use oracle::{reference_dot, DotReference};
pub use tolerance::Tolerance;
pub use verifier::{
    compare_elementwise, InitialState, VerificationOutcome, Verifier, VerifyError,
};
