//! Vector kernels for the vecbench SIMD harness.
//!
//! Each kernel exists in an index-stride and a sample-stride variant and is
//! generic over [`Element`], which ties the element type to its wide
//! accumulator and tolerance constants.

pub mod addressing;
pub mod config;
pub mod dot;
pub mod element;
pub mod kernel;
pub mod multiply;
pub mod registry;
pub mod saxpy;
pub mod stencil;
pub mod wide;

pub use addressing::*;
pub use config::*;
pub use dot::*;
pub use element::*;
pub use kernel::*;
pub use multiply::*;
pub use registry::*;
pub use saxpy::*;
pub use stencil::*;
pub use wide::*;
