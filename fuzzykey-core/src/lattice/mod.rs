//! Lattice layer — validated bases and nearest-point quantization
//!
//! - LatticeBasis: an invertible n × n basis with its solve cached
//! - LatticeQuantizer: approximate closest-vector by coordinate rounding

mod basis;
mod quantizer;

pub use basis::LatticeBasis;
pub use quantizer::LatticeQuantizer;
