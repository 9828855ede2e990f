//! LatticeQuantizer — approximate closest-vector by coordinate rounding
//!
//! Solves for lattice coordinates, rounds each one half-away-from-zero and
//! maps back. This is exact only for orthogonal bases and a good
//! approximation for near-orthogonal, low-dimensional ones; it is not a CVP
//! solver for arbitrary lattices.

use super::LatticeBasis;
use crate::error::{FuzzyKeyError, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatticeQuantizer {
    /// Grid resolution coordinates are snapped to before rounding
    pub tolerance: Option<f64>,
}

impl LatticeQuantizer {
    pub fn new() -> Self {
        Self { tolerance: None }
    }

    pub fn with_tolerance(tolerance: f64) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "tolerance must be positive and finite, got {}",
                tolerance
            )));
        }
        Ok(Self { tolerance: Some(tolerance) })
    }

    /// Integer lattice coordinates of the (approximate) nearest lattice point
    pub fn nearest_coordinates(&self, basis: &LatticeBasis, x: &DVector<f64>) -> Result<DVector<f64>> {
        let u = basis.coordinates(x)?;
        Ok(u.map(|c| self.round_coordinate(c)))
    }

    /// The (approximate) nearest lattice point to `x`
    pub fn nearest_lattice_point(&self, basis: &LatticeBasis, x: &DVector<f64>) -> Result<DVector<f64>> {
        let k = self.nearest_coordinates(basis, x)?;
        basis.point(&k)
    }

    fn round_coordinate(&self, c: f64) -> f64 {
        let snapped = match self.tolerance {
            Some(t) => (c / t).round() * t,
            None => c,
        };
        // f64::round is half-away-from-zero
        snapped.round()
    }
}
