//! Reconciler — recover a proxy-key delta from two public residues
//!
//! With `c_i = x_i − y_i` and `x_2 ≈ x_1`, the residue delta is
//! `Δc = c_2 − c_1 ≈ −(y_2 − y_1)`, so quantizing `Δc` exposes the lattice
//! shift between the two samples. The `DirectMod` hash is additive mod p,
//! hence `UH(coords(y_2 − y_1)) = a_2 − a_1 (mod p)` without either party
//! revealing its proxy key.
//!
//! Limitation: the sign rule `⟨Δy, Δc⟩ > 0` is a heuristic. It holds while
//! the sample noise is small against the lattice minimum distance and can
//! flip the delta otherwise. `ScaledInteger` hashing and absolute residues
//! are not additive; engines configured with either are refused.

use super::engine::SketchEngine;
use super::hasher::HashMode;
use super::vector::FeatureVector;
use crate::error::{FuzzyKeyError, Result};
use log::debug;

pub struct Reconciler<'a> {
    engine: &'a SketchEngine,
}

impl<'a> Reconciler<'a> {
    /// Fails unless the engine hashes with `DirectMod` over signed residues
    pub fn new(engine: &'a SketchEngine) -> Result<Self> {
        let config = engine.config();
        if config.hash_mode != HashMode::DirectMod {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "reconciliation needs an additive hash, engine uses {:?}",
                config.hash_mode
            )));
        }
        if config.absolute_residue {
            return Err(FuzzyKeyError::InvalidParameter(
                "reconciliation needs signed residues, engine stores absolute ones".into(),
            ));
        }
        Ok(Self { engine })
    }

    /// Signed delta `a_2 − a_1` recovered from residues `c_1`, `c_2`
    pub fn diff_rec(&self, first: &FeatureVector, second: &FeatureVector) -> Result<i64> {
        if first.len() != second.len() {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: first.len(),
                actual: second.len(),
            });
        }
        let basis = self.engine.basis();
        let delta_c = second - first;
        let delta_y = self
            .engine
            .quantizer()
            .nearest_lattice_point(basis, &delta_c)?;

        let sign: i64 = if delta_y.dot(&delta_c) > 0.0 { 1 } else { -1 };
        // Δy points from the second lattice point back to the first
        let shift = -basis.coordinates(&delta_y)?;
        let magnitude = self.engine.hasher().universal_hash(&shift) as i64;

        debug!(
            "DiffRec: delta_c={:?} delta_y={:?} sign={}",
            delta_c.as_slice(),
            delta_y.as_slice(),
            sign
        );

        Ok(sign * magnitude)
    }

    /// `diff_rec` reduced into `[0, p)`
    pub fn diff_rec_mod(&self, first: &FeatureVector, second: &FeatureVector) -> Result<u64> {
        let delta = self.diff_rec(first, second)?;
        Ok(self.reduce(delta as i128))
    }

    /// Given `a_2` and `Δ = a_2 − a_1`, return `a_1 = a_2 − Δ (mod p)`
    pub fn recover_proxy_key(&self, known_key: u64, delta: i64) -> u64 {
        self.reduce(known_key as i128 - delta as i128)
    }

    fn reduce(&self, value: i128) -> u64 {
        value.rem_euclid(self.engine.modulus() as i128) as u64
    }
}

impl SketchEngine {
    pub fn reconciler(&self) -> Result<Reconciler<'_>> {
        Reconciler::new(self)
    }
}
