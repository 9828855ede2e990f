//! ProxyKeyHasher — universal hash from lattice coordinates into Z_p
//!
//! Sum-based and therefore order-independent. In `DirectMod` mode the hash
//! is additive mod p, which is what lets the reconciler recover key deltas
//! from coordinate deltas. It is not collision resistant; the security of a
//! derived key comes from the quantizer and the KDF around it. Key entropy
//! is at most log2(p) bits, so small moduli only suit experiments.

use crate::error::{FuzzyKeyError, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Scale factor per unit of modulus used when `ScaledInteger` has no explicit scale
const DEFAULT_SCALE_PER_MODULUS: f64 = 1e5;

/// Integral coordinates times an integral multiple of p all reduce to zero,
/// so the default scale is offset by one to stay coprime to p
const DEFAULT_SCALE_OFFSET: f64 = 1.0;

/// How a real coordinate is turned into a residue mod p
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HashMode {
    /// Round each (near-integral) coordinate, reduce mod p, sum
    DirectMod,
    /// Scale, round, take |·|, reduce mod p, sum. `None` means `p · 10⁵ + 1`
    ScaledInteger { scale: Option<f64> },
}

impl Default for HashMode {
    fn default() -> Self {
        HashMode::DirectMod
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyKeyHasher {
    modulus: u64,
    mode: HashMode,
}

impl ProxyKeyHasher {
    pub fn new(modulus: u64, mode: HashMode) -> Result<Self> {
        if modulus < 2 {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "modulus must be at least 2, got {}",
                modulus
            )));
        }
        if let HashMode::ScaledInteger { scale: Some(s) } = mode {
            if !(s.is_finite() && s > 0.0) {
                return Err(FuzzyKeyError::InvalidParameter(format!(
                    "hash scale must be positive and finite, got {}",
                    s
                )));
            }
            // lattice-point coordinates are integers: k·s ≡ 0 (mod p) for every k
            if s.fract() == 0.0 && s < u128::MAX as f64 && (s as u128) % modulus as u128 == 0 {
                return Err(FuzzyKeyError::InvalidParameter(format!(
                    "hash scale {} is a multiple of the modulus {}",
                    s, modulus
                )));
            }
        }
        Ok(Self { modulus, mode })
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn mode(&self) -> HashMode {
        self.mode
    }

    /// Effective scale in `ScaledInteger` mode
    pub fn scale(&self) -> Option<f64> {
        match self.mode {
            HashMode::DirectMod => None,
            HashMode::ScaledInteger { scale } => {
                Some(scale.unwrap_or(
                    self.modulus as f64 * DEFAULT_SCALE_PER_MODULUS + DEFAULT_SCALE_OFFSET,
                ))
            }
        }
    }

    /// Hash a coordinate vector to a value in `[0, p)`
    pub fn universal_hash(&self, coords: &DVector<f64>) -> u64 {
        let p = self.modulus as u128;
        let sum: u128 = coords.iter().map(|&c| self.reduce(c)).sum();
        (sum % p) as u64
    }

    fn reduce(&self, c: f64) -> u128 {
        let p = self.modulus as u128;
        match self.scale() {
            None => {
                // Integral after rounding, so the remainder is exact
                let r = c.round().rem_euclid(self.modulus as f64);
                (r as u128) % p
            }
            Some(scale) => {
                // `as` saturates on overflow
                let scaled = (c * scale).round().abs();
                (scaled as u128) % p
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_row_slice(values)
    }

    #[test]
    fn test_direct_mod() {
        let h = ProxyKeyHasher::new(7, HashMode::DirectMod).unwrap();
        assert_eq!(h.universal_hash(&v(&[0.0, 1.0])), 1);
        assert_eq!(h.universal_hash(&v(&[3.0, 5.0])), 1);
        // negative coordinates use the non-negative remainder
        assert_eq!(h.universal_hash(&v(&[-1.0, 0.0])), 6);
        assert_eq!(h.universal_hash(&v(&[-1.0, 8.0])), 0);
    }

    #[test]
    fn test_direct_mod_absorbs_float_noise() {
        let h = ProxyKeyHasher::new(7, HashMode::DirectMod).unwrap();
        assert_eq!(h.universal_hash(&v(&[2.9999999999, 1.0000000001])), 4);
    }

    #[test]
    fn test_direct_mod_is_additive() {
        let h = ProxyKeyHasher::new(11, HashMode::DirectMod).unwrap();
        let a = v(&[4.0, -7.0, 12.0]);
        let b = v(&[-3.0, 9.0, 5.0]);
        let sum = &a + &b;
        assert_eq!(
            h.universal_hash(&sum),
            (h.universal_hash(&a) + h.universal_hash(&b)) % 11
        );
    }

    #[test]
    fn test_order_independent() {
        let h = ProxyKeyHasher::new(13, HashMode::ScaledInteger { scale: Some(10.0) }).unwrap();
        assert_eq!(
            h.universal_hash(&v(&[0.3, -0.26, 1.7])),
            h.universal_hash(&v(&[1.7, 0.3, -0.26]))
        );
    }

    #[test]
    fn test_scaled_integer() {
        let h = ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: Some(10.0) }).unwrap();
        // round(3.0) + |round(-2.6)| = 3 + 3
        assert_eq!(h.universal_hash(&v(&[0.3, -0.26])), 6);
    }

    #[test]
    fn test_scaled_default_scale() {
        let h = ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: None }).unwrap();
        assert_eq!(h.scale(), Some(700_001.0));
        // 3·700001 ≡ 3 and |−2·700001| ≡ 2 (mod 7)
        assert_eq!(h.universal_hash(&v(&[3.0, -2.0])), 5);
    }

    #[test]
    fn test_scaled_default_separates_cells() {
        let h = ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: None }).unwrap();
        let keys: Vec<u64> = (0..7)
            .map(|k| h.universal_hash(&v(&[k as f64, 0.0, 0.0])))
            .collect();
        let mut distinct = keys.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), 7, "keys {:?}", keys);
    }

    #[test]
    fn test_scale_multiple_of_modulus_rejected() {
        for scale in [7.0, 14.0, 700_000.0] {
            assert!(ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: Some(scale) }).is_err());
        }
        assert!(ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: Some(10.5) }).is_ok());
        assert!(ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: Some(700_001.0) }).is_ok());
    }

    #[test]
    fn test_output_in_range() {
        let h = ProxyKeyHasher::new(5, HashMode::ScaledInteger { scale: Some(123.4) }).unwrap();
        for i in 0..200 {
            let x = i as f64 * 0.731 - 50.0;
            assert!(h.universal_hash(&v(&[x, x * 1.3, -x])) < 5);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ProxyKeyHasher::new(1, HashMode::DirectMod).is_err());
        assert!(ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: Some(0.0) }).is_err());
        assert!(ProxyKeyHasher::new(7, HashMode::ScaledInteger { scale: Some(f64::INFINITY) }).is_err());
    }
}
