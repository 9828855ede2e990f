//! FeatureVector — one real-valued biometric sample
//!
//! Produced upstream (PCA-reduced fingerprint image), treated as opaque and
//! immutable here. Non-finite components are rejected at construction so
//! every downstream solve and hash sees well-defined numbers.

use crate::error::{FuzzyKeyError, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::ops::Sub;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(DVector<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        Self::from_dvector(DVector::from_vec(values))
    }

    pub fn from_slice(values: &[f64]) -> Result<Self> {
        Self::new(values.to_vec())
    }

    pub fn from_dvector(v: DVector<f64>) -> Result<Self> {
        if let Some(index) = v.iter().position(|x| !x.is_finite()) {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "feature vector component {} is not finite",
                index
            )));
        }
        Ok(Self(v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn as_dvector(&self) -> &DVector<f64> {
        &self.0
    }

    /// Euclidean distance to another vector of the same length
    pub fn distance(&self, other: &FeatureVector) -> Result<f64> {
        if self.len() != other.len() {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        Ok((&self.0 - &other.0).norm())
    }

    /// Little-endian bytes of every component, for hashing
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|x| x.to_le_bytes()).collect()
    }
}

impl Sub for &FeatureVector {
    type Output = DVector<f64>;

    fn sub(self, rhs: &FeatureVector) -> DVector<f64> {
        &self.0 - &rhs.0
    }
}

impl From<FeatureVector> for DVector<f64> {
    fn from(v: FeatureVector) -> Self {
        v.0
    }
}
