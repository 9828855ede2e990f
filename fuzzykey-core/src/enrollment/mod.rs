//! Enrollment — register a sample, later recover its key from a fresh one
//!
//! Registration publishes the residue and the hash of the derived key; the
//! proxy key itself is never stored. Recovery sketches the fresh sample,
//! reconciles its residue against the stored one to undo any lattice-cell
//! change, and re-derives the key. The hash check turns a wrong
//! reconciliation into an error instead of a silently different key.

use crate::error::{FuzzyKeyError, Result};
use crate::kdf::{derive_signing_scalar, DerivedKey, KeyDeriver, SigningScalar};
use crate::lattice::LatticeBasis;
use crate::sketch::{FeatureVector, SketchEngine};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Public enrollment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub residue: FeatureVector,
    /// SHA-256 of the enrolled key
    pub key_hash: [u8; 32],
}

impl Enrollment {
    pub fn register(
        engine: &SketchEngine,
        deriver: &KeyDeriver,
        sample: &FeatureVector,
    ) -> Result<(Self, DerivedKey)> {
        // an enrollment that can never be reconciled is refused up front
        engine.reconciler()?;
        let sketch = engine.generate(sample)?;
        let key = deriver.derive_from_proxy_key(sketch.proxy_key)?;
        let enrollment = Self {
            residue: sketch.residue,
            key_hash: key.digest(),
        };
        info!(
            "Enrolled {}-dimensional sample, key hash {}",
            enrollment.residue.len(),
            enrollment.key_hash_hex()
        );
        Ok((enrollment, key))
    }

    pub fn recover(
        &self,
        engine: &SketchEngine,
        deriver: &KeyDeriver,
        sample: &FeatureVector,
    ) -> Result<DerivedKey> {
        let sketch = engine.generate(sample)?;
        let reconciler = engine.reconciler()?;
        let delta = reconciler.diff_rec(&self.residue, &sketch.residue)?;
        let enrolled_key = reconciler.recover_proxy_key(sketch.proxy_key, delta);
        debug!("Reconciled proxy-key delta {}", delta);

        let key = deriver.derive_from_proxy_key(enrolled_key)?;
        if key.digest() != self.key_hash {
            warn!("Recovered key does not match enrollment {}", self.key_hash_hex());
            return Err(FuzzyKeyError::VerificationMismatch);
        }
        info!("Key recovered for enrollment {}", self.key_hash_hex());
        Ok(key)
    }

    /// Private scalar for the signing-keypair collaborator
    pub fn signing_scalar(&self, basis: &LatticeBasis) -> SigningScalar {
        derive_signing_scalar(&self.residue, basis)
    }

    pub fn key_hash_hex(&self) -> String {
        hex::encode(self.key_hash)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
