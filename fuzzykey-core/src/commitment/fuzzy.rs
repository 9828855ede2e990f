//! FuzzyCommitment — bind a key to a residue so a noisy residue reopens it
//!
//! The residue is quantized to one byte per coordinate and protected by a
//! systematic Reed–Solomon code. Only the codeword and `SHA-256(key)` are
//! stored. A later residue is re-encoded, spliced with the stored parity and
//! decoded; the corrected residue bytes re-derive the key, and the hash check
//! decides.

use super::ecc::ReedSolomon;
use crate::error::{FuzzyKeyError, Result};
use crate::kdf::{DerivedKey, KeyDeriver, KeyLabel, SecretMaterial};
use crate::sketch::{FeatureVector, Sketch};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ECC_REDUNDANCY: usize = 10;
pub const DEFAULT_ENCODING_SCALE: f64 = 100.0;

/// Public parameters of the commitment scheme
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommitmentConfig {
    /// Parity bytes; up to half as many residue symbols can be corrected
    pub ecc_redundancy: usize,
    /// Residue coordinates are multiplied by this before rounding to a byte
    pub encoding_scale: f64,
}

impl Default for CommitmentConfig {
    fn default() -> Self {
        Self {
            ecc_redundancy: DEFAULT_ECC_REDUNDANCY,
            encoding_scale: DEFAULT_ENCODING_SCALE,
        }
    }
}

impl CommitmentConfig {
    pub fn with_redundancy(ecc_redundancy: usize) -> Self {
        Self {
            ecc_redundancy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.encoding_scale.is_finite() && self.encoding_scale > 0.0) {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "encoding scale must be finite and positive, got {}",
                self.encoding_scale
            )));
        }
        // the codec checks the redundancy range itself
        ReedSolomon::new(self.ecc_redundancy).map(|_| ())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Residue as two's-complement bytes, `round(c_i · scale)` per coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResidue(Vec<u8>);

impl EncodedResidue {
    pub fn encode(residue: &FeatureVector, scale: f64) -> Result<Self> {
        residue
            .as_slice()
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let value = (c * scale).round();
                if !(f64::from(i8::MIN)..=f64::from(i8::MAX)).contains(&value) {
                    return Err(FuzzyKeyError::EncodingRange { index, value });
                }
                Ok(value as i8 as u8)
            })
            .collect::<Result<Vec<u8>>>()
            .map(Self)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Approximate residue, `byte / scale` per coordinate
    pub fn decode(&self, scale: f64) -> Result<FeatureVector> {
        FeatureVector::new(self.0.iter().map(|&b| f64::from(b as i8) / scale).collect())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stored half of a fuzzy commitment. Safe to publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// Encoded residue followed by `ecc_redundancy` parity bytes
    pub codeword: Vec<u8>,
    /// SHA-256 of the committed key
    pub key_hash: [u8; 32],
    pub ecc_redundancy: usize,
    pub encoding_scale: f64,
}

impl Commitment {
    pub fn residue_len(&self) -> usize {
        self.codeword.len().saturating_sub(self.ecc_redundancy)
    }

    pub fn parity(&self) -> &[u8] {
        &self.codeword[self.residue_len()..]
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

#[derive(Debug, Clone)]
pub struct FuzzyCommitment {
    config: CommitmentConfig,
    codec: ReedSolomon,
    deriver: KeyDeriver,
}

impl FuzzyCommitment {
    pub fn new(config: CommitmentConfig) -> Result<Self> {
        Self::with_deriver(config, KeyDeriver::default())
    }

    pub fn with_deriver(config: CommitmentConfig, deriver: KeyDeriver) -> Result<Self> {
        config.validate()?;
        let codec = ReedSolomon::new(config.ecc_redundancy)?;
        Ok(Self {
            config,
            codec,
            deriver,
        })
    }

    pub fn config(&self) -> &CommitmentConfig {
        &self.config
    }

    pub fn encode_residue(&self, residue: &FeatureVector) -> Result<EncodedResidue> {
        EncodedResidue::encode(residue, self.config.encoding_scale)
    }

    /// Key the commitment binds for this sketch's residue
    pub fn derive_key(&self, sketch: &Sketch) -> Result<DerivedKey> {
        let encoded = self.encode_residue(&sketch.residue)?;
        self.derive_from_encoded(encoded.as_bytes())
    }

    pub fn commit(&self, sketch: &Sketch) -> Result<Commitment> {
        let encoded = self.encode_residue(&sketch.residue)?;
        let key = self.derive_from_encoded(encoded.as_bytes())?;
        let codeword = self.codec.encode(encoded.as_bytes())?;

        info!(
            "Fuzzy commitment created: {} residue bytes + {} parity bytes",
            encoded.len(),
            self.config.ecc_redundancy
        );

        Ok(Commitment {
            codeword,
            key_hash: key.digest(),
            ecc_redundancy: self.config.ecc_redundancy,
            encoding_scale: self.config.encoding_scale,
        })
    }

    /// Reopen `commitment` with a fresh sketch of the same subject
    pub fn verify(&self, commitment: &Commitment, noisy: &Sketch) -> Result<DerivedKey> {
        self.check_parameters(commitment)?;
        let encoded = self.encode_residue(&noisy.residue)?;
        if encoded.len() != commitment.residue_len() {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: commitment.residue_len(),
                actual: encoded.len(),
            });
        }
        let mut candidate = encoded.into_bytes();
        candidate.extend_from_slice(commitment.parity());
        self.open(commitment, &candidate)
    }

    /// Reopen `commitment` from a full noisy codeword
    pub fn verify_codeword(&self, commitment: &Commitment, noisy_codeword: &[u8]) -> Result<DerivedKey> {
        self.check_parameters(commitment)?;
        if noisy_codeword.len() != commitment.codeword.len() {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: commitment.codeword.len(),
                actual: noisy_codeword.len(),
            });
        }
        self.open(commitment, noisy_codeword)
    }

    fn open(&self, commitment: &Commitment, candidate: &[u8]) -> Result<DerivedKey> {
        let (residue, corrected) = self.codec.decode(candidate).map_err(|e| {
            warn!("Fuzzy commitment decode failed: {}", e);
            e
        })?;
        debug!("Corrected {} residue symbols", corrected);

        let key = self.derive_from_encoded(&residue)?;
        if key.digest() != commitment.key_hash {
            warn!("Fuzzy commitment key hash mismatch");
            return Err(FuzzyKeyError::VerificationMismatch);
        }
        info!("Fuzzy commitment opened ({} symbols corrected)", corrected);
        Ok(key)
    }

    fn derive_from_encoded(&self, bytes: &[u8]) -> Result<DerivedKey> {
        self.deriver
            .derive(SecretMaterial::Bytes(bytes), &KeyLabel::FuzzyCommitment)
    }

    fn check_parameters(&self, commitment: &Commitment) -> Result<()> {
        if commitment.ecc_redundancy != self.config.ecc_redundancy
            || commitment.encoding_scale != self.config.encoding_scale
        {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "commitment uses redundancy {} and scale {}, verifier has {} and {}",
                commitment.ecc_redundancy,
                commitment.encoding_scale,
                self.config.ecc_redundancy,
                self.config.encoding_scale
            )));
        }
        if commitment.codeword.len() <= commitment.ecc_redundancy {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "codeword of {} bytes holds no residue",
                commitment.codeword.len()
            )));
        }
        Ok(())
    }
}
