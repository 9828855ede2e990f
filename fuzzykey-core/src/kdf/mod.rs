//! Key derivation — proxy keys and sketches into symmetric keys
//!
//! HKDF-SHA256 (RFC 5869) with no salt. The `info` field carries a
//! domain-separation label so keys derived for different protocol purposes
//! from the same secret are unrelated.
//!
//! - KeyDeriver / DerivedKey: symmetric keys for the cipher collaborator
//! - SigningScalar: private scalar for the asymmetric-keypair collaborator

mod scalar;

pub use scalar::{derive_signing_scalar, SigningScalar};

use crate::error::{FuzzyKeyError, Result};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Default derived key length (AES-256)
pub const DEFAULT_KEY_LEN: usize = 32;

/// Proxy keys are encoded as fixed-width big-endian integers of this size
pub const PROXY_KEY_BYTES: usize = 32;

/// RFC 5869 limit for SHA-256
const MAX_OUTPUT_LEN: usize = 255 * 32;

/// Domain-separation label passed as HKDF `info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyLabel {
    /// Keys derived from a proxy key
    FingerprintKey,
    /// Keys derived from an encoded residue under a fuzzy commitment
    FuzzyCommitment,
    Custom(String),
}

impl KeyLabel {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyLabel::FingerprintKey => b"fingerprint-key",
            KeyLabel::FuzzyCommitment => b"fuzzy-commitment",
            KeyLabel::Custom(label) => label.as_bytes(),
        }
    }
}

/// Input keying material
#[derive(Debug, Clone, Copy)]
pub enum SecretMaterial<'a> {
    ProxyKey(u64),
    Bytes(&'a [u8]),
}

impl SecretMaterial<'_> {
    fn to_ikm(self) -> Vec<u8> {
        match self {
            SecretMaterial::ProxyKey(key) => {
                let mut ikm = vec![0u8; PROXY_KEY_BYTES];
                ikm[PROXY_KEY_BYTES - 8..].copy_from_slice(&key.to_be_bytes());
                ikm
            }
            SecretMaterial::Bytes(bytes) => bytes.to_vec(),
        }
    }
}

/// Derived symmetric key. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 of the key, safe to publish alongside a commitment
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(&self.0).into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDeriver {
    output_len: usize,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self {
            output_len: DEFAULT_KEY_LEN,
        }
    }
}

impl KeyDeriver {
    pub fn new(output_len: usize) -> Result<Self> {
        if output_len == 0 || output_len > MAX_OUTPUT_LEN {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "output length must be in 1..={}, got {}",
                MAX_OUTPUT_LEN, output_len
            )));
        }
        Ok(Self { output_len })
    }

    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// HKDF-SHA256 extract-and-expand with no salt and `label` as info
    pub fn derive(&self, material: SecretMaterial<'_>, label: &KeyLabel) -> Result<DerivedKey> {
        let ikm = material.to_ikm();
        let hk = Hkdf::<Sha256>::new(None, &ikm);
        let mut okm = vec![0u8; self.output_len];
        hk.expand(label.as_bytes(), &mut okm)
            .map_err(|e| FuzzyKeyError::InvalidParameter(format!("HKDF expand: {}", e)))?;
        Ok(DerivedKey(okm))
    }

    /// Key bound to a proxy key under the `fingerprint-key` label
    pub fn derive_from_proxy_key(&self, proxy_key: u64) -> Result<DerivedKey> {
        self.derive(SecretMaterial::ProxyKey(proxy_key), &KeyLabel::FingerprintKey)
    }
}
