//! Signing scalar — a P-256 private scalar bound to a sketch
//!
//! `SHA-256(domain ‖ residue ‖ basis)` reduced modulo the P-256 group order.
//! The keypair itself is built by an external collaborator.

use crate::lattice::LatticeBasis;
use crate::sketch::FeatureVector;
use p256::elliptic_curve::bigint::ArrayEncoding;
use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::PrimeField;
use p256::{Scalar, U256};
use sha2::{Digest, Sha256};
use std::fmt;

/// Domain separator for signing-scalar derivation
const SCALAR_DOMAIN: &[u8] = b"FUZZYKEY_P256_SCALAR_V1";

/// Element of the P-256 scalar field. `Debug` never prints the value.
#[derive(Clone)]
pub struct SigningScalar(Scalar);

impl SigningScalar {
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_repr().into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }
}

impl PartialEq for SigningScalar {
    fn eq(&self, other: &Self) -> bool {
        self.to_be_bytes() == other.to_be_bytes()
    }
}

impl Eq for SigningScalar {}

impl fmt::Debug for SigningScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningScalar(<redacted>)")
    }
}

pub fn derive_signing_scalar(residue: &FeatureVector, basis: &LatticeBasis) -> SigningScalar {
    let mut hasher = Sha256::new();
    hasher.update(SCALAR_DOMAIN);
    hasher.update(residue.to_le_bytes());
    for val in basis.to_rows().iter().flatten() {
        hasher.update(val.to_le_bytes());
    }
    let digest: [u8; 32] = hasher.finalize().into();
    SigningScalar(reduce_digest(digest))
}

fn reduce_digest(digest: [u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce(U256::from_be_byte_array(digest.into()))
}
