//! Fuzzy commitment layer
//!
//! - ReedSolomon: GF(2⁸) error-correcting codec
//! - FuzzyCommitment: commit a sketch residue, reopen it from a noisy one

mod ecc;
mod fuzzy;

pub use ecc::{ReedSolomon, MAX_CODEWORD_LEN};
pub use fuzzy::{
    Commitment, CommitmentConfig, EncodedResidue, FuzzyCommitment, DEFAULT_ECC_REDUNDANCY,
    DEFAULT_ENCODING_SCALE,
};
