//! Reed–Solomon over GF(2⁸)
//!
//! Thin wrapper over the `reed-solomon` crate: field polynomial 0x11d,
//! generator α = 2, first consecutive root α⁰, systematic `data ‖ parity`
//! layout, so codewords are byte-compatible with the common `reedsolo`
//! parameterisation. Decoding is errors-only. With `r` parity bytes up to
//! `⌊r/2⌋` symbol errors are corrected; anything beyond fails with `Decode`
//! instead of returning a guess.

use crate::error::{FuzzyKeyError, Result};
use reed_solomon::{Decoder, Encoder};

/// Codeword length limit for an 8-bit symbol code
pub const MAX_CODEWORD_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReedSolomon {
    parity_len: usize,
}

impl ReedSolomon {
    pub fn new(parity_len: usize) -> Result<Self> {
        if parity_len == 0 || parity_len >= MAX_CODEWORD_LEN {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "parity length must be in 1..{}, got {}",
                MAX_CODEWORD_LEN, parity_len
            )));
        }
        Ok(Self { parity_len })
    }

    pub fn parity_len(&self) -> usize {
        self.parity_len
    }

    /// Number of symbol errors the code is guaranteed to correct
    pub fn correction_capacity(&self) -> usize {
        self.parity_len / 2
    }

    /// Largest data length that still fits a codeword
    pub fn max_data_len(&self) -> usize {
        MAX_CODEWORD_LEN - self.parity_len
    }

    /// `data ‖ parity`
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() || data.len() > self.max_data_len() {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "data length must be in 1..={}, got {}",
                self.max_data_len(),
                data.len()
            )));
        }
        let encoded = Encoder::new(self.parity_len).encode(data);
        Ok(encoded[..].to_vec())
    }

    /// Correct a received codeword. Returns the data part and the number of
    /// symbols that were corrected.
    pub fn decode(&self, received: &[u8]) -> Result<(Vec<u8>, usize)> {
        let n = received.len();
        if n <= self.parity_len || n > MAX_CODEWORD_LEN {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "codeword length must be in {}..={}, got {}",
                self.parity_len + 1,
                MAX_CODEWORD_LEN,
                n
            )));
        }
        let data_len = n - self.parity_len;
        let decoder = Decoder::new(self.parity_len);
        if !decoder.is_corrupted(received) {
            return Ok((received[..data_len].to_vec(), 0));
        }

        let mut buffer = received.to_vec();
        let corrected = decoder
            .correct(&mut buffer, None)
            .map_err(|e| FuzzyKeyError::Decode(format!("{:?}", e)))?;

        let changed = corrected
            .iter()
            .zip(received)
            .filter(|(a, b)| a != b)
            .count();
        // a "correction" past capacity is a different codeword, not ours
        if changed > self.correction_capacity() {
            return Err(FuzzyKeyError::Decode(format!(
                "{} symbols changed, capacity is {}",
                changed,
                self.correction_capacity()
            )));
        }
        if decoder.is_corrupted(&corrected) {
            return Err(FuzzyKeyError::Decode("correction did not produce a codeword".into()));
        }

        Ok((corrected[..data_len].to_vec(), changed))
    }
}
