//! FuzzyKey — stable keys from noisy biometric vectors
//!
//! A fuzzy extractor built on lattice linear sketches: a feature vector is
//! split into a public residue and a secret proxy key, noisy re-samples are
//! reconciled or error-corrected back to the same key, and keys are derived
//! with HKDF-SHA256.

pub mod error;
pub mod lattice;
pub mod sketch;
pub mod commitment;
pub mod kdf;
pub mod enrollment;
pub mod tuning;

pub use error::{FuzzyKeyError, Result};
pub use lattice::{LatticeBasis, LatticeQuantizer};
pub use sketch::{FeatureVector, HashMode, RadiusPolicy, Reconciler, Sketch, SketchConfig, SketchEngine};
pub use commitment::{Commitment, CommitmentConfig, FuzzyCommitment};
pub use kdf::{DerivedKey, KeyDeriver, KeyLabel, SigningScalar};
pub use enrollment::Enrollment;
