//! Linear sketches of biometric feature vectors
//!
//! - FeatureVector: one validated real-valued sample
//! - ProxyKeyHasher: universal hash from lattice coordinates into Z_p
//! - SketchEngine: `(residue, proxy_key)` generation and acceptance tests
//! - Reconciler: proxy-key deltas recovered from residues alone

mod vector;
mod hasher;
mod engine;
mod reconcile;

pub use vector::FeatureVector;
pub use hasher::{HashMode, ProxyKeyHasher};
pub use engine::{RadiusPolicy, Sketch, SketchConfig, SketchEngine};
pub use reconcile::Reconciler;
