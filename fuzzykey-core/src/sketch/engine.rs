//! SketchEngine — linear sketch generation and acceptance testing
//!
//! A sketch of a feature vector `x` is the pair `(c, a)`:
//! `c = x − g_L(x)` is the residue after removing the nearest lattice point
//! and `a = UH(B⁻¹·g_L(x))` is the proxy key. Two samples falling in the same
//! lattice cell share `a` by construction; their residues differ by the
//! sample noise, which the acceptance radius bounds.

use super::hasher::{HashMode, ProxyKeyHasher};
use super::vector::FeatureVector;
use crate::error::{FuzzyKeyError, Result};
use crate::lattice::{LatticeBasis, LatticeQuantizer};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Protocol parameters for one sketch engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchConfig {
    /// Basis vectors as rows (n × n, invertible)
    pub basis: Vec<Vec<f64>>,
    /// Proxy keys live in Z_p
    pub modulus: u64,
    /// Acceptance radius used when no policy overrides it
    pub default_radius: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    #[serde(default)]
    pub hash_mode: HashMode,
    /// Snap lattice coordinates to this grid before rounding
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Store |c| instead of c. Breaks reconciliation; kept for the
    /// commitment-only flow that never reconciles.
    #[serde(default)]
    pub absolute_residue: bool,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            basis: vec![vec![1.0, 0.0], vec![0.5, 3f64.sqrt() / 2.0]],
            modulus: 7,
            default_radius: 5.0,
            min_radius: 2.0,
            max_radius: 15.0,
            hash_mode: HashMode::DirectMod,
            tolerance: None,
            absolute_residue: false,
        }
    }
}

impl SketchConfig {
    /// Hexagonal (triangular) lattice in R², the prototype basis
    pub fn triangular(modulus: u64) -> Self {
        Self {
            modulus,
            ..Self::default()
        }
    }

    /// `scale · I` in Rⁿ — a cubic lattice with cell side `scale`
    pub fn scaled_identity(dim: usize, scale: f64, modulus: u64) -> Self {
        let basis = (0..dim)
            .map(|i| (0..dim).map(|j| if i == j { scale } else { 0.0 }).collect())
            .collect();
        Self {
            basis,
            modulus,
            ..Self::default()
        }
    }

    pub fn with_radii(mut self, default_radius: f64, min_radius: f64, max_radius: f64) -> Self {
        self.default_radius = default_radius;
        self.min_radius = min_radius;
        self.max_radius = max_radius;
        self
    }

    pub fn with_hash_mode(mut self, hash_mode: HashMode) -> Self {
        self.hash_mode = hash_mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let radii = [self.default_radius, self.min_radius, self.max_radius];
        if radii.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "radii must be finite and non-negative, got {:?}",
                radii
            )));
        }
        if self.min_radius > self.max_radius {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "min_radius {} exceeds max_radius {}",
                self.min_radius, self.max_radius
            )));
        }
        Ok(())
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

/// Which radius `verify_acceptance` compares against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusPolicy {
    /// The configured default, clamped to the configured bounds
    Default,
    Fixed(f64),
    /// Derived from caller-supplied scores in [0, 1]
    Dynamic { similarity: f64, noise: f64 },
}

/// Residue and proxy key of one sample
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub residue: FeatureVector,
    pub proxy_key: u64,
}

#[derive(Debug, Clone)]
pub struct SketchEngine {
    config: SketchConfig,
    basis: LatticeBasis,
    quantizer: LatticeQuantizer,
    hasher: ProxyKeyHasher,
}

impl SketchEngine {
    pub fn new(config: SketchConfig) -> Result<Self> {
        config.validate()?;
        let basis = LatticeBasis::from_rows(&config.basis)?;
        let quantizer = match config.tolerance {
            Some(t) => LatticeQuantizer::with_tolerance(t)?,
            None => LatticeQuantizer::new(),
        };
        let hasher = ProxyKeyHasher::new(config.modulus, config.hash_mode)?;

        info!(
            "Sketch engine ready: dim={}, p={}, radius={:.3} in [{:.3}, {:.3}], condition={:.3}",
            basis.dim(),
            config.modulus,
            config.default_radius,
            config.min_radius,
            config.max_radius,
            basis.condition_number()
        );

        Ok(Self {
            config,
            basis,
            quantizer,
            hasher,
        })
    }

    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    pub fn basis(&self) -> &LatticeBasis {
        &self.basis
    }

    pub fn quantizer(&self) -> &LatticeQuantizer {
        &self.quantizer
    }

    pub fn hasher(&self) -> &ProxyKeyHasher {
        &self.hasher
    }

    pub fn modulus(&self) -> u64 {
        self.config.modulus
    }

    pub fn dim(&self) -> usize {
        self.basis.dim()
    }

    /// Default radius clamped into `[min_radius, max_radius]`
    pub fn default_radius(&self) -> f64 {
        self.config
            .default_radius
            .clamp(self.config.min_radius, self.config.max_radius)
    }

    /// Sketch `(c, a)` of a feature vector
    pub fn generate(&self, sample: &FeatureVector) -> Result<Sketch> {
        let x = sample.as_dvector();
        let y = self.quantizer.nearest_lattice_point(&self.basis, x)?;
        let mut residue = x - &y;
        if self.config.absolute_residue {
            residue = residue.abs();
        }
        let coords = self.basis.coordinates(&y)?;
        let proxy_key = self.hasher.universal_hash(&coords);

        debug!("Sketch residue={:?} (norm {:.6})", residue.as_slice(), residue.norm());

        Ok(Sketch {
            residue: FeatureVector::from_dvector(residue)?,
            proxy_key,
        })
    }

    /// Whether two samples fall within the acceptance radius of each other
    pub fn verify_acceptance(
        &self,
        first: &FeatureVector,
        second: &FeatureVector,
        policy: RadiusPolicy,
    ) -> Result<bool> {
        let radius = self.resolve_radius(policy)?;
        let c1 = self.generate(first)?.residue;
        let c2 = self.generate(second)?.residue;
        let distance = c1.distance(&c2)?;
        debug!("Residue distance {:.6} against radius {:.3}", distance, radius);
        Ok(distance <= radius)
    }

    pub fn resolve_radius(&self, policy: RadiusPolicy) -> Result<f64> {
        match policy {
            RadiusPolicy::Default => Ok(self.default_radius()),
            RadiusPolicy::Fixed(r) => {
                if !(r.is_finite() && r >= 0.0) {
                    return Err(FuzzyKeyError::InvalidParameter(format!(
                        "radius must be finite and non-negative, got {}",
                        r
                    )));
                }
                Ok(r)
            }
            RadiusPolicy::Dynamic { similarity, noise } => self.dynamic_radius(
                similarity,
                noise,
                self.config.min_radius,
                self.config.max_radius,
            ),
        }
    }

    /// `default + (1 − similarity)·span − noise·span`, clamped to `[min_r, max_r]`
    /// where `span = max_r − min_r`
    pub fn dynamic_radius(&self, similarity: f64, noise: f64, min_r: f64, max_r: f64) -> Result<f64> {
        for (name, score) in [("similarity", similarity), ("noise", noise)] {
            if !(0.0..=1.0).contains(&score) {
                return Err(FuzzyKeyError::InvalidParameter(format!(
                    "{} score must lie in [0, 1], got {}",
                    name, score
                )));
            }
        }
        if !(min_r.is_finite() && max_r.is_finite() && min_r <= max_r) {
            return Err(FuzzyKeyError::InvalidParameter(format!(
                "invalid radius bounds [{}, {}]",
                min_r, max_r
            )));
        }
        let span = max_r - min_r;
        let radius = self.config.default_radius + (1.0 - similarity) * span - noise * span;
        Ok(radius.clamp(min_r, max_r))
    }
}
