//! Acceptance-radius tuning
//!
//! Empirical error rates of the residue-distance acceptance test, used to
//! pick a radius for a given feature extractor:
//! - FNMR: genuine pairs (same subject) rejected
//! - FMR: impostor pairs accepted
//! - conditional FMR: FMR over every unordered pair of a sample set

use crate::error::{FuzzyKeyError, Result};
use crate::sketch::{FeatureVector, SketchEngine};
use log::debug;
use serde::{Deserialize, Serialize};

/// Error rates at one radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusReport {
    pub radius: f64,
    pub false_match_rate: f64,
    pub false_non_match_rate: f64,
}

/// Residue distance of each pair
fn residue_distances(
    engine: &SketchEngine,
    pairs: &[(FeatureVector, FeatureVector)],
) -> Result<Vec<f64>> {
    pairs
        .iter()
        .map(|(a, b)| {
            let c1 = engine.generate(a)?.residue;
            let c2 = engine.generate(b)?.residue;
            c1.distance(&c2)
        })
        .collect()
}

fn check_radius(radius: f64) -> Result<()> {
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(FuzzyKeyError::InvalidParameter(format!(
            "radius must be finite and non-negative, got {}",
            radius
        )));
    }
    Ok(())
}

fn accepted_fraction(distances: &[f64], radius: f64) -> f64 {
    if distances.is_empty() {
        return 0.0;
    }
    let accepted = distances.iter().filter(|d| **d <= radius).count();
    accepted as f64 / distances.len() as f64
}

pub fn false_non_match_rate(
    engine: &SketchEngine,
    genuine_pairs: &[(FeatureVector, FeatureVector)],
    radius: f64,
) -> Result<f64> {
    check_radius(radius)?;
    if genuine_pairs.is_empty() {
        return Err(FuzzyKeyError::InvalidParameter(
            "no genuine pairs to measure".into(),
        ));
    }
    let distances = residue_distances(engine, genuine_pairs)?;
    Ok(1.0 - accepted_fraction(&distances, radius))
}

pub fn false_match_rate(
    engine: &SketchEngine,
    impostor_pairs: &[(FeatureVector, FeatureVector)],
    radius: f64,
) -> Result<f64> {
    check_radius(radius)?;
    let distances = residue_distances(engine, impostor_pairs)?;
    Ok(accepted_fraction(&distances, radius))
}

/// Fraction of unordered sample pairs accepted; 0.0 with fewer than two samples
pub fn conditional_false_match_rate(
    engine: &SketchEngine,
    samples: &[FeatureVector],
    radius: f64,
) -> Result<f64> {
    check_radius(radius)?;
    let residues = samples
        .iter()
        .map(|s| engine.generate(s).map(|sketch| sketch.residue))
        .collect::<Result<Vec<_>>>()?;

    let mut total = 0usize;
    let mut matches = 0usize;
    for i in 0..residues.len() {
        for j in i + 1..residues.len() {
            total += 1;
            if residues[i].distance(&residues[j])? <= radius {
                matches += 1;
            }
        }
    }
    if total == 0 {
        return Ok(0.0);
    }
    Ok(matches as f64 / total as f64)
}

/// FMR and FNMR for each candidate radius. Residues are computed once.
pub fn sweep_radii(
    engine: &SketchEngine,
    genuine_pairs: &[(FeatureVector, FeatureVector)],
    impostor_pairs: &[(FeatureVector, FeatureVector)],
    radii: &[f64],
) -> Result<Vec<RadiusReport>> {
    if genuine_pairs.is_empty() {
        return Err(FuzzyKeyError::InvalidParameter(
            "no genuine pairs to measure".into(),
        ));
    }
    let genuine = residue_distances(engine, genuine_pairs)?;
    let impostor = residue_distances(engine, impostor_pairs)?;

    radii
        .iter()
        .map(|&radius| {
            check_radius(radius)?;
            let report = RadiusReport {
                radius,
                false_match_rate: accepted_fraction(&impostor, radius),
                false_non_match_rate: 1.0 - accepted_fraction(&genuine, radius),
            };
            debug!(
                "radius {:.4}: FMR {:.4}, FNMR {:.4}",
                radius, report.false_match_rate, report.false_non_match_rate
            );
            Ok(report)
        })
        .collect()
}

/// Smallest radius whose FNMR stays within `max_fnmr`
pub fn select_radius(reports: &[RadiusReport], max_fnmr: f64) -> Option<RadiusReport> {
    reports
        .iter()
        .filter(|r| r.false_non_match_rate <= max_fnmr)
        .min_by(|a, b| a.radius.total_cmp(&b.radius))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::SketchConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn engine() -> SketchEngine {
        let config = SketchConfig::scaled_identity(4, 1.0, 7).with_radii(0.05, 0.01, 0.5);
        SketchEngine::new(config).unwrap()
    }

    fn random_vector(rng: &mut StdRng) -> FeatureVector {
        FeatureVector::new((0..4).map(|_| rng.gen_range(0.05..0.45)).collect()).unwrap()
    }

    /// Genuine pairs: small noise inside one cell. Impostors: independent draws.
    fn pairs(seed: u64, count: usize) -> (Vec<(FeatureVector, FeatureVector)>, Vec<(FeatureVector, FeatureVector)>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut genuine = Vec::new();
        let mut impostor = Vec::new();
        for _ in 0..count {
            let a = random_vector(&mut rng);
            let noisy: Vec<f64> = a.as_slice().iter().map(|x| x + rng.gen_range(-0.01..0.01)).collect();
            genuine.push((a.clone(), FeatureVector::new(noisy).unwrap()));
            impostor.push((a, random_vector(&mut rng)));
        }
        (genuine, impostor)
    }

    #[test]
    fn test_rates_at_extremes() {
        let engine = engine();
        let (genuine, impostor) = pairs(11, 200);
        // per-coordinate noise below 0.01 keeps every genuine distance under 0.02
        assert_eq!(false_non_match_rate(&engine, &genuine, 0.02).unwrap(), 0.0);
        assert_eq!(false_non_match_rate(&engine, &genuine, 0.0).unwrap(), 1.0);
        assert_eq!(false_match_rate(&engine, &impostor, 1.0).unwrap(), 1.0);
        assert!(false_match_rate(&engine, &impostor, 0.02).unwrap() < 0.05);
    }

    #[test]
    fn test_conditional_false_match_rate() {
        let engine = engine();
        let same = FeatureVector::from_slice(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        let far = FeatureVector::from_slice(&[0.4, 0.3, 0.2, 0.1]).unwrap();
        // three pairs, only the duplicate one matches
        let samples = vec![same.clone(), same, far];
        let rate = conditional_false_match_rate(&engine, &samples, 0.05).unwrap();
        assert!((rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(conditional_false_match_rate(&engine, &samples[..1], 0.05).unwrap(), 0.0);
    }

    #[test]
    fn test_sweep_is_monotonic() {
        let engine = engine();
        let (genuine, impostor) = pairs(5, 300);
        let radii = [0.0, 0.005, 0.01, 0.02, 0.1, 0.5, 1.0];
        let reports = sweep_radii(&engine, &genuine, &impostor, &radii).unwrap();
        assert_eq!(reports.len(), radii.len());
        for w in reports.windows(2) {
            assert!(w[1].false_match_rate >= w[0].false_match_rate);
            assert!(w[1].false_non_match_rate <= w[0].false_non_match_rate);
        }
        assert_eq!(
            reports[3].false_non_match_rate,
            false_non_match_rate(&engine, &genuine, 0.02).unwrap()
        );

        let chosen = select_radius(&reports, 0.0).unwrap();
        assert!(chosen.radius <= 0.02);
        assert!(select_radius(&reports[..1], 0.0).is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = engine();
        let (genuine, impostor) = pairs(3, 4);
        assert!(false_non_match_rate(&engine, &[], 0.1).is_err());
        assert!(false_non_match_rate(&engine, &genuine, -0.1).is_err());
        assert!(sweep_radii(&engine, &genuine, &impostor, &[f64::NAN]).is_err());
        assert!(sweep_radii(&engine, &[], &impostor, &[0.1]).is_err());
    }
}
