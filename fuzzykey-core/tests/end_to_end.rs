use fuzzykey_core::commitment::CommitmentConfig;
use fuzzykey_core::{
    Enrollment, FeatureVector, FuzzyCommitment, FuzzyKeyError, KeyDeriver, RadiusPolicy,
    SketchConfig, SketchEngine,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn random_sample(rng: &mut StdRng, dim: usize, range: f64) -> Vec<f64> {
    (0..dim).map(|_| rng.gen_range(-range..range)).collect()
}

fn add_noise(rng: &mut StdRng, values: &[f64], amplitude: f64) -> FeatureVector {
    let noisy = values
        .iter()
        .map(|x| x + rng.gen_range(-amplitude..amplitude))
        .collect();
    FeatureVector::new(noisy).unwrap()
}

#[test]
fn prototype_lattice_keeps_key_under_noise() {
    init_logger();
    let config = SketchConfig {
        basis: vec![vec![1.0, 0.0], vec![0.5, 0.866]],
        ..SketchConfig::default()
    };
    let engine = SketchEngine::new(config).unwrap();
    let deriver = KeyDeriver::default();

    let clean = engine.generate(&FeatureVector::new(vec![0.8, 0.6]).unwrap()).unwrap();
    let noisy = engine.generate(&FeatureVector::new(vec![0.801, 0.599]).unwrap()).unwrap();
    assert_eq!(clean.proxy_key, 1);
    assert_eq!(noisy.proxy_key, 1);
    assert_eq!(
        deriver.derive_from_proxy_key(clean.proxy_key).unwrap(),
        deriver.derive_from_proxy_key(noisy.proxy_key).unwrap()
    );
}

#[test]
fn enrollment_survives_cell_changes() {
    init_logger();
    let engine = SketchEngine::new(SketchConfig::scaled_identity(8, 2.0, 257)).unwrap();
    let deriver = KeyDeriver::default();
    let mut rng = StdRng::seed_from_u64(99);

    let mut crossings = 0;
    for _ in 0..100 {
        let base = random_sample(&mut rng, 8, 10.0);
        let enrolled_sample = FeatureVector::new(base.clone()).unwrap();
        let (enrollment, key) = Enrollment::register(&engine, &deriver, &enrolled_sample).unwrap();

        let fresh = add_noise(&mut rng, &base, 0.05);
        if engine.generate(&fresh).unwrap().proxy_key
            != engine.generate(&enrolled_sample).unwrap().proxy_key
        {
            crossings += 1;
        }
        assert_eq!(enrollment.recover(&engine, &deriver, &fresh).unwrap(), key);
    }
    assert!(crossings > 0);
}

#[test]
fn fuzzy_commitment_flow() {
    init_logger();
    let engine = SketchEngine::new(SketchConfig::scaled_identity(16, 1.0, 257)).unwrap();
    let fc = FuzzyCommitment::new(CommitmentConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let base = random_sample(&mut rng, 16, 5.0);
        let enrolled = engine.generate(&FeatureVector::new(base.clone()).unwrap()).unwrap();
        let commitment = fc.commit(&enrolled).unwrap();
        assert_eq!(commitment.codeword.len(), 16 + 10);

        let genuine = engine.generate(&add_noise(&mut rng, &base, 0.0005)).unwrap();
        let key = fc.verify(&commitment, &genuine).unwrap();
        assert_eq!(key, fc.derive_key(&enrolled).unwrap());

        let impostor_sample = FeatureVector::new(random_sample(&mut rng, 16, 5.0)).unwrap();
        let impostor = engine.generate(&impostor_sample).unwrap();
        let err = fc.verify(&commitment, &impostor).unwrap_err();
        assert!(err.is_authentication_failure(), "unexpected error {:?}", err);
    }
}

#[test]
fn stored_records_roundtrip_through_json() {
    init_logger();
    let config = SketchConfig::scaled_identity(4, 1.0, 31).with_radii(0.05, 0.01, 0.5);
    let engine = SketchEngine::new(SketchConfig::from_json(&config.to_json().unwrap()).unwrap()).unwrap();
    let fc = FuzzyCommitment::new(CommitmentConfig::default()).unwrap();

    let sample = FeatureVector::new(vec![0.11, 0.22, -0.33, 0.44]).unwrap();
    let sketch = engine.generate(&sample).unwrap();
    let commitment = fc.commit(&sketch).unwrap();
    let stored = commitment.to_json().unwrap();

    let loaded = fuzzykey_core::Commitment::from_json(&stored).unwrap();
    assert_eq!(loaded.key_hash_hex(), commitment.key_hash_hex());
    assert!(fc.verify(&loaded, &sketch).is_ok());

    assert!(matches!(
        SketchConfig::from_json("{\"basis\": 3}").unwrap_err(),
        FuzzyKeyError::Config(_)
    ));
}

#[test]
fn engine_is_shared_across_threads() {
    init_logger();
    let engine = Arc::new(SketchEngine::new(SketchConfig::default()).unwrap());
    let reference = engine
        .generate(&FeatureVector::new(vec![4.2, -1.0]).unwrap())
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let sample = FeatureVector::new(vec![4.2 + 0.001 * i as f64, -1.0]).unwrap();
                let accepted = engine
                    .verify_acceptance(
                        &sample,
                        &FeatureVector::new(vec![4.2, -1.0]).unwrap(),
                        RadiusPolicy::Fixed(0.01),
                    )
                    .unwrap();
                (engine.generate(&sample).unwrap().proxy_key, accepted)
            })
        })
        .collect();

    for handle in handles {
        let (proxy_key, accepted) = handle.join().unwrap();
        assert_eq!(proxy_key, reference.proxy_key);
        assert!(accepted);
    }
}
