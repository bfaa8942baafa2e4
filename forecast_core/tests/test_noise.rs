use forecast_core::NoiseInjector;
use proptest::prelude::*;
use rand::rngs::mock::StepRng;

#[test]
fn test_zero_vector_stays_zero() {
    let mut noise = NoiseInjector::seeded(0.1, 3).unwrap();
    assert_eq!(noise.jitter(&[0, 0, 0, 0]), vec![0, 0, 0, 0]);
}

#[test]
fn test_empty_input() {
    let mut noise = NoiseInjector::seeded(0.1, 3).unwrap();
    assert!(noise.jitter(&[]).is_empty());
}

#[test]
fn test_negative_inputs_are_clamped() {
    let mut noise = NoiseInjector::seeded(0.05, 11).unwrap();
    assert_eq!(noise.jitter(&[-4]), vec![0]);
}

#[test]
fn test_custom_random_source() {
    let mut noise = NoiseInjector::new(0.1, StepRng::new(0, 0)).unwrap();
    let jittered = noise.jitter(&[100]);
    assert!((90..=110).contains(&jittered[0]));
}

proptest! {
    #[test]
    fn prop_jitter_stays_in_band(
        values in proptest::collection::vec(0i64..100_000, 0..50),
        pct in 0.0f64..0.5,
        seed in any::<u64>(),
    ) {
        let mut noise = NoiseInjector::seeded(pct, seed).unwrap();
        let jittered = noise.jitter(&values);

        prop_assert_eq!(jittered.len(), values.len());
        for (v, j) in values.iter().zip(&jittered) {
            let low = (*v as f64 * (1.0 - pct)).floor() as i64;
            let high = (*v as f64 * (1.0 + pct)).ceil() as i64;
            prop_assert!(*j >= low.max(0) && *j <= high);
        }
    }
}
