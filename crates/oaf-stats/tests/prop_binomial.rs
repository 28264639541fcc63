//! Randomized properties of the binomial tail and interval routines.

use oaf_stats::{binomial_cdf, quantile_interval, threshold_satisfied};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cdf_is_monotone_and_bounded(n in 1usize..40, p in 0.01f64..0.99) {
        let mut prev = 0.0;
        for k in 0..=n {
            let c = binomial_cdf(k, n, p);
            prop_assert!(c >= prev - 1e-12);
            prop_assert!(c <= 1.0);
            prev = c;
        }
        prop_assert!((binomial_cdf(n, n, p) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn interval_endpoints_come_from_the_sample(
        samples in proptest::collection::vec(-100.0f64..100.0, 22..60),
    ) {
        if let Some(ci) = quantile_interval(&samples, 0.9, 0.9).unwrap() {
            prop_assert!(ci.low <= ci.high);
            prop_assert!(samples.iter().any(|s| *s == ci.low));
            prop_assert!(samples.iter().any(|s| *s == ci.high));
        }
    }

    #[test]
    fn no_successes_never_satisfy_the_threshold(
        samples in proptest::collection::vec(-10.0f64..-1.0, 1..50),
    ) {
        prop_assert!(!threshold_satisfied(&samples, 0.0, 0.9, 0.9).unwrap());
    }
}
