//! Statistical property assessment primitives.
//!
//! These mirror the surface OAF consumes from the SPA toolkit: a minimum
//! sample-count rule, a threshold-satisfaction decision, and nonparametric
//! confidence intervals for a proportion quantile built from order
//! statistics. All tail probabilities are exact binomial sums.

use oaf_core::errors::{ErrorInfo, OafError};
use serde::{Deserialize, Serialize};

use crate::binomial::binomial_cdf;

/// Closed interval estimate for a quantile of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower endpoint, drawn from the sample.
    pub low: f64,
    /// Upper endpoint, drawn from the sample.
    pub high: f64,
}

fn validate_unit(name: &'static str, value: f64) -> Result<(), OafError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(OafError::Stats(
            ErrorInfo::new(format!("bad-{name}"), format!("{name} must lie in (0, 1)"))
                .with_context(name, value.to_string()),
        ));
    }
    Ok(())
}

/// Smallest number of samples for which a pure-success run is conclusive:
/// the least `n` with `proportion^n <= 1 - confidence`.
pub fn min_num_samples(proportion: f64, confidence: f64) -> Result<usize, OafError> {
    validate_unit("proportion", proportion)?;
    validate_unit("confidence", confidence)?;
    let n = ((1.0 - confidence).ln() / proportion.ln()).ceil();
    Ok(n as usize)
}

/// Decides whether at least `proportion` of the sampled population exceeds
/// `threshold`, at the requested confidence.
///
/// Exact one-sided binomial test: with `k` of `n` samples above the
/// threshold, the claim is accepted when observing `k` or more successes
/// would be improbable under a true satisfaction rate of exactly
/// `proportion`, i.e. when `P(Bin(n, proportion) >= k) <= 1 - confidence`.
pub fn threshold_satisfied(
    samples: &[f64],
    threshold: f64,
    proportion: f64,
    confidence: f64,
) -> Result<bool, OafError> {
    validate_unit("proportion", proportion)?;
    validate_unit("confidence", confidence)?;
    if samples.is_empty() {
        return Err(OafError::Stats(ErrorInfo::new(
            "empty-samples",
            "threshold decision requires at least one sample",
        )));
    }
    let n = samples.len();
    let k = samples.iter().filter(|&&v| v > threshold).count();
    if k == 0 {
        return Ok(false);
    }
    let upper_tail = 1.0 - binomial_cdf(k - 1, n, proportion);
    Ok(upper_tail <= 1.0 - confidence)
}

/// Order-statistic confidence interval for the `proportion`-quantile of the
/// sampled distribution.
///
/// Returns `None` when fewer than [`min_num_samples`] samples are available.
/// Endpoint indices are chosen so each tail carries at most half of the
/// allowed miss probability `1 - confidence`.
pub fn quantile_interval(
    samples: &[f64],
    proportion: f64,
    confidence: f64,
) -> Result<Option<ConfidenceInterval>, OafError> {
    let required = min_num_samples(proportion, confidence)?;
    let n = samples.len();
    if n < required {
        return Ok(None);
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let tail = (1.0 - confidence) / 2.0;
    // Largest lower index l (1-based) with P(Bin < l) <= tail.
    let mut low_idx = 1usize;
    for l in 1..=n {
        if binomial_cdf(l - 1, n, proportion) <= tail {
            low_idx = l;
        } else {
            break;
        }
    }
    // Smallest upper index u (1-based) with P(Bin < u) >= 1 - tail.
    let mut high_idx = n;
    for u in 1..=n {
        if binomial_cdf(u - 1, n, proportion) >= 1.0 - tail {
            high_idx = u;
            break;
        }
    }

    Ok(Some(ConfidenceInterval {
        low: sorted[low_idx - 1],
        high: sorted[high_idx - 1],
    }))
}
