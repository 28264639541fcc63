//! Exact binomial tail computation in log space.

/// Natural log of `n!`, accumulated iteratively. Sample counts in OAF runs
/// stay in the low thousands, where direct accumulation is both exact enough
/// and cheap.
fn ln_factorial(n: usize) -> f64 {
    (2..=n).map(|i| (i as f64).ln()).sum()
}

fn ln_choose(n: usize, k: usize) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// Probability mass `P(X = k)` for `X ~ Bin(n, p)`.
pub fn binomial_pmf(k: usize, n: usize, p: f64) -> f64 {
    if p <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if p >= 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }
    let ln_term = ln_choose(n, k) + (k as f64) * p.ln() + ((n - k) as f64) * (1.0 - p).ln();
    ln_term.exp()
}

/// Cumulative probability `P(X <= k)` for `X ~ Bin(n, p)`.
pub fn binomial_cdf(k: usize, n: usize, p: f64) -> f64 {
    let mut total = 0.0;
    for i in 0..=k.min(n) {
        total += binomial_pmf(i, n, p);
    }
    total.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pmf_sums_to_one() {
        let total: f64 = (0..=20).map(|k| binomial_pmf(k, 20, 0.3)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cdf_matches_fair_coin() {
        // P(X <= 1) for Bin(3, 0.5) = 4/8.
        assert!((binomial_cdf(1, 3, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn degenerate_probabilities() {
        assert_eq!(binomial_pmf(0, 10, 0.0), 1.0);
        assert_eq!(binomial_pmf(10, 10, 1.0), 1.0);
        assert_eq!(binomial_cdf(9, 10, 1.0), 0.0);
    }
}
