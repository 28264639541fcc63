#![deny(missing_docs)]

//! Statistical routines backing OAF node checks and trace analysis.

mod binomial;
mod ci;
mod spa;

pub use binomial::{binomial_cdf, binomial_pmf};
pub use ci::{
    ci_failures_per_period, ci_for_parameter, ci_time_to_failure, ci_time_to_failure_from_waves,
    FailureKind,
};
pub use spa::{min_num_samples, quantile_interval, threshold_satisfied, ConfidenceInterval};
