#![deny(missing_docs)]

//! Failure analysis over OAF calibration traces.

mod failure;
mod importance;
mod processing;

pub use failure::{
    base_failure_proportions, base_failures_for_group, co_occurring_failures,
    count_base_failures, count_failures, failure_propagation_depth, find_base_failures,
    mean_failure_chain_length, time_to_failure, time_to_failure_base, BaseFailureStats,
    PropagationDepth,
};
pub use importance::{check_scores, co_occurring_check_failures, CheckScore};
pub use processing::{organize_checks_by_trigger, split_by_trigger};
