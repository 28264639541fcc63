//! Stochastic node models with scalar failure behaviour.

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::records::FailureMagnitude;
use oaf_core::rng::RngHandle;
use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma, Normal, Poisson, Uniform};
use serde::{Deserialize, Serialize};

use crate::node::{CalibrationNode, Exports, NodeCore};

/// Node that fails independently at every step with a fixed probability.
#[derive(Debug, Clone)]
pub struct SimpleNode {
    core: NodeCore,
    failure_prob: f64,
    value: Option<f64>,
}

impl SimpleNode {
    /// Creates a node failing with probability `failure_prob` per step.
    pub fn new(core: NodeCore, failure_prob: f64) -> Result<Self, OafError> {
        if !(0.0..=1.0).contains(&failure_prob) {
            return Err(OafError::Node(
                ErrorInfo::new("invalid-probability", "failure probability must lie in [0, 1]")
                    .with_context("node", core.name.clone())
                    .with_context("failure_prob", failure_prob.to_string()),
            ));
        }
        Ok(Self {
            core,
            failure_prob,
            value: None,
        })
    }
}

impl CalibrationNode for SimpleNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn simulate_failure(
        &mut self,
        _time: f64,
        _exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        if self.core.failed {
            return Ok(());
        }
        let draw: f64 = rng.gen();
        self.value = Some(draw);
        self.core.failed = draw < self.failure_prob;
        if self.core.failed {
            self.core.failure_magnitude = if rng.gen::<bool>() {
                FailureMagnitude::Minor
            } else {
                FailureMagnitude::Major
            };
        }
        Ok(())
    }

    fn check_values(&self) -> Vec<f64> {
        self.value.into_iter().collect()
    }
}

/// Node whose scalar value drifts with noise and fails past a threshold.
#[derive(Debug, Clone)]
pub struct TrendNode {
    core: NodeCore,
    value: f64,
    initial_value: f64,
    drift_rate: f64,
    noise_std: f64,
    noise: Normal<f64>,
    threshold: f64,
}

impl TrendNode {
    /// Creates a drifting node starting at `initial_value`.
    pub fn new(
        core: NodeCore,
        initial_value: f64,
        drift_rate: f64,
        noise_std: f64,
        threshold: f64,
    ) -> Result<Self, OafError> {
        let noise = Normal::new(0.0, noise_std).map_err(|err| {
            OafError::Node(
                ErrorInfo::new("invalid-distribution", "trend noise is not a valid normal")
                    .with_context("node", core.name.clone())
                    .with_context("noise_std", noise_std.to_string())
                    .with_context("cause", err.to_string()),
            )
        })?;
        Ok(Self {
            core,
            value: initial_value,
            initial_value,
            drift_rate,
            noise_std,
            noise,
            threshold,
        })
    }
}

impl CalibrationNode for TrendNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn simulate_failure(
        &mut self,
        _time: f64,
        _exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        if self.core.failed {
            return Ok(());
        }
        self.value += self.drift_rate + self.noise.sample(rng);
        self.core.failed = self.value > self.threshold;
        if self.core.failed {
            let overshoot = (self.value - self.threshold).abs();
            self.core.failure_magnitude = if overshoot > self.noise_std {
                FailureMagnitude::Major
            } else {
                FailureMagnitude::Minor
            };
        }
        Ok(())
    }

    fn calibrate(
        &mut self,
        time: f64,
        _exports: &Exports,
        _rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        self.value = self.initial_value;
        self.core.mark_calibrated(time);
        Ok(())
    }

    fn check_values(&self) -> Vec<f64> {
        vec![self.value]
    }
}

/// Sampling distribution used by [`DistributionNode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DistributionKind {
    /// Normal with the given mean and standard deviation.
    Normal {
        /// Distribution mean.
        mean: f64,
        /// Distribution standard deviation.
        std: f64,
    },
    /// Uniform over `[low, high)`.
    Uniform {
        /// Inclusive lower bound.
        low: f64,
        /// Exclusive upper bound.
        high: f64,
    },
    /// Poisson with the given rate.
    Poisson {
        /// Event rate.
        lambda: f64,
    },
    /// Exponential with the given rate.
    Exponential {
        /// Decay rate.
        lambda: f64,
    },
    /// Gamma with the given shape and scale.
    Gamma {
        /// Shape parameter.
        shape: f64,
        /// Scale parameter.
        scale: f64,
    },
}

impl DistributionKind {
    fn build(&self, node: &str) -> Result<Sampler, OafError> {
        let bad = |cause: String| {
            OafError::Node(
                ErrorInfo::new("invalid-distribution", "distribution parameters are invalid")
                    .with_context("node", node)
                    .with_context("cause", cause),
            )
        };
        match *self {
            DistributionKind::Normal { mean, std } => Ok(Sampler::Normal(
                Normal::new(mean, std).map_err(|e| bad(e.to_string()))?,
            )),
            DistributionKind::Uniform { low, high } => {
                if !(low < high) {
                    return Err(bad(format!("uniform bounds out of order: [{low}, {high})")));
                }
                Ok(Sampler::Uniform(Uniform::new(low, high)))
            }
            DistributionKind::Poisson { lambda } => Ok(Sampler::Poisson(
                Poisson::new(lambda).map_err(|e| bad(e.to_string()))?,
            )),
            DistributionKind::Exponential { lambda } => Ok(Sampler::Exponential(
                Exp::new(lambda).map_err(|e| bad(e.to_string()))?,
            )),
            DistributionKind::Gamma { shape, scale } => Ok(Sampler::Gamma(
                Gamma::new(shape, scale).map_err(|e| bad(e.to_string()))?,
            )),
        }
    }
}

#[derive(Debug, Clone)]
enum Sampler {
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    Poisson(Poisson<f64>),
    Exponential(Exp<f64>),
    Gamma(Gamma<f64>),
}

impl Sampler {
    fn draw(&self, rng: &mut RngHandle) -> f64 {
        match self {
            Sampler::Normal(d) => d.sample(rng),
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Poisson(d) => d.sample(rng),
            Sampler::Exponential(d) => d.sample(rng),
            Sampler::Gamma(d) => d.sample(rng),
        }
    }
}

/// Decision applied to a batch of samples against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Comparison {
    /// True when the sample mean exceeds the threshold.
    MeanGreaterThan,
    /// True when, at the given confidence, at least `proportion` of the
    /// population exceeds the threshold.
    SpaGreaterThan {
        /// Required population proportion above the threshold.
        proportion: f64,
        /// Confidence level of the decision.
        confidence: f64,
    },
}

impl Comparison {
    /// Evaluates the comparison over a batch of samples.
    pub fn exceeds(&self, samples: &[f64], threshold: f64) -> Result<bool, OafError> {
        match *self {
            Comparison::MeanGreaterThan => {
                if samples.is_empty() {
                    return Ok(false);
                }
                let mean = samples.iter().sum::<f64>() / samples.len() as f64;
                Ok(mean > threshold)
            }
            Comparison::SpaGreaterThan {
                proportion,
                confidence,
            } => oaf_stats::threshold_satisfied(samples, threshold, proportion, confidence),
        }
    }
}

/// Node that draws a batch of samples each step and fails when the batch
/// satisfies the configured comparison against the threshold.
#[derive(Debug, Clone)]
pub struct DistributionNode {
    core: NodeCore,
    sampler: Sampler,
    num_samples: usize,
    threshold: f64,
    comparison: Comparison,
    values: Vec<f64>,
}

impl DistributionNode {
    /// Creates a distribution-backed node.
    pub fn new(
        core: NodeCore,
        distribution: DistributionKind,
        num_samples: usize,
        threshold: f64,
        comparison: Comparison,
    ) -> Result<Self, OafError> {
        if num_samples == 0 {
            return Err(OafError::Node(
                ErrorInfo::new("invalid-sample-count", "num_samples must be at least 1")
                    .with_context("node", core.name.clone()),
            ));
        }
        let sampler = distribution.build(&core.name)?;
        Ok(Self {
            core,
            sampler,
            num_samples,
            threshold,
            comparison,
            values: Vec::new(),
        })
    }
}

impl CalibrationNode for DistributionNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn simulate_failure(
        &mut self,
        _time: f64,
        _exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        if self.core.failed {
            return Ok(());
        }
        self.values = (0..self.num_samples).map(|_| self.sampler.draw(rng)).collect();
        self.core.failed = self.comparison.exceeds(&self.values, self.threshold)?;
        if self.core.failed {
            self.core.failure_magnitude = FailureMagnitude::Minor;
        }
        Ok(())
    }

    fn check_values(&self) -> Vec<f64> {
        self.values.clone()
    }
}
