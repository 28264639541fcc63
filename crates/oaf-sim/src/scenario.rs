//! YAML-configurable simulation scenarios.
//!
//! A scenario names every node model, the dependency edges between them,
//! the wave roots, and the seeding policy, and can build a ready-to-run
//! simulator. The canned constructors mirror the reference experiments used
//! by tests and the demo command.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::rng::{RngHandle, SIMULATION_SUBSTREAM};
use oaf_graph::CalibrationGraph;
use serde::{Deserialize, Serialize};

use crate::basic::{Comparison, DistributionKind, DistributionNode, SimpleNode, TrendNode};
use crate::func::{FuncNode, FuncOptions, NonlinearDrift, ParamSpec, ParamTable, Response};
use crate::hidden::{CompensatingExpDecayNode, HiddenParamNode};
use crate::node::{AdaptiveTimeouts, CalibrationNode, NodeCore};
use crate::simulator::{CalibrationSimulator, NodeMap, RunTrace};
use crate::utility::{RandomlyChangeParamNode, VirtualConnectionNode};

/// Deterministic seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in manifests alongside the seed.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x00AF_5EED_00AF_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Drift rate and direction bias for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftSpec {
    /// Maximum absolute drift per step.
    pub rate: f64,
    /// Probability of a positive drift step.
    pub bias: f64,
}

/// Rabi-style `sin^2` node configuration. Defaults model a 70 kHz Rabi
/// oscillation read out at its first population peak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sin2Spec {
    /// Check timeout.
    pub timeout: f64,
    /// Angular frequency of the oscillation.
    #[serde(default = "default_omega")]
    pub omega: f64,
    /// Probe duration.
    #[serde(default = "default_gate_time")]
    pub gate_time: f64,
    /// Detuning entering the `cos^2` error term.
    #[serde(default)]
    pub delta: f64,
    /// Constant background subtracted from the population.
    #[serde(default)]
    pub background: f64,
    /// Acceptable population threshold.
    #[serde(default = "default_population_threshold")]
    pub threshold: f64,
    /// Drift of `omega`.
    #[serde(default = "default_omega_drift")]
    pub omega_drift: DriftSpec,
    /// Drift of the probe duration.
    #[serde(default = "default_gate_time_drift")]
    pub gate_time_drift: DriftSpec,
    /// Drift of the detuning.
    #[serde(default = "default_delta_drift")]
    pub delta_drift: DriftSpec,
    /// Drift of the background.
    #[serde(default = "default_sin2_background_drift")]
    pub background_drift: DriftSpec,
    /// Node whose export replaces the background parameter (attenuated).
    #[serde(default)]
    pub background_source: Option<String>,
    /// Logistic drift suppression after calibration.
    #[serde(default)]
    pub nonlinear_drift: Option<NonlinearDrift>,
    /// Imperfect gamma-distributed recalibration.
    #[serde(default)]
    pub randomize_calibration: bool,
    /// Evaluate the response every step.
    #[serde(default = "default_true")]
    pub monitor_in_spec: bool,
    /// Adaptive timeout options.
    #[serde(default)]
    pub adaptive: AdaptiveTimeouts,
}

fn default_omega() -> f64 {
    TAU * 70e3
}

fn default_gate_time() -> f64 {
    1.0 / 280e3
}

fn default_population_threshold() -> f64 {
    0.992
}

fn default_omega_drift() -> DriftSpec {
    DriftSpec {
        rate: 25_077.5 / 75.0,
        bias: 0.6,
    }
}

fn default_gate_time_drift() -> DriftSpec {
    DriftSpec {
        rate: 2.03633e-7 / 75.0,
        bias: 0.6,
    }
}

fn default_delta_drift() -> DriftSpec {
    DriftSpec {
        rate: 0.0895624 / 75.0,
        bias: 0.6,
    }
}

fn default_sin2_background_drift() -> DriftSpec {
    DriftSpec {
        rate: 0.008 / 75.0,
        bias: 0.6,
    }
}

fn default_true() -> bool {
    true
}

impl Sin2Spec {
    fn build(&self, name: &str) -> Result<FuncNode, OafError> {
        let core = NodeCore::with_adaptive(name, self.timeout, self.adaptive)?;
        let mut specs = BTreeMap::new();
        specs.insert(
            "omega".to_string(),
            ParamSpec {
                initial: self.omega,
                drift_rate: self.omega_drift.rate,
                drift_bias: self.omega_drift.bias,
                min: 0.0,
                max: f64::INFINITY,
            },
        );
        specs.insert(
            "time".to_string(),
            ParamSpec {
                initial: self.gate_time,
                drift_rate: self.gate_time_drift.rate,
                drift_bias: self.gate_time_drift.bias,
                min: 0.0,
                max: f64::INFINITY,
            },
        );
        specs.insert(
            "delta".to_string(),
            ParamSpec {
                initial: self.delta,
                drift_rate: self.delta_drift.rate,
                drift_bias: self.delta_drift.bias,
                min: -100.0,
                max: f64::INFINITY,
            },
        );
        if self.background_source.is_none() {
            specs.insert(
                "background".to_string(),
                ParamSpec {
                    initial: self.background,
                    drift_rate: self.background_drift.rate,
                    drift_bias: self.background_drift.bias,
                    min: 0.0,
                    max: f64::INFINITY,
                },
            );
        }
        FuncNode::new(
            core,
            Response::Sin2,
            ParamTable::new(specs),
            self.threshold,
            FuncOptions {
                background_source: self.background_source.clone(),
                nonlinear_drift: self.nonlinear_drift,
                randomize_calibration: self.randomize_calibration,
                monitor_in_spec: self.monitor_in_spec,
            },
        )
    }
}

/// Exponential-decay fidelity node configuration. The probe time is derived
/// from the decay time so that 99.9% of the population has decayed at the
/// calibrated operating point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpDecaySpec {
    /// Check timeout.
    pub timeout: f64,
    /// Decay amplitude.
    #[serde(default = "default_amp")]
    pub amp: f64,
    /// Decay time constant.
    #[serde(default = "default_decay_time")]
    pub decay_time: f64,
    /// Constant background added to the remaining population.
    #[serde(default)]
    pub background: f64,
    /// Acceptable fidelity threshold.
    #[serde(default = "default_population_threshold")]
    pub threshold: f64,
    /// Drift of the amplitude.
    #[serde(default = "default_amp_drift")]
    pub amp_drift: DriftSpec,
    /// Drift of the probe time.
    #[serde(default = "default_probe_time_drift")]
    pub probe_time_drift: DriftSpec,
    /// Drift of the decay time constant.
    #[serde(default = "default_decay_time_drift")]
    pub decay_time_drift: DriftSpec,
    /// Drift of the background.
    #[serde(default = "default_decay_background_drift")]
    pub background_drift: DriftSpec,
    /// Node whose export replaces the background parameter (attenuated).
    #[serde(default)]
    pub background_source: Option<String>,
    /// Logistic drift suppression after calibration.
    #[serde(default)]
    pub nonlinear_drift: Option<NonlinearDrift>,
    /// Imperfect gamma-distributed recalibration.
    #[serde(default)]
    pub randomize_calibration: bool,
    /// Evaluate the response every step.
    #[serde(default = "default_true")]
    pub monitor_in_spec: bool,
    /// Adaptive timeout options.
    #[serde(default)]
    pub adaptive: AdaptiveTimeouts,
}

fn default_amp() -> f64 {
    1.0
}

fn default_decay_time() -> f64 {
    10.0
}

fn default_amp_drift() -> DriftSpec {
    DriftSpec {
        rate: 7.0 / 75.0,
        bias: 0.6,
    }
}

fn default_probe_time_drift() -> DriftSpec {
    DriftSpec {
        rate: 20.7944 / 75.0,
        bias: 0.4,
    }
}

fn default_decay_time_drift() -> DriftSpec {
    DriftSpec {
        rate: 4.30677 / 75.0,
        bias: 0.6,
    }
}

fn default_decay_background_drift() -> DriftSpec {
    DriftSpec {
        rate: 0.007 / 75.0,
        bias: 0.6,
    }
}

impl ExpDecaySpec {
    fn build(&self, name: &str) -> Result<FuncNode, OafError> {
        let core = NodeCore::with_adaptive(name, self.timeout, self.adaptive)?;
        // Probe at the time where only 0.1% of the population remains.
        let probe_time = -self.decay_time * (1.0 - 0.999_f64).ln();
        let mut specs = BTreeMap::new();
        specs.insert(
            "amp".to_string(),
            ParamSpec {
                initial: self.amp,
                drift_rate: self.amp_drift.rate,
                drift_bias: self.amp_drift.bias,
                min: self.amp,
                max: f64::INFINITY,
            },
        );
        specs.insert(
            "time".to_string(),
            ParamSpec {
                initial: probe_time,
                drift_rate: self.probe_time_drift.rate,
                drift_bias: self.probe_time_drift.bias,
                min: 0.0,
                max: probe_time,
            },
        );
        specs.insert(
            "decay_time".to_string(),
            ParamSpec {
                initial: self.decay_time,
                drift_rate: self.decay_time_drift.rate,
                drift_bias: self.decay_time_drift.bias,
                min: self.decay_time,
                max: f64::INFINITY,
            },
        );
        if self.background_source.is_none() {
            specs.insert(
                "background".to_string(),
                ParamSpec {
                    initial: self.background,
                    drift_rate: self.background_drift.rate,
                    drift_bias: self.background_drift.bias,
                    min: 0.0,
                    max: f64::INFINITY,
                },
            );
        }
        FuncNode::new(
            core,
            Response::ExpDecay,
            ParamTable::new(specs),
            self.threshold,
            FuncOptions {
                background_source: self.background_source.clone(),
                nonlinear_drift: self.nonlinear_drift,
                randomize_calibration: self.randomize_calibration,
                monitor_in_spec: self.monitor_in_spec,
            },
        )
    }
}

/// Hidden environmental node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenParamSpec {
    /// Check timeout (hidden nodes pass every check).
    pub timeout: f64,
    /// Initial parameter value.
    #[serde(default)]
    pub initial: f64,
    /// Maximum absolute drift per step.
    #[serde(default = "default_hidden_drift_rate")]
    pub drift_rate: f64,
    /// Probability of a positive drift step.
    #[serde(default = "default_hidden_drift_bias")]
    pub drift_bias: f64,
}

fn default_hidden_drift_rate() -> f64 {
    1e-3
}

fn default_hidden_drift_bias() -> f64 {
    0.8
}

/// Compensating exp-decay node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensatingSpec {
    /// Underlying exp-decay configuration.
    #[serde(flatten)]
    pub decay: ExpDecaySpec,
    /// Hidden node whose export supplies the baseline.
    pub baseline: String,
}

/// Randomly-jumping parameter node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomlyChangeParamSpec {
    /// Check timeout.
    pub timeout: f64,
    /// Node whose failure state this node's check proxies.
    pub dependence: String,
    /// Initial parameter value.
    #[serde(default)]
    pub initial: f64,
    /// Probability of a jump at each calibration.
    #[serde(default = "default_jump_probability")]
    pub jump_probability: f64,
    /// Jump size applied to the parameter.
    #[serde(default = "default_jump_amount")]
    pub jump_amount: f64,
    /// Adaptive timeout options.
    #[serde(default)]
    pub adaptive: AdaptiveTimeouts,
}

fn default_jump_probability() -> f64 {
    0.1
}

fn default_jump_amount() -> f64 {
    1.0
}

/// Configuration of one node model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeSpec {
    /// Independent per-step failure with fixed probability.
    Simple {
        /// Check timeout.
        timeout: f64,
        /// Per-step failure probability.
        failure_prob: f64,
        /// Adaptive timeout options.
        #[serde(default)]
        adaptive: AdaptiveTimeouts,
    },
    /// Drifting scalar value failing past a threshold.
    Trend {
        /// Check timeout.
        timeout: f64,
        /// Starting value.
        initial_value: f64,
        /// Deterministic drift per step.
        drift_rate: f64,
        /// Standard deviation of the per-step noise.
        noise_std: f64,
        /// Failure threshold.
        threshold: f64,
        /// Adaptive timeout options.
        #[serde(default)]
        adaptive: AdaptiveTimeouts,
    },
    /// Batch sampling against a threshold comparison.
    Distribution {
        /// Check timeout.
        timeout: f64,
        /// Sampling distribution.
        distribution: DistributionKind,
        /// Samples drawn per step.
        num_samples: usize,
        /// Comparison threshold.
        threshold: f64,
        /// Decision applied to each batch.
        comparison: Comparison,
        /// Adaptive timeout options.
        #[serde(default)]
        adaptive: AdaptiveTimeouts,
    },
    /// Rabi-style `sin^2` response node.
    Sin2(Sin2Spec),
    /// Exponential-decay fidelity node.
    ExpDecay(ExpDecaySpec),
    /// Drift-only hidden environmental node.
    HiddenParam(HiddenParamSpec),
    /// Exp-decay node compensating a hidden baseline.
    CompensatingExpDecay(CompensatingSpec),
    /// Node whose calibration occasionally jumps its parameter.
    RandomlyChangeParam(RandomlyChangeParamSpec),
    /// Structural connector that always fails its check.
    Virtual {
        /// Check timeout.
        timeout: f64,
    },
}

impl NodeSpec {
    /// Instantiates the node model for graph node `name`.
    pub fn build(&self, name: &str) -> Result<Box<dyn CalibrationNode>, OafError> {
        match self {
            NodeSpec::Simple {
                timeout,
                failure_prob,
                adaptive,
            } => {
                let core = NodeCore::with_adaptive(name, *timeout, *adaptive)?;
                Ok(Box::new(SimpleNode::new(core, *failure_prob)?))
            }
            NodeSpec::Trend {
                timeout,
                initial_value,
                drift_rate,
                noise_std,
                threshold,
                adaptive,
            } => {
                let core = NodeCore::with_adaptive(name, *timeout, *adaptive)?;
                Ok(Box::new(TrendNode::new(
                    core,
                    *initial_value,
                    *drift_rate,
                    *noise_std,
                    *threshold,
                )?))
            }
            NodeSpec::Distribution {
                timeout,
                distribution,
                num_samples,
                threshold,
                comparison,
                adaptive,
            } => {
                let core = NodeCore::with_adaptive(name, *timeout, *adaptive)?;
                Ok(Box::new(DistributionNode::new(
                    core,
                    *distribution,
                    *num_samples,
                    *threshold,
                    *comparison,
                )?))
            }
            NodeSpec::Sin2(spec) => Ok(Box::new(spec.build(name)?)),
            NodeSpec::ExpDecay(spec) => Ok(Box::new(spec.build(name)?)),
            NodeSpec::HiddenParam(spec) => {
                let core = NodeCore::new(name, spec.timeout)?;
                Ok(Box::new(HiddenParamNode::new(
                    core,
                    spec.initial,
                    spec.drift_rate,
                    spec.drift_bias,
                )))
            }
            NodeSpec::CompensatingExpDecay(spec) => {
                let func = spec.decay.build(name)?;
                Ok(Box::new(CompensatingExpDecayNode::new(
                    func,
                    spec.baseline.clone(),
                )?))
            }
            NodeSpec::RandomlyChangeParam(spec) => {
                let core = NodeCore::with_adaptive(name, spec.timeout, spec.adaptive)?;
                Ok(Box::new(RandomlyChangeParamNode::new(
                    core,
                    spec.dependence.clone(),
                    spec.initial,
                    spec.jump_probability,
                    spec.jump_amount,
                )))
            }
            NodeSpec::Virtual { timeout } => {
                let core = NodeCore::new(name, *timeout)?;
                Ok(Box::new(VirtualConnectionNode::new(core)))
            }
        }
    }
}

/// Complete description of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Optional scenario name recorded in manifests.
    #[serde(default)]
    pub name: Option<String>,
    /// Node models keyed by graph node name.
    pub nodes: BTreeMap<String, NodeSpec>,
    /// Dependency edges `(from, to)`: `from` depends on `to`.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
    /// Root nodes recorded on trigger waves.
    pub root_nodes: Vec<String>,
    /// Simulation step size.
    #[serde(default = "default_time_step")]
    pub time_step: u32,
    /// Number of time units to simulate.
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_time_step() -> u32 {
    1
}

fn default_steps() -> u32 {
    100
}

impl ScenarioConfig {
    /// Parses a scenario from YAML.
    pub fn from_yaml(text: &str) -> Result<Self, OafError> {
        serde_yaml::from_str(text).map_err(|err| {
            OafError::Serde(
                ErrorInfo::new("invalid-scenario", "scenario YAML did not parse")
                    .with_context("cause", err.to_string()),
            )
        })
    }

    /// Serializes the scenario to YAML.
    pub fn to_yaml(&self) -> Result<String, OafError> {
        serde_yaml::to_string(self).map_err(|err| {
            OafError::Serde(
                ErrorInfo::new("unserializable-scenario", "scenario did not serialize")
                    .with_context("cause", err.to_string()),
            )
        })
    }

    /// Builds the calibration graph described by the node and edge lists.
    pub fn build_graph(&self) -> Result<CalibrationGraph, OafError> {
        let mut graph = CalibrationGraph::new();
        for name in self.nodes.keys() {
            graph.add_node(name.clone())?;
        }
        for (from, to) in &self.edges {
            graph.add_edge(from, to)?;
        }
        Ok(graph)
    }

    /// Builds a simulator ready to run this scenario.
    pub fn build(&self) -> Result<CalibrationSimulator, OafError> {
        let graph = self.build_graph()?;
        let mut models: NodeMap = BTreeMap::new();
        for (name, spec) in &self.nodes {
            models.insert(name.clone(), spec.build(name)?);
        }
        let rng = RngHandle::for_substream(self.seed_policy.master_seed, SIMULATION_SUBSTREAM);
        CalibrationSimulator::new(graph, models, self.root_nodes.clone(), self.time_step, rng)
    }

    /// Builds the scenario and runs it to completion.
    pub fn run(&self) -> Result<RunTrace, OafError> {
        let mut simulator = self.build()?;
        simulator.simulate(self.steps)?;
        Ok(simulator.into_trace())
    }
}

/// Three-node chain `C -> B -> A` of simple nodes with staggered timeouts.
pub fn simple_chain() -> ScenarioConfig {
    let mut nodes = BTreeMap::new();
    nodes.insert(
        "A".to_string(),
        NodeSpec::Simple {
            timeout: 5.0,
            failure_prob: 0.1,
            adaptive: AdaptiveTimeouts::default(),
        },
    );
    nodes.insert(
        "B".to_string(),
        NodeSpec::Simple {
            timeout: 3.0,
            failure_prob: 0.2,
            adaptive: AdaptiveTimeouts::default(),
        },
    );
    nodes.insert(
        "C".to_string(),
        NodeSpec::Simple {
            timeout: 7.0,
            failure_prob: 0.3,
            adaptive: AdaptiveTimeouts::default(),
        },
    );
    ScenarioConfig {
        name: Some("simple-chain".to_string()),
        nodes,
        edges: vec![
            ("C".to_string(), "B".to_string()),
            ("B".to_string(), "A".to_string()),
        ],
        root_nodes: vec!["C".to_string()],
        time_step: 1,
        steps: default_steps(),
        seed_policy: SeedPolicy::default(),
    }
}

/// Five-node diamond: `C -> B -> A` and `E -> D -> A`.
pub fn simple_diamond() -> ScenarioConfig {
    let mut nodes = BTreeMap::new();
    let simple = |timeout: f64, failure_prob: f64| NodeSpec::Simple {
        timeout,
        failure_prob,
        adaptive: AdaptiveTimeouts::default(),
    };
    nodes.insert("A".to_string(), simple(5.0, 0.05));
    nodes.insert("B".to_string(), simple(3.0, 0.1));
    nodes.insert("C".to_string(), simple(7.0, 0.2));
    nodes.insert("D".to_string(), simple(4.0, 0.1));
    nodes.insert("E".to_string(), simple(7.0, 0.2));
    ScenarioConfig {
        name: Some("simple-diamond".to_string()),
        nodes,
        edges: vec![
            ("C".to_string(), "B".to_string()),
            ("B".to_string(), "A".to_string()),
            ("E".to_string(), "D".to_string()),
            ("D".to_string(), "A".to_string()),
        ],
        root_nodes: vec!["C".to_string(), "E".to_string()],
        time_step: 1,
        steps: default_steps(),
        seed_policy: SeedPolicy::default(),
    }
}

/// Chain of drifting trend nodes.
pub fn trend_chain() -> ScenarioConfig {
    let mut nodes = BTreeMap::new();
    let trend = |timeout: f64, threshold: f64| NodeSpec::Trend {
        timeout,
        initial_value: 0.0,
        drift_rate: 0.1,
        noise_std: 0.1,
        threshold,
        adaptive: AdaptiveTimeouts::default(),
    };
    nodes.insert("A".to_string(), trend(2.0, 0.5));
    nodes.insert("B".to_string(), trend(2.0, 0.5));
    nodes.insert("C".to_string(), trend(1.0, 0.1));
    ScenarioConfig {
        name: Some("trend-chain".to_string()),
        nodes,
        edges: vec![
            ("C".to_string(), "B".to_string()),
            ("B".to_string(), "A".to_string()),
        ],
        root_nodes: vec!["C".to_string()],
        time_step: 1,
        steps: default_steps(),
        seed_policy: SeedPolicy::default(),
    }
}

/// Chain of distribution nodes, optionally using the statistical threshold
/// decision in place of the plain mean comparison.
pub fn distribution_chain(spa: bool) -> ScenarioConfig {
    let comparison = if spa {
        Comparison::SpaGreaterThan {
            proportion: 0.9,
            confidence: 0.9,
        }
    } else {
        Comparison::MeanGreaterThan
    };
    let mut nodes = BTreeMap::new();
    let dist = |timeout: f64| NodeSpec::Distribution {
        timeout,
        distribution: DistributionKind::Normal {
            mean: 0.0,
            std: 0.1,
        },
        num_samples: 1,
        threshold: 0.2,
        comparison,
        adaptive: AdaptiveTimeouts::default(),
    };
    nodes.insert("A".to_string(), dist(2.0));
    nodes.insert("B".to_string(), dist(2.0));
    nodes.insert("C".to_string(), dist(1.0));
    ScenarioConfig {
        name: Some(if spa {
            "spa-distribution-chain".to_string()
        } else {
            "distribution-chain".to_string()
        }),
        nodes,
        edges: vec![
            ("C".to_string(), "B".to_string()),
            ("B".to_string(), "A".to_string()),
        ],
        root_nodes: vec!["C".to_string()],
        time_step: 1,
        steps: default_steps(),
        seed_policy: SeedPolicy::default(),
    }
}
