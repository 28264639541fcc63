//! Calibration-graph simulator driven by the Optimus wave algorithm.
//!
//! The crate provides a menu of stochastic node models ([`SimpleNode`],
//! [`TrendNode`], [`DistributionNode`], the parametric [`FuncNode`] family,
//! and the hidden and utility nodes), the [`CalibrationSimulator`] that runs
//! the wave algorithm over them, and YAML-backed [`ScenarioConfig`]
//! descriptions of complete runs.

#![deny(missing_docs)]

pub mod basic;
pub mod func;
pub mod hidden;
pub mod node;
pub mod scenario;
pub mod simulator;
pub mod utility;

pub use basic::{Comparison, DistributionKind, DistributionNode, SimpleNode, TrendNode};
pub use func::{FuncNode, FuncOptions, NonlinearDrift, ParamSpec, ParamTable, Response};
pub use hidden::{CompensatingExpDecayNode, HiddenParamNode};
pub use node::{
    AdaptiveTimeouts, CalibrationNode, ExportedState, Exports, NodeCore, FIRST_CHECKS_TO_DELAY,
};
pub use scenario::{
    distribution_chain, simple_chain, simple_diamond, trend_chain, NodeSpec, ScenarioConfig,
    SeedPolicy,
};
pub use simulator::{CalibrationSimulator, NodeMap, RunTrace};
pub use utility::{RandomlyChangeParamNode, VirtualConnectionNode};
