//! Parametric device-response nodes.
//!
//! A func node owns a table of named parameters that drift every step and a
//! response curve evaluated at the current parameter values. The node is in
//! spec while the response stays above its threshold. Calibration restores
//! parameters to their initial values, optionally with a gamma-distributed
//! imperfection skewed in the drift direction.

use std::collections::BTreeMap;

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::records::FailureMagnitude;
use oaf_core::rng::RngHandle;
use rand::Rng;
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};

use crate::node::{require_export_value, CalibrationNode, Exports, NodeCore};

/// Factor by which a dependency-sourced background is attenuated before it
/// enters the response.
pub const BACKGROUND_ATTENUATION: f64 = 5.0;

/// Margin below the threshold separating minor from major failures.
const MINOR_FAILURE_MARGIN: f64 = 0.01;

/// Shape of the gamma draw used for randomized calibration.
const RANDOMIZED_CALIBRATION_SHAPE: f64 = 2.0;

/// Drift behaviour of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Calibrated (optimal) value.
    pub initial: f64,
    /// Maximum absolute drift per step; scaled by a uniform draw.
    pub drift_rate: f64,
    /// Probability of drifting in the positive direction.
    pub drift_bias: f64,
    /// Lower clamp applied after each drift step.
    pub min: f64,
    /// Upper clamp applied after each drift step.
    pub max: f64,
}

impl ParamSpec {
    /// Unbounded parameter spec.
    pub fn unbounded(initial: f64, drift_rate: f64, drift_bias: f64) -> Self {
        Self {
            initial,
            drift_rate,
            drift_bias,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

/// Named drifting parameters with before/after calibration snapshots.
#[derive(Debug, Clone)]
pub struct ParamTable {
    specs: BTreeMap<String, ParamSpec>,
    current: BTreeMap<String, f64>,
    before_calibration: BTreeMap<String, f64>,
    after_calibration: BTreeMap<String, f64>,
}

impl ParamTable {
    /// Creates a table at its initial parameter values.
    pub fn new(specs: BTreeMap<String, ParamSpec>) -> Self {
        let current = specs.iter().map(|(k, s)| (k.clone(), s.initial)).collect();
        Self {
            specs,
            current,
            before_calibration: BTreeMap::new(),
            after_calibration: BTreeMap::new(),
        }
    }

    /// Current value of a parameter.
    pub fn get(&self, name: &str) -> Result<f64, OafError> {
        self.current.get(name).copied().ok_or_else(|| {
            OafError::Node(
                ErrorInfo::new("unknown-parameter", "parameter not present in table")
                    .with_context("parameter", name),
            )
        })
    }

    /// Overwrites the current value of a parameter.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), OafError> {
        match self.current.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(OafError::Node(
                ErrorInfo::new("unknown-parameter", "parameter not present in table")
                    .with_context("parameter", name),
            )),
        }
    }

    /// Drifts every parameter by one step. `coeff` scales the step size and
    /// carries the nonlinear drift factor when enabled.
    pub fn drift(&mut self, coeff: f64, rng: &mut RngHandle) {
        for (name, spec) in &self.specs {
            let direction = if rng.gen::<f64>() < spec.drift_bias {
                1.0
            } else {
                -1.0
            };
            let step = direction * spec.drift_rate * rng.gen::<f64>() * coeff;
            if let Some(value) = self.current.get_mut(name) {
                *value = (*value + step).clamp(spec.min, spec.max);
            }
        }
    }

    /// Snapshots current values, then restores every parameter to its
    /// initial value.
    pub fn reset(&mut self) {
        self.before_calibration = self.current.clone();
        for (name, spec) in &self.specs {
            if let Some(value) = self.current.get_mut(name) {
                *value = spec.initial;
            }
        }
        self.after_calibration = self.current.clone();
    }

    /// Snapshots current values, then draws each parameter from a gamma
    /// distribution around its initial value, skewed toward the drift
    /// direction. Parameters with zero drift rate reset exactly.
    pub fn randomized_reset(&mut self, rng: &mut RngHandle) -> Result<(), OafError> {
        self.before_calibration = self.current.clone();
        for (name, spec) in &self.specs {
            let value = if spec.drift_rate > 0.0 {
                let gamma = Gamma::new(RANDOMIZED_CALIBRATION_SHAPE, spec.drift_rate)
                    .map_err(|err| {
                        OafError::Node(
                            ErrorInfo::new(
                                "invalid-distribution",
                                "randomized calibration gamma is invalid",
                            )
                            .with_context("parameter", name.clone())
                            .with_context("cause", err.to_string()),
                        )
                    })?;
                let offset = gamma.sample(rng);
                if spec.drift_bias >= 0.5 {
                    spec.initial + offset
                } else {
                    spec.initial - offset
                }
            } else {
                spec.initial
            };
            if let Some(slot) = self.current.get_mut(name) {
                *slot = value;
            }
        }
        self.after_calibration = self.current.clone();
        Ok(())
    }

    /// Parameter values captured immediately before the last calibration.
    pub fn before_calibration(&self) -> &BTreeMap<String, f64> {
        &self.before_calibration
    }

    /// Parameter values captured immediately after the last calibration.
    pub fn after_calibration(&self) -> &BTreeMap<String, f64> {
        &self.after_calibration
    }
}

/// Logistic factor that suppresses drift right after calibration and
/// approaches one as the node ages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NonlinearDrift {
    /// Steepness of the logistic ramp.
    pub k: f64,
    /// Time since calibration at which the factor reaches one half.
    pub n0: f64,
}

impl NonlinearDrift {
    /// Drift factor for a node calibrated `time_since_calibration` ago.
    pub fn coeff(&self, time_since_calibration: f64) -> f64 {
        1.0 / (1.0 + (-self.k * (time_since_calibration - self.n0)).exp())
    }
}

impl Default for NonlinearDrift {
    fn default() -> Self {
        Self { k: 0.02, n0: 200.0 }
    }
}

/// Response curve evaluated against the parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Response {
    /// Rabi-style population: `sin^2(omega t) cos^2(delta) - background`.
    Sin2,
    /// Decay fidelity: `1 - (amp exp(-t / decay_time) + background)`.
    ExpDecay,
}

/// Optional behaviours of a func node.
#[derive(Debug, Clone, Default)]
pub struct FuncOptions {
    /// Node whose export supplies the background term (attenuated).
    pub background_source: Option<String>,
    /// Logistic drift suppression after calibration.
    pub nonlinear_drift: Option<NonlinearDrift>,
    /// Draw post-calibration parameters from a gamma around the optimum.
    pub randomize_calibration: bool,
    /// Evaluate the response every step. Turning this off skips in-spec
    /// monitoring for speed; the node then never fails on its own.
    pub monitor_in_spec: bool,
}

impl FuncOptions {
    /// Options with in-spec monitoring enabled and nothing else.
    pub fn monitored() -> Self {
        Self {
            monitor_in_spec: true,
            ..Self::default()
        }
    }
}

/// Parametric node with a drifting parameter table and a response curve.
#[derive(Debug, Clone)]
pub struct FuncNode {
    pub(crate) core: NodeCore,
    pub(crate) params: ParamTable,
    pub(crate) response: Response,
    pub(crate) threshold: f64,
    pub(crate) options: FuncOptions,
    pub(crate) last_value: Option<f64>,
}

impl FuncNode {
    /// Creates a func node over the given parameter table.
    ///
    /// The table must carry every parameter the response reads, including
    /// `background` unless a background source is configured. Nodes without
    /// a background source start with their check value evaluated at the
    /// initial parameters, so dependents see a usable export from step zero.
    pub fn new(
        core: NodeCore,
        response: Response,
        params: ParamTable,
        threshold: f64,
        options: FuncOptions,
    ) -> Result<Self, OafError> {
        let mut required: Vec<&str> = match response {
            Response::Sin2 => vec!["omega", "time", "delta"],
            Response::ExpDecay => vec!["amp", "time", "decay_time"],
        };
        if options.background_source.is_none() {
            required.push("background");
        }
        for name in required {
            params.get(name).map_err(|_| {
                OafError::Node(
                    ErrorInfo::new("missing-parameter", "response parameter absent from table")
                        .with_context("node", core.name.clone())
                        .with_context("parameter", name),
                )
            })?;
        }
        let mut node = Self {
            core,
            params,
            response,
            threshold,
            options,
            last_value: None,
        };
        if node.options.background_source.is_none() {
            node.last_value = Some(node.check_value(&Exports::new())?);
        }
        Ok(node)
    }

    /// Current parameter table.
    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    /// Drift scale factor at `time`.
    pub(crate) fn drift_coeff(&self, time: f64) -> f64 {
        match &self.options.nonlinear_drift {
            Some(nl) => nl.coeff(time - self.core.last_calibration),
            None => 1.0,
        }
    }

    fn background(&self, exports: &Exports) -> Result<f64, OafError> {
        match &self.options.background_source {
            Some(source) => {
                let value = require_export_value(exports, source, &self.core.name)?;
                Ok(value / BACKGROUND_ATTENUATION)
            }
            None => self.params.get("background"),
        }
    }

    /// Raw response value: the Rabi population for [`Response::Sin2`], the
    /// remaining decay population for [`Response::ExpDecay`].
    pub(crate) fn response_raw(&self, exports: &Exports) -> Result<f64, OafError> {
        let background = self.background(exports)?;
        match self.response {
            Response::Sin2 => {
                let omega = self.params.get("omega")?;
                let time = self.params.get("time")?;
                let delta = self.params.get("delta")?;
                Ok((omega * time).sin().powi(2) * delta.cos().powi(2) - background)
            }
            Response::ExpDecay => {
                let amp = self.params.get("amp")?;
                let time = self.params.get("time")?;
                let decay_time = self.params.get("decay_time")?;
                Ok(amp * (-time / decay_time).exp() + background)
            }
        }
    }

    /// Check value compared against the threshold.
    pub(crate) fn check_value(&self, exports: &Exports) -> Result<f64, OafError> {
        let raw = self.response_raw(exports)?;
        Ok(match self.response {
            Response::Sin2 => raw,
            Response::ExpDecay => 1.0 - raw,
        })
    }

    /// Records a freshly evaluated check value and updates failure state.
    pub(crate) fn record_check(&mut self, value: f64) {
        self.last_value = Some(value);
        self.core.failed = !(value > self.threshold);
        self.core.failure_magnitude = if !self.core.failed {
            FailureMagnitude::None
        } else if self.threshold - value < MINOR_FAILURE_MARGIN {
            FailureMagnitude::Minor
        } else {
            FailureMagnitude::Major
        };
    }

    pub(crate) fn recalibrate_params(&mut self, rng: &mut RngHandle) -> Result<(), OafError> {
        if self.options.randomize_calibration {
            self.params.randomized_reset(rng)?;
        } else {
            self.params.reset();
        }
        Ok(())
    }
}

impl CalibrationNode for FuncNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn simulate_failure(
        &mut self,
        time: f64,
        exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        let coeff = self.drift_coeff(time);
        self.params.drift(coeff, rng);
        if self.options.monitor_in_spec {
            let value = self.check_value(exports)?;
            self.record_check(value);
        }
        Ok(())
    }

    fn calibrate(
        &mut self,
        time: f64,
        _exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        self.recalibrate_params(rng)?;
        self.core.mark_calibrated(time);
        Ok(())
    }

    fn check_values(&self) -> Vec<f64> {
        self.last_value.into_iter().collect()
    }

    fn export(&self) -> Option<f64> {
        let value = self.last_value?;
        Some(match self.response {
            Response::Sin2 => value,
            // Consumers attenuate the remaining population, not the fidelity.
            Response::ExpDecay => 1.0 - value,
        })
    }
}
