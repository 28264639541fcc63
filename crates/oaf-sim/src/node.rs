//! Node state shared by every calibration model and the trait the simulator
//! drives them through.
//!
//! Model-to-model coupling (background sources, hidden baselines, proxy
//! checks) flows through an [`Exports`] snapshot the simulator gathers from
//! all nodes before handing control to any one of them. A node therefore
//! never holds a reference to another node.

use std::collections::BTreeMap;

use oaf_core::errors::{ErrorInfo, OafError};
use oaf_core::records::FailureMagnitude;
use oaf_core::rng::RngHandle;
use serde::{Deserialize, Serialize};

/// Number of post-calibration checks for which a stretched timeout is kept.
pub const FIRST_CHECKS_TO_DELAY: usize = 2;

/// Per-node state published to other nodes each step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportedState {
    /// Value the node exposes to consumers, when the model exposes one.
    pub value: Option<f64>,
    /// Whether the node is currently failed.
    pub failed: bool,
}

/// Snapshot of every node's exported state, keyed by node name.
pub type Exports = BTreeMap<String, ExportedState>;

/// Looks up the exported state a consumer node depends on.
pub fn require_export<'a>(
    exports: &'a Exports,
    source: &str,
    consumer: &str,
) -> Result<&'a ExportedState, OafError> {
    exports.get(source).ok_or_else(|| {
        OafError::Node(
            ErrorInfo::new("missing-export", "dependency export not found")
                .with_context("source", source)
                .with_context("consumer", consumer),
        )
    })
}

/// Looks up the exported value a consumer node depends on.
pub fn require_export_value(
    exports: &Exports,
    source: &str,
    consumer: &str,
) -> Result<f64, OafError> {
    require_export(exports, source, consumer)?.value.ok_or_else(|| {
        OafError::Node(
            ErrorInfo::new("export-without-value", "dependency exports no value")
                .with_context("source", source)
                .with_context("consumer", consumer),
        )
    })
}

/// Timeout-adaptation options shared by all node models.
///
/// Both fields carry a time-to-failure percentile estimated from earlier
/// runs. `delay_first_check` stretches the timeout right after calibration
/// when the node is known to survive much longer than its timeout;
/// `check_long_lived` halves the timeout once a node has outlived its 95th
/// percentile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdaptiveTimeouts {
    /// 5th-percentile time to failure; enables first-check delaying.
    #[serde(default)]
    pub delay_first_check: Option<f64>,
    /// 95th-percentile time to failure; enables long-lived tightening.
    #[serde(default)]
    pub check_long_lived: Option<f64>,
}

impl AdaptiveTimeouts {
    fn validate(&self) -> Result<(), OafError> {
        if let Some(p5) = self.delay_first_check {
            if p5 <= 0.0 {
                return Err(invalid_percentiles("delay_first_check", p5));
            }
        }
        if let Some(p95) = self.check_long_lived {
            if p95 <= 0.0 {
                return Err(invalid_percentiles("check_long_lived", p95));
            }
        }
        if let (Some(p5), Some(p95)) = (self.delay_first_check, self.check_long_lived) {
            if p5 >= p95 {
                return Err(OafError::Node(
                    ErrorInfo::new(
                        "invalid-ttf-percentiles",
                        "5th percentile must lie below the 95th",
                    )
                    .with_context("p5", p5.to_string())
                    .with_context("p95", p95.to_string()),
                ));
            }
        }
        Ok(())
    }
}

fn invalid_percentiles(field: &str, value: f64) -> OafError {
    OafError::Node(
        ErrorInfo::new("invalid-ttf-percentiles", "percentile must be positive")
            .with_context("field", field)
            .with_context("value", value.to_string()),
    )
}

/// Bookkeeping state every calibration node carries.
#[derive(Debug, Clone)]
pub struct NodeCore {
    /// Node name, unique within a simulation.
    pub name: String,
    /// Timeout configured for the node.
    pub base_timeout: f64,
    /// Effective timeout, adjusted by the adaptive policies.
    pub timeout: f64,
    /// Whether the node is currently out of spec.
    pub failed: bool,
    /// Magnitude of the most recent failure.
    pub failure_magnitude: FailureMagnitude,
    /// Time of the most recent recalibration.
    pub last_calibration: f64,
    /// Time of the most recent data check.
    pub last_check: f64,
    adaptive: AdaptiveTimeouts,
    stretched_checks_left: usize,
    long_lived: bool,
}

impl NodeCore {
    /// Creates node state with the given name and timeout.
    pub fn new(name: impl Into<String>, timeout: f64) -> Result<Self, OafError> {
        Self::with_adaptive(name, timeout, AdaptiveTimeouts::default())
    }

    /// Creates node state with adaptive timeout options.
    pub fn with_adaptive(
        name: impl Into<String>,
        timeout: f64,
        adaptive: AdaptiveTimeouts,
    ) -> Result<Self, OafError> {
        let name = name.into();
        if !(timeout > 0.0) {
            return Err(OafError::Node(
                ErrorInfo::new("invalid-timeout", "timeout must be positive")
                    .with_context("node", name)
                    .with_context("timeout", timeout.to_string()),
            ));
        }
        adaptive.validate()?;
        Ok(Self {
            name,
            base_timeout: timeout,
            timeout,
            failed: false,
            failure_magnitude: FailureMagnitude::None,
            last_calibration: 0.0,
            last_check: 0.0,
            adaptive,
            stretched_checks_left: 0,
            long_lived: false,
        })
    }

    /// Records a data check at `time`, applying the adaptive timeout rules,
    /// and returns the current failed flag.
    pub fn note_check(&mut self, time: f64) -> bool {
        if self.stretched_checks_left > 0 {
            self.stretched_checks_left -= 1;
            if self.stretched_checks_left == 0 {
                self.timeout = self.base_timeout;
            }
        }
        if let Some(p95) = self.adaptive.check_long_lived {
            if !self.long_lived {
                let alive = time - self.last_calibration.max(self.last_check);
                if alive > p95 {
                    self.timeout = self.base_timeout / 2.0;
                    self.long_lived = true;
                }
            }
        }
        self.failed
    }

    /// Clears failure state after a recalibration at `time` and applies the
    /// first-check delay when enabled.
    pub fn mark_calibrated(&mut self, time: f64) {
        self.failed = false;
        self.failure_magnitude = FailureMagnitude::None;
        self.last_calibration = time;
        self.long_lived = false;
        self.timeout = self.base_timeout;
        self.stretched_checks_left = 0;
        if let Some(p5) = self.adaptive.delay_first_check {
            if p5 > 5.0 * self.base_timeout {
                self.timeout = p5 / 5.0;
                self.stretched_checks_left = FIRST_CHECKS_TO_DELAY;
            }
        }
    }
}

/// Behaviour the simulator requires of every node model.
pub trait CalibrationNode {
    /// Shared bookkeeping state.
    fn core(&self) -> &NodeCore;

    /// Mutable shared bookkeeping state.
    fn core_mut(&mut self) -> &mut NodeCore;

    /// Advances the node's failure model by one unit of simulated time.
    fn simulate_failure(
        &mut self,
        time: f64,
        exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError>;

    /// Runs the node's data check. The default applies the adaptive-timeout
    /// bookkeeping and reports the current failed flag.
    fn check_data(&mut self, time: f64, exports: &Exports) -> Result<bool, OafError> {
        let _ = exports;
        Ok(self.core_mut().note_check(time))
    }

    /// Recalibrates the node. The default clears the failure state.
    fn calibrate(
        &mut self,
        time: f64,
        exports: &Exports,
        rng: &mut RngHandle,
    ) -> Result<(), OafError> {
        let _ = (exports, rng);
        self.core_mut().mark_calibrated(time);
        Ok(())
    }

    /// Raw data values backing the most recent check, when the model keeps
    /// them.
    fn check_values(&self) -> Vec<f64> {
        Vec::new()
    }

    /// Value the node publishes to dependent models, when any.
    fn export(&self) -> Option<f64> {
        None
    }
}
