use std::error::Error;
use std::fs;
use std::path::Path;

use oaf_core::{RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

/// Structured manifest describing one completed simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema of the artifacts in the run directory.
    pub schema_version: SchemaVersion,
    /// Scenario name, when the configuration carried one.
    pub scenario: Option<String>,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Config hash, seed, and timestamp of the run.
    pub provenance: RunProvenance,
    /// Number of time units simulated.
    pub steps: u32,
    /// Simulation step size.
    pub time_step: u32,
    /// Root nodes recorded on trigger waves.
    pub root_nodes: Vec<String>,
}

impl RunManifest {
    /// Writes the manifest as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}
