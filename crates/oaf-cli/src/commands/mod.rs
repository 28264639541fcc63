pub mod analyze;
pub mod ci;
pub mod demo;
pub mod simulate;

use std::error::Error;
use std::fs;
use std::path::Path;

use oaf_core::records::{CheckRecord, WaveRecord};
use oaf_graph::{graph_from_json, CalibrationGraph};
use serde::Serialize;

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub(crate) fn load_waves(run_dir: &Path) -> Result<Vec<WaveRecord>, Box<dyn Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(
        run_dir.join("wave_data.json"),
    )?)?)
}

pub(crate) fn load_checks(run_dir: &Path) -> Result<Vec<CheckRecord>, Box<dyn Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(
        run_dir.join("check_data.json"),
    )?)?)
}

pub(crate) fn load_graph(run_dir: &Path) -> Result<CalibrationGraph, Box<dyn Error>> {
    Ok(graph_from_json(&fs::read_to_string(
        run_dir.join("graph.json"),
    )?)?)
}
