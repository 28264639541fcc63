#![deny(missing_docs)]
#![doc = "Core types, errors, and deterministic RNG for the OAF framework."]

pub mod errors;
pub mod provenance;
pub mod records;
pub mod rng;

pub use errors::{ErrorInfo, OafError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use records::{
    sort_checks, sort_waves, CheckKind, CheckRecord, FailureMagnitude, GroundTruthSample,
    WaveRecord, WAVE_OFFSET_STEP,
};
pub use rng::{derive_substream_seed, RngHandle, SIMULATION_SUBSTREAM};
