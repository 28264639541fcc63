//! Deterministic random number generation for simulation runs.
//!
//! All randomness in a run flows from the master seed declared in the
//! scenario's seed policy. Distinct purposes draw from distinct substreams:
//! the seed for a substream is SipHash-1-3 (fixed zero keys) over the pair
//! `(master_seed, substream)`, so derived seeds are stable across platforms
//! and adding a substream never perturbs the draws of an existing one. Node
//! models never seed themselves; the simulator threads a single handle
//! through every `simulate_failure` and `calibrate` call.

use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;

/// Substream feeding the simulator and the node models it drives.
pub const SIMULATION_SUBSTREAM: u64 = 1;

/// Derives the seed for one substream of a master seed.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}

/// Random source threaded through a simulation run.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Creates a handle seeded directly with `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates the handle for one substream of a run's master seed.
    pub fn for_substream(master_seed: u64, substream: u64) -> Self {
        Self::from_seed(derive_substream_seed(master_seed, substream))
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
