//! Trace reproducibility under the seed policy.

use oaf_sim::{simple_diamond, SeedPolicy};

#[test]
fn identical_seeds_reproduce_the_full_trace() {
    let scenario = simple_diamond();
    let first = scenario.run().unwrap();
    let second = scenario.run().unwrap();

    let a = serde_json::to_string(&first).unwrap();
    let b = serde_json::to_string(&second).unwrap();
    assert_eq!(a, b);
}

#[test]
fn different_seeds_diverge() {
    let mut scenario = simple_diamond();
    let first = scenario.run().unwrap();
    scenario.seed_policy = SeedPolicy {
        master_seed: 0xDEAD_BEEF,
        label: Some("reseeded".to_string()),
    };
    let second = scenario.run().unwrap();

    assert_ne!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn trace_round_trips_through_json() {
    let trace = simple_diamond().run().unwrap();
    let json = serde_json::to_string(&trace).unwrap();
    let back: oaf_sim::RunTrace = serde_json::from_str(&json).unwrap();
    assert_eq!(trace, back);
}
