//! Threshold decisions and confidence intervals on known inputs.

use std::collections::BTreeMap;

use oaf_core::WaveRecord;
use oaf_graph::CalibrationGraph;
use oaf_stats::{
    ci_failures_per_period, ci_for_parameter, ci_time_to_failure, ci_time_to_failure_from_waves,
    min_num_samples, quantile_interval, threshold_satisfied, FailureKind,
};

#[test]
fn min_num_samples_matches_pure_success_rule() {
    // 0.9^21 > 0.1 >= 0.9^22
    assert_eq!(min_num_samples(0.9, 0.9).unwrap(), 22);
    assert_eq!(min_num_samples(0.5, 0.6).unwrap(), 2);
}

#[test]
fn threshold_decision_needs_a_conclusive_clean_run() {
    let clean = |n: usize| vec![1.0; n];
    assert!(!threshold_satisfied(&clean(21), 0.0, 0.9, 0.9).unwrap());
    assert!(threshold_satisfied(&clean(22), 0.0, 0.9, 0.9).unwrap());
    assert!(threshold_satisfied(&clean(30), 0.0, 0.9, 0.9).unwrap());
}

#[test]
fn one_dud_among_thirty_is_inconclusive() {
    let mut samples = vec![1.0; 29];
    samples.push(-1.0);
    assert!(!threshold_satisfied(&samples, 0.0, 0.9, 0.9).unwrap());
}

#[test]
fn all_samples_below_threshold_never_satisfy() {
    assert!(!threshold_satisfied(&vec![-1.0; 50], 0.0, 0.9, 0.9).unwrap());
}

#[test]
fn threshold_decision_validates_inputs() {
    assert!(threshold_satisfied(&[], 0.0, 0.9, 0.9).is_err());
    assert!(threshold_satisfied(&[1.0], 0.0, 1.2, 0.9).is_err());
    assert!(threshold_satisfied(&[1.0], 0.0, 0.9, 0.0).is_err());
}

#[test]
fn quantile_interval_brackets_the_upper_order_statistics() {
    let samples: Vec<f64> = (1..=30).map(f64::from).collect();
    let ci = quantile_interval(&samples, 0.9, 0.9).unwrap().unwrap();
    assert_eq!(ci.low, 24.0);
    assert_eq!(ci.high, 30.0);
}

#[test]
fn quantile_interval_requires_enough_samples() {
    let samples: Vec<f64> = (1..=10).map(f64::from).collect();
    assert!(quantile_interval(&samples, 0.9, 0.9).unwrap().is_none());
}

#[test]
fn time_to_failure_intervals_are_per_node() {
    let mut times = BTreeMap::new();
    times.insert("a".to_string(), (1..=30).map(f64::from).collect::<Vec<_>>());
    times.insert("b".to_string(), vec![1.0, 2.0, 3.0]);
    let intervals = ci_time_to_failure(&times, 0.9, 0.9).unwrap();
    assert!(intervals["a"].is_some());
    assert!(intervals["b"].is_none());
}

#[test]
fn parameter_interval_matches_the_quantile_interval() {
    let samples: Vec<f64> = (1..=30).map(f64::from).collect();
    let ci = ci_for_parameter(&samples, 0.9, 0.9).unwrap().unwrap();
    assert_eq!(ci.low, 24.0);
    assert_eq!(ci.high, 30.0);
}

fn chain_graph() -> CalibrationGraph {
    let mut graph = CalibrationGraph::new();
    graph.add_node("a").unwrap();
    graph.add_node("b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph
}

fn period(time: f64) -> Vec<WaveRecord> {
    vec![
        WaveRecord {
            wave: time,
            timed_trigger: true,
            root_nodes: vec!["b".to_string()],
            submitted_nodes: vec!["a".to_string(), "b".to_string()],
        },
        WaveRecord {
            wave: time + 0.001,
            timed_trigger: false,
            root_nodes: vec!["b".to_string()],
            submitted_nodes: vec!["a".to_string()],
        },
        WaveRecord {
            wave: time + 0.002,
            timed_trigger: false,
            root_nodes: vec!["a".to_string()],
            submitted_nodes: vec![],
        },
    ]
}

#[test]
fn failures_per_period_distinguishes_all_from_base() {
    let graph = chain_graph();
    let periods: Vec<Vec<WaveRecord>> = (0..25).map(|i| period(f64::from(i) * 10.0)).collect();

    let all = ci_failures_per_period(&periods, &graph, FailureKind::All, 0.9, 0.9).unwrap();
    let a = all["a"].unwrap();
    let b = all["b"].unwrap();
    assert_eq!((a.low, a.high), (1.0, 1.0));
    assert_eq!((b.low, b.high), (1.0, 1.0));

    // Base attribution collapses b's failure onto its dependency a.
    let base = ci_failures_per_period(&periods, &graph, FailureKind::Base, 0.9, 0.9).unwrap();
    let a = base["a"].unwrap();
    let b = base["b"].unwrap();
    assert_eq!((a.low, a.high), (1.0, 1.0));
    assert_eq!((b.low, b.high), (0.0, 0.0));
}

#[test]
fn time_to_failure_intervals_come_straight_from_a_trace() {
    let graph = chain_graph();
    // One diagnosis per node every 10 time units, 31 times over.
    let waves: Vec<WaveRecord> = (0..31).flat_map(|i| period(f64::from(i) * 10.0)).collect();
    let intervals =
        ci_time_to_failure_from_waves(&waves, &graph, FailureKind::All, 0.9, 0.9).unwrap();
    let a = intervals["a"].unwrap();
    assert!((a.low - 10.0).abs() < 1e-9);
    assert!((a.high - 10.0).abs() < 1e-9);
    assert!(intervals["b"].is_some());
}

#[test]
fn failures_per_period_rejects_too_few_periods() {
    let graph = chain_graph();
    let periods: Vec<Vec<WaveRecord>> = (0..5).map(|i| period(f64::from(i) * 10.0)).collect();
    assert!(ci_failures_per_period(&periods, &graph, FailureKind::All, 0.9, 0.9).is_err());
}
