use oaf_analysis::{check_scores, co_occurring_check_failures, organize_checks_by_trigger};
use oaf_core::records::{CheckKind, CheckRecord, FailureMagnitude, WaveRecord};
use oaf_graph::CalibrationGraph;

fn trigger(wave: f64, roots: &[&str], submitted: &[&str]) -> WaveRecord {
    WaveRecord {
        wave,
        timed_trigger: true,
        root_nodes: roots.iter().map(|s| s.to_string()).collect(),
        submitted_nodes: submitted.iter().map(|s| s.to_string()).collect(),
    }
}

fn diagnosis(wave: f64, root: &str, submitted: &[&str]) -> WaveRecord {
    WaveRecord {
        wave,
        timed_trigger: false,
        root_nodes: vec![root.to_string()],
        submitted_nodes: submitted.iter().map(|s| s.to_string()).collect(),
    }
}

fn check(wave: f64, node: &str, magnitude: FailureMagnitude) -> CheckRecord {
    CheckRecord {
        wave,
        node: node.to_string(),
        check_kind: CheckKind::CheckData,
        failure_magnitude: magnitude,
        values: Vec::new(),
    }
}

fn chain() -> CalibrationGraph {
    let mut graph = CalibrationGraph::new();
    for name in ["a", "b", "c"] {
        graph.add_node(name).unwrap();
    }
    graph.add_edge("c", "b").unwrap();
    graph.add_edge("b", "a").unwrap();
    graph
}

fn trace() -> (Vec<WaveRecord>, Vec<CheckRecord>) {
    let waves = vec![
        trigger(5.0, &["c"], &["a", "b", "c"]),
        diagnosis(5.001, "a", &[]),
        diagnosis(5.002, "b", &["a"]),
        diagnosis(5.003, "c", &["b"]),
    ];
    let checks = vec![
        check(5.0, "a", FailureMagnitude::Major),
        check(5.0, "b", FailureMagnitude::Minor),
        check(5.0, "c", FailureMagnitude::None),
    ];
    (waves, checks)
}

#[test]
fn checks_bucket_by_enclosing_trigger() {
    let waves = vec![
        trigger(5.0, &["c"], &["a", "b", "c"]),
        trigger(10.0, &["c"], &["a", "b", "c"]),
    ];
    let checks = vec![
        check(5.0, "a", FailureMagnitude::Major),
        check(5.002, "b", FailureMagnitude::Minor),
        check(10.0, "a", FailureMagnitude::None),
    ];
    let buckets = organize_checks_by_trigger(&waves, &checks);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].1.len(), 2);
    assert_eq!(buckets[1].1.len(), 1);
}

#[test]
fn check_cofailures_count_within_bucket() {
    let (waves, checks) = trace();
    let matrix = co_occurring_check_failures(&waves, &checks);
    assert_eq!(matrix[&("a".to_string(), "b".to_string())], 1);
    assert!(!matrix.contains_key(&("a".to_string(), "c".to_string())));
}

#[test]
fn scores_rank_failing_base_node_highest() {
    let graph = chain();
    let (waves, checks) = trace();
    let scores = check_scores(&waves, &checks, &graph).unwrap();

    let a = &scores["a"];
    assert_eq!(a.checks, 1);
    assert_eq!(a.failures, 1);
    assert!((a.avg_failure_magnitude - 2.0).abs() < 1e-12);
    assert!((a.avg_failure_chain_length - 2.0).abs() < 1e-12);
    assert_eq!(a.cofailure_score, 1);
    // 4*2 + 10*(1-0) + 10*2 + 3*1
    assert!((a.check_more - 41.0).abs() < 1e-9);
    assert!((a.check_less - 0.2).abs() < 1e-9);

    let c = &scores["c"];
    assert_eq!(c.failures, 0);
    assert!((c.check_more - 0.0).abs() < 1e-9);
    assert!((c.check_less - 0.9).abs() < 1e-9);
    assert!(a.check_more > scores["b"].check_more);
    assert!(scores["b"].check_more > c.check_more);
}
