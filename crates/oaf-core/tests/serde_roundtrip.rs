use std::collections::BTreeMap;

use oaf_core::records::{
    CheckKind, CheckRecord, FailureMagnitude, GroundTruthSample, WaveRecord,
};

#[test]
fn wave_record_roundtrip() {
    let record = WaveRecord {
        wave: 12.002,
        timed_trigger: false,
        root_nodes: vec!["rabi".to_string()],
        submitted_nodes: vec!["spam_background".to_string()],
    };
    let json = serde_json::to_string(&record).unwrap();
    let back: WaveRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

#[test]
fn check_record_roundtrip_with_magnitude_codes() {
    let record = CheckRecord {
        wave: 3.001,
        node: "exp_decay".to_string(),
        check_kind: CheckKind::CheckData,
        failure_magnitude: FailureMagnitude::Major,
        values: vec![0.981, 0.979],
    };
    let json = serde_json::to_string(&record).unwrap();
    // Magnitudes serialize as the original integer codes.
    assert!(json.contains("\"failure_magnitude\":2"));
    let back: CheckRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

#[test]
fn invalid_magnitude_code_is_rejected() {
    let json = r#"{"wave":1.0,"node":"a","check_kind":"check_data","failure_magnitude":9,"values":[]}"#;
    assert!(serde_json::from_str::<CheckRecord>(json).is_err());
}

#[test]
fn ground_truth_roundtrip() {
    let mut in_spec = BTreeMap::new();
    in_spec.insert("a".to_string(), true);
    in_spec.insert("b".to_string(), false);
    let sample = GroundTruthSample { time: 4.0, in_spec };
    let json = serde_json::to_string(&sample).unwrap();
    let back: GroundTruthSample = serde_json::from_str(&json).unwrap();
    assert_eq!(sample, back);
}
