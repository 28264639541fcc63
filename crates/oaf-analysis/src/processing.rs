//! Trace preprocessing: trigger-group splitting and check bucketing.

use oaf_core::records::{sort_checks, sort_waves, CheckRecord, WaveRecord};

/// Sorts wave records by stamp and splits them into trigger groups: each
/// group starts with a timed trigger wave followed by the diagnosis waves it
/// caused. Diagnosis records preceding the first trigger are discarded.
pub fn split_by_trigger(waves: &[WaveRecord]) -> Vec<Vec<WaveRecord>> {
    let mut sorted = waves.to_vec();
    sort_waves(&mut sorted);

    let mut groups: Vec<Vec<WaveRecord>> = Vec::new();
    let mut current: Vec<WaveRecord> = Vec::new();
    for record in sorted {
        if record.timed_trigger {
            if !current.is_empty() && current[0].timed_trigger {
                groups.push(current);
            }
            current = vec![record];
        } else if !current.is_empty() {
            current.push(record);
        }
        // A diagnosis record before the first trigger is dropped.
    }
    if !current.is_empty() && current[0].timed_trigger {
        groups.push(current);
    }
    groups
}

/// Buckets check records into half-open stamp intervals between successive
/// timed trigger waves. Returns `(trigger_stamp, checks)` pairs in stamp
/// order.
pub fn organize_checks_by_trigger(
    waves: &[WaveRecord],
    checks: &[CheckRecord],
) -> Vec<(f64, Vec<CheckRecord>)> {
    let mut triggers: Vec<f64> = waves
        .iter()
        .filter(|record| record.timed_trigger)
        .map(|record| record.wave)
        .collect();
    triggers.sort_by(|a, b| a.total_cmp(b));

    let mut sorted_checks = checks.to_vec();
    sort_checks(&mut sorted_checks);

    let mut buckets = Vec::with_capacity(triggers.len());
    for (idx, &low) in triggers.iter().enumerate() {
        let high = triggers.get(idx + 1).copied().unwrap_or(f64::INFINITY);
        let bucket = sorted_checks
            .iter()
            .filter(|check| check.wave >= low && check.wave < high)
            .cloned()
            .collect();
        buckets.push((low, bucket));
    }
    buckets
}
