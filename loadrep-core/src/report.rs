use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{RunResult, StepResultSummary};
use crate::duration_keys;

/// `round(100 * count / total)`, or `0` for an empty total.
pub fn percentage(count: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * count as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Rounds seconds to millisecond precision for output.
pub fn round3(v: f64) -> f64 {
    (v * 1e3).round() / 1e3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percentages {
    pub success_perc: u8,
    pub fail_perc: u8,
}

impl Percentages {
    /// The fail share is the complement of the success share so both always add
    /// up to 100 for a non-empty total.
    pub fn of(success: u64, fail: u64) -> Self {
        let total = success.saturating_add(fail);
        if total == 0 {
            return Self {
                success_perc: 0,
                fail_perc: 0,
            };
        }
        let success_perc = percentage(success, total);
        Self {
            success_perc,
            fail_perc: 100 - success_perc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub percentages: Percentages,
    pub success_count: u64,
    pub fail_count: u64,
    pub avg_duration: f64,
    pub steps: BTreeMap<u16, StepReportView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReportView {
    pub name: String,
    #[serde(flatten)]
    pub percentages: Percentages,
    pub success_count: u64,
    pub fail_count: u64,
    pub status_code_dist: BTreeMap<u16, u64>,
    pub error_dist: BTreeMap<String, u64>,
    /// Keyed by report field name (`dns`, `total`, ...), in seconds.
    pub durations: BTreeMap<String, f64>,
}

impl From<&StepResultSummary> for StepReportView {
    fn from(s: &StepResultSummary) -> Self {
        // Known phases go in last: they win over an unknown phase that already
        // carries the same report name.
        let (known, unknown): (Vec<_>, Vec<_>) = s
            .durations
            .iter()
            .partition(|(phase, _)| duration_keys::is_known(phase));
        let mut durations = BTreeMap::new();
        for (phase, mean) in unknown.into_iter().chain(known) {
            durations.insert(
                duration_keys::rename(phase).to_string(),
                round3(mean.mean()),
            );
        }

        Self {
            name: s.name.clone(),
            percentages: Percentages::of(s.success_count, s.fail_count),
            success_count: s.success_count,
            fail_count: s.fail_count,
            status_code_dist: s.status_code_dist.iter().map(|(k, v)| (*k, *v)).collect(),
            error_dist: s
                .error_dist
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            durations,
        }
    }
}

impl From<&RunResult> for ReportView {
    fn from(r: &RunResult) -> Self {
        Self {
            percentages: Percentages::of(r.success_count, r.fail_count),
            success_count: r.success_count,
            fail_count: r.fail_count,
            avg_duration: round3(r.avg_duration.mean()),
            steps: r
                .steps
                .iter()
                .map(|(id, s)| (*id, StepReportView::from(s)))
                .collect(),
        }
    }
}
