use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::Error;
use crate::types::{ScenarioResult, ScenarioStepResult};

/// Incrementally updated mean. Keeps full precision; rounding is the encoder's job.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunningMean {
    samples: u64,
    mean: f64,
}

impl RunningMean {
    pub fn push(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }

        self.samples = self.samples.saturating_add(1);
        self.mean += (x - self.mean) / (self.samples as f64);
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}

/// Decides which step outcomes count as successes.
///
/// A step with an error is always a failure. Otherwise its status code must fall
/// in `statuses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessPolicy {
    statuses: RangeInclusive<u16>,
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        Self { statuses: 200..=399 }
    }
}

impl SuccessPolicy {
    pub fn new(statuses: RangeInclusive<u16>) -> Self {
        Self { statuses }
    }

    pub fn statuses(&self) -> &RangeInclusive<u16> {
        &self.statuses
    }

    pub fn is_success(&self, step: &ScenarioStepResult) -> bool {
        step.error.is_none() && self.statuses.contains(&step.status_code)
    }
}

impl FromStr for SuccessPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSuccessRange(s.to_string());

        let (lo, hi) = s.trim().split_once('-').ok_or_else(invalid)?;
        let lo: u16 = lo.trim().parse().map_err(|_| invalid())?;
        let hi: u16 = hi.trim().parse().map_err(|_| invalid())?;
        if lo > hi {
            return Err(invalid());
        }
        Ok(Self::new(lo..=hi))
    }
}

impl std::fmt::Display for SuccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.statuses.start(), self.statuses.end())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepResultSummary {
    pub name: String,
    pub success_count: u64,
    pub fail_count: u64,
    pub status_code_dist: HashMap<u16, u64>,
    pub error_dist: HashMap<String, u64>,
    /// Mean duration in seconds per internal phase name.
    pub durations: HashMap<String, RunningMean>,
}

impl StepResultSummary {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Running totals for a whole test run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunResult {
    /// Step outcomes counted as successes.
    pub success_count: u64,
    pub fail_count: u64,
    /// Mean scenario duration in seconds.
    pub avg_duration: RunningMean,
    pub steps: HashMap<u16, StepResultSummary>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_count(&self) -> u64 {
        self.success_count.saturating_add(self.fail_count)
    }
}

/// Folds one scenario run into `result`.
///
/// Must be called once per record, from a single consumer.
pub fn fold(result: &mut RunResult, record: &ScenarioResult, policy: &SuccessPolicy) {
    if record.steps.is_empty() {
        return;
    }

    for step in &record.steps {
        let summary = result
            .steps
            .entry(step.id)
            .or_insert_with(|| StepResultSummary::new(&step.name));

        if let Some(err) = &step.error {
            *summary.error_dist.entry(err.kind.to_string()).or_default() += 1;
        } else {
            *summary.status_code_dist.entry(step.status_code).or_default() += 1;
        }

        if policy.is_success(step) {
            summary.success_count += 1;
            result.success_count += 1;
        } else {
            summary.fail_count += 1;
            result.fail_count += 1;
        }

        for (phase, elapsed) in &step.durations {
            summary
                .durations
                .entry(phase.clone())
                .or_default()
                .push(elapsed.as_secs_f64());
        }
    }

    result
        .avg_duration
        .push(record.total_secs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StepError, StepErrorKind, phase};
    use std::time::Duration;

    fn step(id: u16, status: u16, total_ms: u64) -> ScenarioStepResult {
        let mut s = ScenarioStepResult {
            id,
            name: format!("step-{id}"),
            status_code: status,
            ..ScenarioStepResult::default()
        };
        s.durations
            .insert(phase::TOTAL.to_string(), Duration::from_millis(total_ms));
        s
    }

    fn fold_all(records: &[ScenarioResult]) -> RunResult {
        let mut r = RunResult::new();
        let policy = SuccessPolicy::default();
        for rec in records {
            fold(&mut r, rec, &policy);
        }
        r
    }

    #[test]
    fn running_mean_is_incremental() {
        let mut m = RunningMean::default();
        for x in [1.0, 2.0, 3.0, 4.0] {
            m.push(x);
        }
        assert_eq!(m.samples(), 4);
        assert!((m.mean() - 2.5).abs() < 1e-12);

        m.push(f64::NAN);
        assert_eq!(m.samples(), 4);
    }

    #[test]
    fn empty_record_is_a_no_op() {
        let r = fold_all(&[ScenarioResult::default()]);
        assert_eq!(r, RunResult::new());
    }

    #[test]
    fn statuses_and_errors_are_counted_per_step() {
        let mut failed = step(2, 0, 10);
        failed.error = Some(StepError::new(StepErrorKind::Connection, "refused"));

        let r = fold_all(&[
            ScenarioResult {
                steps: vec![step(1, 200, 100), step(2, 500, 50)],
            },
            ScenarioResult {
                steps: vec![step(1, 200, 300), failed],
            },
        ]);

        assert_eq!(r.success_count, 2);
        assert_eq!(r.fail_count, 2);

        let s1 = &r.steps[&1];
        assert_eq!(s1.name, "step-1");
        assert_eq!(s1.success_count, 2);
        assert_eq!(s1.status_code_dist.get(&200), Some(&2));
        assert!((s1.durations[phase::TOTAL].mean() - 0.2).abs() < 1e-12);

        let s2 = &r.steps[&2];
        assert_eq!(s2.fail_count, 2);
        assert_eq!(s2.status_code_dist.get(&500), Some(&1));
        assert_eq!(s2.status_code_dist.get(&0), None);
        assert_eq!(s2.error_dist.get("connectionError"), Some(&1));

        // Scenario totals: 150ms and 310ms.
        assert_eq!(r.avg_duration.samples(), 2);
        assert!((r.avg_duration.mean() - 0.23).abs() < 1e-12);
    }

    #[test]
    fn huge_step_totals_do_not_panic() {
        let mut a = step(1, 200, 0);
        a.durations
            .insert(phase::TOTAL.to_string(), Duration::from_secs(u64::MAX));
        let mut b = a.clone();
        b.id = 2;

        let r = fold_all(&[ScenarioResult { steps: vec![a, b] }]);

        assert_eq!(r.avg_duration.samples(), 1);
        assert!(r.avg_duration.mean() > u64::MAX as f64);
        assert_eq!(r.success_count, 2);
    }

    #[test]
    fn unknown_phases_are_kept() {
        let mut s = step(1, 200, 10);
        s.durations
            .insert("queueDuration".to_string(), Duration::from_millis(4));

        let r = fold_all(&[ScenarioResult { steps: vec![s] }]);
        let d = &r.steps[&1].durations;
        assert!(d.contains_key("queueDuration"));
        assert!(d.contains_key(phase::TOTAL));
    }

    #[test]
    fn fold_order_does_not_change_the_outcome() {
        let records = vec![
            ScenarioResult {
                steps: vec![step(1, 200, 100), step(2, 404, 20)],
            },
            ScenarioResult {
                steps: vec![step(1, 302, 40)],
            },
            ScenarioResult {
                steps: vec![step(2, 200, 60), step(3, 503, 7)],
            },
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let a = fold_all(&records);
        let b = fold_all(&reversed);

        assert_eq!(a.success_count, b.success_count);
        assert_eq!(a.fail_count, b.fail_count);
        for (id, sa) in &a.steps {
            let sb = &b.steps[id];
            assert_eq!(sa.status_code_dist, sb.status_code_dist);
            assert_eq!(sa.error_dist, sb.error_dist);
            for (k, m) in &sa.durations {
                assert!((m.mean() - sb.durations[k].mean()).abs() < 1e-9);
            }
        }
        assert!((a.avg_duration.mean() - b.avg_duration.mean()).abs() < 1e-9);
    }

    #[test]
    fn success_policy_parses_and_classifies() {
        let p: SuccessPolicy = match "200-299".parse() {
            Ok(p) => p,
            Err(err) => panic!("parse failed: {err}"),
        };
        assert_eq!(p.to_string(), "200-299");
        assert!(p.is_success(&step(1, 204, 1)));
        assert!(!p.is_success(&step(1, 302, 1)));
        assert!(SuccessPolicy::default().is_success(&step(1, 302, 1)));

        assert!("299-200".parse::<SuccessPolicy>().is_err());
        assert!("200".parse::<SuccessPolicy>().is_err());
        assert!("a-b".parse::<SuccessPolicy>().is_err());
    }
}
