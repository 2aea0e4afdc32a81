// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Grouping of an [`EventLog`] into [`TestCase`]s.

use linked_hash_map::LinkedHashMap;

use super::{
    anomaly::Anomaly,
    event::{ExecutionEvent, HostRecord, RunEnd, TestIdentity},
    log::EventLog,
    test_case::{HookInstance, HookScope, TestCase, TestCaseRun},
};
use crate::hook::HookId;

/// Frozen result of grouping an [`EventLog`].
#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    /// [`TestCase`]s, ordered by feature URI, then pickle line, then
    /// identity.
    pub test_cases: Vec<TestCase>,

    /// `BeforeAll` and `AfterAll` invocations, ordered by start time.
    pub global_hooks: Vec<HookInstance>,

    /// Last reported end of the host run, if any.
    pub run_end: Option<RunEnd>,

    /// Defects found while grouping.
    pub anomalies: Vec<Anomaly>,
}

impl Aggregation {
    /// Returns the [`TestCase`] with the given `identity`.
    #[must_use]
    pub fn test_case(&self, identity: &TestIdentity) -> Option<&TestCase> {
        self.test_cases.iter().find(|tc| &tc.identity == identity)
    }

    /// Total number of attempts across all [`TestCase`]s.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.test_cases.iter().map(|tc| tc.runs.len()).sum()
    }
}

/// Groups the records of the given [`EventLog`] into [`TestCase`]s.
///
/// Records may come in any order: the result only depends on their content.
#[must_use]
pub fn aggregate(log: &EventLog) -> Aggregation {
    let mut agg = Aggregation::default();
    let mut groups = LinkedHashMap::<TestIdentity, Vec<&ExecutionEvent>>::new();
    let mut globals = LinkedHashMap::<(HookId, usize, u64), HookInstance>::new();

    for rec in log.records() {
        let ev = match rec {
            HostRecord::RunEnd(end) => {
                agg.run_end = Some(end.clone());
                continue;
            }
            HostRecord::TestEnd(ev) => ev,
        };

        if ev.bdd.is_none() {
            if ev.is_pre_skipped() {
                tracing::trace!(test = %ev.identity(), "never attempted");
            } else {
                Anomaly::UnknownTest(ev.identity()).record(&mut agg.anomalies);
            }
            continue;
        }

        for h in ev.hooks.iter().filter(|h| h.kind.is_global()) {
            let instance = HookInstance {
                hook: h.hook,
                kind: h.kind,
                scope: HookScope::Global {
                    worker: ev.worker,
                    start_time: h.start_time,
                },
                status: h.status,
                start_time: h.start_time,
                duration_ms: h.duration_ms,
                error: h.error.clone(),
            };
            let key = (h.hook, ev.worker, h.start_time);
            if let Some(seen) = globals.get(&key) {
                if !seen.same_outcome(&instance) {
                    Anomaly::HookCollision { hook: h.hook, scope: instance.scope }
                        .record(&mut agg.anomalies);
                }
            } else {
                _ = globals.insert(key, instance);
            }
        }

        groups.entry(ev.identity()).or_insert_with(Vec::new).push(ev);
    }

    for (identity, mut events) in groups {
        events.sort_by_key(|ev| ev.attempt);
        if let Some(tc) = test_case(identity, &events, &mut agg.anomalies) {
            agg.test_cases.push(tc);
        }
    }
    agg.test_cases.sort_by(|a, b| {
        (&a.bdd.uri, a.bdd.pickle_line, &a.identity)
            .cmp(&(&b.bdd.uri, b.bdd.pickle_line, &b.identity))
    });

    agg.global_hooks = globals.into_iter().map(|(_, h)| h).collect();
    agg.global_hooks.sort_by_key(|h| (h.start_time, h.scope, h.hook));

    tracing::info!(
        test_cases = agg.test_cases.len(),
        runs = agg.runs(),
        anomalies = agg.anomalies.len(),
        "aggregated execution records",
    );
    agg
}

/// Builds the [`TestCase`] out of its `events`, sorted by attempt.
fn test_case(
    identity: TestIdentity,
    events: &[&ExecutionEvent],
    anomalies: &mut Vec<Anomaly>,
) -> Option<TestCase> {
    let bdd = events.iter().rev().find_map(|ev| ev.bdd.clone())?;

    let mut runs = Vec::<TestCaseRun>::with_capacity(events.len());
    for ev in events {
        if runs.last().is_some_and(|r| r.attempt == ev.attempt) {
            Anomaly::DuplicateAttempt {
                identity: identity.clone(),
                attempt: ev.attempt,
            }
            .record(anomalies);
            continue;
        }
        runs.push(run(&identity, ev, anomalies));
    }

    Some(TestCase { identity, bdd, runs })
}

/// Builds a single [`TestCaseRun`] out of its event.
fn run(
    identity: &TestIdentity,
    ev: &ExecutionEvent,
    anomalies: &mut Vec<Anomaly>,
) -> TestCaseRun {
    let mut steps = ev.steps.clone();
    steps.sort_by_key(|s| s.index);
    steps.dedup_by_key(|s| s.index);

    let mut hooks = Vec::<HookInstance>::new();
    for h in ev.hooks.iter().filter(|h| !h.kind.is_global()) {
        let scope = match (h.kind.is_step_scoped(), h.step) {
            (true, Some(step)) => HookScope::Step { attempt: ev.attempt, step },
            (true, None) => {
                Anomaly::UnscopedStepHook {
                    identity: identity.clone(),
                    hook: h.hook,
                }
                .record(anomalies);
                continue;
            }
            (false, _) => HookScope::Attempt { attempt: ev.attempt },
        };
        if hooks.iter().any(|seen| seen.hook == h.hook && seen.scope == scope) {
            Anomaly::HookCollision { hook: h.hook, scope }.record(anomalies);
            continue;
        }
        hooks.push(HookInstance {
            hook: h.hook,
            kind: h.kind,
            scope,
            status: h.status,
            start_time: h.start_time,
            duration_ms: h.duration_ms,
            error: h.error.clone(),
        });
    }

    TestCaseRun {
        attempt: ev.attempt,
        worker: ev.worker,
        status: ev.status,
        verdict: ev.verdict,
        start_time: ev.start_time,
        duration_ms: ev.duration_ms,
        steps,
        hooks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hook::HookKind,
        report::event::{BddData, HookOutcome, TestStatus, Verdict},
    };

    fn event(line: usize, attempt: usize, status: TestStatus) -> ExecutionEvent {
        ExecutionEvent {
            project: String::new(),
            file: "gen/cart.feature.rs".into(),
            line,
            title_path: vec!["Cart".into(), format!("test {line}")],
            worker: attempt,
            attempt,
            status,
            verdict: None,
            start_time: 1_000 + 100 * attempt as u64,
            duration_ms: 10,
            bdd: Some(BddData { uri: "features/cart.feature".into(), pickle_line: line }),
            steps: vec![],
            hooks: vec![],
            annotations: vec![format!("attempt {attempt}")],
        }
    }

    fn hook(id: usize, kind: HookKind, step: Option<usize>, start: u64) -> HookOutcome {
        HookOutcome {
            hook: HookId(id),
            kind,
            step,
            status: TestStatus::Passed,
            start_time: start,
            duration_ms: 1,
            error: None,
        }
    }

    fn log(events: impl IntoIterator<Item = ExecutionEvent>) -> EventLog {
        let mut log = EventLog::new();
        for ev in events {
            log.push(ev);
        }
        log
    }

    #[test]
    fn groups_attempts_in_order() {
        let agg = aggregate(&log([
            event(3, 2, TestStatus::Passed),
            event(7, 0, TestStatus::Passed),
            event(3, 0, TestStatus::Failed),
            event(3, 1, TestStatus::TimedOut),
        ]));

        assert_eq!(agg.test_cases.len(), 2);
        let attempts = agg.test_cases[0].runs.iter().map(|r| r.attempt).collect::<Vec<_>>();
        assert_eq!(attempts, [0, 1, 2]);
        assert_eq!(agg.test_cases[1].bdd.pickle_line, 7);
        assert!(agg.anomalies.is_empty());
    }

    #[test]
    fn drops_never_attempted_tests() {
        let mut skipped = event(3, 0, TestStatus::Skipped);
        skipped.bdd = None;

        let agg = aggregate(&log([skipped]));

        assert!(agg.test_cases.is_empty());
        assert!(agg.anomalies.is_empty());
    }

    #[test]
    fn reports_attempted_tests_without_feature_data() {
        let mut ev = event(3, 0, TestStatus::Failed);
        ev.bdd = None;

        let agg = aggregate(&log([ev]));

        assert!(agg.test_cases.is_empty());
        assert!(matches!(agg.anomalies[..], [Anomaly::UnknownTest(_)]));
    }

    #[test]
    fn reports_duplicate_attempts() {
        let agg = aggregate(&log([
            event(3, 0, TestStatus::Failed),
            event(3, 0, TestStatus::Passed),
        ]));

        assert_eq!(agg.test_cases[0].runs.len(), 1);
        assert!(matches!(
            agg.anomalies[..],
            [Anomaly::DuplicateAttempt { attempt: 0, .. }],
        ));
    }

    #[test]
    fn attributes_hooks_to_their_scope() {
        let mut ev = event(3, 0, TestStatus::Passed);
        ev.hooks = vec![
            hook(0, HookKind::Before, None, 1_000),
            hook(1, HookKind::AfterStep, Some(1), 1_005),
            hook(1, HookKind::AfterStep, None, 1_006),
            hook(0, HookKind::Before, None, 1_007),
            hook(2, HookKind::BeforeAll, None, 990),
        ];

        let agg = aggregate(&log([ev]));

        let run = &agg.test_cases[0].runs[0];
        assert_eq!(run.hooks.len(), 2);
        assert!(run.hook(HookId(1), Some(1)).is_some());
        assert_eq!(agg.global_hooks.len(), 1);
        assert_eq!(agg.anomalies.len(), 2);
        assert!(matches!(agg.anomalies[0], Anomaly::UnscopedStepHook { .. }));
        assert!(matches!(agg.anomalies[1], Anomaly::HookCollision { .. }));
    }

    #[test]
    fn deduplicates_global_hooks_per_worker() {
        let mut a = event(3, 0, TestStatus::Passed);
        a.hooks = vec![hook(2, HookKind::BeforeAll, None, 990)];
        let mut b = event(7, 0, TestStatus::Passed);
        b.hooks = vec![hook(2, HookKind::BeforeAll, None, 990)];
        let mut c = event(9, 1, TestStatus::Passed);
        c.hooks = vec![hook(2, HookKind::BeforeAll, None, 995)];

        let agg = aggregate(&log([a, b, c]));

        assert_eq!(agg.global_hooks.len(), 2);
        assert!(agg.anomalies.is_empty());
    }

    #[test]
    fn keeps_host_verdict_of_retried_test() {
        let mut failed = event(3, 0, TestStatus::Failed);
        failed.verdict = Some(Verdict::Unexpected);
        let mut passed = event(3, 1, TestStatus::Passed);
        passed.verdict = Some(Verdict::Flaky);

        let agg = aggregate(&log([passed, failed]));

        let tc = &agg.test_cases[0];
        assert_eq!(tc.runs.len(), 2);
        assert_eq!(tc.runs[0].status, TestStatus::Failed);
        assert_eq!(tc.verdict(), Some(Verdict::Flaky));
    }
}
