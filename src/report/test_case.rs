// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`TestCase`]s and their [`TestCaseRun`]s, as aggregated from execution
//! records.

use derive_more::with_trait::Display;

use super::event::{BddData, StepOutcome, TestIdentity, TestStatus, Verdict};
use crate::hook::{HookId, HookKind};

/// What a [`HookInstance`] ran for.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HookScope {
    /// Around a whole attempt of a test.
    #[display("attempt {attempt}")]
    Attempt { attempt: usize },

    /// Around a single step of an attempt.
    #[display("step {step} of attempt {attempt}")]
    Step { attempt: usize, step: usize },

    /// Once per worker.
    #[display("worker {worker} at {start_time}")]
    Global { worker: usize, start_time: u64 },
}

/// Single observed invocation of a hook.
#[derive(Clone, Debug, PartialEq)]
pub struct HookInstance {
    pub hook: HookId,
    pub kind: HookKind,
    pub scope: HookScope,
    pub status: TestStatus,

    /// Milliseconds since the Unix epoch.
    pub start_time: u64,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl HookInstance {
    /// Milliseconds since the Unix epoch this invocation ended at.
    #[must_use]
    pub const fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration_ms)
    }

    /// Indicates whether both instances report the same outcome.
    #[must_use]
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.status == other.status
            && self.duration_ms == other.duration_ms
            && self.error == other.error
    }
}

/// One attempt of a [`TestCase`].
#[derive(Clone, Debug, PartialEq)]
pub struct TestCaseRun {
    pub attempt: usize,
    pub worker: usize,
    pub status: TestStatus,
    pub verdict: Option<Verdict>,

    /// Milliseconds since the Unix epoch.
    pub start_time: u64,
    pub duration_ms: u64,

    /// Step outcomes, ordered by step index.
    pub steps: Vec<StepOutcome>,

    /// Test and step hook invocations of this attempt.
    pub hooks: Vec<HookInstance>,
}

impl TestCaseRun {
    /// Milliseconds since the Unix epoch this attempt ended at.
    #[must_use]
    pub const fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration_ms)
    }

    /// Returns the outcome of the step with the given `index`.
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.index == index)
    }

    /// Returns the invocation of the `hook` around the given `step`, or
    /// around the whole attempt if `step` is [`None`].
    #[must_use]
    pub fn hook(&self, hook: HookId, step: Option<usize>) -> Option<&HookInstance> {
        let scope = match step {
            Some(step) => HookScope::Step { attempt: self.attempt, step },
            None => HookScope::Attempt { attempt: self.attempt },
        };
        self.hooks.iter().find(|h| h.hook == hook && h.scope == scope)
    }

    /// Verdict of the host on this attempt, or the one implied by its
    /// status.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        self.verdict.unwrap_or_else(|| Verdict::from_status(self.status))
    }
}

/// Single generated test, across all its attempts.
#[derive(Clone, Debug, PartialEq)]
pub struct TestCase {
    pub identity: TestIdentity,

    /// Pickle this test was generated from.
    pub bdd: BddData,

    /// Attempts, ordered by their ordinal.
    pub runs: Vec<TestCaseRun>,
}

impl TestCase {
    /// Returns the last attempt.
    #[must_use]
    pub fn last_run(&self) -> Option<&TestCaseRun> {
        self.runs.last()
    }

    /// Final verdict: the host's verdict on the last attempt.
    #[must_use]
    pub fn verdict(&self) -> Option<Verdict> {
        self.last_run().map(TestCaseRun::verdict)
    }

    /// Indicates whether the attempt at `index` in [`TestCase::runs`] was
    /// followed by another one.
    #[must_use]
    pub fn will_be_retried(&self, index: usize) -> bool {
        index + 1 < self.runs.len()
    }

    /// Returns the distinct `(hook, step)` pairs of the given `kind` observed
    /// in any attempt.
    pub fn observed_hooks(
        &self,
        kind: HookKind,
    ) -> impl Iterator<Item = (HookId, Option<usize>)> + '_ {
        let mut seen = Vec::new();
        self.runs
            .iter()
            .flat_map(|r| &r.hooks)
            .filter(move |h| h.kind == kind)
            .filter_map(move |h| {
                let step = match h.scope {
                    HookScope::Step { step, .. } => Some(step),
                    HookScope::Attempt { .. } | HookScope::Global { .. } => None,
                };
                (!seen.contains(&(h.hook, step))).then(|| {
                    seen.push((h.hook, step));
                    (h.hook, step)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(id: usize, kind: HookKind, scope: HookScope) -> HookInstance {
        HookInstance {
            hook: HookId(id),
            kind,
            scope,
            status: TestStatus::Passed,
            start_time: 0,
            duration_ms: 1,
            error: None,
        }
    }

    fn run(attempt: usize, status: TestStatus, hooks: Vec<HookInstance>) -> TestCaseRun {
        TestCaseRun {
            attempt,
            worker: 0,
            status,
            verdict: None,
            start_time: 100,
            duration_ms: 5,
            steps: vec![],
            hooks,
        }
    }

    #[test]
    fn finds_hooks_by_scope() {
        let r = run(
            1,
            TestStatus::Passed,
            vec![
                hook(0, HookKind::Before, HookScope::Attempt { attempt: 1 }),
                hook(1, HookKind::AfterStep, HookScope::Step { attempt: 1, step: 2 }),
            ],
        );

        assert!(r.hook(HookId(0), None).is_some());
        assert!(r.hook(HookId(1), Some(2)).is_some());
        assert!(r.hook(HookId(1), Some(1)).is_none());
        assert_eq!(r.end_time(), 105);
    }

    #[test]
    fn verdict_follows_last_run() {
        let case = TestCase {
            identity: TestIdentity {
                project: String::new(),
                file: "a.feature.rs".into(),
                line: 1,
                title_path: vec![],
            },
            bdd: BddData { uri: "a.feature".into(), pickle_line: 2 },
            runs: vec![
                run(0, TestStatus::Failed, vec![]),
                run(1, TestStatus::Passed, vec![]),
            ],
        };

        assert_eq!(case.verdict(), Some(Verdict::Expected));
        assert!(case.will_be_retried(0));
        assert!(!case.will_be_retried(1));
    }

    #[test]
    fn observed_hooks_are_distinct() {
        let case = TestCase {
            identity: TestIdentity {
                project: String::new(),
                file: "a.feature.rs".into(),
                line: 1,
                title_path: vec![],
            },
            bdd: BddData { uri: "a.feature".into(), pickle_line: 2 },
            runs: vec![
                run(0, TestStatus::Failed, vec![
                    hook(3, HookKind::Before, HookScope::Attempt { attempt: 0 }),
                ]),
                run(1, TestStatus::Passed, vec![
                    hook(3, HookKind::Before, HookScope::Attempt { attempt: 1 }),
                    hook(4, HookKind::After, HookScope::Attempt { attempt: 1 }),
                ]),
            ],
        };

        let before = case.observed_hooks(HookKind::Before).collect::<Vec<_>>();
        assert_eq!(before, [(HookId(3), None)]);
    }
}
