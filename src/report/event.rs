// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution records emitted by the host test framework.
//!
//! Records are read as NDJSON, one [`HostRecord`] per line, tagged by its
//! `"type"`:
//! ```json
//! {"type": "testEnd", "file": "tests/cart.feature.rs", "line": 12,
//!  "titlePath": ["Cart", "adding"], "attempt": 0, "status": "passed",
//!  "startTime": 1700000000000, "durationMs": 20,
//!  "bdd": {"uri": "features/cart.feature", "pickleLine": 3}}
//! {"type": "runEnd", "status": "passed"}
//! ```

use derive_more::with_trait::Display;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use crate::hook::{HookId, HookKind};

/// Status of an executed test, step or hook.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    #[display("passed")]
    Passed,
    #[display("failed")]
    Failed,
    #[display("timedOut")]
    TimedOut,
    #[display("skipped")]
    Skipped,
    #[display("interrupted")]
    Interrupted,
}

/// Verdict of the host on a whole test, after its retry policy applied.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    #[display("expected")]
    Expected,
    #[display("unexpected")]
    Unexpected,
    #[display("flaky")]
    Flaky,
    #[display("skipped")]
    Skipped,
}

impl Verdict {
    /// Indicates whether the host accepts a test with this [`Verdict`].
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Expected | Self::Flaky | Self::Skipped)
    }

    /// Verdict the host would give to a test ended with the given `status`,
    /// used when the host supplies none.
    #[must_use]
    pub const fn from_status(status: TestStatus) -> Self {
        match status {
            TestStatus::Passed => Self::Expected,
            TestStatus::Skipped => Self::Skipped,
            TestStatus::Failed
            | TestStatus::TimedOut
            | TestStatus::Interrupted => Self::Unexpected,
        }
    }
}

/// Location of the pickle a generated test was generated from.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BddData {
    /// URI of the `.feature` file.
    pub uri: String,

    /// Line of the pickle in the `.feature` file.
    pub pickle_line: usize,
}

/// Outcome of a single pickle step within one attempt.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Index of the step in its pickle.
    pub index: usize,
    pub status: TestStatus,

    /// Milliseconds since the Unix epoch.
    pub start_time: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a single hook invocation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutcome {
    pub hook: HookId,
    pub kind: HookKind,

    /// Index of the pickle step a step hook ran around.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    pub status: TestStatus,

    /// Milliseconds since the Unix epoch.
    pub start_time: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Completion of one attempt of one test.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEvent {
    /// Host project the test ran in.
    #[serde(default)]
    pub project: String,

    /// Generated test file.
    pub file: String,

    /// Line of the test in [`ExecutionEvent::file`].
    pub line: usize,

    /// Titles of the test and its enclosing groups, outermost first.
    #[serde(default)]
    pub title_path: Vec<String>,

    /// Index of the worker the attempt ran on.
    #[serde(default)]
    pub worker: usize,

    /// Ordinal of the attempt, starting from `0`.
    #[serde(default)]
    pub attempt: usize,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,

    /// Milliseconds since the Unix epoch.
    pub start_time: u64,
    #[serde(default)]
    pub duration_ms: u64,

    /// Absent if the test never reached the generated code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bdd: Option<BddData>,
    #[serde(default)]
    pub steps: Vec<StepOutcome>,
    #[serde(default)]
    pub hooks: Vec<HookOutcome>,

    /// Free-form annotations. May change between attempts.
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl ExecutionEvent {
    /// Returns the [`TestIdentity`] of the test this attempt belongs to.
    #[must_use]
    pub fn identity(&self) -> TestIdentity {
        TestIdentity {
            project: self.project.clone(),
            file: self.file.clone(),
            line: self.line,
            title_path: self.title_path.clone(),
        }
    }

    /// Milliseconds since the Unix epoch this attempt ended at.
    #[must_use]
    pub const fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration_ms)
    }

    /// Indicates whether the host skipped this test before running anything.
    #[must_use]
    pub fn is_pre_skipped(&self) -> bool {
        self.status == TestStatus::Skipped && self.bdd.is_none()
    }
}

/// Identity of a test across all its attempts.
///
/// Built only out of the properties a retry never changes.
#[derive(
    Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TestIdentity {
    pub project: String,
    pub file: String,
    pub line: usize,
    pub title_path: Vec<String>,
}

impl std::fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.project.is_empty() {
            write!(f, "[{}] ", self.project)?;
        }
        write!(f, "{}:{}", self.file, self.line)?;
        if !self.title_path.is_empty() {
            write!(f, " {}", self.title_path.iter().join(" > "))?;
        }
        Ok(())
    }
}

/// Overall outcome of a host run.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    #[display("passed")]
    Passed,
    #[display("failed")]
    Failed,
    #[display("timedOut")]
    TimedOut,
    #[display("interrupted")]
    Interrupted,
}

/// End of a host run.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEnd {
    /// Milliseconds since the Unix epoch the run started at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Aggregate verdict of the host, after its retry policy applied.
    pub status: RunStatus,
}

/// Single record of the host's NDJSON output.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostRecord {
    TestEnd(ExecutionEvent),
    RunEnd(RunEnd),
}

impl From<ExecutionEvent> for HostRecord {
    fn from(ev: ExecutionEvent) -> Self {
        Self::TestEnd(ev)
    }
}

impl From<RunEnd> for HostRecord {
    fn from(end: RunEnd) -> Self {
        Self::RunEnd(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_test_end() {
        let rec: HostRecord = serde_json::from_str(
            r#"{"type": "testEnd", "file": "a.feature.rs", "line": 3,
                "status": "timedOut", "startTime": 10}"#,
        )
        .unwrap();

        let HostRecord::TestEnd(ev) = rec else {
            panic!("expected `testEnd`");
        };
        assert_eq!(ev.status, TestStatus::TimedOut);
        assert_eq!(ev.attempt, 0);
        assert!(ev.bdd.is_none());
        assert_eq!(ev.end_time(), 10);
    }

    #[test]
    fn parses_run_end() {
        let rec: HostRecord =
            serde_json::from_str(r#"{"type": "runEnd", "status": "failed"}"#)
                .unwrap();

        assert_eq!(
            rec,
            HostRecord::RunEnd(RunEnd {
                start_time: None,
                duration_ms: None,
                status: RunStatus::Failed,
            }),
        );
    }

    #[test]
    fn identity_ignores_per_attempt_data() {
        let ev = |attempt, annotation: &str| ExecutionEvent {
            project: "p".into(),
            file: "a.feature.rs".into(),
            line: 3,
            title_path: vec!["F".into(), "S".into()],
            worker: attempt,
            attempt,
            status: TestStatus::Passed,
            verdict: None,
            start_time: 0,
            duration_ms: 0,
            bdd: None,
            steps: vec![],
            hooks: vec![],
            annotations: vec![annotation.into()],
        };

        assert_eq!(ev(0, "slow").identity(), ev(1, "retry").identity());
        assert_eq!(ev(0, "").identity().to_string(), "[p] a.feature.rs:3 F > S");
    }

    #[test]
    fn verdicts() {
        assert!(Verdict::Flaky.is_accepted());
        assert!(!Verdict::Unexpected.is_accepted());
        assert_eq!(
            Verdict::from_status(TestStatus::Interrupted),
            Verdict::Unexpected,
        );
    }
}
