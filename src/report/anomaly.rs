// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Non-fatal defects found while building a report.

use derive_more::with_trait::Display;

use super::{event::TestIdentity, test_case::HookScope};
use crate::hook::HookId;

/// Defect in the execution records.
///
/// Never aborts a report: the offending data is left out, and the rest of the
/// report is built as usual.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Anomaly {
    /// Test was attempted, but carries no data locating its pickle.
    #[display("test `{_0}` was attempted, but carries no feature data")]
    UnknownTest(TestIdentity),

    /// Same attempt of a test was reported more than once.
    #[display("test `{identity}` reported attempt {attempt} more than once")]
    DuplicateAttempt { identity: TestIdentity, attempt: usize },

    /// Same hook was reported twice in the same scope.
    #[display("hook {hook} reported twice for {scope}")]
    HookCollision { hook: HookId, scope: HookScope },

    /// Step hook was reported without the step it ran around.
    #[display("step hook {hook} of test `{identity}` has no step index")]
    UnscopedStepHook { identity: TestIdentity, hook: HookId },

    /// No pickle exists at the location a test claims to be generated from.
    #[display("no pickle at `{uri}:{line}`")]
    UnknownPickle { uri: String, line: usize },

    /// Step outcome points outside of its pickle.
    #[display("test `{identity}` reports step {index}, but its pickle has {count} steps")]
    UnknownStep { identity: TestIdentity, index: usize, count: usize },

    /// Hook outcome refers to a hook that is not registered.
    #[display("hook {hook} is not registered")]
    UnknownHook { hook: HookId },

    /// Record cannot be parsed.
    #[display("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

impl Anomaly {
    /// Logs this [`Anomaly`] and appends it to the given list.
    pub(crate) fn record(self, into: &mut Vec<Self>) {
        tracing::warn!(anomaly = %self, "report anomaly");
        into.push(self);
    }
}
