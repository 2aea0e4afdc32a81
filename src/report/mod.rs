// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Aggregation of the host's execution records.
//!
//! Aggregation is done in two phases: records are appended to an
//! [`EventLog`] in any order (possibly through many [`EventSink`]s), and only
//! then [`aggregate()`]d into a frozen [`Aggregation`].

pub mod aggregator;
pub mod anomaly;
pub mod event;
pub mod log;
pub mod test_case;

#[doc(inline)]
pub use self::{
    aggregator::{aggregate, Aggregation},
    anomaly::Anomaly,
    event::{
        BddData, ExecutionEvent, HookOutcome, HostRecord, RunEnd, RunStatus,
        StepOutcome, TestIdentity, TestStatus, Verdict,
    },
    log::{EventLog, EventReceiver, EventSink},
    test_case::{HookInstance, HookScope, TestCase, TestCaseRun},
};
