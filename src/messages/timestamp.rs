// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Protocol-native time representations.

use serde::Serialize;

/// Point in time, relative to the Unix epoch.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl Timestamp {
    /// Converts milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self { seconds: ms / 1000, nanos: nanos(ms) }
    }
}

/// Span of time.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Duration {
    pub seconds: u64,
    pub nanos: u32,
}

impl Duration {
    /// Converts milliseconds.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self { seconds: ms / 1000, nanos: nanos(ms) }
    }
}

#[allow(clippy::cast_possible_truncation)] // always below 1e9
const fn nanos(ms: u64) -> u32 {
    (ms % 1000) as u32 * 1_000_000
}
