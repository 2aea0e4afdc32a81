// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Generator of unique message IDs.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Source of unique, monotonically increasing IDs.
///
/// Clones share the same counter, so every ID handed out by any clone is
/// unique among all of them. Starting from a fresh [`IdGenerator`] makes the
/// produced sequence deterministic.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator(Arc<AtomicU64>);

impl IdGenerator {
    /// Creates a new [`IdGenerator`] starting from `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unique ID.
    #[must_use]
    pub fn next_id(&self) -> String {
        self.0.fetch_add(1, Ordering::Relaxed).to_string()
    }
}
