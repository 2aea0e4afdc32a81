// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`GenerationSummary`] of a generation pass.

use std::{fmt, path::PathBuf, time::Duration};

/// Outcome of a successful generation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationSummary {
    /// Written files, in [`Document`] order.
    ///
    /// [`Document`]: crate::document::Document
    pub files: Vec<PathBuf>,

    /// Number of generated tests.
    pub units: usize,

    /// Number of pickles excluded by the tag filter.
    pub excluded: usize,

    /// Number of generated tests skipped by the host framework.
    pub ignored: usize,

    /// Number of previously generated files removed.
    pub removed: usize,

    /// Time the pass took.
    pub elapsed: Duration,
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} test{} in {} file{}",
            self.units,
            if self.units == 1 { "" } else { "s" },
            self.files.len(),
            if self.files.len() == 1 { "" } else { "s" },
        )?;
        if self.ignored > 0 {
            write!(f, ", {} ignored", self.ignored)?;
        }
        if self.excluded > 0 {
            write!(f, ", {} excluded by tags", self.excluded)?;
        }
        if self.removed > 0 {
            write!(f, ", {} stale removed", self.removed)?;
        }
        let elapsed = Duration::from_millis(
            u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
        );
        write!(f, " ({})", humantime::format_duration(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_counts() {
        let s = GenerationSummary {
            files: vec!["a.feature.rs".into()],
            units: 3,
            excluded: 2,
            ignored: 0,
            removed: 1,
            elapsed: Duration::from_millis(1500),
        };

        assert_eq!(
            s.to_string(),
            "3 tests in 1 file, 2 excluded by tags, 1 stale removed (1s 500ms)",
        );
    }
}
