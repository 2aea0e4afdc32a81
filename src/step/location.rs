// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Location tracking for step and hook definitions.

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

/// Location of a step or hook body in the source code of the steps crate.
#[derive(
    Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file where the body is located.
    pub path: String,

    /// Line of the file where the body is located.
    pub line: u32,

    /// Column of the file where the body is located.
    #[serde(default = "first_column")]
    pub column: u32,
}

/// Columns are 1-based, like lines.
const fn first_column() -> u32 {
    1
}

impl Location {
    /// Creates a new [`Location`] with the given path, line, and column.
    #[must_use]
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self { path: path.into(), line, column }
    }

    /// Returns the file name from the path.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_path_line_and_column() {
        let loc = Location::new("src/steps.rs", 42, 5);

        assert_eq!(loc.to_string(), "src/steps.rs:42:5");
    }

    #[test]
    fn filename_handles_both_separators() {
        assert_eq!(Location::new("src/steps/cart.rs", 1, 1).filename(), "cart.rs");
        assert_eq!(Location::new(r"src\steps\cart.rs", 1, 1).filename(), "cart.rs");
        assert_eq!(Location::new("cart.rs", 1, 1).filename(), "cart.rs");
    }

    #[test]
    fn column_defaults_to_first() {
        let loc: Location =
            serde_json::from_str(r#"{"path": "src/steps.rs", "line": 7}"#)
                .unwrap();

        assert_eq!(loc, Location::new("src/steps.rs", 7, 1));
    }
}
