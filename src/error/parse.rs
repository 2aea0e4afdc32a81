// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of parsing `.feature` files.

use std::{fmt, path::PathBuf};

use derive_more::with_trait::{Display, Error};

/// Failure to read or parse a single `.feature` file.
#[derive(Clone, Debug, Display, Error)]
#[display("{}: {message}", path.display())]
pub struct ParseError {
    /// Path to the `.feature` file.
    #[error(not(source))]
    pub path: PathBuf,

    /// Parser message, including the position reported by the parser.
    #[error(not(source))]
    pub message: String,
}

impl ParseError {
    /// Creates a new [`ParseError`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self { path: path.into(), message: message.to_string() }
    }
}

/// All the [`ParseError`]s collected during a single load.
#[derive(Clone, Debug, Default, Error)]
pub struct ParseErrors(#[error(not(source))] pub Vec<ParseError>);

impl ParseErrors {
    /// Indicates whether no errors were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to parse {} feature file(s):", self.0.len())?;
        for e in &self.0 {
            write!(f, "\n  {e}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_file() {
        let errs = ParseErrors(vec![
            ParseError::new("features/a.feature", "error at 3:1"),
            ParseError::new("features/b.feature", "error at 7:5"),
        ]);

        assert_eq!(errs.len(), 2);
        assert_eq!(
            errs.to_string(),
            "Failed to parse 2 feature file(s):\
             \n  features/a.feature: error at 3:1\
             \n  features/b.feature: error at 7:5",
        );
    }
}
