// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error of a pickle step matching several step definitions.

use std::fmt;

use derive_more::with_trait::Error;

use super::{DefinitionId, Location};

/// Step definition a pickle step happened to match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// ID of the matched definition.
    pub id: DefinitionId,

    /// Source of the definition's pattern.
    pub pattern: String,

    /// Location of the definition's body, if known.
    pub location: Option<Location>,
}

/// Error of a [`PickleStep`] matching multiple [`Definition`]s inside a
/// [`Collection`].
///
/// [`Collection`]: super::Collection
/// [`Definition`]: super::Definition
/// [`PickleStep`]: crate::pickle::PickleStep
#[derive(Clone, Debug, Error)]
pub struct AmbiguousMatchError {
    /// Every [`Definition`] the step matches, in registration order.
    ///
    /// [`Definition`]: super::Definition
    #[error(not(source))]
    pub possible_matches: Vec<Candidate>,
}

impl AmbiguousMatchError {
    /// Creates a new [`AmbiguousMatchError`] with the given possible matches.
    #[must_use]
    pub const fn new(possible_matches: Vec<Candidate>) -> Self {
        Self { possible_matches }
    }

    /// Returns the number of possible matches.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.possible_matches.len()
    }

    /// Returns an iterator over the IDs of the matching definitions.
    pub fn ids(&self) -> impl Iterator<Item = DefinitionId> + '_ {
        self.possible_matches.iter().map(|c| c.id)
    }
}

impl fmt::Display for AmbiguousMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Possible matches:")?;
        for c in &self.possible_matches {
            write!(f, "\n    {}", c.pattern)?;
            if let Some(loc) = &c.location {
                write!(f, " --> {loc}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                id: DefinitionId(0),
                pattern: "I have {int} cukes".into(),
                location: Some(Location::new("src/steps.rs", 10, 5)),
            },
            Candidate {
                id: DefinitionId(3),
                pattern: r"^I have (\d+) cukes$".into(),
                location: None,
            },
        ]
    }

    #[test]
    fn lists_every_candidate() {
        let err = AmbiguousMatchError::new(candidates());
        let out = err.to_string();

        assert_eq!(err.match_count(), 2);
        assert!(out.starts_with("Possible matches:"));
        assert!(out.contains("I have {int} cukes --> src/steps.rs:10:5"));
        assert!(out.contains(r"^I have (\d+) cukes$"));
    }

    #[test]
    fn yields_ids_in_order() {
        let err = AmbiguousMatchError::new(candidates());

        assert_eq!(
            err.ids().collect::<Vec<_>>(),
            [DefinitionId(0), DefinitionId(3)],
        );
    }
}
