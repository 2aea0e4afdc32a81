// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions.

use derive_more::with_trait::Display;
use gherkin::StepType;
use serde::{Deserialize, Serialize};

use super::{Location, Pattern};
use crate::tag::TagExpression;

/// Resolved keyword of a step, with `And`/`But` already replaced by the
/// keyword they continue.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum StepKeyword {
    /// [Given](https://cucumber.io/docs/gherkin/reference#given) step.
    #[serde(alias = "given")]
    Given,

    /// [When](https://cucumber.io/docs/gherkin/reference#when) step.
    #[serde(alias = "when")]
    When,

    /// [Then](https://cucumber.io/docs/gherkin/reference#then) step.
    #[serde(alias = "then")]
    Then,
}

impl From<StepType> for StepKeyword {
    fn from(ty: StepType) -> Self {
        match ty {
            StepType::Given => Self::Given,
            StepType::When => Self::When,
            StepType::Then => Self::Then,
        }
    }
}

/// Identifier of a [`Definition`] inside its [`Collection`], equal to its
/// registration index.
///
/// [`Collection`]: super::Collection
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq,
    PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct DefinitionId(pub usize);

/// Step definition: a [`Pattern`] bound to a body in the steps crate.
#[derive(Clone, Debug)]
pub struct Definition {
    /// ID of this [`Definition`].
    pub id: DefinitionId,

    /// Keyword this [`Definition`] is restricted to, if any.
    pub keyword: Option<StepKeyword>,

    /// [`Pattern`] to match steps against.
    pub pattern: Pattern,

    /// Path of the body function, called as `body(&mut world, args...)`.
    pub body: String,

    /// Tags a pickle must satisfy for this [`Definition`] to be considered.
    pub tags: Option<TagExpression>,

    /// [`Location`] of the body, if known.
    pub location: Option<Location>,
}

impl Definition {
    /// Indicates whether this [`Definition`] may be used for a step with the
    /// given `keyword`, inside a pickle carrying the given `tags`.
    #[must_use]
    pub fn applies_to<I, S>(&self, keyword: StepKeyword, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.keyword.map_or(true, |k| k == keyword)
            && self.tags.as_ref().map_or(true, |t| t.eval(tags))
    }
}
