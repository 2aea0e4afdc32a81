// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hook definitions and their selection.

use derive_more::with_trait::Display;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use crate::{step::Location, tag::TagExpression};

/// Kind of a hook, defining when it runs.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq,
    PartialOrd, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    /// Runs once per worker, before any test.
    #[display("BeforeAll")]
    BeforeAll,

    /// Runs once per worker, after all tests.
    #[display("AfterAll")]
    AfterAll,

    /// Runs before every test.
    #[display("Before")]
    Before,

    /// Runs after every test.
    #[display("After")]
    After,

    /// Runs before every step.
    #[display("BeforeStep")]
    BeforeStep,

    /// Runs after every step.
    #[display("AfterStep")]
    AfterStep,
}

impl HookKind {
    /// All the [`HookKind`]s, in their execution order around a test.
    pub const ALL: [Self; 6] = [
        Self::BeforeAll,
        Self::Before,
        Self::BeforeStep,
        Self::AfterStep,
        Self::After,
        Self::AfterAll,
    ];

    /// Indicates whether this hook runs once per worker rather than per test.
    #[must_use]
    pub const fn is_global(self) -> bool {
        matches!(self, Self::BeforeAll | Self::AfterAll)
    }

    /// Indicates whether this hook runs around every step.
    #[must_use]
    pub const fn is_step_scoped(self) -> bool {
        matches!(self, Self::BeforeStep | Self::AfterStep)
    }

    /// Name of this hook's type in the Cucumber Messages protocol.
    #[must_use]
    pub const fn message_type(self) -> &'static str {
        match self {
            Self::BeforeAll => "BEFORE_TEST_RUN",
            Self::AfterAll => "AFTER_TEST_RUN",
            Self::Before => "BEFORE_TEST_CASE",
            Self::After => "AFTER_TEST_CASE",
            Self::BeforeStep => "BEFORE_TEST_STEP",
            Self::AfterStep => "AFTER_TEST_STEP",
        }
    }
}

/// Identifier of a hook [`Definition`], equal to its registration index.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq,
    PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct HookId(pub usize);

/// Hook definition.
#[derive(Clone, Debug)]
pub struct Definition {
    /// ID of this [`Definition`].
    pub id: HookId,

    /// Kind of this hook.
    pub kind: HookKind,

    /// Optional human-readable name.
    pub name: Option<String>,

    /// Tags a pickle must satisfy for this hook to apply to it.
    pub tags: Option<TagExpression>,

    /// Ordering among hooks of the same kind. Lower runs first.
    pub order: i32,

    /// Path of the body function.
    pub body: String,

    /// [`Location`] of the body, if known.
    pub location: Option<Location>,
}

/// Ordered set of hook [`Definition`]s.
#[derive(Clone, Debug, Default)]
pub struct Hooks {
    definitions: Vec<Definition>,
}

impl Hooks {
    /// Creates a new empty set of [`Hooks`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new hook, returning its [`HookId`].
    pub fn push(
        &mut self,
        kind: HookKind,
        name: Option<String>,
        tags: Option<TagExpression>,
        order: i32,
        body: impl Into<String>,
        location: Option<Location>,
    ) -> HookId {
        let id = HookId(self.definitions.len());
        self.definitions.push(Definition {
            id,
            kind,
            name,
            tags,
            order,
            body: body.into(),
            location,
        });
        id
    }

    /// Returns all the [`Definition`]s, in registration order.
    #[must_use]
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Returns the [`Definition`] with the given `id`, if any.
    #[must_use]
    pub fn get(&self, id: HookId) -> Option<&Definition> {
        self.definitions.get(id.0)
    }

    /// Selects the hooks of the given `kind` applying to a pickle with the
    /// given `tags`, ordered by [`Definition::order`] and then by
    /// registration.
    pub fn select<I, S>(&self, kind: HookKind, tags: I) -> Vec<&Definition>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.definitions
            .iter()
            .filter(|h| h.kind == kind)
            .filter(|h| {
                h.tags.as_ref().map_or(true, |t| t.eval(tags.clone()))
            })
            .sorted_by_key(|h| (h.order, h.id))
            .collect()
    }

    /// Returns the key hooks of the same kind are executed in the order of.
    #[must_use]
    pub fn execution_key(&self, id: HookId) -> Option<(i32, HookId)> {
        self.get(id).map(|h| (h.order, h.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TAGS: [&str; 0] = [];

    #[test]
    fn selects_by_kind_and_orders_by_priority() {
        let mut hooks = Hooks::new();
        let late = hooks.push(HookKind::Before, None, None, 10, "late", None);
        let _ = hooks.push(HookKind::After, None, None, 0, "after", None);
        let early = hooks.push(HookKind::Before, None, None, -1, "early", None);
        let same = hooks.push(HookKind::Before, None, None, 10, "same", None);

        let ids = hooks
            .select(HookKind::Before, NO_TAGS)
            .into_iter()
            .map(|h| h.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, [early, late, same]);
    }

    #[test]
    fn tagged_hooks_apply_to_matching_pickles_only() {
        let mut hooks = Hooks::new();
        let _ = hooks.push(
            HookKind::Before,
            Some("db".into()),
            Some("@db".parse().unwrap()),
            0,
            "hooks::reset_db",
            None,
        );

        assert_eq!(hooks.select(HookKind::Before, ["@db"]).len(), 1);
        assert!(hooks.select(HookKind::Before, ["@ui"]).is_empty());
    }

    #[test]
    fn global_hooks_honor_tags() {
        let mut hooks = Hooks::new();
        let _ = hooks.push(
            HookKind::BeforeAll,
            None,
            Some("@db".parse().unwrap()),
            0,
            "hooks::start_db",
            None,
        );
        let _ = hooks.push(HookKind::BeforeAll, None, None, 0, "hooks::start", None);

        let untagged = hooks.select(HookKind::BeforeAll, NO_TAGS);
        assert_eq!(untagged.len(), 1);
        assert_eq!(untagged[0].body, "hooks::start");
        assert_eq!(hooks.select(HookKind::BeforeAll, ["@db"]).len(), 2);
    }

    #[test]
    fn kind_classification() {
        assert!(HookKind::BeforeAll.is_global());
        assert!(!HookKind::Before.is_global());
        assert!(HookKind::AfterStep.is_step_scoped());
        assert_eq!(HookKind::After.message_type(), "AFTER_TEST_CASE");
        assert_eq!(
            serde_json::from_str::<HookKind>(r#""beforeStep""#).unwrap(),
            HookKind::BeforeStep,
        );
    }
}
