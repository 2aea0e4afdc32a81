// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Ordered collection of step [`Definition`]s and step matching.

use super::{
    error::{AmbiguousMatchError, Candidate},
    Argument, Definition, DefinitionId, Location, Pattern, StepKeyword,
};
use crate::tag::TagExpression;

/// [`Definition`] successfully matched against a step's text.
#[derive(Clone, Debug)]
pub struct Match<'me> {
    /// Matched [`Definition`].
    pub definition: &'me Definition,

    /// [`Argument`]s extracted from the step's text.
    pub arguments: Vec<Argument>,
}

/// Collection of step [`Definition`]s, in registration order.
///
/// Every step has to match exactly 1 [`Definition`].
#[derive(Clone, Debug, Default)]
pub struct Collection {
    definitions: Vec<Definition>,
}

impl Collection {
    /// Creates a new empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a [Given] step definition.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[must_use]
    pub fn given(
        mut self,
        loc: Option<Location>,
        pattern: Pattern,
        body: impl Into<String>,
    ) -> Self {
        _ = self.push(Some(StepKeyword::Given), pattern, body, None, loc);
        self
    }

    /// Adds a [When] step definition.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[must_use]
    pub fn when(
        mut self,
        loc: Option<Location>,
        pattern: Pattern,
        body: impl Into<String>,
    ) -> Self {
        _ = self.push(Some(StepKeyword::When), pattern, body, None, loc);
        self
    }

    /// Adds a [Then] step definition.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[must_use]
    pub fn then(
        mut self,
        loc: Option<Location>,
        pattern: Pattern,
        body: impl Into<String>,
    ) -> Self {
        _ = self.push(Some(StepKeyword::Then), pattern, body, None, loc);
        self
    }

    /// Adds a step definition matching steps of any keyword.
    #[must_use]
    pub fn step(
        mut self,
        loc: Option<Location>,
        pattern: Pattern,
        body: impl Into<String>,
    ) -> Self {
        _ = self.push(None, pattern, body, None, loc);
        self
    }

    /// Registers a new [`Definition`], returning its [`DefinitionId`].
    pub fn push(
        &mut self,
        keyword: Option<StepKeyword>,
        pattern: Pattern,
        body: impl Into<String>,
        tags: Option<TagExpression>,
        location: Option<Location>,
    ) -> DefinitionId {
        let id = DefinitionId(self.definitions.len());
        self.definitions.push(Definition {
            id,
            keyword,
            pattern,
            body: body.into(),
            tags,
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
    pub fn get(&self, id: DefinitionId) -> Option<&Definition> {
        self.definitions.get(id.0)
    }

    /// Returns the number of registered [`Definition`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Indicates whether no [`Definition`]s are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns every [`Definition`] matching the step `text`, in registration
    /// order.
    pub fn matches<'me, I, S>(
        &'me self,
        keyword: StepKeyword,
        text: &str,
        tags: I,
    ) -> Vec<Match<'me>>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.definitions
            .iter()
            .filter(|d| d.applies_to(keyword, tags.clone()))
            .filter_map(|definition| {
                definition
                    .pattern
                    .matches(text)
                    .map(|arguments| Match { definition, arguments })
            })
            .collect()
    }

    /// Returns the [`Definition`] matching the given step, if any.
    ///
    /// # Errors
    ///
    /// If the step matches multiple [`Definition`]s.
    pub fn find<I, S>(
        &self,
        keyword: StepKeyword,
        text: &str,
        tags: I,
    ) -> Result<Option<Match<'_>>, AmbiguousMatchError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        let mut matches = self.matches(keyword, text, tags);

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(AmbiguousMatchError::new(
                matches
                    .into_iter()
                    .map(|m| Candidate {
                        id: m.definition.id,
                        pattern: m.definition.pattern.source().to_owned(),
                        location: m.definition.location.clone(),
                    })
                    .collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::ArgumentValue;

    const NO_TAGS: [&str; 0] = [];

    fn expr(s: &str) -> Pattern {
        Pattern::expression(s).unwrap()
    }

    #[test]
    fn finds_single_match_with_typed_arguments() {
        let steps = Collection::new()
            .given(None, expr("I have {int} cukes"), "steps::cukes")
            .when(None, expr("I eat {int}"), "steps::eat");

        let m = steps
            .find(StepKeyword::Given, "I have 5 cukes", NO_TAGS)
            .unwrap()
            .unwrap();

        assert_eq!(m.definition.body, "steps::cukes");
        assert_eq!(m.arguments[0].value, ArgumentValue::Int(5));
    }

    #[test]
    fn respects_keyword_restriction() {
        let steps = Collection::new().when(None, expr("I eat {int}"), "eat");

        assert!(steps.find(StepKeyword::Given, "I eat 3", NO_TAGS)
            .unwrap()
            .is_none());
        assert!(steps.find(StepKeyword::When, "I eat 3", NO_TAGS)
            .unwrap()
            .is_some());
    }

    #[test]
    fn reports_every_ambiguous_candidate() {
        let steps = Collection::new()
            .given(
                Some(Location::new("src/a.rs", 3, 1)),
                expr("I have {int} cukes"),
                "a",
            )
            .when(None, expr("I have {int} cukes"), "unrelated")
            .step(
                Some(Location::new("src/b.rs", 8, 1)),
                Pattern::regex(r"^I have (\d+) cukes$").unwrap(),
                "b",
            );

        let err = steps
            .find(StepKeyword::Given, "I have 5 cukes", NO_TAGS)
            .unwrap_err();

        assert_eq!(err.ids().collect::<Vec<_>>(), [DefinitionId(0), DefinitionId(2)]);
        let out = err.to_string();
        assert!(out.contains("src/a.rs:3:1"));
        assert!(out.contains("src/b.rs:8:1"));
    }

    #[test]
    fn tag_scoped_definitions_need_matching_tags() {
        let mut steps = Collection::new();
        _ = steps.push(
            None,
            expr("I log in"),
            "web::login",
            Some("@web".parse().unwrap()),
            None,
        );
        _ = steps.push(
            None,
            expr("I log in"),
            "api::login",
            Some("not @web".parse().unwrap()),
            None,
        );

        let web = steps
            .find(StepKeyword::When, "I log in", ["@web"])
            .unwrap()
            .unwrap();
        let api = steps
            .find(StepKeyword::When, "I log in", NO_TAGS)
            .unwrap()
            .unwrap();

        assert_eq!(web.definition.body, "web::login");
        assert_eq!(api.definition.body, "api::login");
    }

    #[test]
    fn ids_follow_registration_order() {
        let steps = Collection::new()
            .given(None, expr("a"), "a")
            .then(None, expr("b"), "b");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps.get(DefinitionId(1)).unwrap().body, "b");
        assert!(steps.get(DefinitionId(2)).is_none());
    }
}
