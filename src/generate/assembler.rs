// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Assembly of [`TestUnit`]s out of [`Pickle`]s.

use super::unit::{AppliedHooks, Resolution, ResolvedStep, TestUnit};
use crate::{
    error::ResolutionErrors,
    hook::HookKind,
    pickle::{Pickle, PickleStep},
    registry::Registry,
    tag::TagExpression,
};

/// Tags marking a test to be generated, but skipped by the host framework.
pub const IGNORE_TAGS: [&str; 2] = ["@skip", "@fixme"];

/// Binds [`Pickle`]s to the step and hook definitions of a [`Registry`].
#[derive(Clone, Copy, Debug)]
pub struct Assembler<'a> {
    registry: &'a Registry,
    filter: Option<&'a TagExpression>,
}

/// [`TestUnit`]s of a whole pickle set.
#[derive(Clone, Debug, Default)]
pub struct Assembled<'a> {
    /// Units of the included pickles, in pickle order.
    pub units: Vec<TestUnit<'a>>,

    /// Number of pickles excluded by the tag filter.
    pub excluded: usize,
}

impl<'a> Assembler<'a> {
    /// Creates a new [`Assembler`] over the given [`Registry`], optionally
    /// restricted to the pickles matching the `filter`.
    #[must_use]
    pub const fn new(
        registry: &'a Registry,
        filter: Option<&'a TagExpression>,
    ) -> Self {
        Self { registry, filter }
    }

    /// Indicates whether the given [`Pickle`] passes the tag filter.
    #[must_use]
    pub fn is_included(&self, pickle: &Pickle) -> bool {
        self.filter.map_or(true, |f| f.eval(pickle.tag_names()))
    }

    /// Resolves a single [`PickleStep`] of the given [`Pickle`].
    #[must_use]
    pub fn resolve(
        &self,
        pickle: &Pickle,
        step: &'a PickleStep,
    ) -> ResolvedStep<'a> {
        let resolution = match self.registry.steps.find(
            step.resolved,
            &step.text,
            pickle.tag_names(),
        ) {
            Ok(Some(m)) => Resolution::Bound(m),
            Ok(None) => Resolution::Undefined,
            Err(e) => Resolution::Ambiguous(e),
        };
        ResolvedStep { step, resolution }
    }

    /// Assembles the [`TestUnit`] of the given [`Pickle`].
    ///
    /// Never fails: unresolved steps are kept in the unit, see
    /// [`TestUnit::errors()`].
    #[must_use]
    pub fn assemble(&self, pickle: &'a Pickle) -> TestUnit<'a> {
        let steps = pickle.steps.iter().map(|s| self.resolve(pickle, s)).collect();

        let mut hooks = AppliedHooks::default();
        for kind in HookKind::ALL {
            hooks.set(kind, self.registry.hooks.select(kind, pickle.tag_names()));
        }

        TestUnit {
            pickle,
            steps,
            hooks,
            ignored: IGNORE_TAGS.iter().any(|t| pickle.has_tag(t)),
        }
    }

    /// Assembles the [`TestUnit`]s of every included [`Pickle`].
    ///
    /// # Errors
    ///
    /// With every [`ResolutionError`] at once, if any step of an included
    /// [`Pickle`] is undefined or ambiguous. Excluded pickles never cause
    /// errors.
    ///
    /// [`ResolutionError`]: crate::error::ResolutionError
    pub fn assemble_all(
        &self,
        pickles: &'a [Pickle],
    ) -> Result<Assembled<'a>, ResolutionErrors> {
        let mut assembled = Assembled::default();
        for pickle in pickles {
            if self.is_included(pickle) {
                assembled.units.push(self.assemble(pickle));
            } else {
                tracing::trace!(pickle = %pickle.name, "excluded by tags");
                assembled.excluded += 1;
            }
        }

        let errors = assembled
            .units
            .iter()
            .flat_map(TestUnit::errors)
            .collect::<Vec<_>>();
        if !errors.is_empty() {
            return Err(ResolutionErrors {
                errors,
                units: assembled.units.len(),
                excluded: assembled.excluded,
            });
        }
        Ok(assembled)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        document::Document,
        error::ResolutionError,
        id::IdGenerator,
        pickle,
        step::{ArgumentValue, Pattern},
    };

    fn pickles(src: &str) -> Vec<Pickle> {
        let ids = IdGenerator::new();
        let feature =
            gherkin::Feature::parse(src, gherkin::GherkinEnv::default()).unwrap();
        let doc = Document::new(
            "features/cukes.feature".into(),
            PathBuf::from("features/cukes.feature"),
            src.into(),
            &feature,
            &ids,
        );
        pickle::compile(&doc, &ids).unwrap()
    }

    fn registry() -> Registry {
        Registry::new()
            .given(Pattern::expression("I have {int} cukes").unwrap(), "steps::have")
            .when(Pattern::expression("I eat {int}").unwrap(), "steps::eat")
            .then(Pattern::expression("I have {int} left").unwrap(), "steps::left")
            .hook(HookKind::Before, "hooks::before")
    }

    const CUKES: &str = "\
Feature: Cukes
  Scenario: eating
    Given I have 5 cukes
    When I eat 2
    Then I have 3 left

  @wip
  Scenario: undefined
    Given I have 5 cukes
    When I juggle them
";

    #[test]
    fn binds_steps_with_typed_arguments() {
        let registry = registry();
        let pickles = pickles(CUKES);
        let unit = Assembler::new(&registry, None).assemble(&pickles[0]);

        assert!(unit.is_resolved());
        let Resolution::Bound(m) = &unit.steps[0].resolution else {
            panic!("expected bound step");
        };
        assert_eq!(m.definition.body, "steps::have");
        assert_eq!(m.arguments[0].value, ArgumentValue::Int(5));
        assert_eq!(unit.hooks.of(HookKind::Before).len(), 1);
    }

    #[test]
    fn reports_undefined_step_location() {
        let registry = registry();
        let pickles = pickles(CUKES);

        let errs = Assembler::new(&registry, None)
            .assemble_all(&pickles)
            .unwrap_err();

        assert_eq!(errs.errors.len(), 1);
        let ResolutionError::Undefined(e) = &errs.errors[0] else {
            panic!("expected undefined step");
        };
        assert_eq!(e.uri, "features/cukes.feature");
        assert_eq!(e.line, 10);
        assert_eq!(e.text, "I juggle them");
    }

    #[test]
    fn rejects_numbers_overflowing_their_parameter_type() {
        let registry = registry();
        let pickles = pickles(
            "\
Feature: Cukes
  Scenario: greedy
    Given I have 99999999999999999999 cukes
    When I eat 2
",
        );

        let errs = Assembler::new(&registry, None)
            .assemble_all(&pickles)
            .unwrap_err();

        assert_eq!(errs.unrepresentable_count(), 1);
        let ResolutionError::Unrepresentable(e) = &errs.errors[0] else {
            panic!("expected unrepresentable argument");
        };
        assert_eq!(e.line, 3);
        assert_eq!(e.argument, "99999999999999999999");
        assert_eq!(e.parameter_type, "int");
    }

    #[test]
    fn excluded_pickles_never_fail() {
        let registry = registry();
        let pickles = pickles(CUKES);
        let filter = "not @wip".parse::<TagExpression>().unwrap();

        let assembled = Assembler::new(&registry, Some(&filter))
            .assemble_all(&pickles)
            .unwrap();

        assert_eq!(assembled.units.len(), 1);
        assert_eq!(assembled.excluded, 1);
    }

    #[test]
    fn ambiguous_step_lists_all_candidates() {
        let registry = registry()
            .step(Pattern::regex(r"^I eat (\d+)$").unwrap(), "steps::eat_re");
        let pickles = pickles(CUKES);

        let unit = Assembler::new(&registry, None).assemble(&pickles[0]);
        let Resolution::Ambiguous(e) = &unit.steps[1].resolution else {
            panic!("expected ambiguous step");
        };
        assert_eq!(e.match_count(), 2);
    }

    #[test]
    fn skip_tags_mark_unit_ignored() {
        let registry = registry();
        let pickles = pickles(
            "Feature: F\n  @skip\n  Scenario: s\n    Given I have 1 cukes\n",
        );

        assert!(Assembler::new(&registry, None).assemble(&pickles[0]).ignored);
    }
}
