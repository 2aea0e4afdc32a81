// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`TestUnit`]s: pickles with their steps resolved against definitions.

use crate::{
    error::{
        AmbiguousStep, ResolutionError, UndefinedStep, UnrepresentableArgument,
    },
    hook::{self, HookKind},
    pickle::{Pickle, PickleStep},
    step::{AmbiguousMatchError, Argument, Match},
};

/// Outcome of resolving a single [`PickleStep`].
#[derive(Clone, Debug)]
pub enum Resolution<'a> {
    /// Exactly one definition matched.
    Bound(Match<'a>),

    /// No definition matched.
    Undefined,

    /// Several definitions matched.
    Ambiguous(AmbiguousMatchError),
}

/// [`PickleStep`] along with its [`Resolution`].
#[derive(Clone, Debug)]
pub struct ResolvedStep<'a> {
    /// Resolved step.
    pub step: &'a PickleStep,

    /// How the step resolved.
    pub resolution: Resolution<'a>,
}

/// Hooks applying to a [`TestUnit`], grouped by kind and ordered for
/// execution.
#[derive(Clone, Debug, Default)]
pub struct AppliedHooks<'a> {
    pub before_all: Vec<&'a hook::Definition>,
    pub after_all: Vec<&'a hook::Definition>,
    pub before: Vec<&'a hook::Definition>,
    pub after: Vec<&'a hook::Definition>,
    pub before_step: Vec<&'a hook::Definition>,
    pub after_step: Vec<&'a hook::Definition>,
}

impl<'a> AppliedHooks<'a> {
    /// Returns the hooks of the given `kind`.
    #[must_use]
    pub fn of(&self, kind: HookKind) -> &[&'a hook::Definition] {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::AfterAll => &self.after_all,
            HookKind::Before => &self.before,
            HookKind::After => &self.after,
            HookKind::BeforeStep => &self.before_step,
            HookKind::AfterStep => &self.after_step,
        }
    }

    pub(crate) fn set(&mut self, kind: HookKind, hooks: Vec<&'a hook::Definition>) {
        *match kind {
            HookKind::BeforeAll => &mut self.before_all,
            HookKind::AfterAll => &mut self.after_all,
            HookKind::Before => &mut self.before,
            HookKind::After => &mut self.after,
            HookKind::BeforeStep => &mut self.before_step,
            HookKind::AfterStep => &mut self.after_step,
        } = hooks;
    }
}

/// Single generated test: a [`Pickle`] bound to definitions and hooks.
#[derive(Clone, Debug)]
pub struct TestUnit<'a> {
    /// [`Pickle`] this unit executes.
    pub pickle: &'a Pickle,

    /// Every step of the [`Pickle`], in order.
    pub steps: Vec<ResolvedStep<'a>>,

    /// Hooks applying to the [`Pickle`].
    pub hooks: AppliedHooks<'a>,

    /// Whether the test is generated but skipped by the host framework.
    pub ignored: bool,
}

impl TestUnit<'_> {
    /// Indicates whether every step is bound to exactly one definition, with
    /// representable arguments only.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.steps.iter().all(|s| match &s.resolution {
            Resolution::Bound(m) => {
                m.arguments.iter().all(Argument::is_representable)
            }
            Resolution::Undefined | Resolution::Ambiguous(_) => false,
        })
    }

    /// Returns a [`ResolutionError`] for every unresolved step, and for every
    /// bound step argument not representable by its parameter type.
    #[must_use]
    pub fn errors(&self) -> Vec<ResolutionError> {
        let uri = &self.pickle.uri;
        self.steps
            .iter()
            .flat_map(|s| {
                let (keyword, text, line) =
                    (&s.step.keyword, &s.step.text, s.step.line);
                match &s.resolution {
                    Resolution::Bound(m) => m
                        .arguments
                        .iter()
                        .filter(|a| !a.is_representable())
                        .map(|a| {
                            ResolutionError::Unrepresentable(
                                UnrepresentableArgument {
                                    uri: uri.clone(),
                                    line,
                                    keyword: keyword.clone(),
                                    text: text.clone(),
                                    argument: a.raw.clone(),
                                    parameter_type: a
                                        .parameter_type
                                        .unwrap_or_default(),
                                },
                            )
                        })
                        .collect(),
                    Resolution::Undefined => {
                        vec![ResolutionError::Undefined(UndefinedStep {
                            uri: uri.clone(),
                            line,
                            keyword: keyword.clone(),
                            text: text.clone(),
                        })]
                    }
                    Resolution::Ambiguous(matches) => {
                        vec![ResolutionError::Ambiguous(AmbiguousStep {
                            uri: uri.clone(),
                            line,
                            keyword: keyword.clone(),
                            text: text.clone(),
                            matches: matches.clone(),
                        })]
                    }
                }
            })
            .collect()
    }
}
