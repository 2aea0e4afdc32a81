// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of resolving pickle steps against step definitions.
//!
//! Resolution errors are never reported one by one: the generator collects
//! them over the whole pickle set and fails once with [`ResolutionErrors`].

use std::fmt;

use derive_more::with_trait::{Display, Error};

use crate::step::AmbiguousMatchError;

/// Pickle step matching no step definition.
#[derive(Clone, Debug, Display, Error)]
#[display("{uri}:{line}: undefined step `{keyword} {text}`")]
pub struct UndefinedStep {
    /// URI of the feature document.
    #[error(not(source))]
    pub uri: String,

    /// Line of the step in the feature document.
    pub line: usize,

    /// Keyword of the step, as written.
    #[error(not(source))]
    pub keyword: String,

    /// Text of the step.
    #[error(not(source))]
    pub text: String,
}

/// Pickle step matching several step definitions at once.
#[derive(Clone, Debug, Display, Error)]
#[display("{uri}:{line}: ambiguous step `{keyword} {text}`. {matches}")]
pub struct AmbiguousStep {
    /// URI of the feature document.
    #[error(not(source))]
    pub uri: String,

    /// Line of the step in the feature document.
    pub line: usize,

    /// Keyword of the step, as written.
    #[error(not(source))]
    pub keyword: String,

    /// Text of the step.
    #[error(not(source))]
    pub text: String,

    /// All the conflicting step definitions.
    #[error(not(source))]
    pub matches: AmbiguousMatchError,
}

/// Pickle step whose `{int}` or `{float}` argument cannot be represented as
/// a number of its parameter type.
#[derive(Clone, Debug, Display, Error)]
#[display(
    "{uri}:{line}: step `{keyword} {text}` captures `{argument}`, which is \
     not a valid `{{{parameter_type}}}`"
)]
pub struct UnrepresentableArgument {
    /// URI of the feature document.
    #[error(not(source))]
    pub uri: String,

    /// Line of the step in the feature document.
    pub line: usize,

    /// Keyword of the step, as written.
    #[error(not(source))]
    pub keyword: String,

    /// Text of the step.
    #[error(not(source))]
    pub text: String,

    /// Captured argument, as written.
    #[error(not(source))]
    pub argument: String,

    /// Name of the parameter type that captured the argument.
    #[error(not(source))]
    pub parameter_type: &'static str,
}

/// Single resolution failure.
#[derive(Clone, Debug, Display, Error)]
pub enum ResolutionError {
    /// See [`UndefinedStep`].
    Undefined(UndefinedStep),

    /// See [`AmbiguousStep`].
    Ambiguous(AmbiguousStep),

    /// See [`UnrepresentableArgument`].
    Unrepresentable(UnrepresentableArgument),
}

impl ResolutionError {
    /// URI of the feature document this error refers to.
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Undefined(e) => &e.uri,
            Self::Ambiguous(e) => &e.uri,
            Self::Unrepresentable(e) => &e.uri,
        }
    }

    /// Line of the offending step.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Undefined(e) => e.line,
            Self::Ambiguous(e) => e.line,
            Self::Unrepresentable(e) => e.line,
        }
    }
}

/// Every [`ResolutionError`] found during one generation pass.
#[derive(Clone, Debug, Default, Error)]
pub struct ResolutionErrors {
    /// Collected errors, in document and step order.
    #[error(not(source))]
    pub errors: Vec<ResolutionError>,

    /// Number of test units that were assembled.
    pub units: usize,

    /// Number of test units excluded by the tag filter.
    pub excluded: usize,
}

impl ResolutionErrors {
    /// Number of undefined steps.
    #[must_use]
    pub fn undefined_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, ResolutionError::Undefined(_)))
            .count()
    }

    /// Number of ambiguous steps.
    #[must_use]
    pub fn ambiguous_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, ResolutionError::Ambiguous(_)))
            .count()
    }

    /// Number of step arguments not representable by their parameter type.
    #[must_use]
    pub fn unrepresentable_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, ResolutionError::Unrepresentable(_)))
            .count()
    }

    /// Indicates whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ResolutionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} undefined and {} ambiguous step(s)",
            self.undefined_count(),
            self.ambiguous_count(),
        )?;
        let unrepresentable = self.unrepresentable_count();
        if unrepresentable > 0 {
            write!(f, ", {unrepresentable} unrepresentable argument(s)")?;
        }
        write!(f, " in {} test(s):", self.units)?;
        for e in &self.errors {
            write!(f, "\n  {e}")?;
        }
        Ok(())
    }
}
