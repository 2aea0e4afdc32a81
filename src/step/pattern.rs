// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definition patterns.

use derive_more::with_trait::Display;
use regex::Regex;
use serde::Serialize;

use super::{argument::Argument, expression::Expression, regex::HashableRegex};
use crate::error::{ConfigError, ConfigResult};

/// Syntax a [`Pattern`] is written in.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    /// [Cucumber Expression][1].
    ///
    /// [1]: https://github.com/cucumber/cucumber-expressions#readme
    #[display("CUCUMBER_EXPRESSION")]
    CucumberExpression,

    /// Regular expression.
    #[display("REGULAR_EXPRESSION")]
    RegularExpression,
}

/// Pattern of a step definition, matched against the whole text of a step.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub enum Pattern {
    /// Cucumber Expression pattern.
    Expression(Expression),

    /// Regular expression pattern, used as written.
    Regex(HashableRegex),
}

impl Pattern {
    /// Creates a [`Pattern`] out of a Cucumber Expression `source`.
    ///
    /// # Errors
    ///
    /// If `source` is not a valid Cucumber Expression.
    pub fn expression(source: &str) -> ConfigResult<Self> {
        Expression::parse(source).map(Self::Expression)
    }

    /// Creates a [`Pattern`] out of a regular expression `source`.
    ///
    /// # Errors
    ///
    /// If `source` is not a valid regular expression.
    pub fn regex(source: &str) -> ConfigResult<Self> {
        Regex::new(source)
            .map(|re| Self::Regex(re.into()))
            .map_err(|e| ConfigError::invalid_pattern(source, e))
    }

    /// Returns the source of this [`Pattern`], as it was written.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Expression(e) => e.source(),
            Self::Regex(re) => re.as_str(),
        }
    }

    /// Returns the [`PatternKind`] of this [`Pattern`].
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        match self {
            Self::Expression(_) => PatternKind::CucumberExpression,
            Self::Regex(_) => PatternKind::RegularExpression,
        }
    }

    /// Matches the given step `text`, returning the extracted [`Argument`]s.
    ///
    /// A regular expression must match the whole `text` unless it is anchored
    /// explicitly. Every participating capture group becomes an [`Argument`].
    #[must_use]
    pub fn matches(&self, text: &str) -> Option<Vec<Argument>> {
        match self {
            Self::Expression(e) => e.matches(text),
            Self::Regex(re) => {
                let caps = re.captures(text)?;
                let whole = caps.get(0)?;
                if whole.start() != 0 || whole.end() != text.len() {
                    return None;
                }
                Some(
                    caps.iter()
                        .skip(1)
                        .flatten()
                        .map(|m| Argument::text(m.start(), m.as_str()))
                        .collect(),
                )
            }
        }
    }
}
