// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Tag expressions][1] and their evaluation.
//!
//! [1]: https://cucumber.io/docs/cucumber/api#tag-expressions

use std::str::FromStr;

use derive_more::with_trait::Display;
use gherkin::tagexpr::TagOperation;
use sealed::sealed;

use crate::error::ConfigError;

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    ///
    /// Tags are compared without their leading `@`, so both `@smoke` and
    /// `smoke` satisfy an `@smoke` expression.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => {
                let t = bare(t);
                tags.into_iter().any(|tag| bare(tag.as_ref()) == t)
            }
        }
    }
}

/// Strips the leading `@` of a tag, if any.
fn bare(tag: &str) -> &str {
    tag.strip_prefix('@').unwrap_or(tag)
}

/// Parsed tag expression, remembering its source.
#[derive(Clone, Debug, Display)]
#[display("{source}")]
pub struct TagExpression {
    source: String,
    op: TagOperation,
}

impl TagExpression {
    /// Returns the tag expression as it was written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates this [`TagExpression`] for the given `tags`.
    #[must_use]
    pub fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.op.eval(tags)
    }
}

impl FromStr for TagExpression {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = s.trim();
        source
            .parse::<TagOperation>()
            .map(|op| Self { source: source.to_owned(), op })
            .map_err(|e| ConfigError::invalid_tag_expression(source, e))
    }
}

/// Parses an optional tag expression, treating a blank one as absent.
///
/// # Errors
///
/// If the expression is not blank and fails to parse.
pub fn parse_optional(
    expr: Option<&str>,
) -> Result<Option<TagExpression>, ConfigError> {
    expr.filter(|s| !s.trim().is_empty()).map(str::parse::<TagExpression>).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(s: &str) -> TagExpression {
        s.parse().unwrap()
    }

    #[test]
    fn evaluates_boolean_operators() {
        let e = expr("@smoke and not @slow");

        assert!(e.eval(["@smoke"]));
        assert!(!e.eval(["@smoke", "@slow"]));
        assert!(!e.eval(["@fast"]));

        let e = expr("@a or @b");
        assert!(e.eval(["@b"]));
        assert!(!e.eval(Vec::<String>::new()));
    }

    #[test]
    fn ignores_leading_at_sign() {
        let e = expr("@smoke");

        assert!(e.eval(["smoke"]));
        assert!(e.eval(["@smoke"]));
        assert!(!e.eval(["smoker"]));
    }

    #[test]
    fn keeps_source() {
        assert_eq!(expr("  @a and @b ").to_string(), "@a and @b");
    }

    #[test]
    fn rejects_malformed_expression() {
        let err = "@a and".parse::<TagExpression>().unwrap_err();

        assert!(err.is_invalid_tag_expression());
    }

    #[test]
    fn blank_expression_is_absent() {
        assert!(parse_optional(None).unwrap().is_none());
        assert!(parse_optional(Some("  ")).unwrap().is_none());
        assert!(parse_optional(Some("@a")).unwrap().is_some());
        assert!(parse_optional(Some("(")).is_err());
    }
}
