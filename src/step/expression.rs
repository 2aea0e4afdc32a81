// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Cucumber Expressions][1] typed on top of the [`cucumber_expressions`]
//! crate.
//!
//! Only the built-in `{int}`, `{float}`, `{word}`, `{string}` and anonymous
//! `{}` parameter types are recognized.
//!
//! [1]: https://github.com/cucumber/cucumber-expressions#readme

use cucumber_expressions::{Expression as Ast, SingleExpression};
use derive_more::with_trait::Display;
use regex::Regex;

use super::{
    argument::{unquote, Argument, ArgumentValue},
    regex::HashableRegex,
};
use crate::error::{ConfigError, ConfigResult};

/// Built-in parameter type of a Cucumber Expression.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ParameterType {
    /// `{int}`
    #[display("int")]
    Int,

    /// `{float}`
    #[display("float")]
    Float,

    /// `{word}`
    #[display("word")]
    Word,

    /// `{string}`
    #[display("string")]
    String,

    /// `{}`
    #[display("")]
    Anonymous,
}

impl ParameterType {
    /// Looks up a built-in [`ParameterType`] by its `name`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "word" => Self::Word,
            "string" => Self::String,
            "" => Self::Anonymous,
            _ => return None,
        })
    }

    /// Name of this [`ParameterType`] as written inside the braces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Word => "word",
            Self::String => "string",
            Self::Anonymous => "",
        }
    }

    /// Converts the `raw` text captured by this [`ParameterType`].
    ///
    /// Numbers overflowing an [`i64`], or not representable as a finite
    /// [`f64`], become [`ArgumentValue::Unrepresentable`].
    #[must_use]
    pub fn convert(self, raw: &str) -> ArgumentValue {
        let unrepresentable = || ArgumentValue::Unrepresentable(raw.to_owned());
        match self {
            Self::Int => raw
                .parse()
                .map_or_else(|_| unrepresentable(), ArgumentValue::Int),
            Self::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map_or_else(unrepresentable, ArgumentValue::Float),
            Self::String => ArgumentValue::String(unquote(raw)),
            Self::Word | Self::Anonymous => {
                ArgumentValue::Text(raw.to_owned())
            }
        }
    }
}

/// Compiled Cucumber Expression.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{source}")]
pub struct Expression {
    /// Expression as it was written.
    source: String,

    /// Anchored [`Regex`] the expression expands into.
    regex: HashableRegex,

    /// Parameters in the order of appearance.
    parameters: Vec<ParameterType>,

    /// Indices of the capturing groups of [`Expression::regex`] holding
    /// [`Expression::parameters`], one to one.
    groups: Vec<usize>,
}

impl Expression {
    /// Parses the given `source` and expands it into a [`Regex`].
    ///
    /// # Errors
    ///
    /// If `source` is not a valid Cucumber Expression, or uses an unknown
    /// parameter type.
    pub fn parse(source: &str) -> ConfigResult<Self> {
        let ast = Ast::parse(source)
            .map_err(|e| ConfigError::invalid_pattern(source, e))?;

        let parameters = ast
            .0
            .into_iter()
            .filter_map(|e| match e {
                SingleExpression::Parameter(par) => Some(**par),
                SingleExpression::Alternation(_)
                | SingleExpression::Optional(_)
                | SingleExpression::Text(_)
                | SingleExpression::Whitespaces(_) => None,
            })
            .map(|name| {
                ParameterType::from_name(name).ok_or_else(|| {
                    ConfigError::invalid_pattern(
                        source,
                        format!("unknown parameter type `{{{name}}}`"),
                    )
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        let regex = Ast::regex(source)
            .map_err(|e| ConfigError::invalid_pattern(source, e))?;

        // `{string}` additionally captures its unquoted content into named
        // groups, so only the unnamed ones are parameters.
        let groups = regex
            .capture_names()
            .enumerate()
            .skip(1)
            .filter_map(|(i, name)| name.is_none().then_some(i))
            .collect::<Vec<_>>();
        if groups.len() != parameters.len() {
            return Err(ConfigError::invalid_pattern(
                source,
                format!(
                    "expanded into {} capturing groups for {} parameters",
                    groups.len(),
                    parameters.len(),
                ),
            ));
        }

        Ok(Self {
            source: source.to_owned(),
            regex: regex.into(),
            parameters,
            groups,
        })
    }

    /// Returns the source of this [`Expression`].
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the [`Regex`] this [`Expression`] expands into.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the parameters of this [`Expression`].
    #[must_use]
    pub fn parameters(&self) -> &[ParameterType] {
        &self.parameters
    }

    /// Matches the whole `text`, returning the typed [`Argument`]s on success.
    #[must_use]
    pub fn matches(&self, text: &str) -> Option<Vec<Argument>> {
        let caps = self.regex.captures(text)?;

        Some(
            self.parameters
                .iter()
                .zip(&self.groups)
                .filter_map(|(ty, group)| {
                    let m = caps.get(*group)?;
                    Some(Argument {
                        start: m.start(),
                        raw: m.as_str().to_owned(),
                        value: ty.convert(m.as_str()),
                        parameter_type: Some(ty.name()),
                    })
                })
                .collect(),
        )
    }
}
