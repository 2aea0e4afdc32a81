// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Arguments extracted from a pickle step's text.

use derive_more::with_trait::Display;

/// Typed value of an [`Argument`].
#[derive(Clone, Debug, Display, PartialEq)]
pub enum ArgumentValue {
    /// Value of an `{int}` parameter.
    #[display("{_0}")]
    Int(i64),

    /// Value of a `{float}` parameter.
    #[display("{_0}")]
    Float(f64),

    /// Value of a `{string}` parameter, unquoted and unescaped.
    #[display("{_0:?}")]
    String(String),

    /// Raw text of any other parameter or regular expression group.
    #[display("{_0}")]
    Text(String),

    /// Raw text of an `{int}` or `{float}` parameter whose number cannot be
    /// represented as an [`i64`] or a finite [`f64`].
    #[display("{_0}")]
    Unrepresentable(String),
}

/// Single argument of a matched step.
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    /// Byte offset of the argument in the step's text.
    pub start: usize,

    /// Argument as it appears in the step's text.
    pub raw: String,

    /// Converted value.
    pub value: ArgumentValue,

    /// Name of the Cucumber Expression parameter type this argument was
    /// captured by, or [`None`] for regular expression groups.
    pub parameter_type: Option<&'static str>,
}

impl Argument {
    /// Creates an untyped [`Argument`] out of a regular expression group.
    #[must_use]
    pub fn text(start: usize, raw: &str) -> Self {
        Self {
            start,
            raw: raw.to_owned(),
            value: ArgumentValue::Text(raw.to_owned()),
            parameter_type: None,
        }
    }

    /// Indicates whether the captured value fits its parameter type.
    #[must_use]
    pub const fn is_representable(&self) -> bool {
        !matches!(self.value, ArgumentValue::Unrepresentable(_))
    }
}

/// Strips the quotes of a `{string}` capture and unescapes its content.
pub(crate) fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix(['"', '\''])
        .and_then(|s| s.strip_suffix(['"', '\'']))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(e @ ('"' | '\'' | '\\')) => out.push(e),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquotes_both_quote_styles() {
        assert_eq!(unquote(r#""hello world""#), "hello world");
        assert_eq!(unquote("'single'"), "single");
    }

    #[test]
    fn unescapes_quotes_only() {
        assert_eq!(unquote(r#""say \"hi\"""#), r#"say "hi""#);
        assert_eq!(unquote(r#""a\nb""#), r"a\nb");
        assert_eq!(unquote(r#""back\\slash""#), r"back\slash");
    }

    #[test]
    fn text_argument_keeps_raw_value() {
        let arg = Argument::text(4, "42");

        assert_eq!(arg.value, ArgumentValue::Text("42".into()));
        assert_eq!(arg.parameter_type, None);
        assert_eq!(arg.start, 4);
    }
}
