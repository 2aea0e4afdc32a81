// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step [`Definition`]s, their [`Pattern`]s and the [`Collection`] matching
//! pickle steps against them.
//!
//! - [`argument`]: Typed arguments extracted from a step's text
//! - [`collection`]: Ordered definitions and step matching
//! - [`definition`]: Step definitions and resolved keywords
//! - [`error`]: Ambiguous match error
//! - [`expression`]: Cucumber Expressions expansion
//! - [`location`]: Source location of definition bodies
//! - [`pattern`]: Expression or regular expression patterns
//! - [`regex`]: Hashable regex wrapper

pub mod argument;
pub mod collection;
pub mod definition;
pub mod error;
pub mod expression;
pub mod location;
pub mod pattern;
pub mod regex;

pub use self::{
    argument::{Argument, ArgumentValue},
    collection::{Collection, Match},
    definition::{Definition, DefinitionId, StepKeyword},
    error::{AmbiguousMatchError, Candidate},
    expression::{Expression, ParameterType},
    location::Location,
    pattern::{Pattern, PatternKind},
    regex::HashableRegex,
};
