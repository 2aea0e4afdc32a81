// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Pickle`]s: flattened, executable scenarios compiled from a [`Document`].
//!
//! Every `Scenario` yields one [`Pickle`], and every `Scenario Outline` yields
//! one [`Pickle`] per row of its `Examples`, with `<placeholders>` replaced.
//! Backgrounds are prepended, and tags are inherited from all the enclosing
//! nodes.

use std::iter;

use lazy_regex::{regex, Lazy, Regex};
use serde::Serialize;

use crate::{
    document::{self, Document, Location, ScenarioContext, TableRow},
    error::ParseError,
    id::IdGenerator,
    step::StepKeyword,
};

/// Executable scenario.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickle {
    pub id: String,
    pub uri: String,

    /// Location of the `Scenario`, or of the `Examples` row this [`Pickle`]
    /// was expanded from.
    pub location: Location,
    pub name: String,
    pub language: String,
    pub steps: Vec<PickleStep>,
    pub tags: Vec<PickleTag>,
    pub ast_node_ids: Vec<String>,
}

impl Pickle {
    /// Returns the names of this [`Pickle`]'s tags, with the leading `@`.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.tags.iter().map(|t| t.name.as_str())
    }

    /// Indicates whether this [`Pickle`] carries the given `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_names().any(|t| t == tag)
    }
}

/// Type of a [`PickleStep`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PickleStepType {
    Context,
    Action,
    Outcome,
}

impl From<StepKeyword> for PickleStepType {
    fn from(k: StepKeyword) -> Self {
        match k {
            StepKeyword::Given => Self::Context,
            StepKeyword::When => Self::Action,
            StepKeyword::Then => Self::Outcome,
        }
    }
}

/// Step of a [`Pickle`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<PickleStepArgument>,
    pub ast_node_ids: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub ty: PickleStepType,
    pub text: String,

    /// Keyword as written in the source, trimmed.
    #[serde(skip)]
    pub keyword: String,

    /// Resolved keyword.
    #[serde(skip)]
    pub resolved: StepKeyword,

    /// Line of the step in the source.
    #[serde(skip)]
    pub line: usize,
}

/// Argument of a [`PickleStep`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PickleStepArgument {
    DocString(PickleDocString),
    DataTable(PickleTable),
}

/// Doc string argument of a [`PickleStep`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleDocString {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub content: String,
}

/// Data table argument of a [`PickleStep`].
#[derive(Clone, Debug, Serialize)]
pub struct PickleTable {
    pub rows: Vec<PickleTableRow>,
}

/// Row of a [`PickleTable`].
#[derive(Clone, Debug, Serialize)]
pub struct PickleTableRow {
    pub cells: Vec<PickleTableCell>,
}

/// Cell of a [`PickleTableRow`].
#[derive(Clone, Debug, Serialize)]
pub struct PickleTableCell {
    pub value: String,
}

impl PickleTable {
    /// Returns the cell values, row by row.
    #[must_use]
    pub fn values(&self) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.value.as_str()).collect())
            .collect()
    }
}

/// Tag of a [`Pickle`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleTag {
    pub name: String,
    pub ast_node_id: String,
}

/// Compiles all the [`Pickle`]s of the given [`Document`], in source order.
///
/// # Errors
///
/// If an outline step refers to a `<placeholder>` its `Examples` don't define.
pub fn compile(
    document: &Document,
    ids: &IdGenerator,
) -> Result<Vec<Pickle>, ParseError> {
    let mut pickles = Vec::new();
    for ctx in document.feature.scenarios() {
        Compiler { document, ctx: &ctx, ids }.compile(&mut pickles)?;
    }
    Ok(pickles)
}

struct Compiler<'a> {
    document: &'a Document,
    ctx: &'a ScenarioContext<'a>,
    ids: &'a IdGenerator,
}

/// Header and values of a single `Examples` row.
struct ExampleRow<'a> {
    header: &'a TableRow,
    row: &'a TableRow,
    examples: &'a document::Examples,
}

impl ExampleRow<'_> {
    fn value(&self, name: &str) -> Option<&str> {
        self.header
            .values()
            .zip(self.row.values())
            .find_map(|(k, v)| (k == name).then_some(v))
    }
}

impl Compiler<'_> {
    fn compile(&self, out: &mut Vec<Pickle>) -> Result<(), ParseError> {
        let scenario = self.ctx.scenario;

        if scenario.examples.is_empty() {
            out.push(self.pickle(None)?);
            return Ok(());
        }

        for examples in &scenario.examples {
            let Some(header) = &examples.table_header else {
                continue;
            };
            for row in &examples.table_body {
                let example = ExampleRow { header, row, examples };
                out.push(self.pickle(Some(&example))?);
            }
        }
        Ok(())
    }

    fn pickle(
        &self,
        example: Option<&ExampleRow<'_>>,
    ) -> Result<Pickle, ParseError> {
        let ScenarioContext { feature, rule, backgrounds, scenario } = self.ctx;

        let background_steps = if scenario.steps.is_empty() {
            vec![]
        } else {
            backgrounds.iter().flat_map(|bg| &bg.steps).collect()
        };

        let mut steps = background_steps
            .into_iter()
            .map(|s| self.step(s, None))
            .collect::<Result<Vec<_>, _>>()?;
        for s in &scenario.steps {
            steps.push(self.step(s, example)?);
        }

        let tags = feature
            .tags
            .iter()
            .chain(rule.iter().flat_map(|r| &r.tags))
            .chain(&scenario.tags)
            .chain(example.iter().flat_map(|e| &e.examples.tags))
            .map(|t| PickleTag { name: t.name.clone(), ast_node_id: t.id.clone() })
            .collect();

        let name = match example {
            Some(e) => self.expand(&scenario.name, scenario.location, e)?,
            None => scenario.name.clone(),
        };

        Ok(Pickle {
            id: self.ids.next_id(),
            uri: self.document.uri.clone(),
            location: example.map_or(scenario.location, |e| e.row.location),
            name,
            language: feature.language.clone(),
            steps,
            tags,
            ast_node_ids: iter::once(scenario.id.clone())
                .chain(example.map(|e| e.row.id.clone()))
                .collect(),
        })
    }

    fn step(
        &self,
        step: &document::Step,
        example: Option<&ExampleRow<'_>>,
    ) -> Result<PickleStep, ParseError> {
        let expand = |text: &str| match example {
            Some(e) => self.expand(text, step.location, e),
            None => Ok(text.to_owned()),
        };

        let argument = if let Some(doc) = &step.doc_string {
            Some(PickleStepArgument::DocString(PickleDocString {
                media_type: doc.media_type.clone(),
                content: expand(&doc.content)?,
            }))
        } else if let Some(table) = &step.data_table {
            let rows = table
                .rows
                .iter()
                .map(|r| {
                    let cells = r
                        .values()
                        .map(|v| expand(v).map(|value| PickleTableCell { value }))
                        .collect::<Result<_, _>>()?;
                    Ok(PickleTableRow { cells })
                })
                .collect::<Result<_, ParseError>>()?;
            Some(PickleStepArgument::DataTable(PickleTable { rows }))
        } else {
            None
        };

        Ok(PickleStep {
            argument,
            ast_node_ids: iter::once(step.id.clone())
                .chain(example.map(|e| e.row.id.clone()))
                .collect(),
            id: self.ids.next_id(),
            ty: step.resolved.into(),
            text: expand(&step.text)?,
            keyword: step.keyword.trim().to_owned(),
            resolved: step.resolved,
            line: step.location.line,
        })
    }

    /// Replaces every `<placeholder>` in the `text` with its `Examples` value.
    fn expand(
        &self,
        text: &str,
        at: Location,
        example: &ExampleRow<'_>,
    ) -> Result<String, ParseError> {
        /// [`Regex`] matching placeholders `Examples` should expand into.
        static TEMPLATE_REGEX: &Lazy<Regex> = regex!(r"<([^>\s]+)>");

        let mut unknown = None;
        let replaced = TEMPLATE_REGEX.replace_all(text, |cap: &regex::Captures<'_>| {
            let name = cap.get(1).map_or("", |m| m.as_str());
            example.value(name).map_or_else(
                || {
                    unknown.get_or_insert_with(|| name.to_owned());
                    String::new()
                },
                str::to_owned,
            )
        });

        match unknown {
            Some(name) => Err(ParseError::new(
                &self.document.path,
                format!(
                    "{}:{}: failed to resolve <{name}> from `Examples` at line {}",
                    at.line, at.column, example.examples.location.line,
                ),
            )),
            None => Ok(replaced.into_owned()),
        }
    }
}
