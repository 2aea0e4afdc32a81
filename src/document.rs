// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsed `.feature` [`Document`]s with every node carrying a unique ID.
//!
//! The model serializes into the `gherkinDocument` shape of the
//! [Cucumber Messages][1] protocol.
//!
//! [1]: https://github.com/cucumber/messages

use std::path::PathBuf;

use serde::Serialize;

use crate::{id::IdGenerator, step::StepKeyword};

/// Line and column of a node in its [`Document`], both 1-based.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Location {
    /// Line number.
    pub line: usize,

    /// Column number.
    pub column: usize,
}

impl Location {
    /// Creates a new [`Location`].
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<gherkin::LineCol> for Location {
    fn from(lc: gherkin::LineCol) -> Self {
        Self { line: lc.line, column: lc.col }
    }
}

/// Parsed `.feature` file.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Stable URI of this [`Document`]: its path relative to the base
    /// directory, with `/` separators.
    pub uri: String,

    /// Path this [`Document`] was read from.
    #[serde(skip)]
    pub path: PathBuf,

    /// Raw source text.
    #[serde(skip)]
    pub source: String,

    /// Root [`Feature`].
    pub feature: Feature,

    /// Comments are not retained.
    pub comments: Vec<()>,
}

/// `Feature` node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub location: Location,
    pub tags: Vec<Tag>,
    pub language: String,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub children: Vec<Child>,
}

/// Child of a [`Feature`] or a [`Rule`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Child {
    Background(Background),
    Scenario(Scenario),
    Rule(Rule),
}

/// Tag attached to a node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub location: Location,

    /// Name including the leading `@`.
    pub name: String,
    pub id: String,
}

/// `Background` node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub location: Location,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
    pub id: String,
}

/// `Scenario` or `Scenario Outline` node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub location: Location,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
    pub examples: Vec<Examples>,
    pub id: String,
}

/// `Rule` node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub location: Location,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub children: Vec<Child>,
    pub id: String,
}

/// Type of a [`Step`] keyword.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum KeywordType {
    /// `Given`
    Context,

    /// `When`
    Action,

    /// `Then`
    Outcome,

    /// `And` or `But`.
    Conjunction,
}

/// `Step` node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub location: Location,
    pub keyword: String,
    pub keyword_type: KeywordType,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<DocString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_table: Option<DataTable>,
    pub id: String,

    /// Keyword this step resolves to, with conjunctions already resolved.
    #[serde(skip)]
    pub resolved: StepKeyword,
}

/// Doc string argument of a [`Step`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocString {
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub content: String,
    pub delimiter: String,
}

/// Data table argument of a [`Step`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTable {
    pub location: Location,
    pub rows: Vec<TableRow>,
}

/// `Examples` node of a `Scenario Outline`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Examples {
    pub location: Location,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_header: Option<TableRow>,
    pub table_body: Vec<TableRow>,
    pub id: String,
}

/// Row of a table.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub location: Location,
    pub cells: Vec<TableCell>,
    pub id: String,
}

/// Cell of a [`TableRow`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub location: Location,
    pub value: String,
}

impl TableRow {
    /// Returns the values of this row's cells.
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(|c| c.value.as_str())
    }
}

impl Feature {
    /// Iterates over every [`Scenario`] of this [`Feature`], including the
    /// ones inside [`Rule`]s, along with the [`Background`]s and the [`Rule`]
    /// applying to it.
    pub fn scenarios(&self) -> Vec<ScenarioContext<'_>> {
        let feature_bg = self.children.iter().find_map(Child::as_background);

        let mut out = Vec::new();
        for child in &self.children {
            match child {
                Child::Scenario(scenario) => out.push(ScenarioContext {
                    feature: self,
                    rule: None,
                    backgrounds: feature_bg.into_iter().collect(),
                    scenario,
                }),
                Child::Rule(rule) => {
                    let rule_bg =
                        rule.children.iter().find_map(Child::as_background);
                    out.extend(
                        rule.children
                            .iter()
                            .filter_map(Child::as_scenario)
                            .map(|scenario| ScenarioContext {
                                feature: self,
                                rule: Some(rule),
                                backgrounds: feature_bg
                                    .into_iter()
                                    .chain(rule_bg)
                                    .collect(),
                                scenario,
                            }),
                    );
                }
                Child::Background(_) => {}
            }
        }
        out
    }
}

impl Child {
    const fn as_background(&self) -> Option<&Background> {
        if let Self::Background(bg) = self { Some(bg) } else { None }
    }

    const fn as_scenario(&self) -> Option<&Scenario> {
        if let Self::Scenario(s) = self { Some(s) } else { None }
    }
}

/// [`Scenario`] along with everything enclosing it.
#[derive(Clone, Debug)]
pub struct ScenarioContext<'d> {
    pub feature: &'d Feature,
    pub rule: Option<&'d Rule>,

    /// [`Background`]s applying to the [`Scenario`], outermost first.
    pub backgrounds: Vec<&'d Background>,
    pub scenario: &'d Scenario,
}

impl Document {
    /// Converts a parsed [`gherkin::Feature`] into a [`Document`], assigning
    /// IDs from the given [`IdGenerator`].
    ///
    /// The `source` is used to recover locations [`gherkin`] doesn't track.
    #[must_use]
    pub fn new(
        uri: String,
        path: PathBuf,
        source: String,
        feature: &gherkin::Feature,
        ids: &IdGenerator,
    ) -> Self {
        let feature = {
            let b = Builder { lines: source.lines().collect(), ids };
            b.feature(feature, language(&source))
        };
        Self { uri, path, source, feature, comments: vec![] }
    }
}

/// Detects the `# language: xx` header, defaulting to `en`.
fn language(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .take_while(|l| l.is_empty() || l.starts_with('#'))
        .find_map(|l| {
            let rest = l.strip_prefix('#')?.trim_start();
            let lang = rest.strip_prefix("language")?.trim_start();
            Some(lang.strip_prefix(':')?.trim().to_owned())
        })
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "en".to_owned())
}

/// Converter of [`gherkin`] nodes, recovering extra locations from the source.
struct Builder<'s> {
    lines: Vec<&'s str>,
    ids: &'s IdGenerator,
}

impl Builder<'_> {
    fn feature(&self, f: &gherkin::Feature, language: String) -> Feature {
        let location = Location::from(f.position);
        let tags = self.tags(&f.tags, location.line);

        let mut children = Vec::new();
        if let Some(bg) = &f.background {
            children.push(Child::Background(self.background(bg)));
        }
        children.extend(
            f.scenarios.iter().map(|s| Child::Scenario(self.scenario(s))),
        );
        children.extend(f.rules.iter().map(|r| Child::Rule(self.rule(r))));

        Feature {
            location,
            tags,
            language,
            keyword: f.keyword.clone(),
            name: f.name.clone(),
            description: description(f.description.as_ref()),
            children,
        }
    }

    fn rule(&self, r: &gherkin::Rule) -> Rule {
        let location = Location::from(r.position);
        let tags = self.tags(&r.tags, location.line);

        let mut children = Vec::new();
        if let Some(bg) = &r.background {
            children.push(Child::Background(self.background(bg)));
        }
        children.extend(
            r.scenarios.iter().map(|s| Child::Scenario(self.scenario(s))),
        );

        Rule {
            location,
            tags,
            keyword: r.keyword.clone(),
            name: r.name.clone(),
            description: description(r.description.as_ref()),
            children,
            id: self.ids.next_id(),
        }
    }

    fn background(&self, bg: &gherkin::Background) -> Background {
        let steps = self.steps(&bg.steps);
        Background {
            location: bg.position.into(),
            keyword: bg.keyword.clone(),
            name: String::new(),
            description: String::new(),
            steps,
            id: self.ids.next_id(),
        }
    }

    fn scenario(&self, s: &gherkin::Scenario) -> Scenario {
        let location = Location::from(s.position);
        let tags = self.tags(&s.tags, location.line);
        let steps = self.steps(&s.steps);
        let examples = s.examples.iter().map(|e| self.examples(e)).collect();

        Scenario {
            location,
            tags,
            keyword: s.keyword.clone(),
            name: s.name.clone(),
            description: description(s.description.as_ref()),
            steps,
            examples,
            id: self.ids.next_id(),
        }
    }

    fn examples(&self, e: &gherkin::Examples) -> Examples {
        let location = Location::from(e.position);
        let tags = self.tags(&e.tags, location.line);
        let line = self.line(location.line);
        let keyword = line
            .trim_start()
            .split(':')
            .next()
            .filter(|k| !k.is_empty())
            .unwrap_or("Examples")
            .to_owned();
        let name = line.split_once(':').map_or("", |(_, n)| n.trim()).to_owned();

        let mut rows = e
            .table
            .as_ref()
            .map(|t| self.table_rows(&t.rows, location.line + 1))
            .unwrap_or_default()
            .into_iter();
        let table_header = rows.next();

        Examples {
            location,
            tags,
            keyword,
            name,
            description: String::new(),
            table_header,
            table_body: rows.collect(),
            id: self.ids.next_id(),
        }
    }

    fn steps(&self, steps: &[gherkin::Step]) -> Vec<Step> {
        let mut previous = StepKeyword::Given;
        steps
            .iter()
            .map(|s| {
                let step = self.step(s, previous);
                previous = step.resolved;
                step
            })
            .collect()
    }

    fn step(&self, s: &gherkin::Step, previous: StepKeyword) -> Step {
        let location = Location::from(s.position);
        let resolved = StepKeyword::from(s.ty);
        let keyword_type = match s.keyword.trim() {
            "And" | "But" | "*" => KeywordType::Conjunction,
            _ => match resolved {
                StepKeyword::Given => KeywordType::Context,
                StepKeyword::When => KeywordType::Action,
                StepKeyword::Then => KeywordType::Outcome,
            },
        };
        let resolved = if keyword_type == KeywordType::Conjunction
            && s.keyword.trim() == "*"
        {
            previous
        } else {
            resolved
        };

        let doc_string = s.docstring.as_ref().map(|content| {
            self.doc_string(content, location.line + 1)
        });
        let data_table = s.table.as_ref().map(|t| {
            let rows = self.table_rows(&t.rows, location.line + 1);
            DataTable {
                location: rows.first().map_or(location, |r| r.location),
                rows,
            }
        });

        Step {
            location,
            keyword: s.keyword.clone(),
            keyword_type,
            text: s.value.clone(),
            doc_string,
            data_table,
            id: self.ids.next_id(),
            resolved,
        }
    }

    fn doc_string(&self, content: &str, from: usize) -> DocString {
        let found = (from..=self.lines.len()).find_map(|n| {
            let raw = self.line(n);
            let trimmed = raw.trim_start();
            ["\"\"\"", "```"].into_iter().find_map(|d| {
                let media = trimmed.strip_prefix(d)?.trim();
                Some((n, raw.len() - trimmed.len() + 1, d, media))
            })
        });

        let (line, column, delimiter, media) =
            found.unwrap_or((from, 1, "\"\"\"", ""));
        DocString {
            location: Location::new(line, column),
            media_type: (!media.is_empty()).then(|| media.to_owned()),
            content: content.to_owned(),
            delimiter: delimiter.to_owned(),
        }
    }

    /// Converts table `rows`, locating them on the `|`-lines starting at
    /// line `from`.
    fn table_rows(&self, rows: &[Vec<String>], from: usize) -> Vec<TableRow> {
        let mut lines = (from..=self.lines.len())
            .filter(|&n| self.line(n).trim_start().starts_with('|'));

        rows.iter()
            .map(|cells| {
                let line = lines.next().unwrap_or(from);
                let columns = cell_columns(self.line(line));
                let row_column = columns.first().map_or(1, |c| c.0);
                TableRow {
                    location: Location::new(line, row_column),
                    cells: cells
                        .iter()
                        .enumerate()
                        .map(|(i, value)| TableCell {
                            location: Location::new(
                                line,
                                columns.get(i).map_or(row_column, |c| c.1),
                            ),
                            value: value.clone(),
                        })
                        .collect(),
                    id: self.ids.next_id(),
                }
            })
            .collect()
    }

    /// Locates the tags preceding the node at `line`.
    fn tags(&self, tags: &[String], line: usize) -> Vec<Tag> {
        let above = (1..line)
            .rev()
            .map(|n| (n, self.line(n)))
            .take_while(|(_, l)| {
                let l = l.trim_start();
                l.is_empty() || l.starts_with('@') || l.starts_with('#')
            })
            .collect::<Vec<_>>();

        tags.iter()
            .map(|t| {
                let name =
                    if t.starts_with('@') { t.clone() } else { format!("@{t}") };
                let location = above
                    .iter()
                    .find_map(|(n, l)| {
                        l.find(&name).map(|i| Location::new(*n, i + 1))
                    })
                    .unwrap_or(Location::new(line, 1));
                Tag { location, name, id: self.ids.next_id() }
            })
            .collect()
    }

    /// Returns the 1-based `n`-th line, or an empty one.
    fn line(&self, n: usize) -> &str {
        n.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .copied()
            .unwrap_or("")
    }
}

/// Returns the `|` column and the value column of every cell in a table line.
fn cell_columns(line: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut chars = line.char_indices().peekable();
    let mut pipe = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                _ = chars.next();
            }
            '|' => {
                if let Some(p) = pipe {
                    let cell = &line[p + 1..i];
                    let offset = cell.len() - cell.trim_start().len();
                    out.push((p + 1, p + 1 + offset + 1));
                }
                pipe = Some(i);
            }
            _ => {}
        }
    }
    out
}

fn description(d: Option<&String>) -> String {
    d.map(|s| s.trim_end().to_owned()).unwrap_or_default()
}
