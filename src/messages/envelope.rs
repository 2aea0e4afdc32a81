// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Cucumber Messages][1] [`Envelope`]s.
//!
//! [1]: https://github.com/cucumber/messages

use serde::Serialize;

use super::timestamp::{Duration, Timestamp};
use crate::{
    document::{self, Document},
    pickle::Pickle,
    report,
    step::PatternKind,
};

/// Version of the Cucumber Messages protocol produced.
pub const PROTOCOL_VERSION: &str = "27.0.0";

/// Single message, serialized as `{"<kind>": {...}}`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Envelope {
    Meta(Meta),
    Source(Source),
    GherkinDocument(Document),
    Pickle(Pickle),
    StepDefinition(StepDefinition),
    Hook(Hook),
    TestRunStarted(TestRunStarted),
    TestCase(TestCase),
    TestRunHookStarted(TestRunHookStarted),
    TestRunHookFinished(TestRunHookFinished),
    TestCaseStarted(TestCaseStarted),
    TestStepStarted(TestStepStarted),
    TestStepFinished(TestStepFinished),
    TestCaseFinished(TestCaseFinished),
    TestRunFinished(TestRunFinished),
}

impl Envelope {
    /// Name of this [`Envelope`]'s kind, as it appears in JSON.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Meta(_) => "meta",
            Self::Source(_) => "source",
            Self::GherkinDocument(_) => "gherkinDocument",
            Self::Pickle(_) => "pickle",
            Self::StepDefinition(_) => "stepDefinition",
            Self::Hook(_) => "hook",
            Self::TestRunStarted(_) => "testRunStarted",
            Self::TestCase(_) => "testCase",
            Self::TestRunHookStarted(_) => "testRunHookStarted",
            Self::TestRunHookFinished(_) => "testRunHookFinished",
            Self::TestCaseStarted(_) => "testCaseStarted",
            Self::TestStepStarted(_) => "testStepStarted",
            Self::TestStepFinished(_) => "testStepFinished",
            Self::TestCaseFinished(_) => "testCaseFinished",
            Self::TestRunFinished(_) => "testRunFinished",
        }
    }
}

/// Name and version of a piece of software or hardware.
#[derive(Clone, Debug, Serialize)]
pub struct Product {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub protocol_version: String,
    pub implementation: Product,
    pub runtime: Product,
    pub os: Product,
    pub cpu: Product,
}

impl Meta {
    /// [`Meta`] of this crate on the current platform.
    #[must_use]
    pub fn current() -> Self {
        let product = |name: &str, version: Option<&str>| Product {
            name: name.to_owned(),
            version: version.map(str::to_owned),
        };
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            implementation: product(
                env!("CARGO_PKG_NAME"),
                Some(env!("CARGO_PKG_VERSION")),
            ),
            runtime: product("rust", None),
            os: product(std::env::consts::OS, None),
            cpu: product(std::env::consts::ARCH, None),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub uri: String,
    pub data: String,
    pub media_type: &'static str,
}

impl Source {
    /// [`Source`] of the given [`Document`].
    #[must_use]
    pub fn of(doc: &Document) -> Self {
        Self {
            uri: doc.uri.clone(),
            data: doc.source.clone(),
            media_type: "text/x.cucumber.gherkin+plain",
        }
    }
}

/// Location of a definition in the code.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SourceReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<document::Location>,
}

impl From<Option<&crate::step::Location>> for SourceReference {
    fn from(loc: Option<&crate::step::Location>) -> Self {
        loc.map_or_else(Self::default, |l| Self {
            uri: Some(l.path.clone()),
            location: Some(document::Location::new(
                l.line as usize,
                l.column as usize,
            )),
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepDefinitionPattern {
    pub source: String,
    #[serde(rename = "type")]
    pub ty: PatternKind,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub id: String,
    pub pattern: StepDefinitionPattern,
    pub source_reference: SourceReference,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source_reference: SourceReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_expression: Option<String>,
    #[serde(rename = "type")]
    pub ty: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct TestRunStarted {
    pub timestamp: Timestamp,
    pub id: String,
}

/// Matched group of a step argument.
#[derive(Clone, Debug, Serialize)]
pub struct Group {
    pub children: Vec<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMatchArgument {
    pub group: Group,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_type_name: Option<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMatchArgumentsList {
    pub step_match_arguments: Vec<StepMatchArgument>,
}

/// Step of a [`TestCase`]: either a hook or a pickle step.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickle_step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_definition_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_match_arguments_lists: Option<Vec<StepMatchArgumentsList>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub pickle_id: String,
    pub test_steps: Vec<TestStep>,
    pub test_run_started_id: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunHookStarted {
    pub id: String,
    pub test_run_started_id: String,
    pub hook_id: String,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunHookFinished {
    pub test_run_hook_started_id: String,
    pub result: TestStepResult,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseStarted {
    pub attempt: usize,
    pub id: String,
    pub test_case_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStepStarted {
    pub test_case_started_id: String,
    pub test_step_id: String,
    pub timestamp: Timestamp,
}

/// Status of a finished [`TestStep`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStepResultStatus {
    Unknown,
    Passed,
    Skipped,
    Pending,
    Undefined,
    Ambiguous,
    Failed,
}

impl From<report::TestStatus> for TestStepResultStatus {
    fn from(status: report::TestStatus) -> Self {
        use crate::report::TestStatus as S;

        match status {
            S::Passed => Self::Passed,
            S::Skipped => Self::Skipped,
            S::Failed | S::TimedOut | S::Interrupted => Self::Failed,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TestStepResult {
    pub duration: Duration,
    pub status: TestStepResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStepFinished {
    pub test_case_started_id: String,
    pub test_step_id: String,
    pub test_step_result: TestStepResult,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseFinished {
    pub test_case_started_id: String,
    pub timestamp: Timestamp,
    pub will_be_retried: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunFinished {
    pub success: bool,
    pub timestamp: Timestamp,
    pub test_run_started_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_externally_tagged() {
        let env = Envelope::TestRunStarted(TestRunStarted {
            timestamp: Timestamp::from_millis(1_500),
            id: "7".into(),
        });

        assert_eq!(
            serde_json::to_string(&env).unwrap(),
            r#"{"testRunStarted":{"timestamp":{"seconds":1,"nanos":500000000},"id":"7"}}"#,
        );
        assert_eq!(env.kind(), "testRunStarted");
    }

    #[test]
    fn serializes_statuses_and_patterns() {
        let def = StepDefinition {
            id: "1".into(),
            pattern: StepDefinitionPattern {
                source: "I have {int} cukes".into(),
                ty: PatternKind::CucumberExpression,
            },
            source_reference: SourceReference::default(),
        };

        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["pattern"]["type"], "CUCUMBER_EXPRESSION");
        assert_eq!(
            serde_json::to_value(TestStepResultStatus::Undefined).unwrap(),
            "UNDEFINED",
        );
    }
}
