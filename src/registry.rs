// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Registry`] of step and hook definitions, and its JSON manifest.
//!
//! A manifest looks like:
//! ```json
//! {
//!   "steps": [
//!     {"keyword": "Given", "pattern": "I have {int} cukes", "body": "steps::cukes"},
//!     {"pattern": "^I eat (\\d+)$", "regex": true, "body": "steps::eat",
//!      "location": {"path": "tests/steps.rs", "line": 12}}
//!   ],
//!   "hooks": [
//!     {"kind": "before", "tags": "@db", "order": 1, "body": "hooks::reset_db"}
//!   ]
//! }
//! ```

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    error::{BridgeError, ConfigError, ConfigResult, Result},
    hook::{HookKind, Hooks},
    step::{Collection, Location, Pattern, StepKeyword},
    tag,
};

/// Step and hook definitions available to the generator and the reporter.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    /// Step definitions.
    pub steps: Collection,

    /// Hook definitions.
    pub hooks: Hooks,
}

impl Registry {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a [Given] step definition.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[must_use]
    pub fn given(mut self, pattern: Pattern, body: impl Into<String>) -> Self {
        self.steps = self.steps.given(None, pattern, body);
        self
    }

    /// Adds a [When] step definition.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[must_use]
    pub fn when(mut self, pattern: Pattern, body: impl Into<String>) -> Self {
        self.steps = self.steps.when(None, pattern, body);
        self
    }

    /// Adds a [Then] step definition.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[must_use]
    pub fn then(mut self, pattern: Pattern, body: impl Into<String>) -> Self {
        self.steps = self.steps.then(None, pattern, body);
        self
    }

    /// Adds a step definition matching steps of any keyword.
    #[must_use]
    pub fn step(mut self, pattern: Pattern, body: impl Into<String>) -> Self {
        self.steps = self.steps.step(None, pattern, body);
        self
    }

    /// Adds an untagged hook of the given `kind`.
    #[must_use]
    pub fn hook(mut self, kind: HookKind, body: impl Into<String>) -> Self {
        _ = self.hooks.push(kind, None, None, 0, body, None);
        self
    }

    /// Builds a [`Registry`] out of a parsed [`Manifest`].
    ///
    /// # Errors
    ///
    /// If any pattern or tag expression of the [`Manifest`] is invalid.
    pub fn from_manifest(manifest: Manifest) -> ConfigResult<Self> {
        let mut registry = Self::new();

        for s in manifest.steps {
            let pattern = if s.regex {
                Pattern::regex(&s.pattern)?
            } else {
                Pattern::expression(&s.pattern)?
            };
            let tags = tag::parse_optional(s.tags.as_deref())?;
            _ = registry.steps.push(s.keyword, pattern, s.body, tags, s.location);
        }

        for h in manifest.hooks {
            let tags = tag::parse_optional(h.tags.as_deref())?;
            _ = registry.hooks.push(
                h.kind, h.name, tags, h.order, h.body, h.location,
            );
        }

        Ok(registry)
    }

    /// Parses a [`Registry`] out of a JSON manifest.
    ///
    /// # Errors
    ///
    /// If the JSON is malformed, or any of its definitions is invalid.
    pub fn from_json(path: &Path, json: &str) -> ConfigResult<Self> {
        let manifest = serde_json::from_str(json)
            .map_err(|e| ConfigError::invalid_file(path, e))?;
        Self::from_manifest(manifest)
    }

    /// Loads a [`Registry`] from the JSON manifest at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read, or its content is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let json =
            fs::read_to_string(path).map_err(|e| BridgeError::io(path, e))?;
        let registry = Self::from_json(path, &json)?;
        tracing::debug!(
            path = %path.display(),
            steps = registry.steps.len(),
            hooks = registry.hooks.definitions().len(),
            "loaded definitions",
        );
        Ok(registry)
    }
}

/// JSON manifest of a [`Registry`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Step definitions, in registration order.
    #[serde(default)]
    pub steps: Vec<StepEntry>,

    /// Hook definitions, in registration order.
    #[serde(default)]
    pub hooks: Vec<HookEntry>,
}

/// Step definition entry of a [`Manifest`].
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepEntry {
    /// Keyword restriction. Absent means any keyword.
    #[serde(default)]
    pub keyword: Option<StepKeyword>,

    /// Pattern source.
    pub pattern: String,

    /// Whether [`StepEntry::pattern`] is a regular expression rather than a
    /// Cucumber Expression.
    #[serde(default)]
    pub regex: bool,

    /// Path of the body function.
    pub body: String,

    /// Tag expression scoping this definition.
    #[serde(default)]
    pub tags: Option<String>,

    /// Location of the body.
    #[serde(default)]
    pub location: Option<Location>,
}

/// Hook definition entry of a [`Manifest`].
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookEntry {
    /// Kind of the hook.
    pub kind: HookKind,

    /// Optional name.
    #[serde(default)]
    pub name: Option<String>,

    /// Tag expression scoping this hook.
    #[serde(default)]
    pub tags: Option<String>,

    /// Ordering among hooks of the same kind.
    #[serde(default)]
    pub order: i32,

    /// Path of the body function.
    pub body: String,

    /// Location of the body.
    #[serde(default)]
    pub location: Option<Location>,
}
