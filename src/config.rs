// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Project [`Config`] and its versioned snapshot.
//!
//! The same [`Config`] drives both the generation and the reporting paths:
//! the generator writes a snapshot of it next to the generated files, so the
//! reporter sees exactly the configuration the tests were generated with.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::{
    error::{BridgeError, ConfigError, ConfigResult, Result},
    tag::{self, TagExpression},
};

/// Version of the [`Config`] snapshot format.
pub const CONFIG_VERSION: u32 = 1;

/// Name of the snapshot file written into [`Config::output_dir`].
pub const SNAPSHOT_FILE: &str = ".config.json";

/// Configuration of a project.
///
/// Relative paths are resolved against [`Config::base_dir`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, SmartDefault)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Version of the snapshot format.
    #[default(CONFIG_VERSION)]
    pub version: u32,

    /// Directory relative paths are resolved against.
    #[default(PathBuf::from("."))]
    pub base_dir: PathBuf,

    /// Glob patterns of the `.feature` files.
    #[default(vec!["features/**/*.feature".to_owned()])]
    pub features: Vec<String>,

    /// Directory every `.feature` file has to reside under. The generated
    /// files mirror the layout below it.
    #[default(PathBuf::from("features"))]
    pub features_root: PathBuf,

    /// Directory the test files are generated into.
    #[default(PathBuf::from(".features-gen"))]
    pub output_dir: PathBuf,

    /// Path to the JSON manifest of step and hook definitions.
    #[default(PathBuf::from("steps.json"))]
    pub steps: PathBuf,

    /// Tag expression selecting the pickles to generate tests for.
    pub tags: Option<String>,

    /// Path of the world type every generated test constructs.
    #[default(String::from("crate::World"))]
    pub world: String,

    /// Maximum number of `.feature` files parsed in parallel, each on its
    /// own thread.
    #[default(8)]
    pub concurrency: usize,
}

impl Config {
    /// Parses a [`Config`] out of its JSON snapshot.
    ///
    /// # Errors
    ///
    /// If the JSON is malformed, or was written by an unsupported version.
    pub fn from_snapshot(path: &Path, json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::invalid_file(path, e))?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                expected: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// Serializes this [`Config`] into its JSON snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> String {
        // Serializing plain data into a `String` cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Loads a [`Config`] from the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read, or its content is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let json =
            fs::read_to_string(path).map_err(|e| BridgeError::io(path, e))?;
        Ok(Self::from_snapshot(path, &json)?)
    }

    /// Writes the snapshot of this [`Config`] into [`Config::output_dir`].
    ///
    /// # Errors
    ///
    /// If the snapshot cannot be written.
    pub fn save_snapshot(&self) -> Result<PathBuf> {
        let dir = self.output_dir();
        fs::create_dir_all(&dir).map_err(|e| BridgeError::io(&dir, e))?;
        let path = dir.join(SNAPSHOT_FILE);
        fs::write(&path, self.to_snapshot())
            .map_err(|e| BridgeError::io(&path, e))?;
        Ok(path)
    }

    /// Parses [`Config::tags`], if any.
    ///
    /// # Errors
    ///
    /// If the tag expression is malformed.
    pub fn tag_filter(&self) -> ConfigResult<Option<TagExpression>> {
        tag::parse_optional(self.tags.as_deref())
    }

    /// Resolves the given `path` against [`Config::base_dir`].
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Resolved [`Config::features_root`].
    #[must_use]
    pub fn features_root(&self) -> PathBuf {
        self.resolve(&self.features_root)
    }

    /// Resolved [`Config::output_dir`].
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    /// Resolved [`Config::steps`].
    #[must_use]
    pub fn steps_path(&self) -> PathBuf {
        self.resolve(&self.steps)
    }
}
