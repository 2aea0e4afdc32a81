// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration and validation error types.
//!
//! This module defines errors that can occur while building a [`Config`], a
//! step registry, or while deriving output paths of generated files.
//!
//! [`Config`]: crate::Config

use std::path::{Path, PathBuf};

use derive_more::with_trait::{Display, Error};
use itertools::Itertools as _;

/// Configuration and validation errors.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// Tag expression cannot be parsed.
    #[display("Invalid tag expression `{expression}`: {reason}")]
    InvalidTagExpression {
        /// The invalid tag expression.
        #[error(not(source))]
        expression: String,

        /// Why parsing failed.
        #[error(not(source))]
        reason: String,
    },

    /// Step pattern (Cucumber expression or regex) cannot be compiled.
    #[display("Invalid step pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The invalid pattern.
        #[error(not(source))]
        pattern: String,

        /// Why compilation failed.
        #[error(not(source))]
        reason: String,
    },

    /// Snapshot was written by an incompatible version.
    #[display(
        "Unsupported configuration version {found}, expected {expected}"
    )]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u32,

        /// Version this crate understands.
        expected: u32,
    },

    /// Feature file lies outside the configured features root.
    #[display(
        "Feature file `{}` is outside of the features root `{}`",
        feature.display(),
        root.display()
    )]
    FeatureOutsideRoot {
        /// Offending feature file.
        #[error(not(source))]
        feature: PathBuf,

        /// Configured features root.
        #[error(not(source))]
        root: PathBuf,
    },

    /// Several feature files would be generated into the same output file.
    #[display(
        "Feature files {} would all be generated into `{}`",
        display_paths(features),
        output.display()
    )]
    OutputPathCollision {
        /// Colliding output path.
        #[error(not(source))]
        output: PathBuf,

        /// Feature files mapped onto the `output`.
        #[error(not(source))]
        features: Vec<PathBuf>,
    },

    /// No feature files were found by the configured patterns.
    #[display("No feature files found by patterns: {patterns}")]
    NoFeatures {
        /// Joined glob patterns.
        #[error(not(source))]
        patterns: String,
    },

    /// Manifest or configuration file has invalid content.
    #[display("Invalid `{}`: {reason}", path.display())]
    InvalidFile {
        /// Path of the file.
        #[error(not(source))]
        path: PathBuf,

        /// What is wrong with it.
        #[error(not(source))]
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Creates a new invalid tag expression error.
    #[must_use]
    pub fn invalid_tag_expression(
        expression: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidTagExpression {
            expression: expression.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(
        pattern: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new error of a feature lying outside the features root.
    #[must_use]
    pub fn feature_outside_root(
        feature: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self::FeatureOutsideRoot { feature: feature.into(), root: root.into() }
    }

    /// Creates a new invalid file error.
    #[must_use]
    pub fn invalid_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidFile { path: path.into(), reason: reason.to_string() }
    }

    /// Returns `true` if this is an invalid tag expression error.
    #[must_use]
    pub const fn is_invalid_tag_expression(&self) -> bool {
        matches!(self, Self::InvalidTagExpression { .. })
    }

    /// Returns `true` if this is an invalid pattern error.
    #[must_use]
    pub const fn is_invalid_pattern(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }

    /// Returns `true` if this is an output path collision error.
    #[must_use]
    pub const fn is_output_path_collision(&self) -> bool {
        matches!(self, Self::OutputPathCollision { .. })
    }

    /// Returns `true` if this is a feature outside root error.
    #[must_use]
    pub const fn is_feature_outside_root(&self) -> bool {
        matches!(self, Self::FeatureOutsideRoot { .. })
    }
}

/// Formats the given `paths` as a comma-separated list of quoted paths.
fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(PathBuf::as_path)
        .map(Path::display)
        .map(|p| format!("`{p}`"))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_root_names_both_paths() {
        let err = ConfigError::feature_outside_root(
            "other/a.feature",
            "features",
        );

        assert!(err.is_feature_outside_root());
        let msg = err.to_string();
        assert!(msg.contains("other/a.feature"));
        assert!(msg.contains("`features`"));
    }

    #[test]
    fn collision_lists_every_feature() {
        let err = ConfigError::OutputPathCollision {
            output: PathBuf::from("gen/a.feature.rs"),
            features: vec![
                PathBuf::from("features/a.feature"),
                PathBuf::from("features/A.feature"),
            ],
        };

        assert!(err.is_output_path_collision());
        assert_eq!(
            err.to_string(),
            "Feature files `features/a.feature`, `features/A.feature` would \
             all be generated into `gen/a.feature.rs`",
        );
    }

    #[test]
    fn invalid_tag_expression_keeps_reason() {
        let err = ConfigError::invalid_tag_expression("@a and", "unexpected end");

        assert!(err.is_invalid_tag_expression());
        assert!(!err.is_invalid_pattern());
        assert_eq!(
            err.to_string(),
            "Invalid tag expression `@a and`: unexpected end",
        );
    }
}
