// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Core error type of the crate.
//!
//! This module contains the [`BridgeError`] enum consolidating every fatal
//! error of the generation and reporting paths into a single hierarchy.

use std::{io, path::PathBuf};

use derive_more::with_trait::{Display, Error};

use super::{ConfigError, ParseErrors, ResolutionErrors};

/// Top-level error type for all fatal operations.
#[derive(Debug, Display, Error)]
pub enum BridgeError {
    /// Configuration or validation error.
    #[display("Configuration error: {_0}")]
    Config(ConfigError),

    /// `.feature` files failed to parse.
    #[display("{_0}")]
    Parse(ParseErrors),

    /// Pickle steps failed to resolve.
    #[display("{_0}")]
    Resolution(ResolutionErrors),

    /// I/O error on a particular path.
    #[display("I/O operation on `{}` failed: {source}", path.display())]
    Io {
        /// Path the operation was performed on.
        #[error(not(source))]
        path: PathBuf,

        /// Underlying error.
        source: io::Error,
    },
}

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Creates an I/O error for the given `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Returns `true` if this error is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if this error is a resolution error.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }

    /// Returns `true` if this error is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ParseErrors> for BridgeError {
    fn from(err: ParseErrors) -> Self {
        Self::Parse(err)
    }
}

impl From<ResolutionErrors> for BridgeError {
    fn from(err: ResolutionErrors) -> Self {
        Self::Resolution(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_error_keeps_path_and_source() {
        let err = BridgeError::io(
            "gen/a.feature.rs",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        assert!(err.to_string().contains("gen/a.feature.rs"));
        assert!(err.source().is_some());
    }

    #[test]
    fn conversions_pick_the_right_variant() {
        let err: BridgeError =
            ConfigError::invalid_pattern("{nope}", "unknown parameter").into();
        assert!(err.is_config());

        let err: BridgeError = ResolutionErrors::default().into();
        assert!(err.is_resolution());

        let err: BridgeError = ParseErrors::default().into();
        assert!(err.is_parse());
    }
}
