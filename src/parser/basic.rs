// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default [`Parser`] implementation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use super::{Parsed, Parser};
use crate::error::{ConfigError, ConfigResult, ParseError};

/// Default [`Parser`].
///
/// Reads `.feature` files from the file system and parses them with the
/// [`gherkin`] crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Basic;

impl Parser for Basic {
    fn parse(&self, path: &Path) -> Result<Parsed, ParseError> {
        let source =
            fs::read_to_string(path).map_err(|e| ParseError::new(path, e))?;
        let feature =
            gherkin::Feature::parse(&source, gherkin::GherkinEnv::default())
                .map_err(|e| ParseError::new(path, e))?;
        Ok(Parsed { source, feature })
    }
}

/// Finds the files matching any of the glob `patterns` under `base`, sorted
/// and deduplicated.
///
/// # Errors
///
/// If the patterns are malformed, or match nothing.
pub fn discover(base: &Path, patterns: &[String]) -> ConfigResult<Vec<PathBuf>> {
    let walker = globwalk::GlobWalkerBuilder::from_patterns(base, patterns)
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::invalid_pattern(patterns.join(", "), e))?;

    let mut paths = walker
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .collect::<Vec<_>>();
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        return Err(ConfigError::NoFeatures { patterns: patterns.join(", ") });
    }
    tracing::debug!(count = paths.len(), "discovered feature files");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_sorted_feature_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("features/nested")).unwrap();
        fs::write(dir.path().join("features/b.feature"), "Feature: B\n").unwrap();
        fs::write(dir.path().join("features/nested/a.feature"), "Feature: A\n")
            .unwrap();
        fs::write(dir.path().join("features/notes.txt"), "").unwrap();

        let paths =
            discover(dir.path(), &["features/**/*.feature".to_owned()]).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.windows(2).all(|w| w[0] < w[1]));
        assert!(paths.iter().all(|p| p.extension().unwrap() == "feature"));
    }

    #[test]
    fn nothing_found_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = discover(dir.path(), &["**/*.feature".to_owned()]).unwrap_err();

        assert!(matches!(err, ConfigError::NoFeatures { .. }));
    }

    #[test]
    fn reports_syntax_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.feature");
        fs::write(&path, "This is not Gherkin\n").unwrap();

        let err = Basic.parse(&path).unwrap_err();

        assert_eq!(err.path, path);
    }
}
