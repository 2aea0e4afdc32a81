// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Deterministic output paths of generated files.

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

use crate::error::{ConfigError, ConfigResult};

/// Suffix of every generated file.
pub const GENERATED_SUFFIX: &str = ".feature.rs";

/// Makes the `path` absolute and resolves its `.` and `..` components
/// lexically, without touching the file system.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut out = PathBuf::new();
    for c in abs.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                _ = out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Computes the output path of the `feature` file: its path relative to the
/// features `root`, placed under `output_dir`, with `.rs` appended.
///
/// # Errors
///
/// If the `feature` doesn't lie under the `root`.
pub fn output_path(
    feature: &Path,
    root: &Path,
    output_dir: &Path,
) -> ConfigResult<PathBuf> {
    let (feature, root) = (normalize(feature), normalize(root));
    let rel = feature
        .strip_prefix(&root)
        .map_err(|_| ConfigError::feature_outside_root(&feature, &root))?;

    let name = rel.file_name().unwrap_or_default().to_string_lossy();
    Ok(normalize(output_dir).join(rel.with_file_name(format!("{name}.rs"))))
}

/// Checks that no two features are generated into the same output path.
///
/// Paths differing only by case collide too, as they would on
/// case-insensitive file systems.
///
/// # Errors
///
/// On the first colliding output path.
pub fn check_collisions<'p, I>(pairs: I) -> ConfigResult<()>
where
    I: IntoIterator<Item = (&'p Path, &'p Path)>,
{
    let mut seen = BTreeMap::<String, (PathBuf, Vec<PathBuf>)>::new();
    for (feature, output) in pairs {
        let key = output.to_string_lossy().to_lowercase();
        seen.entry(key)
            .or_insert_with(|| (output.to_path_buf(), vec![]))
            .1
            .push(feature.to_path_buf());
    }

    match seen.into_values().find(|(_, features)| features.len() > 1) {
        Some((output, features)) => {
            Err(ConfigError::OutputPathCollision { output, features })
        }
        None => Ok(()),
    }
}

/// Lists the previously generated files under the `output_dir`.
#[must_use]
pub fn stale_files(output_dir: &Path) -> Vec<PathBuf> {
    if !output_dir.is_dir() {
        return vec![];
    }
    let pattern = format!("**/*{GENERATED_SUFFIX}");
    globwalk::GlobWalkerBuilder::from_patterns(output_dir, &[pattern])
        .build()
        .map(|walker| {
            walker
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path().to_path_buf())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn mirrors_layout_under_output_dir() {
        let out = output_path(
            Path::new("/p/features/shop/cart.feature"),
            Path::new("/p/features"),
            Path::new("/p/gen"),
        )
        .unwrap();

        assert_eq!(out, PathBuf::from("/p/gen/shop/cart.feature.rs"));
    }

    #[test]
    fn is_idempotent() {
        let args = (
            Path::new("/p/./features/../features/a.feature"),
            Path::new("/p/features/"),
            Path::new("/p/gen"),
        );

        let first = output_path(args.0, args.1, args.2).unwrap();
        let second = output_path(args.0, args.1, args.2).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("/p/gen/a.feature.rs"));
    }

    #[test]
    fn rejects_features_outside_root() {
        let err = output_path(
            Path::new("/p/other/a.feature"),
            Path::new("/p/features"),
            Path::new("/p/gen"),
        )
        .unwrap_err();

        assert!(err.is_feature_outside_root());
    }

    #[test]
    fn detects_case_insensitive_collisions() {
        let a = (Path::new("/f/A.feature"), Path::new("/gen/A.feature.rs"));
        let b = (Path::new("/f/a.feature"), Path::new("/gen/a.feature.rs"));
        let c = (Path::new("/f/c.feature"), Path::new("/gen/c.feature.rs"));

        assert!(check_collisions([a, c]).is_ok());

        let err = check_collisions([a, b, c]).unwrap_err();
        assert!(err.is_output_path_collision());
        assert!(err.to_string().contains("/f/A.feature"));
        assert!(err.to_string().contains("/f/a.feature"));
    }

    #[test]
    fn lists_only_generated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.feature.rs"), "").unwrap();
        fs::write(dir.path().join("nested/b.feature.rs"), "").unwrap();
        fs::write(dir.path().join("keep.rs"), "").unwrap();

        let mut stale = stale_files(dir.path());
        stale.sort();

        assert_eq!(stale.len(), 2);
        assert!(stale.iter().all(|p| p.to_string_lossy().ends_with(GENERATED_SUFFIX)));
        assert!(stale_files(&dir.path().join("missing")).is_empty());
    }
}
