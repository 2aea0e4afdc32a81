// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Discovery and parsing of `.feature` files into [`Document`]s and
//! [`Pickle`]s.

pub mod basic;

use std::{
    path::{Path, PathBuf},
    thread,
};

use futures::{channel::oneshot, stream, StreamExt as _};

use crate::{
    config::Config,
    document::Document,
    error::{ParseError, ParseErrors, Result},
    id::IdGenerator,
    pickle::{self, Pickle},
};

#[doc(inline)]
pub use self::basic::Basic;

/// Raw result of parsing a single `.feature` file.
#[derive(Clone, Debug)]
pub struct Parsed {
    /// Source text of the file.
    pub source: String,

    /// Parsed [`gherkin::Feature`].
    pub feature: gherkin::Feature,
}

/// Source of parsed `.feature` files.
///
/// Must be safe to call concurrently for different paths.
pub trait Parser {
    /// Parses the `.feature` file at the given `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not valid Gherkin.
    fn parse(&self, path: &Path) -> std::result::Result<Parsed, ParseError>;
}

/// Every [`Document`] and [`Pickle`] of a project.
#[derive(Clone, Debug, Default)]
pub struct Loaded {
    /// [`Document`]s, ordered by URI.
    pub documents: Vec<Document>,

    /// [`Pickle`]s, ordered by [`Document`] and then by source position.
    pub pickles: Vec<Pickle>,
}

impl Loaded {
    /// Returns the [`Document`] with the given `uri`, if any.
    #[must_use]
    pub fn document(&self, uri: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.uri == uri)
    }

    /// Returns the [`Pickle`]s compiled from the [`Document`] with the given
    /// `uri`.
    pub fn pickles_of<'s>(
        &'s self,
        uri: &'s str,
    ) -> impl Iterator<Item = &'s Pickle> + 's {
        self.pickles.iter().filter(move |p| p.uri == uri)
    }

    /// Returns the [`Pickle`] of the given `uri` located at the given `line`.
    #[must_use]
    pub fn pickle_at(&self, uri: &str, line: usize) -> Option<&Pickle> {
        self.pickles
            .iter()
            .find(|p| p.uri == uri && p.location.line == line)
    }
}

/// Loader of a project's `.feature` files.
#[derive(Clone, Debug)]
pub struct Loader<P = Basic> {
    parser: P,
    base_dir: PathBuf,
    patterns: Vec<String>,
    concurrency: usize,
    ids: IdGenerator,
}

impl Loader {
    /// Creates a [`Loader`] of the `.feature` files described by the given
    /// [`Config`], assigning IDs from the given [`IdGenerator`].
    #[must_use]
    pub fn new(config: &Config, ids: IdGenerator) -> Self {
        Self {
            parser: Basic,
            base_dir: config.base_dir.clone(),
            patterns: config.features.clone(),
            concurrency: config.concurrency,
            ids,
        }
    }
}

impl<P: Parser> Loader<P> {
    /// Replaces the [`Parser`] of this [`Loader`].
    #[must_use]
    pub fn with_parser<Q: Parser>(self, parser: Q) -> Loader<Q> {
        Loader {
            parser,
            base_dir: self.base_dir,
            patterns: self.patterns,
            concurrency: self.concurrency,
            ids: self.ids,
        }
    }

    /// Discovers the `.feature` files.
    ///
    /// # Errors
    ///
    /// If the patterns are malformed, or match nothing.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        Ok(basic::discover(&self.base_dir, &self.patterns)?)
    }

    /// Discovers and parses every `.feature` file, then compiles them into
    /// [`Pickle`]s.
    ///
    /// Up to [`Config::concurrency`] files are read and parsed in parallel,
    /// each on its own thread. IDs are assigned only once all of them are
    /// parsed and sorted by URI, so the output is deterministic.
    ///
    /// # Errors
    ///
    /// - If no files are found.
    /// - With every [`ParseError`] at once, if any file fails to parse.
    pub async fn load(&self) -> Result<Loaded>
    where
        P: Clone + Send + 'static,
    {
        let paths = self.discover()?;

        let results = stream::iter(paths)
            .map(|path| self.parse_on_thread(path))
            .buffer_unordered(self.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut errors = Vec::new();
        let mut parsed = Vec::new();
        for (path, res) in results {
            match res {
                Ok(p) => parsed.push((self.uri_of(&path), path, p)),
                Err(e) => errors.push(e),
            }
        }
        parsed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut loaded = Loaded::default();
        for (uri, path, Parsed { source, feature }) in parsed {
            let doc = Document::new(uri, path, source, &feature, &self.ids);
            match pickle::compile(&doc, &self.ids) {
                Ok(pickles) => loaded.pickles.extend(pickles),
                Err(e) => errors.push(e),
            }
            loaded.documents.push(doc);
        }

        if !errors.is_empty() {
            errors.sort_by(|a, b| a.path.cmp(&b.path));
            return Err(ParseErrors(errors).into());
        }

        tracing::info!(
            documents = loaded.documents.len(),
            pickles = loaded.pickles.len(),
            "loaded features",
        );
        Ok(loaded)
    }

    /// Parses the file at `path` on a dedicated thread.
    ///
    /// The thread is spawned on the first poll only.
    async fn parse_on_thread(
        &self,
        path: PathBuf,
    ) -> (PathBuf, std::result::Result<Parsed, ParseError>)
    where
        P: Clone + Send + 'static,
    {
        let parser = self.parser.clone();
        let (sender, receiver) = oneshot::channel();
        let thread_path = path.clone();
        let spawned = thread::Builder::new()
            .name("feature-parser".into())
            .spawn(move || {
                _ = sender.send(parser.parse(&thread_path));
            });

        let parsed = match spawned {
            Ok(_) => receiver.await.unwrap_or_else(|_| {
                Err(ParseError::new(path.clone(), "parser thread panicked"))
            }),
            Err(e) => Err(ParseError::new(path.clone(), e)),
        };
        tracing::trace!(path = %path.display(), ok = parsed.is_ok(), "parsed");
        (path, parsed)
    }

    /// Stable URI of the file at `path`: relative to the base directory, with
    /// `/` separators.
    fn uri_of(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.base_dir).unwrap_or(path);
        rel.components()
            .filter_map(|c| match c {
                std::path::Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use super::*;

    /// [`Basic`] parser tracking the peak number of parallel parses.
    #[derive(Clone, Debug, Default)]
    struct Tracking {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Parser for Tracking {
        fn parse(
            &self,
            path: &Path,
        ) -> std::result::Result<Parsed, ParseError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            _ = self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            let parsed = Basic.parse(path);
            _ = self.active.fetch_sub(1, Ordering::SeqCst);
            parsed
        }
    }

    fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = Config { base_dir: dir.path().into(), ..Config::default() };
        (dir, config)
    }

    #[tokio::test]
    async fn loads_documents_sorted_by_uri() {
        let (_dir, config) = project(&[
            ("features/b.feature", "Feature: B\n  Scenario: b\n    Given b\n"),
            ("features/a.feature", "Feature: A\n  Scenario: a\n    Given a\n"),
        ]);

        let loaded = Loader::new(&config, IdGenerator::new()).load().await.unwrap();

        let uris = loaded.documents.iter().map(|d| d.uri.as_str()).collect::<Vec<_>>();
        assert_eq!(uris, ["features/a.feature", "features/b.feature"]);
        assert_eq!(loaded.pickles[0].uri, "features/a.feature");
        assert!(loaded.pickle_at("features/b.feature", 2).is_some());
        assert_eq!(loaded.pickles_of("features/a.feature").count(), 1);
    }

    #[tokio::test]
    async fn ids_are_deterministic() {
        let (_dir, config) = project(&[
            ("features/b.feature", "Feature: B\n  Scenario: b\n    Given b\n"),
            ("features/a.feature", "Feature: A\n  Scenario: a\n    Given a\n"),
        ]);

        let first = Loader::new(&config, IdGenerator::new()).load().await.unwrap();
        let second = Loader::new(&config, IdGenerator::new()).load().await.unwrap();

        let ids = |l: &Loaded| l.pickles.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn parses_in_parallel_up_to_concurrency() {
        let (_dir, config) = project(&[
            ("features/a.feature", "Feature: A\n  Scenario: a\n    Given a\n"),
            ("features/b.feature", "Feature: B\n  Scenario: b\n    Given b\n"),
            ("features/c.feature", "Feature: C\n  Scenario: c\n    Given c\n"),
            ("features/d.feature", "Feature: D\n  Scenario: d\n    Given d\n"),
        ]);
        let config = Config { concurrency: 2, ..config };
        let parser = Tracking::default();

        let loaded = Loader::new(&config, IdGenerator::new())
            .with_parser(parser.clone())
            .load()
            .await
            .unwrap();

        assert_eq!(loaded.documents.len(), 4);
        assert_eq!(parser.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn collects_every_parse_error() {
        let (_dir, config) = project(&[
            ("features/ok.feature", "Feature: A\n  Scenario: a\n    Given a\n"),
            ("features/bad1.feature", "This is not Gherkin\n"),
            ("features/bad2.feature", "Nope\n"),
        ]);

        let err = Loader::new(&config, IdGenerator::new()).load().await.unwrap_err();

        let crate::error::BridgeError::Parse(errs) = err else {
            panic!("expected parse errors, got {err}");
        };
        assert_eq!(errs.len(), 2);
    }
}
