// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Generation of host test files out of [`Pickle`]s.
//!
//! Generation is split into [`Generator::plan()`], which performs every
//! check and renders every file in memory, and [`Generator::write()`], which
//! touches the file system. Nothing is written unless the whole plan
//! succeeds.
//!
//! [`Pickle`]: crate::pickle::Pickle

pub mod assembler;
pub mod emitter;
pub mod path;
pub mod summary;
pub mod unit;

use std::{collections::HashSet, fs, path::PathBuf, time::Instant};

use itertools::Itertools as _;

use crate::{
    config::Config,
    error::{BridgeError, ConfigResult, Result},
    id::IdGenerator,
    parser::{Loaded, Loader},
    registry::Registry,
};

#[doc(inline)]
pub use self::{
    assembler::{Assembled, Assembler, IGNORE_TAGS},
    emitter::{Emitter, RustEmitter},
    path::GENERATED_SUFFIX,
    summary::GenerationSummary,
    unit::{AppliedHooks, Resolution, ResolvedStep, TestUnit},
};

/// Single rendered test file.
#[derive(Clone, Debug)]
pub struct GeneratedFile {
    /// Output path.
    pub path: PathBuf,

    /// URI of the source `.feature` file.
    pub uri: String,

    /// Number of tests in the file.
    pub units: usize,

    /// Rendered source code.
    pub contents: String,
}

/// Every file of a generation pass, rendered but not written yet.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    /// Files to write, in [`Document`] order.
    ///
    /// [`Document`]: crate::document::Document
    pub files: Vec<GeneratedFile>,

    /// Number of generated tests.
    pub units: usize,

    /// Number of pickles excluded by the tag filter.
    pub excluded: usize,

    /// Number of generated tests skipped by the host framework.
    pub ignored: usize,
}

/// Generator of host test files.
#[derive(Clone, Debug)]
pub struct Generator<'a, E = RustEmitter> {
    config: &'a Config,
    registry: &'a Registry,
    emitter: E,
}

impl<'a> Generator<'a> {
    /// Creates a new [`Generator`] rendering plain `#[test]` functions.
    #[must_use]
    pub fn new(config: &'a Config, registry: &'a Registry) -> Self {
        Self { config, registry, emitter: RustEmitter::new(&config.world) }
    }
}

impl<'a, E: Emitter> Generator<'a, E> {
    /// Replaces the [`Emitter`] of this [`Generator`].
    #[must_use]
    pub fn with_emitter<F: Emitter>(self, emitter: F) -> Generator<'a, F> {
        Generator { config: self.config, registry: self.registry, emitter }
    }

    /// Checks and renders every test file of the `loaded` project.
    ///
    /// [`Document`]s without any included pickle produce no file.
    ///
    /// # Errors
    ///
    /// - If a `.feature` file lies outside of the features root.
    /// - If two `.feature` files map to the same output path.
    /// - If the tag filter is malformed.
    /// - With every undefined and ambiguous step at once.
    ///
    /// [`Document`]: crate::document::Document
    pub fn plan(&self, loaded: &Loaded) -> Result<Plan> {
        let (root, out_dir) =
            (self.config.features_root(), self.config.output_dir());

        let outputs = loaded
            .documents
            .iter()
            .map(|d| path::output_path(&d.path, &root, &out_dir).map(|p| (d, p)))
            .collect::<ConfigResult<Vec<_>>>()?;
        path::check_collisions(
            outputs.iter().map(|(d, p)| (d.path.as_path(), p.as_path())),
        )?;

        let filter = self.config.tag_filter()?;
        let Assembled { units, excluded } =
            Assembler::new(self.registry, filter.as_ref())
                .assemble_all(&loaded.pickles)?;

        let mut plan = Plan {
            units: units.len(),
            ignored: units.iter().filter(|u| u.ignored).count(),
            excluded,
            ..Plan::default()
        };

        let mut by_uri = units.into_iter().into_group_map_by(|u| u.pickle.uri.clone());
        for (doc, path) in outputs {
            let Some(units) = by_uri.remove(&doc.uri) else {
                tracing::debug!(uri = %doc.uri, "no tests to generate");
                continue;
            };
            plan.files.push(GeneratedFile {
                contents: self.emitter.emit(doc, &units),
                units: units.len(),
                uri: doc.uri.clone(),
                path,
            });
        }
        Ok(plan)
    }

    /// Writes the files of the given [`Plan`], removes previously generated
    /// files it doesn't contain, and saves the [`Config`] snapshot.
    ///
    /// # Errors
    ///
    /// On any file system failure.
    pub fn write(&self, plan: &Plan) -> Result<GenerationSummary> {
        let planned = plan.files.iter().map(|f| &f.path).collect::<HashSet<_>>();

        let mut removed = 0;
        for stale in path::stale_files(&self.config.output_dir()) {
            if !planned.contains(&path::normalize(&stale)) {
                fs::remove_file(&stale).map_err(|e| BridgeError::io(&stale, e))?;
                tracing::debug!(path = %stale.display(), "removed stale file");
                removed += 1;
            }
        }

        for file in &plan.files {
            if let Some(dir) = file.path.parent() {
                fs::create_dir_all(dir).map_err(|e| BridgeError::io(dir, e))?;
            }
            fs::write(&file.path, &file.contents)
                .map_err(|e| BridgeError::io(&file.path, e))?;
            tracing::debug!(
                path = %file.path.display(),
                tests = file.units,
                "generated",
            );
        }

        _ = self.config.save_snapshot()?;

        Ok(GenerationSummary {
            files: plan.files.iter().map(|f| f.path.clone()).collect(),
            units: plan.units,
            excluded: plan.excluded,
            ignored: plan.ignored,
            removed,
            elapsed: Default::default(),
        })
    }

    /// Loads, plans and writes the whole project.
    ///
    /// # Errors
    ///
    /// See [`Loader::load()`], [`Generator::plan()`] and
    /// [`Generator::write()`].
    pub async fn run(&self, ids: IdGenerator) -> Result<GenerationSummary> {
        let started = Instant::now();
        let loaded = Loader::new(self.config, ids).load().await?;
        let plan = self.plan(&loaded)?;
        let mut summary = self.write(&plan)?;
        summary.elapsed = started.elapsed();
        tracing::info!(%summary, "generation finished");
        Ok(summary)
    }
}
