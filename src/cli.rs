// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of the `gherkin-bridge` binary.

use std::{
    borrow::Cow,
    fs,
    io::{self, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::{Args, Parser, Subcommand};
use console::Style;

use crate::{
    config::{Config, SNAPSHOT_FILE},
    error::{BridgeError, Result},
    generate::Generator,
    id::IdGenerator,
    messages::{MessageAssembler, Ndjson, Publisher},
    parser::Loader,
    registry::Registry,
    report::{self, EventLog},
};

/// Generates tests out of `.feature` files, and reports their execution as
/// Cucumber Messages.
#[derive(Clone, Debug, Parser)]
#[command(name = "gherkin-bridge", version, about)]
pub struct Opts {
    /// JSON configuration file.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increases logging verbosity. May be repeated.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Coloring policy for the console output.
    #[arg(
        long,
        global = true,
        value_name = "auto|always|never",
        default_value = "auto"
    )]
    pub color: Coloring,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Generates test files out of `.feature` files.
    Generate(Overrides),

    /// Assembles Cucumber Messages out of the host's execution records.
    Report(ReportOpts),

    /// Prints the resolved configuration snapshot.
    PrintConfig(Overrides),
}

/// Overrides of [`Config`] values.
#[derive(Args, Clone, Debug, Default)]
pub struct Overrides {
    /// Glob pattern of `.feature` files. May be repeated.
    #[arg(long = "features", value_name = "GLOB")]
    pub features: Vec<String>,

    /// Directory every `.feature` file resides under.
    #[arg(long, value_name = "DIR")]
    pub features_root: Option<PathBuf>,

    /// Directory to generate tests into.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON manifest of step and hook definitions.
    #[arg(long, value_name = "FILE")]
    pub steps: Option<PathBuf>,

    /// Tag expression selecting scenarios.
    #[arg(short, long, value_name = "tagexpr")]
    pub tags: Option<String>,

    /// Path of the world type.
    #[arg(long, value_name = "PATH")]
    pub world: Option<String>,

    /// Maximum number of `.feature` files parsed concurrently.
    #[arg(long, value_name = "int")]
    pub concurrency: Option<usize>,
}

impl Overrides {
    /// Applies these [`Overrides`] to the given [`Config`].
    #[must_use]
    pub fn apply(&self, mut config: Config) -> Config {
        if !self.features.is_empty() {
            config.features.clone_from(&self.features);
        }
        if let Some(root) = &self.features_root {
            config.features_root.clone_from(root);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(steps) = &self.steps {
            config.steps.clone_from(steps);
        }
        if self.tags.is_some() {
            config.tags.clone_from(&self.tags);
        }
        if let Some(world) = &self.world {
            config.world.clone_from(world);
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        config
    }
}

/// Options of the `report` subcommand.
#[derive(Args, Clone, Debug)]
pub struct ReportOpts {
    /// NDJSON execution records of the host. `-` reads standard input.
    #[arg(long, value_name = "FILE", default_value = "-")]
    pub records: PathBuf,

    /// File to write the messages into, instead of standard output.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Possible policies of a [`console`] output coloring.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Coloring {
    /// Letting [`console::colors_enabled()`] decide.
    #[default]
    Auto,

    /// Forcing a colored output.
    Always,

    /// Forcing a non-colored output.
    Never,
}

impl FromStr for Coloring {
    type Err = &'static str;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err("possible options: auto, always, never"),
        }
    }
}

impl Coloring {
    /// Applies this [`Coloring`] to the [`console`] output.
    pub fn apply(self) {
        let enabled = match self {
            Self::Auto => return,
            Self::Always => true,
            Self::Never => false,
        };
        console::set_colors_enabled(enabled);
        console::set_colors_enabled_stderr(enabled);
    }
}

/// [`Style`]s of the console output.
#[derive(Clone, Debug)]
pub struct Styles {
    ok: Style,
    err: Style,
    skipped: Style,
    bold: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            ok: Style::new().green().for_stderr(),
            err: Style::new().red().for_stderr(),
            skipped: Style::new().cyan().for_stderr(),
            bold: Style::new().bold().for_stderr(),
        }
    }
}

impl Styles {
    /// Colors `input` as a success.
    #[must_use]
    pub fn ok<'a>(&self, input: impl Into<Cow<'a, str>>) -> String {
        self.ok.apply_to(input.into()).to_string()
    }

    /// Colors `input` as an error.
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> String {
        self.err.apply_to(input.into()).to_string()
    }

    /// Colors `input` as a warning.
    #[must_use]
    pub fn skipped<'a>(&self, input: impl Into<Cow<'a, str>>) -> String {
        self.skipped.apply_to(input.into()).to_string()
    }

    /// Makes `input` __bold__.
    #[must_use]
    pub fn bold<'a>(&self, input: impl Into<Cow<'a, str>>) -> String {
        self.bold.apply_to(input.into()).to_string()
    }
}

/// Installs the [`tracing`] subscriber, logging to the standard error with
/// the level picked by the `verbose` count.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(console::colors_enabled_stderr())
        .with_target(false)
        .try_init();
}

/// Loads the [`Config`] from `path`, or the snapshot of the last generation
/// if `fallback_to_snapshot`, or the defaults.
///
/// # Errors
///
/// If the file exists but cannot be loaded.
pub fn load_config(path: Option<&Path>, fallback_to_snapshot: bool) -> Result<Config> {
    if let Some(path) = path {
        return Config::load(path);
    }
    if fallback_to_snapshot {
        let snapshot = Config::default().output_dir().join(SNAPSHOT_FILE);
        if snapshot.is_file() {
            tracing::debug!(path = %snapshot.display(), "using snapshot");
            return Config::load(&snapshot);
        }
    }
    Ok(Config::default())
}

/// Runs the given [`Opts`].
///
/// # Errors
///
/// On any fatal error of the subcommand.
pub async fn run(opts: Opts) -> Result<()> {
    let styles = Styles::default();

    match &opts.command {
        Command::Generate(overrides) => {
            let config = overrides.apply(load_config(opts.config.as_deref(), false)?);
            let registry = Registry::load(&config.steps_path())?;
            let summary =
                Generator::new(&config, &registry).run(IdGenerator::new()).await?;
            eprintln!("{} {summary}", styles.ok("Generated"));
        }
        Command::Report(report_opts) => {
            let config = report_opts
                .overrides
                .apply(load_config(opts.config.as_deref(), true)?);
            report(&config, report_opts, &styles).await?;
        }
        Command::PrintConfig(overrides) => {
            let config = overrides.apply(load_config(opts.config.as_deref(), false)?);
            println!("{}", config.to_snapshot());
        }
    }
    Ok(())
}

async fn report(config: &Config, opts: &ReportOpts, styles: &Styles) -> Result<()> {
    let registry = Registry::load(&config.steps_path())?;
    let ids = IdGenerator::new();
    let loaded = Loader::new(config, ids.clone()).load().await?;

    let (log, mut anomalies) = read_records(&opts.records)?;
    let mut aggregation = report::aggregate(&log);
    anomalies.append(&mut aggregation.anomalies);
    aggregation.anomalies = anomalies;

    let assembler = MessageAssembler::new(&loaded, &registry, &aggregation, ids);
    let envelopes = assembler.envelopes();

    match &opts.output {
        Some(path) => {
            let file =
                fs::File::create(path).map_err(|e| BridgeError::io(path, e))?;
            Publisher::new()
                .subscribe(Ndjson::new(io::BufWriter::new(file)))
                .publish(envelopes)
                .map_err(|e| BridgeError::io(path, e))?;
        }
        None => {
            Publisher::new()
                .subscribe(Ndjson::new(io::stdout().lock()))
                .publish(envelopes)
                .map_err(|e| BridgeError::io("<stdout>", e))?;
        }
    }

    let anomalies = assembler.anomalies().count();
    let count = format!("{} messages", envelopes.len());
    if anomalies == 0 {
        eprintln!("{} {}", styles.ok("Reported"), styles.bold(count));
    } else {
        eprintln!(
            "{} {}, {}",
            styles.ok("Reported"),
            styles.bold(count),
            styles.skipped(format!("{anomalies} anomalies")),
        );
    }
    Ok(())
}

/// Reads the NDJSON execution records at `path`, or from the standard input
/// if `path` is `-`.
fn read_records(path: &Path) -> Result<(EventLog, Vec<report::Anomaly>)> {
    let read = if path == Path::new("-") {
        EventLog::read_ndjson(io::stdin().lock())
    } else {
        let file = fs::File::open(path).map_err(|e| BridgeError::io(path, e))?;
        EventLog::read_ndjson(BufReader::new(file))
    };
    read.map_err(|e| BridgeError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let opts = Opts::try_parse_from([
            "gherkin-bridge",
            "-vv",
            "generate",
            "--tags",
            "@smoke and not @wip",
            "--features",
            "a/*.feature",
            "--features",
            "b/*.feature",
        ])
        .unwrap();

        assert_eq!(opts.verbose, 2);
        assert_eq!(opts.color, Coloring::Auto);
        let Command::Generate(o) = opts.command else {
            panic!("expected `generate`");
        };
        let config = o.apply(Config::default());
        assert_eq!(config.tags.as_deref(), Some("@smoke and not @wip"));
        assert_eq!(config.features, ["a/*.feature", "b/*.feature"]);
        assert_eq!(config.output_dir, PathBuf::from(".features-gen"));
    }

    #[test]
    fn parses_report_options() {
        let opts = Opts::try_parse_from([
            "gherkin-bridge",
            "report",
            "--records",
            "results.ndjson",
            "--color",
            "never",
        ])
        .unwrap();

        assert_eq!(opts.color, Coloring::Never);
        let Command::Report(r) = opts.command else {
            panic!("expected `report`");
        };
        assert_eq!(r.records, PathBuf::from("results.ndjson"));
        assert!(r.output.is_none());
    }

    #[test]
    fn rejects_unknown_coloring() {
        assert!("sometimes".parse::<Coloring>().is_err());
        assert_eq!("ALWAYS".parse::<Coloring>(), Ok(Coloring::Always));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(&path, r#"{"version": 1, "tags": "@fast"}"#).unwrap();

        let config = load_config(Some(&path), false).unwrap();

        assert_eq!(config.tags.as_deref(), Some("@fast"));
    }
}
