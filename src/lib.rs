// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bridge between [Gherkin] `.feature` files and a host test framework.
//!
//! It works in two directions:
//! - __Generation__: `.feature` files are compiled into [`Pickle`]s, whose
//!   steps are matched against a [`Registry`] of step definitions, and a
//!   [`Generator`] emits one test source file per `.feature` file.
//! - __Reporting__: execution records of the host are collected into an
//!   [`EventLog`], [`aggregate`]d into test cases, and a
//!   [`MessageAssembler`] turns them into [Cucumber Messages].
//!
//! ```rust,no_run
//! # use gherkin_bridge::{Config, Generator, IdGenerator, Registry};
//! # futures::executor::block_on(async {
//! let config = Config::default();
//! let registry = Registry::load(&config.steps_path())?;
//! let summary = Generator::new(&config, &registry)
//!     .run(IdGenerator::new())
//!     .await?;
//! println!("{summary}");
//! # Ok::<_, gherkin_bridge::error::BridgeError>(())
//! # });
//! ```
//!
//! [Cucumber Messages]: https://github.com/cucumber/messages
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    clippy::all,
    missing_debug_implementations,
    unused_import_braces,
    unused_qualifications
)]

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod hook;
pub mod id;
pub mod messages;
pub mod parser;
pub mod pickle;
pub mod registry;
pub mod report;
pub mod step;
pub mod tag;

#[doc(inline)]
pub use self::{
    config::Config,
    document::Document,
    error::{BridgeError, Result},
    generate::{GenerationSummary, Generator},
    hook::HookKind,
    id::IdGenerator,
    messages::{Envelope, MessageAssembler},
    parser::{Loaded, Loader},
    pickle::Pickle,
    registry::Registry,
    report::{aggregate, Aggregation, EventLog},
    step::Pattern,
    tag::TagExpression,
};
