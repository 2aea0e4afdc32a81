// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of the crate, organized by domain.
//!
//! - [`core`] - Top-level [`BridgeError`] and [`Result`].
//! - [`config`] - Configuration and validation errors.
//! - [`parse`] - `.feature` file parsing errors.
//! - [`resolution`] - Undefined and ambiguous steps.
//!
//! Reporting never fails with these: anomalies of execution telemetry are
//! collected as [`report::Anomaly`] values instead.
//!
//! [`report::Anomaly`]: crate::report::Anomaly

pub mod config;
pub mod core;
pub mod parse;
pub mod resolution;

pub use self::{
    config::{ConfigError, ConfigResult},
    core::{BridgeError, Result},
    parse::{ParseError, ParseErrors},
    resolution::{
        AmbiguousStep, ResolutionError, ResolutionErrors, UndefinedStep,
        UnrepresentableArgument,
    },
};
