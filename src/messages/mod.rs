// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Cucumber Messages][1] assembled out of documents, definitions and an
//! [`Aggregation`].
//!
//! [`Aggregation`]: crate::report::Aggregation
//! [1]: https://github.com/cucumber/messages

pub mod assembler;
pub mod envelope;
pub mod timestamp;
pub mod writer;

#[doc(inline)]
pub use self::{
    assembler::MessageAssembler,
    envelope::{Envelope, Meta, TestStepResultStatus, PROTOCOL_VERSION},
    timestamp::{Duration, Timestamp},
    writer::{Ndjson, Publisher, Writer},
};
