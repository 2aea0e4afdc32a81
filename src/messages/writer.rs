// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Output boundary of [`Envelope`]s.

use std::io;

use super::envelope::Envelope;

/// Subscriber to assembled [`Envelope`]s.
pub trait Writer {
    /// Handles the given [`Envelope`].
    ///
    /// # Errors
    ///
    /// If the output fails.
    fn write(&mut self, envelope: &Envelope) -> io::Result<()>;

    /// Called once the last [`Envelope`] was written.
    ///
    /// # Errors
    ///
    /// If the output fails.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// [`Writer`] of [NDJSON][1]: one [`Envelope`] per line.
///
/// [1]: https://github.com/ndjson/ndjson-spec
#[derive(Clone, Debug)]
pub struct Ndjson<Out: io::Write> {
    output: Out,
}

impl<Out: io::Write> Ndjson<Out> {
    /// Creates a new [`Ndjson`] [`Writer`] outputting into the given `output`.
    #[must_use]
    pub const fn new(output: Out) -> Self {
        Self { output }
    }

    /// Returns the wrapped output.
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }
}

impl<Out: io::Write> Writer for Ndjson<Out> {
    fn write(&mut self, envelope: &Envelope) -> io::Result<()> {
        serde_json::to_writer(&mut self.output, envelope)?;
        self.output.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// Fan-out of [`Envelope`]s to every subscribed [`Writer`].
#[derive(Default)]
pub struct Publisher<'w> {
    subscribers: Vec<Box<dyn Writer + 'w>>,
}

impl<'w> Publisher<'w> {
    /// Creates a new [`Publisher`] without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given [`Writer`] as a subscriber.
    #[must_use]
    pub fn subscribe(mut self, writer: impl Writer + 'w) -> Self {
        self.subscribers.push(Box::new(writer));
        self
    }

    /// Writes every [`Envelope`] to every subscriber, in order, then
    /// finishes them.
    ///
    /// # Errors
    ///
    /// On the first failing subscriber.
    pub fn publish(&mut self, envelopes: &[Envelope]) -> io::Result<()> {
        for env in envelopes {
            for sub in &mut self.subscribers {
                sub.write(env)?;
            }
        }
        for sub in &mut self.subscribers {
            sub.finish()?;
        }
        tracing::debug!(
            envelopes = envelopes.len(),
            subscribers = self.subscribers.len(),
            "published messages",
        );
        Ok(())
    }
}

impl std::fmt::Debug for Publisher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
