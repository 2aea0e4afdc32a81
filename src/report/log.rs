// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Append-only [`EventLog`] of [`HostRecord`]s, and the channels filling it.

use std::io::{self, BufRead};

use futures::{channel::mpsc, StreamExt as _};

use super::{anomaly::Anomaly, event::HostRecord};

/// Append-only log of [`HostRecord`]s, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    records: Vec<HostRecord>,
}

impl EventLog {
    /// Creates a new empty [`EventLog`].
    #[must_use]
    pub const fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Creates a channel whose [`EventSink`]s fill an [`EventLog`] once
    /// [`EventReceiver::collect()`]ed.
    #[must_use]
    pub fn channel() -> (EventSink, EventReceiver) {
        let (tx, rx) = mpsc::unbounded();
        (EventSink(tx), EventReceiver(rx))
    }

    /// Appends the given `record`.
    pub fn push(&mut self, record: impl Into<HostRecord>) {
        self.records.push(record.into());
    }

    /// Returns all the records, in arrival order.
    #[must_use]
    pub fn records(&self) -> &[HostRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Indicates whether no record was appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reads NDJSON [`HostRecord`]s, one per line.
    ///
    /// Blank lines are skipped. Lines failing to parse are reported as
    /// [`Anomaly::MalformedRecord`]s.
    ///
    /// # Errors
    ///
    /// If reading fails.
    pub fn read_ndjson<R: BufRead>(reader: R) -> io::Result<(Self, Vec<Anomaly>)> {
        let mut log = Self::new();
        let mut anomalies = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HostRecord>(&line) {
                Ok(rec) => log.push(rec),
                Err(e) => Anomaly::MalformedRecord {
                    line: n + 1,
                    reason: e.to_string(),
                }
                .record(&mut anomalies),
            }
        }
        tracing::debug!(records = log.len(), "read host records");
        Ok((log, anomalies))
    }
}

impl Extend<HostRecord> for EventLog {
    fn extend<T: IntoIterator<Item = HostRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

/// Cloneable sender of [`HostRecord`]s, one per worker.
#[derive(Clone, Debug)]
pub struct EventSink(mpsc::UnboundedSender<HostRecord>);

impl EventSink {
    /// Sends the given `record`.
    ///
    /// Returns `false` if the [`EventReceiver`] is gone.
    pub fn send(&self, record: impl Into<HostRecord>) -> bool {
        self.0.unbounded_send(record.into()).is_ok()
    }
}

/// Receiving half of [`EventLog::channel()`].
#[derive(Debug)]
pub struct EventReceiver(mpsc::UnboundedReceiver<HostRecord>);

impl EventReceiver {
    /// Waits for every [`EventSink`] to be dropped, and returns the
    /// [`EventLog`] of everything they sent.
    pub async fn collect(self) -> EventLog {
        let mut log = EventLog::new();
        log.extend(self.0.collect::<Vec<_>>().await);
        log
    }
}
