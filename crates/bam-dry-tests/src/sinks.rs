// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sinks that fail on demand.

use std::io::{self, Write};

/// In-memory sink that accepts a fixed byte budget, then fails every write.
///
/// Optionally fails on `flush` as well. Bytes accepted before the failure are
/// kept for inspection.
#[derive(Debug, Default)]
pub struct FailingSink {
    accepted: Vec<u8>,
    budget: usize,
    fail_on_flush: bool,
    flushes: usize,
}

impl FailingSink {
    /// Accept up to `budget` bytes.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    /// Accept everything, fail on flush.
    pub fn failing_flush() -> Self {
        Self {
            budget: usize::MAX,
            fail_on_flush: true,
            ..Self::default()
        }
    }

    /// Bytes accepted so far.
    pub fn accepted(&self) -> &[u8] {
        &self.accepted
    }

    /// Number of successful flushes.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.budget - self.accepted.len();
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink budget exhausted"));
        }
        let n = buf.len().min(room);
        self.accepted.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.fail_on_flush {
            return Err(io::Error::other("flush refused"));
        }
        self.flushes += 1;
        Ok(())
    }
}
