// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces implemented by the host test framework.
//!
//! The reporter never inherits framework plumbing. Instead, the host hands it small capabilities:
//! test handles ([`TestHandle`]), run statistics and result delivery ([`RunHost`]), a summary
//! footer ([`Epilogue`]), and optionally a place to install plugin hooks ([`Attachments`]).

mod test_node;
mod value;

pub use test_node::*;
pub use value::*;

use crate::watcher::RecordTransactionHook;
use camino::Utf8PathBuf;
use gas_reporter_metadata::{RunReport, RunStats, Speed};
use std::{io, time::Duration};

/// A live handle to a test owned by the host framework.
///
/// Handles are accumulated as lifecycle events arrive and only read when the run ends, so every
/// accessor must reflect the test's state at the time it is called.
pub trait TestHandle {
    /// Returns a key identifying this test for the duration of the run.
    fn key(&self) -> TestKey;

    /// Returns the title of the test.
    fn title(&self) -> String;

    /// Returns the title prefixed by the titles of every enclosing suite.
    fn full_title(&self) -> String;

    /// Returns the file the test was defined in.
    fn file(&self) -> Option<Utf8PathBuf>;

    /// Returns how long the test took, if it ran.
    fn duration(&self) -> Option<Duration>;

    /// Returns the current retry attempt, starting from 0.
    fn current_retry(&self) -> u32;

    /// Returns the speed classification, if the test ran.
    fn speed(&self) -> Option<Speed>;

    /// Returns the value the test failed with, if any.
    fn error(&self) -> Option<HostValue>;
}

/// Identifies a test within a run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TestKey(u64);

impl TestKey {
    /// Creates a new key.
    pub fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the raw key.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Run-level capabilities of the host framework.
pub trait RunHost {
    /// Returns the framework's own statistics for the run, if it keeps them.
    ///
    /// If this returns `None`, the reporter's own counters are used instead.
    fn stats(&self) -> Option<RunStats> {
        None
    }

    /// Receives the final report, for in-process consumers such as a calling harness.
    fn attach_results(&mut self, report: &RunReport);
}

/// The host's facility for rendering a human-readable summary after the report is written.
pub trait Epilogue {
    /// Renders the summary for a finished run.
    fn render(&mut self, report: &RunReport) -> io::Result<()>;
}

/// A place where the reporter can expose hooks to other plugins.
pub trait Attachments {
    /// Installs the `recordTransaction` hook.
    ///
    /// Calling the hook feeds a transaction observation into the same accounting pipeline the
    /// reporter uses.
    fn install_record_transaction(&mut self, hook: RecordTransactionHook);
}
