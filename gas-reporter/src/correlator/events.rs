// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ReporterError;
use std::fmt;

/// The kind of a lifecycle event emitted by the host framework.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LifecycleEventKind {
    /// The run started.
    RunBegin,

    /// A test started.
    TestBegin,

    /// A hook finished.
    HookEnd,

    /// A test finished, whatever its outcome.
    TestEnd,

    /// A test was skipped.
    TestPending,

    /// A test passed.
    TestPass,

    /// A test, or a hook outside a test, failed.
    TestFail,

    /// The run finished.
    RunEnd,
}

impl LifecycleEventKind {
    /// Every event kind, in the order the correlator binds them.
    pub const STANDARD_ORDER: [Self; 8] = [
        Self::RunBegin,
        Self::TestEnd,
        Self::TestPending,
        Self::TestBegin,
        Self::HookEnd,
        Self::TestPass,
        Self::TestFail,
        Self::RunEnd,
    ];

    /// Returns the name of this event kind, e.g. `run-begin`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunBegin => "run-begin",
            Self::TestBegin => "test-begin",
            Self::HookEnd => "hook-end",
            Self::TestEnd => "test-end",
            Self::TestPending => "test-pending",
            Self::TestPass => "test-pass",
            Self::TestFail => "test-fail",
            Self::RunEnd => "run-end",
        }
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome a test was classified with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Outcome {
    /// The test was skipped.
    Pending,

    /// The test passed.
    Pass,

    /// The test failed.
    Fail,
}

impl Outcome {
    /// Returns the event kind that reports this outcome.
    pub fn event_kind(self) -> LifecycleEventKind {
        match self {
            Outcome::Pending => LifecycleEventKind::TestPending,
            Outcome::Pass => LifecycleEventKind::TestPass,
            Outcome::Fail => LifecycleEventKind::TestFail,
        }
    }
}

/// A lifecycle event, borrowing the test handle it is about.
#[derive(Debug)]
pub enum LifecycleEvent<'a, T> {
    /// The run started.
    RunBegin,

    /// A test started.
    TestBegin {
        /// The test.
        test: &'a T,
    },

    /// A hook finished.
    HookEnd {
        /// The hook's title, e.g. `"before each" hook: deploy`.
        title: &'a str,
    },

    /// A test finished.
    TestEnd {
        /// The test.
        test: &'a T,
    },

    /// A test was classified.
    Outcome {
        /// The outcome.
        outcome: Outcome,

        /// The test.
        test: &'a T,
    },

    /// The run finished.
    RunEnd,
}

impl<T> LifecycleEvent<'_, T> {
    /// Returns the kind of this event.
    pub fn kind(&self) -> LifecycleEventKind {
        match self {
            LifecycleEvent::RunBegin => LifecycleEventKind::RunBegin,
            LifecycleEvent::TestBegin { .. } => LifecycleEventKind::TestBegin,
            LifecycleEvent::HookEnd { .. } => LifecycleEventKind::HookEnd,
            LifecycleEvent::TestEnd { .. } => LifecycleEventKind::TestEnd,
            LifecycleEvent::Outcome { outcome, .. } => outcome.event_kind(),
            LifecycleEvent::RunEnd => LifecycleEventKind::RunEnd,
        }
    }
}

// Derived Clone and Copy would require `T: Clone`, but only references are held.
impl<T> Clone for LifecycleEvent<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LifecycleEvent<'_, T> {}

/// The capabilities a lifecycle listener provides, one per event.
///
/// Handlers run synchronously in the order the host emits events, and must finish before the
/// next event is delivered. An error aborts the run.
pub trait LifecycleListener<T> {
    /// Handles the start of the run.
    fn on_run_begin(&mut self) -> Result<(), ReporterError>;

    /// Handles the start of a test.
    fn on_test_begin(&mut self, test: &T) -> Result<(), ReporterError>;

    /// Handles the end of a hook.
    fn on_hook_end(&mut self, title: &str) -> Result<(), ReporterError>;

    /// Handles the end of a test.
    fn on_test_end(&mut self, test: &T) -> Result<(), ReporterError>;

    /// Handles a test being classified as pending, passed or failed.
    fn on_outcome(&mut self, outcome: Outcome, test: &T) -> Result<(), ReporterError>;

    /// Handles the end of the run.
    fn on_run_end(&mut self) -> Result<(), ReporterError>;
}
