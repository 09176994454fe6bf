// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Outcome;
use chrono::{DateTime, FixedOffset, Local};
use gas_reporter_metadata::RunStats;

/// Keeps framework-style run statistics for hosts that don't keep their own.
///
/// Suites are not observed, so `suites` stays at 0.
#[derive(Debug, Default)]
pub(super) struct StatsTracker {
    stats: RunStats,
}

impl StatsTracker {
    pub(super) fn start(&mut self) {
        self.start_at(Local::now().fixed_offset());
    }

    fn start_at(&mut self, start: DateTime<FixedOffset>) {
        self.stats.start = Some(start);
    }

    pub(super) fn record_test_end(&mut self) {
        self.stats.tests += 1;
    }

    pub(super) fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Pending => self.stats.pending += 1,
            Outcome::Pass => self.stats.passes += 1,
            Outcome::Fail => self.stats.failures += 1,
        }
    }

    pub(super) fn finish(&mut self) -> RunStats {
        self.finish_at(Local::now().fixed_offset())
    }

    fn finish_at(&mut self, end: DateTime<FixedOffset>) -> RunStats {
        self.stats.end = Some(end);
        self.stats.duration = self.stats.start.map(|start| {
            u64::try_from((end - start).num_milliseconds()).unwrap_or_default()
        });
        self.stats.clone()
    }
}
