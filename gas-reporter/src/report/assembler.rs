// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    correlator::Outcome,
    errors::WriteReportError,
    host::{Epilogue, RunHost, TestHandle},
    sanitize::clean,
    watcher::GasReportAggregator,
};
use debug_ignore::DebugIgnore;
use gas_reporter_metadata::{RunReport, RunStats};
use serde_json::Value;
use std::io::{self, Write};
use tracing::debug;

/// Raw test handles accumulated over a run, in event order.
#[derive(Clone, Debug)]
pub struct RunBuffers<T> {
    /// Every test that ended, whatever its outcome.
    pub tests: Vec<T>,

    /// Tests classified as pending.
    pub pending: Vec<T>,

    /// Tests (and hooks) classified as failed.
    pub failures: Vec<T>,

    /// Tests classified as passed.
    pub passes: Vec<T>,
}

impl<T> RunBuffers<T> {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self {
            tests: Vec::new(),
            pending: Vec::new(),
            failures: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Returns the bucket for an outcome.
    pub fn bucket(&self, outcome: Outcome) -> &[T] {
        match outcome {
            Outcome::Pending => &self.pending,
            Outcome::Pass => &self.passes,
            Outcome::Fail => &self.failures,
        }
    }

    pub(crate) fn bucket_mut(&mut self, outcome: Outcome) -> &mut Vec<T> {
        match outcome {
            Outcome::Pending => &mut self.pending,
            Outcome::Pass => &mut self.passes,
            Outcome::Fail => &mut self.failures,
        }
    }
}

impl<T> Default for RunBuffers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the [`RunReport`] at the end of a run and emits it.
///
/// Emitting a report:
///
/// 1. asks the aggregator for the gas report, passing the watcher's data;
/// 2. sanitizes every accumulated test handle, preserving order;
/// 3. attaches the report to the host;
/// 4. serializes it in full, then writes it to the output in a single write;
/// 5. renders the epilogue.
#[derive(Debug)]
pub struct ReportAssembler {
    aggregator: DebugIgnore<Box<dyn GasReportAggregator>>,
    host: DebugIgnore<Box<dyn RunHost>>,
    epilogue: DebugIgnore<Box<dyn Epilogue>>,
    output: DebugIgnore<Box<dyn Write>>,
}

impl ReportAssembler {
    /// Creates a new assembler that writes the report to standard output.
    pub fn new(
        aggregator: impl GasReportAggregator + 'static,
        host: impl RunHost + 'static,
        epilogue: impl Epilogue + 'static,
    ) -> Self {
        Self {
            aggregator: DebugIgnore(Box::new(aggregator)),
            host: DebugIgnore(Box::new(host)),
            epilogue: DebugIgnore(Box::new(epilogue)),
            output: DebugIgnore(Box::new(io::stdout())),
        }
    }

    /// Sets the stream the report is written to.
    pub fn set_output(&mut self, output: impl Write + 'static) -> &mut Self {
        self.output = DebugIgnore(Box::new(output));
        self
    }

    /// Assembles and emits the report.
    ///
    /// `fallback_stats` is used if the host does not keep its own statistics. If serialization
    /// fails, nothing is written.
    pub fn assemble<T: TestHandle>(
        &mut self,
        buffers: &RunBuffers<T>,
        watcher_data: &Value,
        fallback_stats: RunStats,
    ) -> Result<RunReport, WriteReportError> {
        let gas_report = self.aggregator.build_report(watcher_data);
        let stats = self.host.stats().unwrap_or(fallback_stats);

        let report = RunReport {
            stats,
            tests: buffers.tests.iter().map(clean).collect(),
            pending: buffers.pending.iter().map(clean).collect(),
            failures: buffers.failures.iter().map(clean).collect(),
            passes: buffers.passes.iter().map(clean).collect(),
            gas_report,
        };
        self.host.attach_results(&report);

        let json = serde_json::to_string_pretty(&report).map_err(WriteReportError::Serialize)?;
        self.output
            .write_all(json.as_bytes())
            .map_err(WriteReportError::Io)?;
        self.output.flush().map_err(WriteReportError::Io)?;
        debug!(
            tests = report.tests.len(),
            bytes = json.len(),
            "wrote run report"
        );

        self.epilogue
            .render(&report)
            .map_err(WriteReportError::Epilogue)?;
        Ok(report)
    }
}
