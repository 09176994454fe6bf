// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{config::ReporterConfig, host::Epilogue};
use gas_reporter_metadata::{RunReport, RunStats};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};
use swrite::{SWrite, swrite};

/// An [`Epilogue`] that writes a one-line summary followed by the failed tests.
#[derive(Debug)]
pub struct DisplayEpilogue<W> {
    writer: W,
    styles: Styles,
}

impl DisplayEpilogue<io::Stderr> {
    /// Creates an epilogue that writes to standard error, colorized if the configuration allows
    /// it and standard error supports color.
    pub fn stderr(config: &ReporterConfig) -> Self {
        let mut epilogue = Self::new(io::stderr());
        if !config.no_colors && supports_color::on_cached(supports_color::Stream::Stderr).is_some()
        {
            epilogue.colorize();
        }
        epilogue
    }
}

impl<W: Write> DisplayEpilogue<W> {
    /// Creates a new, uncolorized epilogue writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styles: Styles::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) -> &mut Self {
        self.styles.colorize();
        self
    }

    /// Returns the underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consumes the epilogue, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Epilogue for DisplayEpilogue<W> {
    fn render(&mut self, report: &RunReport) -> io::Result<()> {
        let stats = &report.stats;
        let summary_style = if stats.failures > 0 {
            self.styles.fail
        } else if stats.tests == 0 {
            self.styles.skip
        } else {
            self.styles.pass
        };

        write!(
            self.writer,
            "{}\n{:>12} ",
            "-".repeat(12),
            "Summary".style(summary_style)
        )?;
        write!(self.writer, "[{:>8.3}s] ", millis_to_secs(stats.duration))?;

        let tests_str = if stats.tests == 1 { "test" } else { "tests" };
        let mut summary_str = String::new();
        write_summary_str(stats, &self.styles, &mut summary_str);
        writeln!(
            self.writer,
            "{} {tests_str} run: {summary_str}",
            stats.tests.style(self.styles.count)
        )?;

        for failure in &report.failures {
            writeln!(
                self.writer,
                "{:>12} [{:>8.3}s] {}",
                "FAIL".style(self.styles.fail),
                millis_to_secs(failure.duration),
                failure.full_title
            )?;
            if let Some(message) = failure.error.message() {
                for line in message.lines() {
                    writeln!(self.writer, "{:13}{line}", "")?;
                }
            }
        }

        self.writer.flush()
    }
}

fn write_summary_str(stats: &RunStats, styles: &Styles, out: &mut String) {
    swrite!(
        out,
        "{} {}",
        stats.passes.style(styles.count),
        "passed".style(styles.pass)
    );
    if stats.failures > 0 {
        swrite!(
            out,
            ", {} {}",
            stats.failures.style(styles.count),
            "failed".style(styles.fail)
        );
    }
    if stats.pending > 0 {
        swrite!(
            out,
            ", {} {}",
            stats.pending.style(styles.count),
            "pending".style(styles.skip)
        );
    }
}

fn millis_to_secs(millis: Option<u64>) -> f64 {
    millis.unwrap_or_default() as f64 / 1000.0
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    skip: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
    }
}
