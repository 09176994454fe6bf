// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for a gas-reporting test reporter.
//!
//! A host test framework drives an [`EventCorrelator`](correlator::EventCorrelator) with its
//! lifecycle events, synchronously and in order. The correlator keeps track of the ledger block
//! window belonging to the running test, so that a transaction watcher can attribute gas usage to
//! the right test, and classifies test outcomes. When the run ends, a
//! [`ReportAssembler`](report::ReportAssembler) sanitizes every recorded test into a plain
//! record, merges in the gas report, and writes a single JSON document.
//!
//! The output format is defined in the `gas-reporter-metadata` crate.

pub mod config;
pub mod correlator;
pub mod errors;
pub mod host;
pub mod ledger;
pub mod report;
pub mod sanitize;
#[cfg(test)]
mod test_helpers;
pub mod watcher;
