// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators that record and account for gas usage.
//!
//! The reporter decides *when* transactions belong to a test; these collaborators decide what a
//! transaction costs and how costs are tabulated. Neither schema is interpreted here: watcher
//! data and gas reports pass through as opaque JSON.

use crate::config::ReporterConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{cell::RefCell, rc::Rc};

/// Records transactions and aggregates their gas usage over a run.
pub trait TransactionWatcher {
    /// Prepares watcher state for a new run.
    fn initialize(&mut self, config: &ReporterConfig);

    /// Clears the per-test address and lookup cache.
    fn reset_address_cache(&mut self);

    /// Records a transaction observation.
    ///
    /// `attribution_floor` is the first block whose transactions belong to the current test, or
    /// `None` if block numbers are not being tracked (for instance with a simulated provider).
    fn record_transaction(&mut self, tx: TransactionObservation, attribution_floor: Option<u64>);

    /// Returns the data accumulated so far, for the aggregator.
    fn aggregated_data(&self) -> Value;
}

/// A watcher shared between the correlator and any installed plugin hooks.
pub type SharedWatcher = Rc<RefCell<dyn TransactionWatcher>>;

/// Builds the accounting report at the end of a run.
pub trait GasReportAggregator {
    /// Produces the gas report from the watcher's accumulated data.
    fn build_report(&mut self, watcher_data: &Value) -> Value;
}

/// Looks up gas and currency prices used by the aggregator.
///
/// Lookups are started once when the reporter is built and are never awaited. If they have not
/// completed when the run ends, the aggregator works with whatever data it already holds.
pub trait PriceRates {
    /// Starts fetching prices in the background.
    fn start(&mut self, config: &ReporterConfig);
}

/// A transaction reported to the accounting pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionObservation {
    /// The transaction hash.
    pub hash: String,

    /// Additional data about the transaction (for example, its receipt), passed through to the
    /// watcher as-is.
    #[serde(default)]
    pub data: Value,
}

impl TransactionObservation {
    /// Creates a new observation with no additional data.
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            data: Value::Null,
        }
    }

    /// Attaches additional data to this observation.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// The `recordTransaction` hook installed into a host's attachments.
pub type RecordTransactionHook = Box<dyn FnMut(TransactionObservation)>;
