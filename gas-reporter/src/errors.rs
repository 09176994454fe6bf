// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by gas-reporter.

use crate::correlator::{CorrelatorState, LifecycleEventKind};
use camino::Utf8PathBuf;
use std::num::ParseIntError;
use thiserror::Error;

/// An error that occurred while parsing reporter configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseError {
    /// The options mapping supplied by the host could not be deserialized.
    #[error("failed to parse reporter options")]
    Options(#[source] serde_json::Error),

    /// A configuration file could not be read or deserialized.
    #[error("failed to parse gas reporter config at `{config_file}`")]
    File {
        /// The configuration file.
        config_file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: config::ConfigError,
    },
}

/// An error that occurred while querying the current block number.
///
/// Errors of this kind are fatal for the test that was running when the query was made.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BlockNumberQueryError {
    /// The request could not be sent, or the endpoint returned a non-success HTTP status.
    #[error("error sending eth_blockNumber request to {url}")]
    Transport {
        /// The endpoint that was queried.
        url: String,

        /// The underlying transport error.
        #[source]
        error: Box<ureq::Error>,
    },

    /// The response body was not a JSON-RPC response.
    #[error("error decoding eth_blockNumber response from {url}")]
    Decode {
        /// The endpoint that was queried.
        url: String,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },

    /// The endpoint returned a JSON-RPC error object.
    #[error("{url} returned JSON-RPC error {code}: {message}")]
    Rpc {
        /// The endpoint that was queried.
        url: String,

        /// The JSON-RPC error code.
        code: i64,

        /// The JSON-RPC error message.
        message: String,
    },

    /// The response had neither a result nor an error.
    #[error("{url} returned a JSON-RPC response without a result")]
    MissingResult {
        /// The endpoint that was queried.
        url: String,
    },

    /// The result was not a valid block number quantity.
    #[error("{url} returned an invalid block number")]
    InvalidQuantity {
        /// The endpoint that was queried.
        url: String,

        /// The underlying parse error.
        #[source]
        error: QuantityParseError,
    },

    /// A custom block-number source failed.
    #[error("block number query failed: {message}")]
    Other {
        /// A description of the failure.
        message: String,
    },
}

/// An error that occurs while parsing a hex-encoded JSON-RPC quantity.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid quantity `{input}`: {reason}")]
pub struct QuantityParseError {
    input: String,
    reason: QuantityParseReason,
}

impl QuantityParseError {
    pub(crate) fn new(input: impl Into<String>, reason: QuantityParseReason) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// The reason a quantity failed to parse.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuantityParseReason {
    /// The `0x` prefix was missing.
    #[error("missing 0x prefix")]
    MissingPrefix,

    /// There were no digits after the prefix.
    #[error("no digits after 0x prefix")]
    Empty,

    /// The digits were not valid hexadecimal, or overflowed.
    #[error("{0}")]
    Digits(#[source] ParseIntError),
}

/// A lifecycle event arrived in a state where it cannot be handled.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unexpected {event} event while {state}")]
pub struct LifecycleError {
    /// The event that was received.
    pub event: LifecycleEventKind,

    /// The state the correlator was in.
    pub state: CorrelatorState,
}

/// An error that occurred while emitting the final report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// The report could not be serialized. Nothing was written.
    #[error("error serializing run report to JSON")]
    Serialize(#[source] serde_json::Error),

    /// The report could not be written to the output stream.
    #[error("error writing run report to output")]
    Io(#[source] std::io::Error),

    /// The epilogue could not be rendered.
    #[error("error rendering run epilogue")]
    Epilogue(#[source] std::io::Error),
}

/// An error returned while handling a lifecycle event.
///
/// Any of these aborts the run: they are propagated unchanged to the host framework.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReporterError {
    /// Querying the current block number failed.
    #[error(transparent)]
    Query(#[from] BlockNumberQueryError),

    /// An event arrived out of order.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Emitting the final report failed.
    #[error(transparent)]
    Write(#[from] WriteReportError),
}
