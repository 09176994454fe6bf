// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block-number queries against the ledger.
//!
//! Lifecycle events are handled synchronously and in order, so block numbers must be known before
//! the next event is processed. [`BlockNumberQuery`] is therefore a blocking interface, whatever
//! the transport underneath it.

use crate::{
    config::ReporterConfig,
    errors::{BlockNumberQueryError, QuantityParseError, QuantityParseReason},
};
use serde::Deserialize;
use serde_json::json;
use std::{fmt, time::Duration};
use tracing::debug;

/// A blocking source of the ledger's current block number.
///
/// Implementations own any retry or timeout policy: a query that never returns blocks the run.
pub trait BlockNumberQuery {
    /// Returns the current block number.
    fn block_number(&mut self) -> Result<u64, BlockNumberQueryError>;
}

impl<F> BlockNumberQuery for F
where
    F: FnMut() -> Result<u64, BlockNumberQueryError>,
{
    fn block_number(&mut self) -> Result<u64, BlockNumberQueryError> {
        self()
    }
}

/// Queries `eth_blockNumber` over HTTP JSON-RPC, blocking until the response arrives.
pub struct JsonRpcBlockNumber {
    url: String,
    agent: ureq::Agent,
    next_id: u64,
}

impl JsonRpcBlockNumber {
    /// Creates a new client for the given endpoint.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        let agent = ureq::Agent::new_with_config(config);
        Self {
            url: url.into(),
            agent,
            next_id: 1,
        }
    }

    /// Creates a new client for the endpoint and timeout in `config`.
    pub fn from_config(config: &ReporterConfig) -> Self {
        Self::new(config.url.clone(), config.rpc_timeout)
    }

    /// Returns the endpoint this client queries.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_body(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        json!({
            "jsonrpc": "2.0",
            "method": "eth_blockNumber",
            "params": [],
            "id": id,
        })
        .to_string()
    }
}

impl BlockNumberQuery for JsonRpcBlockNumber {
    fn block_number(&mut self) -> Result<u64, BlockNumberQueryError> {
        let body = self.request_body();
        let transport_err = |error| BlockNumberQueryError::Transport {
            url: self.url.clone(),
            error: Box::new(error),
        };

        let mut response = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(transport_err)?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(transport_err)?;

        let block_number = decode_block_number(&self.url, &text)?;
        debug!(url = %self.url, block_number, "queried block number");
        Ok(block_number)
    }
}

impl fmt::Debug for JsonRpcBlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcBlockNumber")
            .field("url", &self.url)
            .field("agent", &"Agent { .. }")
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Decodes the body of an `eth_blockNumber` JSON-RPC response.
pub(crate) fn decode_block_number(url: &str, body: &str) -> Result<u64, BlockNumberQueryError> {
    let response: JsonRpcResponse =
        serde_json::from_str(body).map_err(|error| BlockNumberQueryError::Decode {
            url: url.to_owned(),
            error,
        })?;

    if let Some(error) = response.error {
        return Err(BlockNumberQueryError::Rpc {
            url: url.to_owned(),
            code: error.code,
            message: error.message,
        });
    }

    let result = response
        .result
        .ok_or_else(|| BlockNumberQueryError::MissingResult {
            url: url.to_owned(),
        })?;
    parse_quantity(&result).map_err(|error| BlockNumberQueryError::InvalidQuantity {
        url: url.to_owned(),
        error,
    })
}

/// Parses a hex-encoded JSON-RPC quantity such as `0x1b4`.
pub fn parse_quantity(input: &str) -> Result<u64, QuantityParseError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| QuantityParseError::new(input, QuantityParseReason::MissingPrefix))?;
    if digits.is_empty() {
        return Err(QuantityParseError::new(input, QuantityParseReason::Empty));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|err| QuantityParseError::new(input, QuantityParseReason::Digits(err)))
}
