// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporter configuration.
//!
//! Configuration normally arrives as the options mapping the host framework hands to its
//! reporters. It can also be read from a TOML file, with environment overrides.

use crate::errors::ConfigParseError;
use camino::Utf8Path;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::time::Duration;

/// Configuration for a gas reporter run.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReporterConfig {
    /// The JSON-RPC endpoint of the ledger.
    #[serde(default = "default_url")]
    pub url: String,

    /// Whether an in-process simulated provider was supplied.
    ///
    /// Any non-null, non-false value counts as a provider being present. When set, no block
    /// numbers are ever queried.
    #[serde(default, deserialize_with = "deserialize_presence")]
    pub provider: bool,

    /// The slow-test threshold, in milliseconds.
    #[serde(default = "default_slow")]
    pub slow: u64,

    /// Disables styling in the epilogue.
    #[serde(default, alias = "noColors", alias = "no_colors")]
    pub no_colors: bool,

    /// Timeout applied to each JSON-RPC request. Unset means requests never time out.
    #[serde(
        default,
        with = "humantime_serde",
        alias = "rpcTimeout",
        alias = "rpc_timeout"
    )]
    pub rpc_timeout: Option<Duration>,

    /// Options not recognized here, passed through verbatim to the watcher and table
    /// collaborators.
    #[serde(flatten)]
    pub collaborators: Map<String, Value>,
}

impl ReporterConfig {
    /// The default JSON-RPC endpoint.
    pub const DEFAULT_URL: &'static str = "http://localhost:8545";

    /// The default slow-test threshold, in milliseconds.
    pub const DEFAULT_SLOW_MS: u64 = 75;

    /// Prefix for environment variable overrides, followed by `_`.
    pub const ENVIRONMENT_PREFIX: &'static str = "GAS_REPORTER";

    /// Builds a configuration from the options mapping supplied by the host.
    ///
    /// A `null` mapping yields the default configuration.
    pub fn from_options(options: Value) -> Result<Self, ConfigParseError> {
        if options.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(options).map_err(ConfigParseError::Options)
    }

    /// Reads a configuration file, layered over the defaults and under environment overrides.
    pub fn from_toml_file(config_file: &Utf8Path) -> Result<Self, ConfigParseError> {
        let map_err = |err| ConfigParseError::File {
            config_file: config_file.to_owned(),
            err,
        };

        Config::builder()
            .set_default("url", Self::DEFAULT_URL)
            .map_err(map_err)?
            .set_default("slow", Self::DEFAULT_SLOW_MS)
            .map_err(map_err)?
            .add_source(File::new(config_file.as_str(), FileFormat::Toml))
            .add_source(Environment::with_prefix(Self::ENVIRONMENT_PREFIX).try_parsing(true))
            .build()
            .map_err(map_err)?
            .try_deserialize()
            .map_err(map_err)
    }

    /// Returns a pass-through option for the watcher or table collaborators.
    pub fn collaborator_option(&self, key: &str) -> Option<&Value> {
        self.collaborators.get(key)
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            provider: false,
            slow: Self::DEFAULT_SLOW_MS,
            no_colors: false,
            rpc_timeout: None,
            collaborators: Map::new(),
        }
    }
}

fn default_url() -> String {
    ReporterConfig::DEFAULT_URL.to_owned()
}

fn default_slow() -> u64 {
    ReporterConfig::DEFAULT_SLOW_MS
}

fn deserialize_presence<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(_) => true,
    })
}
