// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::SpeedParseError;
use camino::Utf8PathBuf;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// The document written to standard output once a run finishes.
///
/// A report is created exactly once per run and never changes after it has been emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Counters and timing supplied by the test framework.
    pub stats: RunStats,

    /// Every test that finished, in the order the framework reported them.
    pub tests: Vec<TestRecord>,

    /// Tests reported as pending, in order.
    pub pending: Vec<TestRecord>,

    /// Tests reported as failed, in order.
    pub failures: Vec<TestRecord>,

    /// Tests reported as passed, in order.
    pub passes: Vec<TestRecord>,

    /// The accounting report produced by the gas aggregator.
    ///
    /// The shape of this value is owned by the aggregator and is not interpreted here.
    pub gas_report: Value,
}

impl RunReport {
    /// Returns true if no tests failed in this run.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A serializable snapshot of a single test.
///
/// Records are always acyclic. Every field is present in the serialized form, with `null`
/// standing in for values the framework did not know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// The title of the test itself.
    pub title: String,

    /// The title prefixed by the titles of every enclosing suite.
    pub full_title: String,

    /// The file the test was defined in, if known.
    pub source_file: Option<Utf8PathBuf>,

    /// How long the test took to run, in milliseconds.
    pub duration: Option<u64>,

    /// The retry attempt this record describes, starting from 0.
    pub retry_count: u32,

    /// The speed classification of the test.
    pub speed: Option<Speed>,

    /// The error the test failed with. Empty if the test did not fail.
    pub error: ErrorSnapshot,
}

/// A flat mapping of the properties of an error value.
///
/// Property values are plain data: nested objects have already been made acyclic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSnapshot(Map<String, Value>);

impl ErrorSnapshot {
    /// Creates a new, empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the snapshot has no properties, meaning there was no error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of properties in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Looks up a property by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the `message` property if it is a string.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Consumes the snapshot, returning the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ErrorSnapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// How fast a test ran relative to the framework's slow threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// At most half the slow threshold.
    Fast,

    /// More than half the slow threshold, but not above it.
    Medium,

    /// Above the slow threshold.
    Slow,
}

impl Speed {
    /// Classifies a duration against a slow threshold, both in milliseconds.
    pub fn classify(duration_ms: u64, slow_ms: u64) -> Self {
        if duration_ms > slow_ms {
            Speed::Slow
        } else if duration_ms.saturating_mul(2) > slow_ms {
            Speed::Medium
        } else {
            Speed::Fast
        }
    }

    /// Returns the string form of this speed.
    pub fn as_str(self) -> &'static str {
        match self {
            Speed::Fast => "fast",
            Speed::Medium => "medium",
            Speed::Slow => "slow",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Speed {
    type Err = SpeedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(Speed::Fast),
            "medium" => Ok(Speed::Medium),
            "slow" => Ok(Speed::Slow),
            other => Err(SpeedParseError::new(other)),
        }
    }
}

/// Statistics for a run, in the shape test frameworks natively keep them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// The number of suites that started.
    pub suites: usize,

    /// The number of tests that finished, whatever their outcome.
    pub tests: usize,

    /// The number of tests that passed.
    pub passes: usize,

    /// The number of tests that were pending.
    pub pending: usize,

    /// The number of tests (and hooks) that failed.
    pub failures: usize,

    /// The time at which the run started.
    pub start: Option<DateTime<FixedOffset>>,

    /// The time at which the run ended.
    pub end: Option<DateTime<FixedOffset>>,

    /// The wall-clock duration of the run, in milliseconds.
    pub duration: Option<u64>,
}
