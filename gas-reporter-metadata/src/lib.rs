// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the machine-readable output of gas-reporter.
//!
//! At the end of every run, the reporter writes a single JSON document to standard output. The
//! types in this crate describe that document, and can be used by harnesses to deserialize it.

mod errors;
mod report;

pub use errors::*;
pub use report::*;
