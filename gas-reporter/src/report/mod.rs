// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembling and emitting the final report.
//!
//! The main type here is [`ReportAssembler`], which the correlator invokes exactly once, when the
//! run ends.

mod assembler;
mod epilogue;

pub use assembler::*;
pub use epilogue::*;
