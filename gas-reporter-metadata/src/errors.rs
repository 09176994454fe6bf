// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{error, fmt};

/// An error that occurs while parsing a [`Speed`](crate::Speed) from a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpeedParseError {
    input: String,
}

impl SpeedParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for SpeedParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unrecognized speed `{}` (known values: fast, medium, slow)",
            self.input
        )
    }
}

impl error::Error for SpeedParseError {}
