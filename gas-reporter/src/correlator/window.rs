// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// The ledger block range within which transactions are attributed to the current test.
///
/// When both bounds are set, `it_start_block >= before_start_block`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockWindow {
    /// The block number observed when the test started.
    pub before_start_block: Option<u64>,

    /// The first block after the test's last "before each" hook completed.
    pub it_start_block: Option<u64>,
}

impl BlockWindow {
    /// Returns the first block whose transactions belong to the current test.
    ///
    /// This is `it_start_block` if set, and `before_start_block` otherwise.
    pub fn attribution_floor(&self) -> Option<u64> {
        self.it_start_block.or(self.before_start_block)
    }
}
