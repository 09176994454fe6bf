// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlates the host framework's lifecycle with the ledger's block progression.
//!
//! The main structure in this module is [`EventCorrelator`], constructed via a
//! [`CorrelatorBuilder`] and driven through an [`EventDispatcher`].

mod dispatcher;
mod events;
mod imp;
mod stats;
mod window;

pub use dispatcher::*;
pub use events::*;
pub use imp::*;
pub use window::*;
