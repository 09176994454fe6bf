// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    BlockWindow, EventDispatcher, LifecycleEventKind, LifecycleListener, Outcome,
    stats::StatsTracker,
};
use crate::{
    config::ReporterConfig,
    errors::{LifecycleError, ReporterError},
    host::{Attachments, TestHandle, TestKey},
    ledger::{BlockNumberQuery, JsonRpcBlockNumber},
    report::{ReportAssembler, RunBuffers},
    watcher::{PriceRates, SharedWatcher},
};
use debug_ignore::DebugIgnore;
use gas_reporter_metadata::RunReport;
use std::{cell::Cell, collections::HashSet, fmt, rc::Rc};
use tracing::{debug, trace, warn};

/// The state of an [`EventCorrelator`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CorrelatorState {
    /// No run has started.
    Idle,

    /// A run is in progress, and no test is.
    RunActive,

    /// A test is in progress.
    TestActive,

    /// The run ended and its report was emitted. No further events are accepted.
    Finished,
}

impl fmt::Display for CorrelatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CorrelatorState::Idle => "no run has started",
            CorrelatorState::RunActive => "a run is active",
            CorrelatorState::TestActive => "a test is active",
            CorrelatorState::Finished => "the run has finished",
        };
        f.write_str(s)
    }
}

const IN_RUN: &[CorrelatorState] = &[CorrelatorState::RunActive, CorrelatorState::TestActive];

/// Event correlator builder.
pub struct CorrelatorBuilder {
    block_source: Option<Box<dyn BlockNumberQuery>>,
    price_rates: Option<Box<dyn PriceRates>>,
}

impl CorrelatorBuilder {
    /// Creates a new builder.
    ///
    /// Unless another source is set, block numbers are queried from the configured JSON-RPC
    /// endpoint.
    pub fn new() -> Self {
        Self {
            block_source: None,
            price_rates: None,
        }
    }

    /// Sets the source of block numbers.
    pub fn set_block_source(&mut self, source: impl BlockNumberQuery + 'static) -> &mut Self {
        self.block_source = Some(Box::new(source));
        self
    }

    /// Sets the price and rate lookup, started once when the correlator is built.
    pub fn set_price_rates(&mut self, price_rates: impl PriceRates + 'static) -> &mut Self {
        self.price_rates = Some(Box::new(price_rates));
        self
    }

    /// Creates a new correlator for one run.
    ///
    /// If `attachments` is provided, a `recordTransaction` hook feeding the watcher is installed
    /// on it.
    pub fn build<T: TestHandle + Clone>(
        self,
        config: ReporterConfig,
        watcher: SharedWatcher,
        assembler: ReportAssembler,
        attachments: Option<&mut dyn Attachments>,
    ) -> EventCorrelator<T> {
        let window = Rc::new(Cell::new(BlockWindow::default()));

        if let Some(attachments) = attachments {
            let hook_watcher = watcher.clone();
            let hook_window = window.clone();
            attachments.install_record_transaction(Box::new(move |tx| {
                let floor = hook_window.get().attribution_floor();
                hook_watcher.borrow_mut().record_transaction(tx, floor);
            }));
            debug!("installed recordTransaction hook");
        }

        let mut price_rates = self.price_rates;
        if let Some(price_rates) = &mut price_rates {
            price_rates.start(&config);
        }

        let block_source: Box<dyn BlockNumberQuery> = match self.block_source {
            Some(block_source) => block_source,
            None => Box::new(JsonRpcBlockNumber::from_config(&config)),
        };

        EventCorrelator {
            config,
            state: CorrelatorState::Idle,
            block_source: DebugIgnore(block_source),
            watcher: DebugIgnore(watcher),
            window,
            buffers: RunBuffers::new(),
            classified: HashSet::new(),
            stats: StatsTracker::default(),
            assembler,
            _price_rates: DebugIgnore(price_rates),
            report: None,
        }
    }
}

impl Default for CorrelatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CorrelatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelatorBuilder")
            .field("block_source", &self.block_source.is_some())
            .field("price_rates", &self.price_rates.is_some())
            .finish()
    }
}

/// Maps lifecycle events to block-window boundaries and outcome buckets for one run.
///
/// A correlator is created fresh for each run and handles exactly one: once the run ends and the
/// report is emitted, any further event is a [`LifecycleError`].
#[derive(Debug)]
pub struct EventCorrelator<T> {
    config: ReporterConfig,
    state: CorrelatorState,
    block_source: DebugIgnore<Box<dyn BlockNumberQuery>>,
    watcher: DebugIgnore<SharedWatcher>,
    // Shared with the recordTransaction hook.
    window: Rc<Cell<BlockWindow>>,
    buffers: RunBuffers<T>,
    classified: HashSet<TestKey>,
    stats: StatsTracker,
    assembler: ReportAssembler,
    // Kept alive for the duration of the run.
    _price_rates: DebugIgnore<Option<Box<dyn PriceRates>>>,
    report: Option<RunReport>,
}

impl<T: TestHandle + Clone> EventCorrelator<T> {
    /// Wraps this correlator in a dispatcher with the standard bindings.
    pub fn into_dispatcher(self) -> EventDispatcher<Self, T> {
        EventDispatcher::with_standard_bindings(self)
    }
}

impl<T> EventCorrelator<T> {
    /// Returns the configuration for this run.
    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Returns the current state.
    pub fn state(&self) -> CorrelatorState {
        self.state
    }

    /// Returns the current block window.
    pub fn block_window(&self) -> BlockWindow {
        self.window.get()
    }

    /// Returns the handles accumulated so far.
    pub fn buffers(&self) -> &RunBuffers<T> {
        &self.buffers
    }

    /// Returns the report, once the run has ended.
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    fn check_state(
        &self,
        event: LifecycleEventKind,
        allowed: &[CorrelatorState],
    ) -> Result<(), LifecycleError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(LifecycleError {
                event,
                state: self.state,
            })
        }
    }
}

impl<T: TestHandle + Clone> LifecycleListener<T> for EventCorrelator<T> {
    fn on_run_begin(&mut self) -> Result<(), ReporterError> {
        self.check_state(LifecycleEventKind::RunBegin, &[CorrelatorState::Idle])?;

        self.watcher.borrow_mut().initialize(&self.config);
        self.stats.start();
        self.state = CorrelatorState::RunActive;
        debug!(provider = self.config.provider, "run started");
        Ok(())
    }

    fn on_test_begin(&mut self, test: &T) -> Result<(), ReporterError> {
        self.check_state(LifecycleEventKind::TestBegin, IN_RUN)?;
        if self.state == CorrelatorState::TestActive {
            // Retried tests begin again without ending.
            debug!(test = %test.full_title(), "test restarted");
        }

        self.window.set(BlockWindow::default());
        if !self.config.provider {
            let before_start_block = self.block_source.block_number()?;
            self.window.set(BlockWindow {
                before_start_block: Some(before_start_block),
                it_start_block: None,
            });
        }
        self.watcher.borrow_mut().reset_address_cache();
        self.state = CorrelatorState::TestActive;

        debug!(
            test = %test.full_title(),
            before_start_block = ?self.window.get().before_start_block,
            "test started"
        );
        Ok(())
    }

    fn on_hook_end(&mut self, title: &str) -> Result<(), ReporterError> {
        self.check_state(LifecycleEventKind::HookEnd, IN_RUN)?;

        if !title.contains("before each") {
            trace!(title, "ignoring hook");
            return Ok(());
        }
        if self.config.provider {
            trace!(title, "simulated provider, not querying block number");
            return Ok(());
        }

        let block_number = self.block_source.block_number()?;
        let mut window = self.window.get();
        let mut it_start_block = block_number.saturating_add(1);
        if let Some(before_start_block) = window.before_start_block
            && it_start_block < before_start_block
        {
            warn!(
                block_number,
                before_start_block, "block number went backwards during a before-each hook"
            );
            it_start_block = before_start_block;
        }
        window.it_start_block = Some(it_start_block);
        self.window.set(window);

        debug!(title, block_number, it_start_block, "before-each hook ended");
        Ok(())
    }

    fn on_test_end(&mut self, test: &T) -> Result<(), ReporterError> {
        self.check_state(LifecycleEventKind::TestEnd, IN_RUN)?;

        self.buffers.tests.push(test.clone());
        self.stats.record_test_end();
        self.state = CorrelatorState::RunActive;
        Ok(())
    }

    fn on_outcome(&mut self, outcome: Outcome, test: &T) -> Result<(), ReporterError> {
        let kind = outcome.event_kind();
        self.check_state(kind, IN_RUN)?;

        if !self.classified.insert(test.key()) {
            warn!(
                test = %test.full_title(),
                event = %kind,
                "test was already classified, ignoring outcome"
            );
            return Ok(());
        }
        self.buffers.bucket_mut(outcome).push(test.clone());
        self.stats.record_outcome(outcome);
        Ok(())
    }

    fn on_run_end(&mut self) -> Result<(), ReporterError> {
        self.check_state(LifecycleEventKind::RunEnd, IN_RUN)?;
        if self.state == CorrelatorState::TestActive {
            warn!("run ended while a test was still active");
        }
        // Set before assembling, so a failed emit can't be retried into a second write.
        self.state = CorrelatorState::Finished;

        let watcher_data = self.watcher.borrow().aggregated_data();
        let stats = self.stats.finish();
        let report = self
            .assembler
            .assemble(&self.buffers, &watcher_data, stats)?;
        debug!(
            tests = report.tests.len(),
            failures = report.failures.len(),
            "run finished"
        );
        self.report = Some(report);
        Ok(())
    }
}
