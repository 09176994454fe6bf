// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fakes for the host framework and collaborators.

use crate::{
    config::ReporterConfig,
    correlator::{CorrelatorBuilder, EventCorrelator, EventDispatcher, LifecycleEvent},
    errors::{BlockNumberQueryError, ReporterError},
    host::{Attachments, Epilogue, RunHost, TestNode},
    ledger::BlockNumberQuery,
    report::ReportAssembler,
    watcher::{
        GasReportAggregator, PriceRates, RecordTransactionHook, SharedWatcher,
        TransactionObservation, TransactionWatcher,
    },
};
use gas_reporter_metadata::{RunReport, RunStats};
use serde_json::{Value, json};
use std::{
    cell::{Cell, Ref, RefCell},
    io::{self, Write},
    rc::Rc,
};

/// Returns consecutive block numbers, counting queries.
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingBlockSource {
    next: Rc<Cell<u64>>,
    queries: Rc<Cell<usize>>,
}

impl CountingBlockSource {
    pub(crate) fn set_next(&self, next: u64) {
        self.next.set(next);
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl BlockNumberQuery for CountingBlockSource {
    fn block_number(&mut self) -> Result<u64, BlockNumberQueryError> {
        self.queries.set(self.queries.get() + 1);
        let block_number = self.next.get();
        self.next.set(block_number + 1);
        Ok(block_number)
    }
}

#[derive(Debug, Default)]
pub(crate) struct WatcherLog {
    pub(crate) initialized: usize,
    pub(crate) cache_resets: usize,
    pub(crate) transactions: Vec<(TransactionObservation, Option<u64>)>,
}

/// A watcher that records every call.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingWatcher {
    log: Rc<RefCell<WatcherLog>>,
}

impl RecordingWatcher {
    pub(crate) fn shared(&self) -> SharedWatcher {
        Rc::new(RefCell::new(self.clone()))
    }

    pub(crate) fn log(&self) -> Ref<'_, WatcherLog> {
        self.log.borrow()
    }
}

impl TransactionWatcher for RecordingWatcher {
    fn initialize(&mut self, _config: &ReporterConfig) {
        self.log.borrow_mut().initialized += 1;
    }

    fn reset_address_cache(&mut self) {
        self.log.borrow_mut().cache_resets += 1;
    }

    fn record_transaction(&mut self, tx: TransactionObservation, attribution_floor: Option<u64>) {
        self.log
            .borrow_mut()
            .transactions
            .push((tx, attribution_floor));
    }

    fn aggregated_data(&self) -> Value {
        json!({ "transactions": self.log.borrow().transactions.len() })
    }
}

/// An aggregator that always returns the same report.
#[derive(Clone, Debug)]
pub(crate) struct StaticAggregator {
    report: Value,
}

impl StaticAggregator {
    pub(crate) fn new(report: Value) -> Self {
        Self { report }
    }
}

impl GasReportAggregator for StaticAggregator {
    fn build_report(&mut self, _watcher_data: &Value) -> Value {
        self.report.clone()
    }
}

/// A host that records the reports attached to it.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingHost {
    stats: Option<RunStats>,
    attached: Rc<RefCell<Vec<RunReport>>>,
}

impl RecordingHost {
    pub(crate) fn with_stats(stats: RunStats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::default()
        }
    }

    pub(crate) fn attached(&self) -> Vec<RunReport> {
        self.attached.borrow().clone()
    }
}

impl RunHost for RecordingHost {
    fn stats(&self) -> Option<RunStats> {
        self.stats.clone()
    }

    fn attach_results(&mut self, report: &RunReport) {
        self.attached.borrow_mut().push(report.clone());
    }
}

/// An epilogue that counts renders.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingEpilogue {
    rendered: Rc<Cell<usize>>,
}

impl RecordingEpilogue {
    pub(crate) fn rendered(&self) -> usize {
        self.rendered.get()
    }
}

impl Epilogue for RecordingEpilogue {
    fn render(&mut self, _report: &RunReport) -> io::Result<()> {
        self.rendered.set(self.rendered.get() + 1);
        Ok(())
    }
}

/// An in-memory output stream that counts writes.
#[derive(Clone, Debug, Default)]
pub(crate) struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
    writes: Rc<Cell<usize>>,
    fail: bool,
}

impl SharedBuffer {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"));
        }
        self.writes.set(self.writes.get() + 1);
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Attachments that keep the installed hook so tests can call it.
#[derive(Default)]
pub(crate) struct RecordingAttachments {
    hook: Option<RecordTransactionHook>,
}

impl RecordingAttachments {
    pub(crate) fn record(&mut self, tx: TransactionObservation) {
        let hook = self
            .hook
            .as_mut()
            .expect("recordTransaction hook was installed");
        hook(tx);
    }
}

impl Attachments for RecordingAttachments {
    fn install_record_transaction(&mut self, hook: RecordTransactionHook) {
        self.hook = Some(hook);
    }
}

/// Price lookups that count how often they were started.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingPriceRates {
    starts: Rc<Cell<usize>>,
}

impl RecordingPriceRates {
    pub(crate) fn starts(&self) -> usize {
        self.starts.get()
    }
}

impl PriceRates for RecordingPriceRates {
    fn start(&mut self, _config: &ReporterConfig) {
        self.starts.set(self.starts.get() + 1);
    }
}

/// A correlator wired to fakes, driven through the standard dispatcher.
pub(crate) struct Harness {
    dispatcher: EventDispatcher<EventCorrelator<TestNode>, TestNode>,
    pub(crate) blocks: CountingBlockSource,
    pub(crate) watcher: RecordingWatcher,
    pub(crate) host: RecordingHost,
    pub(crate) output: SharedBuffer,
}

impl Harness {
    pub(crate) fn new(config: ReporterConfig) -> Self {
        Self::build(config, |_| {}, None)
    }

    pub(crate) fn with_block_source(
        config: ReporterConfig,
        block_source: impl BlockNumberQuery + 'static,
    ) -> Self {
        Self::build(
            config,
            |builder| {
                builder.set_block_source(block_source);
            },
            None,
        )
    }

    pub(crate) fn build(
        config: ReporterConfig,
        configure: impl FnOnce(&mut CorrelatorBuilder),
        attachments: Option<&mut dyn Attachments>,
    ) -> Self {
        let blocks = CountingBlockSource::default();
        let watcher = RecordingWatcher::default();
        let host = RecordingHost::default();
        let output = SharedBuffer::default();

        let mut assembler = ReportAssembler::new(
            StaticAggregator::new(json!({})),
            host.clone(),
            RecordingEpilogue::default(),
        );
        assembler.set_output(output.clone());

        let mut builder = CorrelatorBuilder::new();
        builder.set_block_source(blocks.clone());
        configure(&mut builder);
        let correlator = builder.build(config, watcher.shared(), assembler, attachments);

        Self {
            dispatcher: correlator.into_dispatcher(),
            blocks,
            watcher,
            host,
            output,
        }
    }

    pub(crate) fn correlator(&self) -> &EventCorrelator<TestNode> {
        self.dispatcher.listener()
    }

    pub(crate) fn try_dispatch(
        &mut self,
        event: LifecycleEvent<'_, TestNode>,
    ) -> Result<(), ReporterError> {
        self.dispatcher.dispatch(event)
    }

    pub(crate) fn dispatch(&mut self, event: LifecycleEvent<'_, TestNode>) {
        self.try_dispatch(event).expect("event was handled");
    }

    pub(crate) fn run_begin(&mut self) {
        self.dispatch(LifecycleEvent::RunBegin);
    }

    pub(crate) fn run_end(&mut self) {
        self.dispatch(LifecycleEvent::RunEnd);
    }
}
