// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{HostValue, TestHandle, TestKey};
use crate::config::ReporterConfig;
use camino::Utf8PathBuf;
use gas_reporter_metadata::Speed;
use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

/// A suite in the host framework's test tree.
///
/// Suites are immutable once created. The root suite has an empty title, which is skipped when
/// computing full titles. Each suite carries the slow-test threshold its tests start with,
/// inherited from its parent.
#[derive(Clone)]
pub struct SuiteNode(Rc<SuiteData>);

struct SuiteData {
    title: String,
    file: Option<Utf8PathBuf>,
    slow_ms: u64,
    parent: Option<SuiteNode>,
}

impl SuiteNode {
    /// Creates a root suite with the default slow-test threshold.
    pub fn root() -> Self {
        Self::root_with_slow(ReporterConfig::DEFAULT_SLOW_MS)
    }

    /// Creates a root suite using the slow-test threshold in `config`.
    pub fn configured_root(config: &ReporterConfig) -> Self {
        Self::root_with_slow(config.slow)
    }

    fn root_with_slow(slow_ms: u64) -> Self {
        Self(Rc::new(SuiteData {
            title: String::new(),
            file: None,
            slow_ms,
            parent: None,
        }))
    }

    /// Creates a child suite. The child inherits this suite's file.
    pub fn child(&self, title: impl Into<String>) -> Self {
        Self(Rc::new(SuiteData {
            title: title.into(),
            file: self.0.file.clone(),
            slow_ms: self.0.slow_ms,
            parent: Some(self.clone()),
        }))
    }

    /// Creates a child suite defined in the given file.
    pub fn child_in_file(&self, title: impl Into<String>, file: impl Into<Utf8PathBuf>) -> Self {
        Self(Rc::new(SuiteData {
            title: title.into(),
            file: Some(file.into()),
            slow_ms: self.0.slow_ms,
            parent: Some(self.clone()),
        }))
    }

    /// Returns the title of this suite.
    pub fn title(&self) -> &str {
        &self.0.title
    }

    /// Returns the file this suite was defined in.
    pub fn file(&self) -> Option<&Utf8PathBuf> {
        self.0.file.as_ref()
    }

    /// Returns the slow-test threshold for tests in this suite, in milliseconds.
    pub fn slow_ms(&self) -> u64 {
        self.0.slow_ms
    }

    /// Returns the title prefixed by the titles of every ancestor.
    pub fn full_title(&self) -> String {
        let mut titles = Vec::new();
        let mut current = Some(self);
        while let Some(suite) = current {
            if !suite.0.title.is_empty() {
                titles.push(suite.0.title.as_str());
            }
            current = suite.0.parent.as_ref();
        }
        titles.reverse();
        titles.join(" ")
    }
}

impl fmt::Debug for SuiteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteNode")
            .field("full_title", &self.full_title())
            .field("file", &self.0.file)
            .field("slow_ms", &self.0.slow_ms)
            .finish()
    }
}

/// A concrete, shareable test handle.
///
/// Hosts that do not have their own handle type can use this directly: clones share state, so
/// the framework can keep updating a test (duration, retries, error) after handing it to the
/// reporter.
#[derive(Clone)]
pub struct TestNode(Rc<RefCell<TestData>>);

#[derive(Debug)]
struct TestData {
    title: String,
    suite: SuiteNode,
    file: Option<Utf8PathBuf>,
    slow_ms: u64,
    duration: Option<Duration>,
    current_retry: u32,
    speed: Option<Speed>,
    error: Option<HostValue>,
}

impl TestNode {
    /// Creates a new test in `suite`. The test inherits the suite's file and slow-test threshold.
    pub fn new(suite: &SuiteNode, title: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(TestData {
            title: title.into(),
            suite: suite.clone(),
            file: suite.file().cloned(),
            slow_ms: suite.slow_ms(),
            duration: None,
            current_retry: 0,
            speed: None,
            error: None,
        })))
    }

    /// Sets the slow-test threshold used to classify speed.
    pub fn set_slow(&self, slow_ms: u64) -> &Self {
        self.0.borrow_mut().slow_ms = slow_ms;
        self
    }

    /// Records how long the test took, classifying its speed.
    pub fn set_duration(&self, duration: Duration) -> &Self {
        let mut data = self.0.borrow_mut();
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        data.speed = Some(Speed::classify(millis, data.slow_ms));
        data.duration = Some(duration);
        drop(data);
        self
    }

    /// Sets the current retry attempt.
    pub fn set_current_retry(&self, current_retry: u32) -> &Self {
        self.0.borrow_mut().current_retry = current_retry;
        self
    }

    /// Sets the file this test was defined in.
    pub fn set_file(&self, file: impl Into<Utf8PathBuf>) -> &Self {
        self.0.borrow_mut().file = Some(file.into());
        self
    }

    /// Sets the value this test failed with.
    pub fn set_error(&self, error: impl Into<HostValue>) -> &Self {
        self.0.borrow_mut().error = Some(error.into());
        self
    }

    /// Returns true if both handles refer to the same test.
    pub fn ptr_eq(&self, other: &TestNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl TestHandle for TestNode {
    fn key(&self) -> TestKey {
        TestKey::new(Rc::as_ptr(&self.0) as *const () as usize as u64)
    }

    fn title(&self) -> String {
        self.0.borrow().title.clone()
    }

    fn full_title(&self) -> String {
        let data = self.0.borrow();
        let suite_title = data.suite.full_title();
        if suite_title.is_empty() {
            data.title.clone()
        } else {
            format!("{suite_title} {}", data.title)
        }
    }

    fn file(&self) -> Option<Utf8PathBuf> {
        self.0.borrow().file.clone()
    }

    fn duration(&self) -> Option<Duration> {
        self.0.borrow().duration
    }

    fn current_retry(&self) -> u32 {
        self.0.borrow().current_retry
    }

    fn speed(&self) -> Option<Speed> {
        self.0.borrow().speed
    }

    fn error(&self) -> Option<HostValue> {
        self.0.borrow().error.clone()
    }
}

impl fmt::Debug for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TestNode").field(&self.full_title()).finish()
    }
}
