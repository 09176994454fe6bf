// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use gas_reporter::{
    config::ReporterConfig,
    correlator::{CorrelatorState, LifecycleEvent, Outcome},
    errors::ReporterError,
    host::{Attachments, HostObject, SuiteNode, TestNode},
    watcher::{RecordTransactionHook, TransactionObservation},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::time::Duration;
use test_case::test_case;

#[test]
fn single_passing_test_document() {
    let mut fixture = Fixture::new(ReporterConfig::default());
    let suite = SuiteNode::root().child_in_file("MetaCoin", "test/metacoin.js");
    let test = TestNode::new(&suite, "should send coin correctly");

    fixture.send(LifecycleEvent::RunBegin);
    fixture.send(LifecycleEvent::TestBegin { test: &test });
    fixture.send(LifecycleEvent::HookEnd { title: BEFORE_EACH });
    test.set_duration(Duration::from_millis(42));
    fixture.send(LifecycleEvent::Outcome {
        outcome: Outcome::Pass,
        test: &test,
    });
    fixture.send(LifecycleEvent::TestEnd { test: &test });
    fixture.send(LifecycleEvent::RunEnd);

    assert_eq!(fixture.output.writes(), 1);
    let document = fixture.output.json();

    let mut keys: Vec<_> = document.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        ["failures", "gasReport", "passes", "pending", "stats", "tests"]
    );

    let expected_record = json!({
        "title": "should send coin correctly",
        "fullTitle": "MetaCoin should send coin correctly",
        "sourceFile": "test/metacoin.js",
        "duration": 42,
        "retryCount": 0,
        "speed": "medium",
        "error": {},
    });
    assert_eq!(document["tests"], json!([expected_record.clone()]));
    assert_eq!(document["passes"], json!([expected_record]));
    assert_eq!(document["failures"], json!([]));
    assert_eq!(document["pending"], json!([]));
    assert_eq!(
        document["gasReport"],
        json!({ "watched": { "transactions": [] }, "currency": "EUR" })
    );

    let stats = &document["stats"];
    assert_eq!(stats["tests"], 1);
    assert_eq!(stats["passes"], 1);
    assert_eq!(stats["failures"], 0);
    assert!(stats["start"].is_string(), "start is a timestamp: {stats}");
    assert!(stats["end"].is_string(), "end is a timestamp: {stats}");

    // The same report is attached to the host, and the epilogue follows.
    let attached = fixture.host.test_results().expect("results were attached");
    assert_eq!(serde_json::to_value(&attached).unwrap(), document);
    assert_eq!(fixture.epilogue.text(), "1 passing\n");
}

#[test]
fn document_is_pretty_printed() {
    let mut fixture = Fixture::new(ReporterConfig::default());
    fixture.send(LifecycleEvent::RunBegin);
    fixture.send(LifecycleEvent::RunEnd);

    let text = fixture.output.text();
    assert!(text.starts_with("{\n  \"stats\": {\n"), "two-space indent: {text}");
    assert!(!text.ends_with('\n'), "no trailing newline");
}

#[test_case(0 ; "no tests")]
#[test_case(1 ; "one test")]
#[test_case(7 ; "several tests")]
fn run_end_writes_exactly_once(test_count: usize) {
    let mut fixture = Fixture::new(ReporterConfig::default());
    let suite = SuiteNode::root().child("Vault");
    let tests: Vec<_> = (0..test_count)
        .map(|index| TestNode::new(&suite, format!("case {index}")))
        .collect();

    fixture.send(LifecycleEvent::RunBegin);
    for test in &tests {
        fixture.run_test(test, Outcome::Pass);
    }
    assert_eq!(fixture.output.writes(), 0, "nothing written before run-end");
    fixture.send(LifecycleEvent::RunEnd);

    assert_eq!(fixture.output.writes(), 1);
    let document = fixture.output.json();
    assert_eq!(document["tests"].as_array().unwrap().len(), test_count);
    assert_eq!(document["passes"].as_array().unwrap().len(), test_count);

    // Further events are rejected without writing again.
    let err = fixture
        .dispatcher
        .dispatch(LifecycleEvent::RunEnd)
        .unwrap_err();
    assert!(matches!(err, ReporterError::Lifecycle(_)), "{err:?}");
    assert_eq!(fixture.output.writes(), 1);
}

#[test]
fn simulated_provider_never_queries() {
    let config = ReporterConfig::from_options(json!({ "provider": { "kind": "in-process" } }))
        .expect("valid options");
    let mut fixture = Fixture::new(config);
    let suite = SuiteNode::root().child("Exchange");

    fixture.send(LifecycleEvent::RunBegin);
    for title in ["lists", "buys", "sells"] {
        fixture.run_test(&TestNode::new(&suite, title), Outcome::Pass);
    }
    fixture.send(LifecycleEvent::RunEnd);

    assert_eq!(fixture.ledger.queries(), 0);
    assert_eq!(fixture.watcher.cache_resets(), 3);
    assert_eq!(fixture.output.json()["tests"].as_array().unwrap().len(), 3);
}

#[test]
fn before_each_hook_starts_window_after_setup() {
    let mut fixture = Fixture::new(ReporterConfig::default());
    let test = TestNode::new(&SuiteNode::root(), "transfers");
    fixture.ledger.mine(20);

    fixture.send(LifecycleEvent::RunBegin);
    fixture.send(LifecycleEvent::TestBegin { test: &test });
    assert_eq!(
        fixture.correlator().block_window().before_start_block,
        Some(20)
    );

    // The hook deploys a contract.
    fixture.ledger.mine(3);
    fixture.send(LifecycleEvent::HookEnd { title: BEFORE_EACH });
    let block = fixture.ledger.block();
    assert_eq!(
        fixture.correlator().block_window().it_start_block,
        Some(block + 1)
    );
    assert_eq!(
        fixture.correlator().block_window().attribution_floor(),
        Some(24)
    );

    // Other hooks leave the window alone.
    fixture.ledger.mine(1);
    fixture.send(LifecycleEvent::HookEnd {
        title: "\"after each\" hook",
    });
    assert_eq!(
        fixture.correlator().block_window().it_start_block,
        Some(24)
    );
    assert_eq!(fixture.ledger.queries(), 2);
}

#[test]
fn configured_slow_threshold() {
    let config = ReporterConfig::from_options(json!({ "slow": 1000 })).expect("valid options");
    let mut fixture = Fixture::new(config);
    let root = SuiteNode::configured_root(fixture.correlator().config());
    let test = TestNode::new(&root.child("Bridge"), "relays");
    test.set_duration(Duration::from_millis(600));

    fixture.send(LifecycleEvent::RunBegin);
    fixture.run_test(&test, Outcome::Pass);
    fixture.send(LifecycleEvent::RunEnd);

    // 600ms is slow under the default threshold.
    assert_eq!(fixture.output.json()["passes"][0]["speed"], "medium");
}

#[test]
fn self_referential_error() {
    let mut fixture = Fixture::new(ReporterConfig::default());
    let test = TestNode::new(&SuiteNode::root().child("Token"), "reverts");
    let error = HostObject::error("Error", "boom");
    error
        .set_hidden("stack", "Error: boom\n    at Context.<anonymous> (test/token.js:9:11)")
        .set("cause", error.clone());
    test.set_error(error);

    fixture.send(LifecycleEvent::RunBegin);
    fixture.run_test(&test, Outcome::Fail);
    fixture.send(LifecycleEvent::RunEnd);

    let document = fixture.output.json();
    assert_eq!(
        document["failures"][0]["error"],
        json!({
            "message": "boom",
            "stack": "Error: boom\n    at Context.<anonymous> (test/token.js:9:11)",
            "cause": { "cause": "Error: boom" },
        })
    );
    assert_eq!(document["tests"][0]["error"], document["failures"][0]["error"]);
}

#[test]
fn mocha_style_run() {
    let mut fixture = Fixture::new(ReporterConfig::default());
    let root = SuiteNode::root();
    let token = root.child_in_file("Token", "test/token.js");
    let minting = token.child("minting");

    let mints = TestNode::new(&minting, "mints");
    let flaky = TestNode::new(&minting, "is flaky");
    let skipped = TestNode::new(&token, "is skipped");
    let before_all = TestNode::new(&token, "\"before all\" hook");
    before_all.set_error(HostObject::error("Error", "could not deploy"));

    fixture.send(LifecycleEvent::RunBegin);
    fixture.run_test(&mints, Outcome::Pass);

    // A retried test begins again without ending in between.
    fixture.send(LifecycleEvent::TestBegin { test: &flaky });
    fixture.send(LifecycleEvent::HookEnd { title: BEFORE_EACH });
    let retry = TestNode::new(&minting, "is flaky");
    retry.set_current_retry(1);
    fixture.run_test(&retry, Outcome::Pass);

    // Pending tests never begin.
    fixture.send(LifecycleEvent::Outcome {
        outcome: Outcome::Pending,
        test: &skipped,
    });
    fixture.send(LifecycleEvent::TestEnd { test: &skipped });

    // Hook failures are reported outside a test.
    fixture.send(LifecycleEvent::Outcome {
        outcome: Outcome::Fail,
        test: &before_all,
    });
    fixture.send(LifecycleEvent::RunEnd);

    assert_eq!(fixture.correlator().state(), CorrelatorState::Finished);
    let document = fixture.output.json();
    let titles = |key: &str| -> Vec<String> {
        document[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["fullTitle"].as_str().unwrap().to_owned())
            .collect()
    };
    assert_eq!(
        titles("tests"),
        [
            "Token minting mints",
            "Token minting is flaky",
            "Token is skipped",
        ]
    );
    assert_eq!(
        titles("passes"),
        ["Token minting mints", "Token minting is flaky"]
    );
    assert_eq!(titles("pending"), ["Token is skipped"]);
    assert_eq!(titles("failures"), ["Token \"before all\" hook"]);
    assert_eq!(document["passes"][1]["retryCount"], 1);
    assert_eq!(document["pending"][0]["duration"], Value::Null);
    assert_eq!(document["stats"]["failures"], 1);
    assert_eq!(document["stats"]["pending"], 1);
}

#[derive(Default)]
struct PluginAttachments {
    record_transaction: Option<RecordTransactionHook>,
}

impl Attachments for PluginAttachments {
    fn install_record_transaction(&mut self, hook: RecordTransactionHook) {
        self.record_transaction = Some(hook);
    }
}

#[test]
fn plugins_record_transactions() {
    let mut attachments = PluginAttachments::default();
    let mut fixture = Fixture::with_attachments(ReporterConfig::default(), Some(&mut attachments));
    let mut record_transaction = attachments
        .record_transaction
        .take()
        .expect("hook was installed");

    let test = TestNode::new(&SuiteNode::root(), "swaps");
    fixture.ledger.mine(5);
    fixture.send(LifecycleEvent::RunBegin);
    fixture.send(LifecycleEvent::TestBegin { test: &test });
    record_transaction(TransactionObservation::new("0xaaa"));
    fixture.ledger.mine(2);
    fixture.send(LifecycleEvent::HookEnd { title: BEFORE_EACH });
    record_transaction(TransactionObservation::new("0xbbb"));
    fixture.send(LifecycleEvent::Outcome {
        outcome: Outcome::Pass,
        test: &test,
    });
    fixture.send(LifecycleEvent::TestEnd { test: &test });
    fixture.send(LifecycleEvent::RunEnd);

    assert_eq!(
        fixture.watcher.transactions(),
        [
            ("0xaaa".to_owned(), Some(5)),
            ("0xbbb".to_owned(), Some(8)),
        ]
    );
    assert_eq!(
        fixture.output.json()["gasReport"]["watched"],
        json!({ "transactions": ["0xaaa", "0xbbb"] })
    );
}
