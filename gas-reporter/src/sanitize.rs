// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converts live test handles into plain, serializable records.
//!
//! Test errors are arbitrary host object graphs. [`sanitize_graph`] turns such a graph into an
//! acyclic JSON tree: each object or array is expanded at most once, and any later reference to
//! it (whether a true cycle or a second path to a shared value) is replaced by its string form.
//! The transform is lossy and one-way.

use crate::host::{HostObject, HostValue, TestHandle, ValueId};
use gas_reporter_metadata::{ErrorSnapshot, TestRecord};
use serde_json::{Map, Number, Value};
use std::{collections::HashSet, time::Duration, vec};

/// Produces a [`TestRecord`] from a live test handle.
///
/// Every field is read at the time of the call. Error objects are flattened with
/// [`flatten_error`] first, so hidden properties such as `message` and `stack` are kept.
pub fn clean<T: TestHandle + ?Sized>(test: &T) -> TestRecord {
    TestRecord {
        title: test.title(),
        full_title: test.full_title(),
        source_file: test.file(),
        duration: test.duration().map(duration_millis),
        retry_count: test.current_retry(),
        speed: test.speed(),
        error: test.error().map(snapshot_error).unwrap_or_default(),
    }
}

/// Copies every own property of an error object, hidden ones included, into a new plain object
/// where all of them are enumerable.
pub fn flatten_error(error: &HostObject) -> HostObject {
    let flattened = HostObject::new();
    for (key, value) in error.own_entries() {
        flattened.set(key, value);
    }
    flattened
}

/// Produces an acyclic, serializable copy of `root`.
///
/// Objects contribute their enumerable properties and arrays their elements, depth first. An
/// object or array that was already expanded earlier in the traversal is replaced by its string
/// coercion instead. Undefined properties are omitted and undefined array elements become null,
/// as are non-finite numbers.
///
/// The traversal uses an explicit stack, so arbitrarily deep graphs do not exhaust the call
/// stack.
pub fn sanitize_graph(root: &HostValue) -> Value {
    let mut visited = HashSet::new();
    let mut stack = match visit(root, &mut visited) {
        Visit::Leaf(value) => return value.unwrap_or(Value::Null),
        Visit::Enter(frame) => vec![frame],
    };

    while let Some(frame) = stack.last_mut() {
        match frame.next_child() {
            Some(child) => match visit(&child, &mut visited) {
                Visit::Leaf(value) => frame.accept(value),
                Visit::Enter(child_frame) => stack.push(child_frame),
            },
            None => {
                let Some(done) = stack.pop() else { break };
                let value = done.finish();
                match stack.last_mut() {
                    Some(parent) => parent.accept(Some(value)),
                    None => return value,
                }
            }
        }
    }

    Value::Null
}

fn snapshot_error(error: HostValue) -> ErrorSnapshot {
    let sanitized = match &error {
        HostValue::Undefined | HostValue::Null => return ErrorSnapshot::new(),
        HostValue::Object(object) if object.is_error() => {
            sanitize_graph(&HostValue::Object(flatten_error(object)))
        }
        HostValue::Object(_) => sanitize_graph(&error),
        other => {
            let mut map = Map::new();
            map.insert(
                "message".to_owned(),
                Value::String(other.coerce_to_string()),
            );
            return ErrorSnapshot::from(map);
        }
    };

    match sanitized {
        Value::Object(map) => ErrorSnapshot::from(map),
        other => {
            let mut map = Map::new();
            map.insert("message".to_owned(), other);
            ErrorSnapshot::from(map)
        }
    }
}

enum Visit {
    /// A finished value. `None` stands for undefined.
    Leaf(Option<Value>),
    Enter(Frame),
}

fn visit(value: &HostValue, visited: &mut HashSet<ValueId>) -> Visit {
    match value {
        HostValue::Undefined => Visit::Leaf(None),
        HostValue::Null => Visit::Leaf(Some(Value::Null)),
        HostValue::Bool(b) => Visit::Leaf(Some(Value::Bool(*b))),
        HostValue::Number(n) => Visit::Leaf(Some(number_value(*n))),
        HostValue::String(s) => Visit::Leaf(Some(Value::String(s.clone()))),
        HostValue::Object(object) => {
            if visited.insert(object.identity()) {
                Visit::Enter(Frame::Object {
                    entries: object.enumerable_entries().into_iter(),
                    key: None,
                    map: Map::new(),
                })
            } else {
                Visit::Leaf(Some(Value::String(object.coerce_to_string())))
            }
        }
        HostValue::Array(array) => {
            if visited.insert(array.identity()) {
                let elements = array.elements();
                let items = Vec::with_capacity(elements.len());
                Visit::Enter(Frame::Array {
                    elements: elements.into_iter(),
                    items,
                })
            } else {
                Visit::Leaf(Some(Value::String(value.coerce_to_string())))
            }
        }
    }
}

/// A container whose children are still being sanitized.
enum Frame {
    Object {
        entries: vec::IntoIter<(String, HostValue)>,
        key: Option<String>,
        map: Map<String, Value>,
    },
    Array {
        elements: vec::IntoIter<HostValue>,
        items: Vec<Value>,
    },
}

impl Frame {
    fn next_child(&mut self) -> Option<HostValue> {
        match self {
            Frame::Object { entries, key, .. } => {
                let (next_key, value) = entries.next()?;
                *key = Some(next_key);
                Some(value)
            }
            Frame::Array { elements, .. } => elements.next(),
        }
    }

    fn accept(&mut self, value: Option<Value>) {
        match self {
            Frame::Object { key, map, .. } => {
                if let (Some(key), Some(value)) = (key.take(), value) {
                    map.insert(key, value);
                }
            }
            Frame::Array { items, .. } => items.push(value.unwrap_or(Value::Null)),
        }
    }

    fn finish(self) -> Value {
        match self {
            Frame::Object { map, .. } => Value::Object(map),
            Frame::Array { items, .. } => Value::Array(items),
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
