// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic values owned by the host framework.
//!
//! Errors thrown by tests are arbitrary object graphs that may share or reference themselves.
//! [`HostValue`] models such graphs: objects and arrays are reference-counted handles, so two
//! values can point at the same object and an object can (directly or indirectly) contain itself.

use indexmap::IndexMap;
use std::{cell::RefCell, fmt, rc::Rc};

/// A value in the host framework's object graph.
#[derive(Clone, Debug, Default)]
pub enum HostValue {
    /// An absent value. Omitted from objects when serialized.
    #[default]
    Undefined,

    /// An explicit null.
    Null,

    /// A boolean.
    Bool(bool),

    /// A number. Non-finite numbers serialize as null.
    Number(f64),

    /// A string.
    String(String),

    /// A handle to an array.
    Array(HostArray),

    /// A handle to an object.
    Object(HostObject),
}

impl HostValue {
    /// Returns the object handle, if this is an object.
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the array handle, if this is an array.
    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            HostValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns the identity of the object or array this value refers to, if any.
    pub fn identity(&self) -> Option<ValueId> {
        match self {
            HostValue::Object(object) => Some(object.identity()),
            HostValue::Array(array) => Some(array.identity()),
            _ => None,
        }
    }

    /// Coerces this value to a string the way the host language's `String(value)` would.
    ///
    /// Plain objects become `[object Object]`, error objects become `Name: message`, and arrays
    /// join their elements with commas. Never recurses into a cycle.
    pub fn coerce_to_string(&self) -> String {
        let mut arrays = Vec::new();
        coerce(self, &mut arrays)
    }
}

fn coerce(value: &HostValue, arrays: &mut Vec<ValueId>) -> String {
    match value {
        HostValue::Undefined => "undefined".to_owned(),
        HostValue::Null => "null".to_owned(),
        HostValue::Bool(b) => b.to_string(),
        HostValue::Number(n) => format_number(*n),
        HostValue::String(s) => s.clone(),
        HostValue::Object(object) => object.coerce_to_string(),
        HostValue::Array(array) => {
            let id = array.identity();
            if arrays.contains(&id) {
                // Joining an array that contains itself yields an empty string.
                return String::new();
            }
            arrays.push(id);
            let joined = array
                .elements()
                .iter()
                .map(|element| match element {
                    HostValue::Undefined | HostValue::Null => String::new(),
                    other => coerce(other, arrays),
                })
                .collect::<Vec<_>>()
                .join(",");
            arrays.pop();
            joined
        }
    }
}

/// Formats a number the way the host language prints it: integral values have no fraction.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_owned()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        n.to_string()
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Number(n as f64)
    }
}

impl From<u64> for HostValue {
    fn from(n: u64) -> Self {
        HostValue::Number(n as f64)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<HostObject> for HostValue {
    fn from(object: HostObject) -> Self {
        HostValue::Object(object)
    }
}

impl From<HostArray> for HostValue {
    fn from(array: HostArray) -> Self {
        HostValue::Array(array)
    }
}

/// The identity of an object or array in the host graph.
///
/// Two handles have the same identity if and only if they refer to the same allocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ValueId(usize);

/// What kind of object a [`HostObject`] is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ObjectKind {
    /// An ordinary object.
    Plain,

    /// An error object, with the name of its error class.
    Error {
        /// The error class name, e.g. `AssertionError`.
        name: String,
    },
}

#[derive(Clone, Debug)]
struct Property {
    value: HostValue,
    enumerable: bool,
}

#[derive(Debug)]
struct ObjectData {
    kind: ObjectKind,
    properties: IndexMap<String, Property>,
}

/// A shared handle to an object in the host graph.
///
/// Properties keep insertion order. Each property is either enumerable (visible to ordinary
/// iteration and serialization) or hidden (only visible when asking for every own property).
#[derive(Clone)]
pub struct HostObject(Rc<RefCell<ObjectData>>);

impl HostObject {
    /// Creates a new, empty plain object.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }

    /// Creates a new error object with a hidden `message` property.
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        let object = Self::with_kind(ObjectKind::Error { name: name.into() });
        object.set_hidden("message", message.into());
        object
    }

    fn with_kind(kind: ObjectKind) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            kind,
            properties: IndexMap::new(),
        })))
    }

    /// Returns the kind of this object.
    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind.clone()
    }

    /// Returns true if this is an error object.
    pub fn is_error(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Error { .. })
    }

    /// Returns the identity of this object.
    pub fn identity(&self) -> ValueId {
        ValueId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    /// Returns true if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Sets an enumerable property, returning `self` for chaining.
    pub fn set(&self, key: impl Into<String>, value: impl Into<HostValue>) -> &Self {
        self.insert(key.into(), value.into(), true);
        self
    }

    /// Sets a hidden (non-enumerable) property, returning `self` for chaining.
    pub fn set_hidden(&self, key: impl Into<String>, value: impl Into<HostValue>) -> &Self {
        self.insert(key.into(), value.into(), false);
        self
    }

    fn insert(&self, key: String, value: HostValue, enumerable: bool) {
        let mut data = self.0.borrow_mut();
        match data.properties.get_mut(&key) {
            // Assigning to an existing property keeps its enumerability.
            Some(property) => property.value = value,
            None => {
                data.properties.insert(key, Property { value, enumerable });
            }
        }
    }

    /// Returns the value of an own property.
    pub fn get(&self, key: &str) -> Option<HostValue> {
        self.0
            .borrow()
            .properties
            .get(key)
            .map(|property| property.value.clone())
    }

    /// Returns the names of every own property, hidden ones included, in insertion order.
    pub fn own_property_names(&self) -> Vec<String> {
        self.0.borrow().properties.keys().cloned().collect()
    }

    /// Returns every own property, hidden ones included, in insertion order.
    pub fn own_entries(&self) -> Vec<(String, HostValue)> {
        self.0
            .borrow()
            .properties
            .iter()
            .map(|(key, property)| (key.clone(), property.value.clone()))
            .collect()
    }

    /// Returns the enumerable own properties, in insertion order.
    pub fn enumerable_entries(&self) -> Vec<(String, HostValue)> {
        self.0
            .borrow()
            .properties
            .iter()
            .filter(|(_, property)| property.enumerable)
            .map(|(key, property)| (key.clone(), property.value.clone()))
            .collect()
    }

    /// Coerces this object to a string.
    pub fn coerce_to_string(&self) -> String {
        let data = self.0.borrow();
        match &data.kind {
            ObjectKind::Plain => "[object Object]".to_owned(),
            ObjectKind::Error { name } => {
                let name = match data.properties.get("name").map(|p| &p.value) {
                    Some(HostValue::String(own)) => own.clone(),
                    _ => name.clone(),
                };
                let message = match data.properties.get("message").map(|p| &p.value) {
                    Some(HostValue::String(message)) => message.clone(),
                    _ => String::new(),
                };
                match (name.is_empty(), message.is_empty()) {
                    (true, _) => message,
                    (false, true) => name,
                    (false, false) => format!("{name}: {message}"),
                }
            }
        }
    }
}

impl Default for HostObject {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostObject {
    // Never recurses into properties, since they may refer back to this object.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("HostObject")
            .field("id", &self.identity())
            .field("kind", &data.kind)
            .field("keys", &data.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A shared handle to an array in the host graph.
#[derive(Clone, Default)]
pub struct HostArray(Rc<RefCell<Vec<HostValue>>>);

impl HostArray {
    /// Creates a new, empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identity of this array.
    pub fn identity(&self) -> ValueId {
        ValueId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    /// Appends an element, returning `self` for chaining.
    pub fn push(&self, value: impl Into<HostValue>) -> &Self {
        self.0.borrow_mut().push(value.into());
        self
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns a snapshot of the elements.
    pub fn elements(&self) -> Vec<HostValue> {
        self.0.borrow().clone()
    }
}

impl<V: Into<HostValue>> FromIterator<V> for HostArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(Rc::new(RefCell::new(
            iter.into_iter().map(Into::into).collect(),
        )))
    }
}

impl fmt::Debug for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostArray")
            .field("id", &self.identity())
            .field("len", &self.len())
            .finish()
    }
}
