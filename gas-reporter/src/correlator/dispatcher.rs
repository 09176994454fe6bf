// Copyright (c) The gas-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{LifecycleEvent, LifecycleEventKind, LifecycleListener};
use crate::errors::ReporterError;
use std::fmt;

/// A handler bound to one kind of lifecycle event.
pub type EventHandler<L, T> = fn(&mut L, &LifecycleEvent<'_, T>) -> Result<(), ReporterError>;

/// Routes lifecycle events to a listener through an ordered list of bindings.
///
/// Each binding pairs an event kind with a handler. When an event is dispatched, every binding
/// for its kind runs in registration order; the first error stops dispatch and is returned to
/// the host unchanged.
pub struct EventDispatcher<L, T> {
    listener: L,
    bindings: Vec<(LifecycleEventKind, EventHandler<L, T>)>,
}

impl<L, T> EventDispatcher<L, T> {
    /// Creates a dispatcher with no bindings.
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            bindings: Vec::new(),
        }
    }

    /// Appends a binding.
    pub fn register(
        &mut self,
        kind: LifecycleEventKind,
        handler: EventHandler<L, T>,
    ) -> &mut Self {
        self.bindings.push((kind, handler));
        self
    }

    /// Returns the kinds of the registered bindings, in order.
    pub fn bound_kinds(&self) -> impl Iterator<Item = LifecycleEventKind> + '_ {
        self.bindings.iter().map(|(kind, _)| *kind)
    }

    /// Delivers an event to every binding registered for its kind.
    pub fn dispatch(&mut self, event: LifecycleEvent<'_, T>) -> Result<(), ReporterError> {
        let kind = event.kind();
        for (bound, handler) in &self.bindings {
            if *bound == kind {
                handler(&mut self.listener, &event)?;
            }
        }
        Ok(())
    }

    /// Returns the listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Returns the listener mutably.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Consumes the dispatcher, returning the listener.
    pub fn into_listener(self) -> L {
        self.listener
    }
}

impl<L: LifecycleListener<T>, T> EventDispatcher<L, T> {
    /// Creates a dispatcher that forwards every event kind to the matching listener method.
    pub fn with_standard_bindings(listener: L) -> Self {
        let mut dispatcher = Self::new(listener);
        for kind in LifecycleEventKind::STANDARD_ORDER {
            dispatcher.register(kind, forward::<L, T>);
        }
        dispatcher
    }
}

impl<L: fmt::Debug, T> fmt::Debug for EventDispatcher<L, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listener", &self.listener)
            .field("bindings", &self.bound_kinds().collect::<Vec<_>>())
            .finish()
    }
}

fn forward<L: LifecycleListener<T>, T>(
    listener: &mut L,
    event: &LifecycleEvent<'_, T>,
) -> Result<(), ReporterError> {
    match *event {
        LifecycleEvent::RunBegin => listener.on_run_begin(),
        LifecycleEvent::TestBegin { test } => listener.on_test_begin(test),
        LifecycleEvent::HookEnd { title } => listener.on_hook_end(title),
        LifecycleEvent::TestEnd { test } => listener.on_test_end(test),
        LifecycleEvent::Outcome { outcome, test } => listener.on_outcome(outcome, test),
        LifecycleEvent::RunEnd => listener.on_run_end(),
    }
}
