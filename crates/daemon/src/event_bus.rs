// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process typed publish/subscribe for lifecycle events.
//!
//! Dispatch is synchronous on the emitter and iterates subscribers in
//! registration order. A failing or panicking subscriber is logged and
//! isolated; it never breaks the emitter or later subscribers.

use agentctl_core::event::{EventKind, HubEvent};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

type Handler = Box<dyn Fn(&HubEvent) -> Result<(), String> + Send + Sync>;

struct Subscriber {
    /// `None` subscribes to every kind
    kind: Option<EventKind>,
    handler: Handler,
}

/// Event bus for cross-component lifecycle events.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&HubEvent) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.subscribers.lock().push(Subscriber {
            kind: Some(kind),
            handler: Box::new(handler),
        });
    }

    /// Register a handler receiving every event.
    pub fn subscribe_all(
        &self,
        handler: impl Fn(&HubEvent) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.subscribers.lock().push(Subscriber {
            kind: None,
            handler: Box::new(handler),
        });
    }

    /// Deliver an event to matching subscribers, in registration order.
    pub fn emit(&self, event: &HubEvent) {
        let kind = event.kind();
        let subscribers = self.subscribers.lock();
        for subscriber in subscribers.iter() {
            if subscriber.kind.is_some_and(|k| k != kind) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(kind = %kind, error = %e, "event subscriber failed"),
                Err(_) => error!(kind = %kind, "event subscriber panicked"),
            }
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
