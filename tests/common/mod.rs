//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use flow_designer::{EventBus, EventFilter};
use std::cell::RefCell;
use std::rc::Rc;

/// Records what went over the bus and what the designer reported.
#[derive(Default, Clone)]
pub struct EventRecorder {
    /// Event names in delivery order
    pub events: Rc<RefCell<Vec<String>>>,
    /// Versions passed to the designer's change observer
    pub versions: Rc<RefCell<Vec<u64>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event on `bus`.
    pub fn attach(&self, bus: &EventBus) {
        let events = self.events.clone();
        bus.subscribe(EventFilter::All, move |event| {
            events.borrow_mut().push(event.name().to_string());
        });
    }

    pub fn names(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn change_count(&self) -> usize {
        self.versions.borrow().len()
    }

    /// Clear all recordings.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.versions.borrow_mut().clear();
    }
}
