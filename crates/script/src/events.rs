//! Explicit-dispatch event registry.
//!
//! There is no event loop anywhere in the pipeline; hosts dispatch events
//! by calling [`EventRegistry::dispatch`] directly.

use crate::bridge::MutationResult;
use html::dom::Document;

/// The event kinds hosts can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Click,
    Input,
    Change,
}

/// Lowercase name of an event type.
#[must_use]
pub const fn event_type_name(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Click => "click",
        EventType::Input => "input",
        EventType::Change => "change",
    }
}

/// One dispatched event.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// What kind of event this is.
    pub event_type: EventType,
    /// The `id` attribute of the event target.
    pub target_id: String,
    /// Event payload (input text, etc.); empty when not applicable.
    pub value: String,
}

/// Handler invoked with mutable access to the document.
pub type EventHandler = Box<dyn Fn(&mut Document, &DomEvent)>;

struct EventBinding {
    target_id: String,
    event_type: EventType,
    handler: EventHandler,
}

/// Registered listeners, dispatched in registration order.
#[derive(Default)]
pub struct EventRegistry {
    bindings: Vec<EventBinding>,
}

impl EventRegistry {
    /// Register a handler for `(target_id, event_type)`.
    pub fn add_listener(&mut self, target_id: &str, event_type: EventType, handler: EventHandler) {
        self.bindings.push(EventBinding {
            target_id: target_id.to_owned(),
            event_type,
            handler,
        });
    }

    /// Run every matching handler against the document.
    pub fn dispatch(&self, document: &mut Document, event: &DomEvent) -> MutationResult {
        let mut any_handled = false;
        for binding in &self.bindings {
            if binding.target_id == event.target_id && binding.event_type == event.event_type {
                (binding.handler)(document, event);
                any_handled = true;
            }
        }

        if any_handled {
            MutationResult {
                ok: true,
                message: "OK".to_owned(),
            }
        } else {
            MutationResult {
                ok: true,
                message: "No handler for event".to_owned(),
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.bindings.len()
    }

    /// Drop all listeners.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
