//! Event Emitter
//!
//! Corresponds to packages/core/src/event_emitter.ts
//!
//! Directive outputs are `EventEmitter` fields on the directive instance.
//! The `listener` instruction subscribes through the directive definition's
//! output accessor and registers the unsubscribe on the view cleanup list.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::render3::bindings::Value;

type ListenerFn = Rc<dyn Fn(&Value)>;

struct EmitterInner {
    next_id: u64,
    listeners: Vec<(u64, ListenerFn)>,
}

/// A synchronous multicast event channel. Cloning shares the channel.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Rc<RefCell<EmitterInner>>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        EventEmitter::new()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        EventEmitter {
            inner: Rc::new(RefCell::new(EmitterInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Delivers `value` to every subscriber, in subscription order. The
    /// listener list is snapshotted first so listeners may subscribe or
    /// unsubscribe re-entrantly without being invoked for this event.
    pub fn emit(&self, value: &Value) {
        let snapshot: Vec<ListenerFn> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(value);
        }
    }

    pub fn subscribe(&self, listener: Box<dyn Fn(&Value)>) -> OutputSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, listener.into()));
        OutputSubscription {
            emitter: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Handle returned by [`EventEmitter::subscribe`]; dropping it does nothing,
/// unsubscription is explicit so cleanup lists control the lifetime.
pub struct OutputSubscription {
    emitter: Weak<RefCell<EmitterInner>>,
    id: u64,
}

impl OutputSubscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.emitter.upgrade() {
            inner.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
