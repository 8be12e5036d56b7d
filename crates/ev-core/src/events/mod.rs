//! System-wide event bus
//!
//! Handlers are registered under a string event name and invoked in
//! subscription order. `publish` works on a snapshot of the handler list, so a
//! handler that subscribes or unsubscribes while running never changes the
//! delivery already in progress. A failing handler (error or panic) is logged
//! and skipped; the remaining handlers still run and the publisher never sees
//! the failure.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::state::ProjectId;

/// Well-known event names
pub mod names {
    /// A project was chosen; payload is [`super::BusEvent::SelectionChanged`]
    pub const SELECTION_CHANGED: &str = "selection:changed";

    /// The host window changed size
    pub const WINDOW_RESIZED: &str = "window:resize";

    /// The registry created an instance
    pub const VISUALIZATION_CREATED: &str = "visualization:created";

    /// The registry removed an instance
    pub const VISUALIZATION_REMOVED: &str = "visualization:removed";
}

/// Payload carried by a published event
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    SelectionChanged {
        project_id: ProjectId,
    },
    WindowResized {
        width: f32,
        height: f32,
    },
    VisualizationCreated {
        id: String,
        kind: String,
    },
    VisualizationRemoved {
        id: String,
    },
    Custom(serde_json::Value),
}

impl BusEvent {
    /// Project carried by a selection event
    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            BusEvent::SelectionChanged { project_id } => Some(*project_id),
            _ => None,
        }
    }
}

/// A registered callback
///
/// Identity is the `Arc` allocation: keep a clone to unsubscribe by value.
pub type EventHandler = Arc<dyn Fn(&BusEvent) -> anyhow::Result<()> + Send + Sync>;

/// Outcome of a single `publish`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that returned `Ok`
    pub handled: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

impl PublishReport {
    /// Number of handlers invoked
    pub fn invoked(&self) -> usize {
        self.handled + self.failed
    }
}

struct Registration {
    id: u64,
    handler: EventHandler,
}

struct BusInner {
    table: Mutex<AHashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
    debug: AtomicBool,
}

impl BusInner {
    fn remove_registration(&self, event: &str, id: u64) -> bool {
        let mut table = self.table.lock();
        let Some(registrations) = table.get_mut(event) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            table.remove(event);
        }
        removed
    }
}

/// Publish/subscribe registry
///
/// Cheap to clone; clones share the same subscription table.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                table: Mutex::new(AHashMap::new()),
                next_id: AtomicU64::new(1),
                debug: AtomicBool::new(false),
            }),
        }
    }

    /// Log every subscribe/unsubscribe/publish at debug level
    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.store(enabled, Ordering::Relaxed);
    }

    fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    /// Subscribe a closure to `event`
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe_handler(event, Arc::new(handler))
    }

    /// Subscribe an existing handler to `event`
    ///
    /// The same handler may be registered several times; each registration is
    /// a distinct entry. An empty event name registers nothing and returns an
    /// inactive handle.
    pub fn subscribe_handler(&self, event: &str, handler: EventHandler) -> Subscription {
        if event.is_empty() {
            return Subscription::inactive();
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .table
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(Registration { id, handler });

        if self.debug_enabled() {
            debug!(event, id, "Subscribed");
        }

        Subscription {
            bus: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id: Some(id),
        }
    }

    /// Remove every registration of `handler` under `event`
    ///
    /// Unknown events or handlers are ignored.
    pub fn unsubscribe(&self, event: &str, handler: &EventHandler) {
        let mut table = self.inner.table.lock();
        let Some(registrations) = table.get_mut(event) else {
            return;
        };

        registrations.retain(|r| !Arc::ptr_eq(&r.handler, handler));
        if registrations.is_empty() {
            table.remove(event);
        }
        drop(table);

        if self.debug_enabled() {
            debug!(event, "Unsubscribed");
        }
    }

    /// Invoke every handler currently registered for `event`
    pub fn publish(&self, event: &str, payload: BusEvent) -> PublishReport {
        let snapshot: Vec<EventHandler> = {
            let table = self.inner.table.lock();
            match table.get(event) {
                Some(registrations) => registrations.iter().map(|r| Arc::clone(&r.handler)).collect(),
                None => return PublishReport::default(),
            }
        };

        if self.debug_enabled() {
            debug!(event, subscribers = snapshot.len(), ?payload, "Publishing");
        }

        let mut report = PublishReport::default();
        for handler in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(&payload))) {
                Ok(Ok(())) => report.handled += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    error!(event, error = %err, "Event handler failed");
                }
                Err(panic) => {
                    report.failed += 1;
                    error!(event, panic = panic_message(panic.as_ref()), "Event handler panicked");
                }
            }
        }
        report
    }

    /// Number of registrations for `event`
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner.table.lock().get(event).map(Vec::len).unwrap_or(0)
    }

    /// Remove all subscriptions
    pub fn clear(&self) {
        self.inner.table.lock().clear();

        if self.debug_enabled() {
            debug!("Cleared all subscriptions");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Handle to one registration
///
/// Dropping the handle leaves the registration in place; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<BusInner>,
    event: String,
    id: Option<u64>,
}

impl Subscription {
    fn inactive() -> Self {
        Self {
            bus: Weak::new(),
            event: String::new(),
            id: None,
        }
    }

    /// Event name this handle was registered under
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether the registration is still present on its bus
    pub fn is_active(&self) -> bool {
        let (Some(id), Some(bus)) = (self.id, self.bus.upgrade()) else {
            return false;
        };
        let table = bus.table.lock();
        table
            .get(&self.event)
            .map(|registrations| registrations.iter().any(|r| r.id == id))
            .unwrap_or(false)
    }

    /// Remove exactly this registration; repeated calls are no-ops
    pub fn unsubscribe(&self) {
        if let (Some(id), Some(bus)) = (self.id, self.bus.upgrade()) {
            bus.remove_registration(&self.event, id);
        }
    }
}
