//! Events and listener handles.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::NodeId;
use crate::error::Result;

/// Event handler callback.
///
/// Handlers return `Result` so a render failure triggered from inside a
/// handler (an action mutating component data, say) reaches whoever
/// dispatched the event.
pub type EventHandler = Rc<dyn Fn(&Event) -> Result<()>>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler(f: impl Fn(&Event) -> Result<()> + 'static) -> EventHandler {
    Rc::new(f)
}

/// An event delivered to the listeners of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
    /// Free-form payload (input text, key name, ...). `Null` when unused.
    pub detail: Value,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            detail: Value::Null,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Handle returned when a listener is attached; used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}
