//! Actions - named handlers bound to a component's data.
//!
//! An action is declared once on the options as `Fn(&Observable, &Event)`.
//! Each instance binds every action to its own data, producing one
//! [`EventHandler`] per name. The bound handler is created once per instance,
//! so binding `actions.handler("save")` on every render passes the same
//! pointer and the event Part stays clean.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::options::ActionFn;
use crate::dom::{handler, Event, EventHandler, NodeId};
use crate::error::Result;
use crate::reactive::Observable;
use crate::template::DynamicValue;

/// Handlers bound to one instance. Cloning shares them.
#[derive(Clone, Default)]
pub struct Actions {
    handlers: Rc<BTreeMap<String, EventHandler>>,
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl Actions {
    pub(crate) fn bind(definitions: &[(String, ActionFn)], data: &Observable) -> Self {
        let handlers = definitions
            .iter()
            .map(|(name, action)| {
                let data = data.clone();
                let action = Rc::clone(action);
                let bound = handler(move |event| action(&data, event));
                (name.clone(), bound)
            })
            .collect();
        Self {
            handlers: Rc::new(handlers),
        }
    }

    /// Binding value for an event Part. Unknown names bind `Null`, which
    /// leaves the event without a listener.
    pub fn handler(&self, name: &str) -> DynamicValue {
        self.get(name).map_or(DynamicValue::Null, DynamicValue::Handler)
    }

    pub fn get(&self, name: &str) -> Option<EventHandler> {
        self.handlers.get(name).cloned()
    }

    /// Run an action directly, outside any event. Returns `Ok(false)` when no
    /// action has that name.
    pub fn invoke(&self, name: &str, target: NodeId, detail: Value) -> Result<bool> {
        match self.handlers.get(name) {
            Some(handler) => {
                handler(&Event::new(name, target).with_detail(detail))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
