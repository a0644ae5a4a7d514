//! Observable - a value container that reports every write.
//!
//! Reads are plain passthrough. Every write runs the same cycle:
//!
//! 1. snapshot the current value
//! 2. apply the mutation
//! 3. `before(snapshot)`
//! 4. `after()`
//!
//! There is no batching. Two writes in a row run two full cycles, and the
//! second does not start until the first cycle's hooks have returned.
//!
//! [`Observable::shared`] hands out `Rc` handles to nested values. A handle
//! stays the same pointer until a write touches its location, which lets
//! identity comparison skip arrays and objects nobody wrote to.
//!
//! # Example
//!
//! ```ignore
//! use mosaic::reactive::{ChangeHooks, Observable};
//! use serde_json::json;
//!
//! let data = Observable::new(
//!     json!({ "count": 1, "todos": ["a"] }),
//!     ChangeHooks::new(|old| println!("was {old}"), || Ok(())),
//! );
//!
//! data.set_field("count", 2)?;
//! data.array("todos").unwrap().push("b")?;
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::array::ObservableArray;
use crate::error::Result;

// =============================================================================
// Hooks
// =============================================================================

/// Called with the pre-mutation snapshot once the write has been applied.
pub type BeforeChange = Rc<dyn Fn(&Value)>;

/// Called after [`BeforeChange`]. Errors propagate out of the write call.
pub type AfterChange = Rc<dyn Fn() -> Result<()>>;

/// The two callbacks an [`Observable`] runs on every write.
#[derive(Clone)]
pub struct ChangeHooks {
    before: BeforeChange,
    after: AfterChange,
}

impl ChangeHooks {
    pub fn new(before: impl Fn(&Value) + 'static, after: impl Fn() -> Result<()> + 'static) -> Self {
        Self {
            before: Rc::new(before),
            after: Rc::new(after),
        }
    }

    /// Hooks that do nothing.
    pub fn none() -> Self {
        Self::new(|_| {}, || Ok(()))
    }
}

impl fmt::Debug for ChangeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeHooks")
    }
}

// =============================================================================
// Observable
// =============================================================================

struct ObservableInner {
    value: RefCell<Value>,
    /// Handles given out by `shared`, keyed by JSON pointer.
    shared: RefCell<HashMap<String, Rc<Value>>>,
    hooks: ChangeHooks,
}

/// Shared handle to an observed `serde_json::Value`.
///
/// Cloning the handle shares the value and the hooks.
#[derive(Clone)]
pub struct Observable {
    inner: Rc<ObservableInner>,
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable").field(&*self.inner.value.borrow()).finish()
    }
}

impl Observable {
    pub fn new(value: Value, hooks: ChangeHooks) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                shared: RefCell::default(),
                hooks,
            }),
        }
    }

    /// An observable whose writes notify nobody.
    pub fn detached(value: Value) -> Self {
        Self::new(value, ChangeHooks::none())
    }

    pub fn ptr_eq(&self, other: &Observable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Snapshot of the whole value.
    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Borrow the value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Top-level field of an object value.
    pub fn field(&self, key: &str) -> Option<Value> {
        self.inner.value.borrow().get(key).cloned()
    }

    /// Value at a JSON pointer (`/todos/0`).
    pub fn pointer(&self, pointer: &str) -> Option<Value> {
        self.inner.value.borrow().pointer(pointer).cloned()
    }

    /// Shared handle to the value at `location` (a JSON pointer or a
    /// top-level key).
    ///
    /// Repeated calls return the same `Rc` until a write reaches that
    /// location, one of its ancestors or one of its descendants.
    pub fn shared(&self, location: &str) -> Option<Rc<Value>> {
        let pointer = normalize(location);
        if let Some(handle) = self.inner.shared.borrow().get(&pointer) {
            return Some(Rc::clone(handle));
        }
        let handle = Rc::new(self.inner.value.borrow().pointer(&pointer)?.clone());
        self.inner
            .shared
            .borrow_mut()
            .insert(pointer, Rc::clone(&handle));
        Some(handle)
    }

    /// JSON pointers of every array nested in the value.
    pub fn array_pointers(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_arrays(&self.inner.value.borrow(), String::new(), &mut out);
        out
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Replace the whole value.
    pub fn set(&self, value: Value) -> Result<()> {
        self.mutate("", move |current| {
            *current = value;
            Some(())
        })?;
        Ok(())
    }

    /// Set a top-level field. Returns `Ok(false)` without notifying when the
    /// value is not an object.
    pub fn set_field(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        let location = format!("/{}", escape_pointer_token(key));
        let applied = self.mutate(&location, move |current| {
            current.as_object_mut()?.insert(key.to_string(), value);
            Some(())
        })?;
        Ok(applied.is_some())
    }

    /// Overwrite the value at an existing JSON pointer. Returns `Ok(false)`
    /// without notifying when the pointer does not resolve.
    pub fn set_pointer(&self, pointer: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        let applied = self.mutate(pointer, move |current| {
            *current.pointer_mut(pointer)? = value;
            Some(())
        })?;
        Ok(applied.is_some())
    }

    /// Arbitrary mutation. Always notifies.
    ///
    /// `f` works on a copy, so it may read this observable. Writes it makes
    /// to the observable itself are overwritten by the copy.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> Result<R> {
        let snapshot = self.get();
        let mut next = snapshot.clone();
        let outcome = f(&mut next);
        *self.inner.value.borrow_mut() = next;
        self.invalidate("");
        self.notify(&snapshot)?;
        Ok(outcome)
    }

    /// Handle to the array at `location`, if one is there.
    ///
    /// `location` is a JSON pointer (`/lists/0/items`) or a top-level key
    /// (`todos`). Mutations through the handle notify this observable's hooks.
    pub fn array(&self, location: &str) -> Option<ObservableArray> {
        let pointer = normalize(location);
        let is_array = self
            .inner
            .value
            .borrow()
            .pointer(&pointer)
            .is_some_and(Value::is_array);
        is_array.then(|| ObservableArray::new(self.clone(), pointer))
    }

    /// Run one write cycle on the value at `location`. `f` returns `None`
    /// when it did not change anything, in which case no hook runs.
    pub(crate) fn mutate<R>(
        &self,
        location: &str,
        f: impl FnOnce(&mut Value) -> Option<R>,
    ) -> Result<Option<R>> {
        let (snapshot, outcome) = {
            let mut current = self.inner.value.borrow_mut();
            let snapshot = current.clone();
            match f(&mut *current) {
                Some(outcome) => (snapshot, outcome),
                None => return Ok(None),
            }
        };
        self.invalidate(location);
        self.notify(&snapshot)?;
        Ok(Some(outcome))
    }

    /// Drop the shared handles a write at `location` may have changed.
    fn invalidate(&self, location: &str) {
        self.inner
            .shared
            .borrow_mut()
            .retain(|pointer, _| !overlaps(pointer, location));
    }

    fn notify(&self, snapshot: &Value) -> Result<()> {
        (self.inner.hooks.before)(snapshot);
        (self.inner.hooks.after)()
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// A JSON pointer, or a top-level key turned into one.
fn normalize(location: &str) -> String {
    if location.is_empty() || location.starts_with('/') {
        location.to_string()
    } else {
        format!("/{}", escape_pointer_token(location))
    }
}

/// Whether one pointer addresses the other or something inside it.
fn overlaps(a: &str, b: &str) -> bool {
    fn within(inner: &str, outer: &str) -> bool {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
    within(a, b) || within(b, a)
}

fn collect_arrays(value: &Value, prefix: String, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            out.push(prefix.clone());
            for (index, item) in items.iter().enumerate() {
                collect_arrays(item, format!("{prefix}/{index}"), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                collect_arrays(item, format!("{prefix}/{}", escape_pointer_token(key)), out);
            }
        }
        _ => {}
    }
}
