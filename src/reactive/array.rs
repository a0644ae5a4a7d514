//! ObservableArray - mutating access to an array inside an [`Observable`].
//!
//! The handle stores a JSON pointer, not the array. Every mutating call goes
//! through the owner's write cycle, so `push` on a nested list triggers the
//! same before/after hooks as a scalar write on the owner.

use serde_json::Value;

use super::observable::Observable;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct ObservableArray {
    owner: Observable,
    pointer: String,
}

impl ObservableArray {
    pub(crate) fn new(owner: Observable, pointer: String) -> Self {
        Self { owner, pointer }
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn owner(&self) -> &Observable {
        &self.owner
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Length, or 0 once the location no longer holds an array.
    pub fn len(&self) -> usize {
        self.read(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.read(|items| items.get(index).cloned()).flatten()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.read(|items| items.to_vec()).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    pub fn push(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        self.write(move |items| {
            items.push(value);
            Some(())
        })
        .map(|applied| applied.is_some())
    }

    /// Remove the last item. An empty array is left alone and nobody is
    /// notified.
    pub fn pop(&self) -> Result<Option<Value>> {
        self.write(Vec::pop)
    }

    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        self.write(move |items| {
            (index <= items.len()).then(|| items.insert(index, value))
        })
        .map(|applied| applied.is_some())
    }

    pub fn remove(&self, index: usize) -> Result<Option<Value>> {
        self.write(move |items| (index < items.len()).then(|| items.remove(index)))
    }

    /// Replace the item at `index`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        self.write(move |items| {
            let slot = items.get_mut(index)?;
            *slot = value;
            Some(())
        })
        .map(|applied| applied.is_some())
    }

    /// Shorten to `len` items. A length write always notifies, even when it
    /// does not remove anything.
    pub fn truncate(&self, len: usize) -> Result<bool> {
        self.write(move |items| {
            items.truncate(len);
            Some(())
        })
        .map(|applied| applied.is_some())
    }

    pub fn clear(&self) -> Result<bool> {
        self.truncate(0)
    }

    /// Keep the items matching `keep`. The predicate runs before the write
    /// starts, so it may read the owner.
    pub fn retain(&self, mut keep: impl FnMut(&Value) -> bool) -> Result<bool> {
        let Some(items) = self.read(|items| items.clone()) else {
            return Ok(false);
        };
        let kept: Vec<Value> = items.into_iter().filter(|item| keep(item)).collect();
        self.write(move |items| {
            *items = kept;
            Some(())
        })
        .map(|applied| applied.is_some())
    }

    fn read<R>(&self, f: impl FnOnce(&Vec<Value>) -> R) -> Option<R> {
        self.owner
            .with(|value| value.pointer(&self.pointer)?.as_array().map(f))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> Option<R>) -> Result<Option<R>> {
        let pointer = self.pointer.as_str();
        self.owner
            .mutate(pointer, move |value| f(value.pointer_mut(pointer)?.as_array_mut()?))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::reactive::ChangeHooks;

    fn counted(value: Value) -> (Observable, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        let observable = Observable::new(
            value,
            ChangeHooks::new(
                |_| {},
                move || {
                    seen.set(seen.get() + 1);
                    Ok(())
                },
            ),
        );
        (observable, count)
    }

    #[test]
    fn test_push_notifies_owner() {
        let (data, notified) = counted(json!({ "todos": ["a"] }));
        let todos = data.array("todos").unwrap();
        assert!(todos.push("b").unwrap());
        assert_eq!(notified.get(), 1);
        assert_eq!(data.field("todos"), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_index_and_length_mutations() {
        let (data, notified) = counted(json!({ "items": [1, 2, 3] }));
        let items = data.array("/items").unwrap();

        assert!(items.set(0, 10).unwrap());
        assert!(items.insert(1, 5).unwrap());
        assert_eq!(items.remove(3).unwrap(), Some(json!(3)));
        assert!(items.truncate(2).unwrap());
        assert_eq!(items.to_vec(), vec![json!(10), json!(5)]);
        assert_eq!(notified.get(), 4);
    }

    #[test]
    fn test_out_of_range_is_silent() {
        let (data, notified) = counted(json!({ "items": [] }));
        let items = data.array("items").unwrap();
        assert_eq!(items.pop().unwrap(), None);
        assert_eq!(items.remove(0).unwrap(), None);
        assert!(!items.set(4, 1).unwrap());
        assert!(!items.insert(2, 1).unwrap());
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn test_handle_goes_inert_when_array_is_replaced() {
        let (data, _) = counted(json!({ "items": [1] }));
        let items = data.array("items").unwrap();
        data.set_field("items", "gone").unwrap();
        assert!(items.is_empty());
        assert!(!items.push(2).unwrap());
    }

    #[test]
    fn test_nested_array_pointer() {
        let (data, notified) = counted(json!({ "lists": [{ "items": [] }] }));
        let items = data.array("/lists/0/items").unwrap();
        items.push("x").unwrap();
        assert_eq!(items.get(0), Some(json!("x")));
        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn test_retain() {
        let (data, _) = counted(json!({ "n": [1, 2, 3, 4] }));
        let n = data.array("n").unwrap();
        n.retain(|v| v.as_i64().is_some_and(|i| i % 2 == 0)).unwrap();
        assert_eq!(n.to_vec(), vec![json!(2), json!(4)]);
    }

    #[test]
    fn test_retain_predicate_may_read_the_owner() {
        let (data, notified) = counted(json!({ "limit": 2, "n": [1, 2, 3] }));
        let n = data.array("n").unwrap();
        let owner = data.clone();
        n.retain(|v| {
            let limit = owner.field("limit").and_then(|l| l.as_i64()).unwrap_or(0);
            v.as_i64().is_some_and(|i| i <= limit)
        })
        .unwrap();
        assert_eq!(n.to_vec(), vec![json!(1), json!(2)]);
        assert_eq!(notified.get(), 1);
    }
}
