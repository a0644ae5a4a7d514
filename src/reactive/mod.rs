//! Reactive data.
//!
//! - [`Observable`] - a shared `serde_json::Value` whose writes run before/after hooks
//! - [`ObservableArray`] - mutating handle to an array nested inside an observable

mod array;
mod observable;

pub use array::ObservableArray;
pub use observable::{AfterChange, BeforeChange, ChangeHooks, Observable};
