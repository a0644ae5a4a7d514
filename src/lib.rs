//! # mosaic
//!
//! Reactive component runtime with cached templates and per-binding patching.
//!
//! ## Architecture
//!
//! A component type is parsed once into a template: a detached DOM fragment
//! plus an ordered list of Parts, the points where dynamic values bind. Every
//! instance clones the fragment and keeps its own values. When instance data
//! changes, the view runs again and each Part compares its new value with the
//! last one it committed, touching the document only when they differ:
//!
//! ```text
//! data write -> will_update -> view -> Part dirty check -> commit changed Parts -> updated
//! ```
//!
//! ## Modules
//!
//! - [`dom`] - in-memory document the components render into
//! - [`reactive`] - observable data and nested arrays
//! - [`template`] - markup builder, Parts, the template cache
//! - [`component`] - the [`Mosaic`] component and its options
//! - [`runtime`] - shared document and template cache
//! - [`error`] / [`types`] - errors, ids, lifecycle states, render stats
//!
//! ## Example
//!
//! ```ignore
//! use mosaic::{el, MosaicOptions, Runtime};
//! use serde_json::json;
//!
//! let runtime = Runtime::new();
//! let counter = runtime.mount(
//!     MosaicOptions::new(|data, actions| {
//!         el("div")
//!             .child(el("span").bind(data.field("count")))
//!             .child(el("button").on("click", actions.handler("increment")).text("+"))
//!             .build()
//!     })
//!     .with_data(json!({ "count": 0 }))
//!     .with_action("increment", |data, _| {
//!         let count = data.field("count").and_then(|c| c.as_i64()).unwrap_or(0);
//!         data.set_field("count", count + 1)?;
//!         Ok(())
//!     }),
//! )?;
//! ```

pub mod component;
pub mod dom;
pub mod error;
pub mod reactive;
pub mod runtime;
pub mod template;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use component::{Actions, Anchor, Mosaic, MosaicOptions};
pub use dom::{handler, Document, Event, EventHandler, NodeId};
pub use error::{DomError, MosaicError, Result};
pub use reactive::{ChangeHooks, Observable, ObservableArray};
pub use runtime::Runtime;
pub use template::{
    el, ComparePolicy, DynamicValue, Element, Part, PartKind, Template, TemplateCache,
    TemplateResult,
};
