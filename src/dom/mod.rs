//! Document environment.
//!
//! A small arena-backed DOM: elements, text nodes, attributes, child lists,
//! node replacement, deep cloning and event listeners. Components render into
//! it and tests inspect it through [`Document::to_html`] and
//! [`Document::stats`].

mod document;
mod event;

pub use document::{Document, MutationStats, NodeId, NodeKind};
pub use event::{handler, Event, EventHandler, ListenerId};
