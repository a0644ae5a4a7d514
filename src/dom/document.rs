//! In-memory document.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Removing a node from its
//! parent only detaches it; [`Document::dispose`] is what makes an id invalid
//! and returns its slot for reuse. A reused slot gets a new generation, so a
//! stale id never resolves to the node that took its place.
//! Every mutation is counted in [`MutationStats`] so callers can verify how
//! much DOM work a render pass actually did.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::event::{Event, EventHandler, ListenerId};
use crate::error::{DomError, MosaicError};

// =============================================================================
// Node Types
// =============================================================================

/// Handle to a node in a [`Document`]: arena slot plus slot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Id of slot `raw` in its first generation.
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            index: raw,
            generation: 0,
        }
    }

    /// Arena slot.
    pub const fn raw(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            generation => write!(f, "#{}v{generation}", self.index),
        }
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Element with attributes in insertion order.
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

struct Listener {
    id: ListenerId,
    event: String,
    handler: EventHandler,
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
    generation: u32,
    alive: bool,
}

impl Node {
    fn new(kind: NodeKind, generation: u32) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            generation,
            alive: true,
        }
    }
}

/// Counts of every mutation applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationStats {
    pub nodes_created: u64,
    pub attribute_writes: u64,
    pub attribute_removals: u64,
    pub text_writes: u64,
    pub child_insertions: u64,
    pub child_removals: u64,
    pub replacements: u64,
    pub listeners_attached: u64,
    pub listeners_detached: u64,
}

impl MutationStats {
    /// Total number of writes, excluding node creation.
    pub fn writes(&self) -> u64 {
        self.attribute_writes
            + self.attribute_removals
            + self.text_writes
            + self.child_insertions
            + self.child_removals
            + self.replacements
            + self.listeners_attached
            + self.listeners_detached
    }
}

// =============================================================================
// Document Inner
// =============================================================================

struct DocumentInner {
    nodes: Vec<Node>,
    /// Slots of disposed nodes, reused by `push`.
    free: Vec<u32>,
    body: NodeId,
    next_listener: u64,
    stats: MutationStats,
}

impl DocumentInner {
    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes
            .get(id.index as usize)
            .filter(|node| node.alive && node.generation == id.generation)
            .ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes
            .get_mut(id.index as usize)
            .filter(|node| node.alive && node.generation == id.generation)
            .ok_or(DomError::UnknownNode(id))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.stats.nodes_created += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index as usize];
            let generation = slot.generation.wrapping_add(1);
            *slot = Node::new(kind, generation);
            return NodeId { index, generation };
        }
        let index = self.nodes.len() as u32;
        self.nodes.push(Node::new(kind, 0));
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Invalidate `id` and its subtree and free their slots.
    fn release(&mut self, id: NodeId) -> Result<(), DomError> {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = self.node_mut(next)?;
            node.alive = false;
            node.parent = None;
            node.kind = NodeKind::Text(String::new());
            node.listeners.clear();
            stack.append(&mut node.children);
            self.free.push(next.index);
        }
        Ok(())
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Vec<(String, String)>, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    /// Unlink `child` from its current parent, if any.
    fn unlink(&mut self, child: NodeId) -> Result<bool, DomError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(false);
        };
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;
        self.stats.child_removals += 1;
        Ok(true)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> Result<bool, DomError> {
        loop {
            if node == ancestor {
                return Ok(true);
            }
            match self.node(node)?.parent {
                Some(parent) => node = parent,
                None => return Ok(false),
            }
        }
    }

    fn insert_at(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) -> Result<(), DomError> {
        if let NodeKind::Text(_) = self.node(parent)?.kind {
            return Err(DomError::NotAnElement(parent));
        }
        if self.is_ancestor_or_self(child, parent)? {
            return Err(DomError::Cycle { parent, child });
        }
        self.unlink(child)?;
        let children = &mut self.node_mut(parent)?.children;
        match at {
            Some(index) if index <= children.len() => children.insert(index, child),
            _ => children.push(child),
        }
        self.node_mut(child)?.parent = Some(parent);
        self.stats.child_insertions += 1;
        Ok(())
    }

    fn clone_subtree(&mut self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let (kind, children) = {
            let node = self.node(id)?;
            (node.kind.clone(), node.children.clone())
        };
        let copy = self.push(kind);
        if deep {
            for child in children {
                let child_copy = self.clone_subtree(child, true)?;
                self.node_mut(child_copy)?.parent = Some(copy);
                self.node_mut(copy)?.children.push(child_copy);
            }
        }
        Ok(copy)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<(), DomError> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out)?;
                }
            }
        }
        Ok(())
    }

    fn write_html(&self, id: NodeId, out: &mut String) -> Result<(), DomError> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value));
                    out.push('"');
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out)?;
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Document
// =============================================================================

/// Shared handle to an in-memory document. Cloning shares the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("body", &inner.body)
            .finish()
    }
}

impl Document {
    /// Create a document containing only an empty `<body>`.
    pub fn new() -> Self {
        let mut inner = DocumentInner {
            nodes: Vec::new(),
            free: Vec::new(),
            body: NodeId::from_raw(0),
            next_listener: 0,
            stats: MutationStats::default(),
        };
        inner.body = inner.push(NodeKind::Element {
            tag: "body".into(),
            attributes: Vec::new(),
        });
        inner.stats = MutationStats::default();
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// The document root. Nodes reachable from here are "attached".
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.inner.borrow_mut().push(NodeKind::Element {
            tag: tag.into(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.inner.borrow_mut().push(NodeKind::Text(text.into()))
    }

    /// Copy a node (and, when `deep`, its subtree). Listeners are not copied
    /// and the copy starts detached.
    pub fn clone_node(&self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        self.inner.borrow_mut().clone_subtree(id, deep)
    }

    /// Detach a node and invalidate it together with its subtree.
    pub fn dispose(&self, id: NodeId) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        if id == inner.body {
            return Err(DomError::NotAnElement(id));
        }
        inner.unlink(id)?;
        inner.release(id)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Whether `id` names a live (not disposed) node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.borrow().node(id).is_ok()
    }

    /// Number of live nodes, the body included.
    pub fn live_nodes(&self) -> usize {
        let inner = self.inner.borrow();
        inner.nodes.len() - inner.free.len()
    }

    /// Whether `id` is reachable from the body.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let inner = self.inner.borrow();
        let body = inner.body;
        inner.is_ancestor_or_self(body, id).unwrap_or(false)
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, DomError> {
        Ok(self.inner.borrow().node(id)?.kind.clone())
    }

    pub fn tag(&self, id: NodeId) -> Option<String> {
        match self.inner.borrow().node(id).ok()?.kind {
            NodeKind::Element { ref tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Whether `id` is a live text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.inner
            .borrow()
            .node(id)
            .is_ok_and(|node| matches!(node.kind, NodeKind::Text(_)))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(id).ok()?.parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Follow child indices from `root`.
    pub fn resolve_path(&self, root: NodeId, path: &[usize]) -> Result<NodeId, DomError> {
        let inner = self.inner.borrow();
        let mut current = root;
        inner.node(current)?;
        for &index in path {
            current = *inner
                .node(current)?
                .children
                .get(index)
                .ok_or_else(|| DomError::UnresolvedPath {
                    root,
                    path: path.to_vec(),
                })?;
        }
        Ok(current)
    }

    /// First attached element whose `id` attribute equals `element_id`.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let mut stack = vec![inner.body];
        while let Some(id) = stack.pop() {
            let node = inner.node(id).ok()?;
            if let NodeKind::Element { attributes, .. } = &node.kind {
                if attributes.iter().any(|(n, v)| n == "id" && v == element_id) {
                    return Some(id);
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        match &self.inner.borrow().node(id).ok()?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let _ = self.inner.borrow().collect_text(id, &mut out);
        out
    }

    /// Serialize a subtree as HTML.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let _ = self.inner.borrow().write_html(id, &mut out);
        out
    }

    pub fn stats(&self) -> MutationStats {
        self.inner.borrow().stats
    }

    pub fn reset_stats(&self) {
        self.inner.borrow_mut().stats = MutationStats::default();
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let attributes = inner.element_mut(id)?;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        inner.stats.attribute_writes += 1;
        Ok(())
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let mut inner = self.inner.borrow_mut();
        let attributes = inner.element_mut(id)?;
        let before = attributes.len();
        attributes.retain(|(n, _)| n != name);
        let removed = attributes.len() != before;
        if removed {
            inner.stats.attribute_removals += 1;
        }
        Ok(removed)
    }

    /// Set the text of a text node, or replace an element's children with a
    /// single text node. An element whose only child is already a text node
    /// keeps that node and has its text rewritten.
    pub fn set_text_content(&self, id: NodeId, text: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let target = match inner.node(id)?.children.as_slice() {
            [only] if matches!(inner.node(*only)?.kind, NodeKind::Text(_)) => *only,
            _ => id,
        };
        if let NodeKind::Text(existing) = &mut inner.node_mut(target)?.kind {
            existing.clear();
            existing.push_str(text);
            inner.stats.text_writes += 1;
            return Ok(());
        }
        let children = std::mem::take(&mut inner.node_mut(id)?.children);
        for child in children {
            inner.node_mut(child)?.parent = None;
        }
        let text_node = inner.push(NodeKind::Text(text.to_string()));
        inner.node_mut(text_node)?.parent = Some(id);
        inner.node_mut(id)?.children.push(text_node);
        inner.stats.text_writes += 1;
        Ok(())
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.inner.borrow_mut().insert_at(parent, child, None)
    }

    pub fn insert_child(&self, parent: NodeId, child: NodeId, index: usize) -> Result<(), DomError> {
        self.inner.borrow_mut().insert_at(parent, child, Some(index))
    }

    /// Detach `id` from its parent. Returns whether it had one.
    pub fn detach(&self, id: NodeId) -> Result<bool, DomError> {
        self.inner.borrow_mut().unlink(id)
    }

    /// Detach every child of `id`.
    pub fn clear_children(&self, id: NodeId) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let children = std::mem::take(&mut inner.node_mut(id)?.children);
        for child in children {
            inner.node_mut(child)?.parent = None;
            inner.stats.child_removals += 1;
        }
        Ok(())
    }

    /// Put `replacement` where `old` is. Returns false (and does nothing) when
    /// `old` has no parent.
    pub fn replace_node(&self, old: NodeId, replacement: NodeId) -> Result<bool, DomError> {
        let mut inner = self.inner.borrow_mut();
        inner.node(replacement)?;
        let Some(parent) = inner.node(old)?.parent else {
            return Ok(false);
        };
        if old == replacement {
            return Ok(true);
        }
        if inner.is_ancestor_or_self(replacement, parent)? {
            return Err(DomError::Cycle {
                parent,
                child: replacement,
            });
        }
        inner.unlink(replacement)?;
        let slot = inner
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or(DomError::UnknownNode(old))?;
        inner.node_mut(parent)?.children[slot] = replacement;
        inner.node_mut(replacement)?.parent = Some(parent);
        inner.node_mut(old)?.parent = None;
        inner.stats.replacements += 1;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub fn add_event_listener(
        &self,
        id: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId, DomError> {
        let mut inner = self.inner.borrow_mut();
        let listener = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.node_mut(id)?.listeners.push(Listener {
            id: listener,
            event: event.to_string(),
            handler,
        });
        inner.stats.listeners_attached += 1;
        Ok(listener)
    }

    /// Returns whether the listener was attached to `id`.
    pub fn remove_event_listener(&self, id: NodeId, listener: ListenerId) -> Result<bool, DomError> {
        let mut inner = self.inner.borrow_mut();
        let listeners = &mut inner.node_mut(id)?.listeners;
        let before = listeners.len();
        listeners.retain(|l| l.id != listener);
        let removed = listeners.len() != before;
        if removed {
            inner.stats.listeners_detached += 1;
        }
        Ok(removed)
    }

    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.inner
            .borrow()
            .node(id)
            .map(|node| node.listeners.iter().filter(|l| l.event == event).count())
            .unwrap_or(0)
    }

    /// Invoke the `event` listeners of `target` in attachment order.
    ///
    /// Events do not bubble. Returns the number of handlers run; the first
    /// handler error stops delivery and is returned.
    pub fn dispatch(&self, target: NodeId, event: &str, detail: Value) -> Result<usize, MosaicError> {
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.borrow();
            inner
                .node(target)?
                .listeners
                .iter()
                .filter(|l| l.event == event)
                .map(|l| Rc::clone(&l.handler))
                .collect()
        };
        let event = Event::new(event, target).with_detail(detail);
        for handler in &handlers {
            handler(&event)?;
        }
        Ok(handlers.len())
    }
}
