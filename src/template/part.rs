//! Parts - dynamic binding points inside a template.
//!
//! A [`Part`] is template-level and immutable: it knows where it lives
//! (a child-index path from the template root) and what it binds (an
//! attribute, an event, or child content). It is shared by every instance of
//! the template.
//!
//! [`PartState`] is the per-instance side: the last committed value, the dirty
//! flag of the current pass, and the listener this Part attached.
//!
//! # Algorithm
//!
//! For every Part, in index order:
//! 1. `check_was_changed` compares the candidate with the last committed value
//! 2. If unchanged: skip (no DOM access at all)
//! 3. Otherwise: `commit` writes the value into the instance's DOM

use std::rc::Rc;

use super::value::{ComparePolicy, DynamicValue};
use crate::component::Mosaic;
use crate::dom::{Document, ListenerId, NodeId};
use crate::error::{DomError, Result};
use crate::types::CommitEffects;

/// What a Part binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// Named attribute of the located element.
    Attribute(String),
    /// Named event of the located element.
    Event(String),
    /// All children of the located element.
    Child,
}

/// A dynamic binding location in a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    index: usize,
    path: Rc<[usize]>,
    kind: PartKind,
}

/// Per-instance state of one Part.
#[derive(Debug, Clone, Default)]
pub struct PartState {
    last: Option<DynamicValue>,
    dirty: bool,
    listener: Option<ListenerId>,
}

impl PartState {
    /// Compare `candidate` against the last committed value and remember it
    /// when it differs. Returns the dirty flag. Touches no DOM.
    pub fn check_was_changed(&mut self, candidate: &DynamicValue, policy: ComparePolicy) -> bool {
        self.dirty = policy.changed(self.last.as_ref(), candidate);
        if self.dirty {
            self.last = Some(candidate.clone());
        }
        self.dirty
    }

    /// Undo `check_was_changed` after a failed commit, so the next pass
    /// retries the value.
    pub fn revert(&mut self, previous: Option<DynamicValue>) {
        self.last = previous;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_value(&self) -> Option<&DynamicValue> {
        self.last.as_ref()
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }
}

impl Part {
    pub fn new(index: usize, path: impl Into<Rc<[usize]>>, kind: PartKind) -> Self {
        Self {
            index,
            path: path.into(),
            kind,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn kind(&self) -> &PartKind {
        &self.kind
    }

    /// The node this Part binds to inside the instance rooted at `root`.
    pub fn locate(&self, doc: &Document, root: NodeId) -> std::result::Result<NodeId, DomError> {
        doc.resolve_path(root, &self.path)
    }

    /// Write `value` into the instance rooted at `root`.
    pub fn commit(
        &self,
        doc: &Document,
        root: NodeId,
        value: &DynamicValue,
        state: &mut PartState,
    ) -> Result<CommitEffects> {
        let node = self.locate(doc, root)?;
        match &self.kind {
            PartKind::Attribute(name) => commit_attribute(doc, node, name, value),
            PartKind::Event(name) => commit_event(doc, node, name, value, state),
            PartKind::Child => commit_child(doc, node, value),
        }
    }
}

fn commit_attribute(
    doc: &Document,
    node: NodeId,
    name: &str,
    value: &DynamicValue,
) -> Result<CommitEffects> {
    match value {
        DynamicValue::Null | DynamicValue::Bool(false) => {
            let removed = doc.remove_attribute(node, name)?;
            Ok(if removed {
                CommitEffects::ATTRIBUTE_REMOVED
            } else {
                CommitEffects::NONE
            })
        }
        DynamicValue::Bool(true) => {
            doc.set_attribute(node, name, "")?;
            Ok(CommitEffects::ATTRIBUTE_SET)
        }
        other => {
            doc.set_attribute(node, name, &other.to_text())?;
            Ok(CommitEffects::ATTRIBUTE_SET)
        }
    }
}

fn commit_event(
    doc: &Document,
    node: NodeId,
    name: &str,
    value: &DynamicValue,
    state: &mut PartState,
) -> Result<CommitEffects> {
    let mut effects = CommitEffects::NONE;
    if let Some(previous) = state.listener.take() {
        if doc.remove_event_listener(node, previous)? {
            effects |= CommitEffects::LISTENER_DETACHED;
        }
    }
    if let Some(handler) = value.as_handler() {
        state.listener = Some(doc.add_event_listener(node, name, Rc::clone(handler))?);
        effects |= CommitEffects::LISTENER_ATTACHED;
    }
    Ok(effects)
}

fn commit_child(doc: &Document, node: NodeId, value: &DynamicValue) -> Result<CommitEffects> {
    match value {
        DynamicValue::Component(child) => child.mount_at(node),
        DynamicValue::List(items) => {
            let mut nodes = Vec::with_capacity(items.len());
            let mut fresh = Vec::new();
            resolve_items(doc, items, &mut nodes, &mut fresh)?;
            release_children(doc, node)?;
            for child in nodes {
                doc.append_child(node, child)?;
            }
            for component in &fresh {
                component.run_created();
            }
            Ok(CommitEffects::CHILDREN_REPLACED)
        }
        DynamicValue::Json(json) if json.is_array() => {
            // One text node per item, like a list of scalars.
            let nodes: Vec<NodeId> = json
                .as_array()
                .into_iter()
                .flatten()
                .map(|item| doc.create_text(DynamicValue::from(item.clone()).to_text()))
                .collect();
            release_children(doc, node)?;
            for child in nodes {
                doc.append_child(node, child)?;
            }
            Ok(CommitEffects::CHILDREN_REPLACED)
        }
        other => {
            let single_text = matches!(doc.children(node).as_slice(), [only] if doc.is_text(*only));
            if !single_text {
                release_children(doc, node)?;
            }
            doc.set_text_content(node, &other.to_text())?;
            Ok(CommitEffects::TEXT_SET)
        }
    }
}

/// Detach every child of a Child location. Text nodes belong to the Part and
/// are disposed; elements are component roots and stay alive for their
/// component.
pub(crate) fn release_children(doc: &Document, node: NodeId) -> Result<()> {
    for child in doc.children(node) {
        if doc.is_text(child) {
            doc.dispose(child)?;
        } else {
            doc.detach(child)?;
        }
    }
    Ok(())
}

/// Flatten list items into nodes. Components are painted on first use and
/// collected in `fresh` so their `created` hook can run once inserted.
fn resolve_items(
    doc: &Document,
    items: &[DynamicValue],
    nodes: &mut Vec<NodeId>,
    fresh: &mut Vec<Mosaic>,
) -> Result<()> {
    for item in items {
        match item {
            DynamicValue::Component(component) => {
                let (root, first_paint) = component.render_detached()?;
                if first_paint {
                    fresh.push(component.clone());
                }
                nodes.push(root);
            }
            DynamicValue::List(nested) => resolve_items(doc, nested, nodes, fresh)?,
            scalar => nodes.push(doc.create_text(scalar.to_text())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::Value;

    use super::*;
    use crate::dom::handler;

    fn setup() -> (Document, NodeId) {
        let doc = Document::new();
        let root = doc.create_element("div");
        let span = doc.create_element("span");
        doc.append_child(root, span).unwrap();
        (doc, root)
    }

    #[test]
    fn test_check_was_changed() {
        let mut state = PartState::default();
        let policy = ComparePolicy::Identity;
        assert!(state.check_was_changed(&1.into(), policy));
        assert!(!state.check_was_changed(&1.into(), policy));
        assert!(!state.is_dirty());
        assert!(state.check_was_changed(&2.into(), policy));
        assert!(matches!(state.last_value(), Some(DynamicValue::Number(n)) if *n == 2.0));
    }

    #[test]
    fn test_attribute_commit() {
        let (doc, root) = setup();
        let part = Part::new(0, vec![0], PartKind::Attribute("title".into()));
        let mut state = PartState::default();

        let effects = part.commit(&doc, root, &"hi".into(), &mut state).unwrap();
        assert_eq!(effects, CommitEffects::ATTRIBUTE_SET);
        let span = doc.resolve_path(root, &[0]).unwrap();
        assert_eq!(doc.attribute(span, "title").as_deref(), Some("hi"));

        part.commit(&doc, root, &true.into(), &mut state).unwrap();
        assert_eq!(doc.attribute(span, "title").as_deref(), Some(""));

        let effects = part.commit(&doc, root, &false.into(), &mut state).unwrap();
        assert_eq!(effects, CommitEffects::ATTRIBUTE_REMOVED);
        assert_eq!(doc.attribute(span, "title"), None);

        let effects = part.commit(&doc, root, &DynamicValue::Null, &mut state).unwrap();
        assert_eq!(effects, CommitEffects::NONE);
    }

    #[test]
    fn test_event_commit_replaces_listener() {
        let (doc, root) = setup();
        let part = Part::new(0, vec![0], PartKind::Event("click".into()));
        let mut state = PartState::default();
        let span = doc.resolve_path(root, &[0]).unwrap();

        let hits = Rc::new(Cell::new(0));
        let first_hits = hits.clone();
        let first = handler(move |_| {
            first_hits.set(first_hits.get() + 1);
            Ok(())
        });
        let second_hits = hits.clone();
        let second = handler(move |_| {
            second_hits.set(second_hits.get() + 10);
            Ok(())
        });

        let effects = part.commit(&doc, root, &first.into(), &mut state).unwrap();
        assert_eq!(effects, CommitEffects::LISTENER_ATTACHED);
        let effects = part.commit(&doc, root, &second.into(), &mut state).unwrap();
        assert_eq!(
            effects,
            CommitEffects::LISTENER_DETACHED | CommitEffects::LISTENER_ATTACHED
        );
        assert_eq!(doc.listener_count(span, "click"), 1);

        doc.dispatch(span, "click", Value::Null).unwrap();
        assert_eq!(hits.get(), 10);

        let effects = part.commit(&doc, root, &DynamicValue::Null, &mut state).unwrap();
        assert_eq!(effects, CommitEffects::LISTENER_DETACHED);
        assert_eq!(doc.listener_count(span, "click"), 0);
        assert_eq!(state.listener(), None);
    }

    #[test]
    fn test_child_text_and_list_commit() {
        let (doc, root) = setup();
        let part = Part::new(0, vec![0], PartKind::Child);
        let mut state = PartState::default();

        let effects = part.commit(&doc, root, &42.into(), &mut state).unwrap();
        assert_eq!(effects, CommitEffects::TEXT_SET);
        assert_eq!(doc.to_html(root), "<div><span>42</span></div>");

        let list = DynamicValue::list(vec![
            DynamicValue::from("a"),
            DynamicValue::list(["b", "c"]),
        ]);
        let effects = part.commit(&doc, root, &list, &mut state).unwrap();
        assert_eq!(effects, CommitEffects::CHILDREN_REPLACED);
        let span = doc.resolve_path(root, &[0]).unwrap();
        assert_eq!(doc.children(span).len(), 3);
        assert_eq!(doc.text_content(root), "abc");
    }

    #[test]
    fn test_json_array_renders_one_text_node_per_item() {
        let (doc, root) = setup();
        let part = Part::new(0, vec![0], PartKind::Child);
        let mut state = PartState::default();

        let value = DynamicValue::from(serde_json::json!(["a", 2, { "k": 1 }]));
        let effects = part.commit(&doc, root, &value, &mut state).unwrap();
        assert_eq!(effects, CommitEffects::CHILDREN_REPLACED);
        let span = doc.resolve_path(root, &[0]).unwrap();
        assert_eq!(doc.children(span).len(), 3);
        assert_eq!(doc.text_content(span), "a2{\"k\":1}");
    }

    #[test]
    fn test_repeated_commits_do_not_grow_the_document() {
        let (doc, root) = setup();
        let part = Part::new(0, vec![0], PartKind::Child);
        let mut state = PartState::default();
        part.commit(&doc, root, &DynamicValue::list(["a", "b"]), &mut state).unwrap();
        let span = doc.resolve_path(root, &[0]).unwrap();
        let old = doc.children(span);

        part.commit(&doc, root, &DynamicValue::list(["c", "d"]), &mut state).unwrap();
        assert!(old.iter().all(|node| !doc.contains(*node)));
        doc.reset_stats();
        for n in 0..20 {
            part.commit(&doc, root, &n.into(), &mut state).unwrap();
        }
        assert_eq!(doc.stats().nodes_created, 1);
        assert_eq!(doc.text_content(span), "19");
        assert_eq!(doc.live_nodes(), 4);
    }

    #[test]
    fn test_revert_forgets_the_failed_value() {
        let mut state = PartState::default();
        let policy = ComparePolicy::Identity;
        assert!(state.check_was_changed(&1.into(), policy));
        let previous = state.last_value().cloned();
        assert!(state.check_was_changed(&2.into(), policy));
        state.revert(previous);
        assert!(matches!(state.last_value(), Some(DynamicValue::Number(n)) if *n == 1.0));
        assert!(state.check_was_changed(&2.into(), policy));
    }

    #[test]
    fn test_unresolvable_location_fails() {
        let (doc, root) = setup();
        let part = Part::new(0, vec![4, 2], PartKind::Child);
        let err = part
            .commit(&doc, root, &1.into(), &mut PartState::default())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::MosaicError::Dom(DomError::UnresolvedPath { .. })
        ));
    }
}
