//! Mosaic - a stateful component.
//!
//! A Mosaic ties together:
//! - an [`Observable`] over its data, whose writes drive repaints
//! - the [`Template`] of its type (fragment + Parts, shared per type)
//! - its own binding values and per-Part state
//! - optional lifecycle hooks
//!
//! # Render pass
//!
//! ```text
//! data write -> will_update(old) -> view(data, actions) -> check/commit each Part -> updated(data, actions)
//! ```
//!
//! Every data write runs one full pass before the write call returns.
//!
//! # Example
//!
//! ```ignore
//! let runtime = Runtime::new();
//! let counter = Mosaic::new(
//!     &runtime,
//!     MosaicOptions::new(|data, _| el("span").bind(data.field("count")).build())
//!         .with_data(json!({ "count": 0 })),
//! )?;
//! counter.paint()?;
//! counter.data().set_field("count", 5)?;
//! ```

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::actions::Actions;
use super::ids::next_instance_id;
use super::options::{Definition, MosaicOptions};
use crate::dom::{Document, NodeId};
use crate::error::{MosaicError, Result};
use crate::reactive::{ChangeHooks, Observable};
use crate::runtime::Runtime;
use crate::template::{release_children, DynamicValue, Part, PartState, Template};
use crate::types::{CommitEffects, InstanceId, LifecycleState, RenderStats, TemplateId};

// =============================================================================
// Mosaic
// =============================================================================

struct MosaicInner {
    iid: InstanceId,
    definition: Rc<Definition>,
    runtime: Runtime,
    template: Rc<Template>,
    data: Observable,
    actions: Actions,
    /// Root of this instance's clone of the template fragment.
    element: NodeId,
    /// Attached node the first paint replaces.
    anchor: Cell<Option<NodeId>>,
    lifecycle: Cell<LifecycleState>,
    stats: Cell<RenderStats>,
    values: RefCell<Vec<DynamicValue>>,
    slots: RefCell<Vec<PartState>>,
}

/// Handle to a component instance. Cloning shares the instance.
#[derive(Clone)]
pub struct Mosaic {
    inner: Rc<MosaicInner>,
}

impl fmt::Debug for Mosaic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mosaic")
            .field("tid", self.tid())
            .field("iid", &self.iid())
            .field("state", &self.state())
            .finish()
    }
}

type Link = Rc<OnceCell<Weak<MosaicInner>>>;

impl Mosaic {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Validate `options`, resolve the template and build the instance.
    ///
    /// Fails with [`MosaicError::Configuration`] before touching the document
    /// or the template cache when any option is invalid.
    pub fn new(runtime: &Runtime, options: MosaicOptions) -> Result<Self> {
        let (definition, anchor) = options.validate(runtime.document())?;
        let data = definition.options.data.clone();
        Self::instantiate(runtime, Rc::new(definition), data, anchor)
    }

    fn instantiate(
        runtime: &Runtime,
        definition: Rc<Definition>,
        data: Value,
        anchor: Option<NodeId>,
    ) -> Result<Self> {
        let doc = runtime.document();
        let link: Link = Rc::default();
        let data = Observable::new(data, change_hooks(&link));
        let actions = Actions::bind(&definition.options.actions, &data);

        let mut parsed_values = None;
        let template = runtime.templates().get_or_create(&definition.tid, || {
            let result = (definition.view)(&data, &actions);
            let template = Template::from_result(definition.tid.clone(), doc, &result)?;
            parsed_values = Some(result.into_values());
            Ok(template)
        })?;
        let values = match parsed_values {
            Some(values) => values,
            None => (definition.view)(&data, &actions).into_values(),
        };
        check_value_count(&definition.tid, template.parts(), &values)?;

        let element = doc.clone_node(template.fragment(), true)?;
        let anchor = anchor.filter(|node| doc.is_attached(*node));

        let slots = vec![PartState::default(); template.parts().len()];
        let inner = Rc::new(MosaicInner {
            iid: next_instance_id(),
            definition,
            runtime: runtime.clone(),
            template,
            data,
            actions,
            element,
            anchor: Cell::new(anchor),
            lifecycle: Cell::new(LifecycleState::Constructed),
            stats: Cell::new(RenderStats::default()),
            values: RefCell::new(values),
            slots: RefCell::new(slots),
        });
        let _ = link.set(Rc::downgrade(&inner));

        let mosaic = Self { inner };
        tracing::debug!(
            tid = %mosaic.tid(),
            iid = %mosaic.iid(),
            element = %element,
            anchored = anchor.is_some(),
            "mosaic.constructed"
        );
        Ok(mosaic)
    }

    /// A sibling instance of the same type: fresh instance id, data merged
    /// from this instance's current data and `patch`, its own clone of the
    /// template fragment. The new instance is repainted before it is returned.
    pub fn new_instance(&self, patch: Value) -> Result<Mosaic> {
        let data = merge(self.inner.data.get(), patch);
        let sibling = Self::instantiate(
            &self.inner.runtime,
            Rc::clone(&self.inner.definition),
            data,
            None,
        )?;
        sibling.repaint()?;
        tracing::debug!(tid = %self.tid(), from = %self.iid(), iid = %sibling.iid(), "mosaic.derived");
        Ok(sibling)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn tid(&self) -> &TemplateId {
        &self.inner.definition.tid
    }

    pub fn iid(&self) -> InstanceId {
        self.inner.iid
    }

    /// Root node of this instance. Renders always land here, before and
    /// after paint.
    pub fn element(&self) -> NodeId {
        self.inner.element
    }

    /// The attached node that the first [`paint`](Self::paint) will replace.
    pub fn anchor(&self) -> Option<NodeId> {
        self.inner.anchor.get()
    }

    pub fn data(&self) -> &Observable {
        &self.inner.data
    }

    pub fn actions(&self) -> &Actions {
        &self.inner.actions
    }

    /// The Part list of this component's type, shared with every sibling.
    pub fn parts(&self) -> &Rc<[Part]> {
        self.inner.template.parts()
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.inner.template
    }

    /// Binding values of the latest render pass.
    pub fn values(&self) -> Vec<DynamicValue> {
        self.inner.values.borrow().clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.get()
    }

    pub fn stats(&self) -> RenderStats {
        self.inner.stats.get()
    }

    pub fn document(&self) -> &Document {
        self.inner.runtime.document()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Same logical instance: both type and instance ids match.
    pub fn equals(&self, other: &Mosaic) -> bool {
        self.tid() == other.tid() && self.iid() == other.iid()
    }

    /// Same handle.
    pub fn ptr_eq(&self, other: &Mosaic) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// First insertion.
    ///
    /// Renders into the instance's root, puts the root where the anchor is
    /// and runs `created`. The anchor's own content is detached, never
    /// written to. Fails without touching the document when the root or the
    /// anchor is not a live node.
    ///
    /// Painting an already painted component repaints it and runs no hook.
    pub fn paint(&self) -> Result<()> {
        let doc = self.document();
        let root = self.element();
        let first_paint = match self.state() {
            LifecycleState::Destroyed => {
                return Err(MosaicError::render_precondition("component has been destroyed"));
            }
            LifecycleState::Repainting => return Err(self.reentrant()),
            LifecycleState::Constructed => true,
            LifecycleState::Painted => false,
        };
        let anchor = self.anchor();
        for node in anchor.into_iter().chain([root]) {
            if !doc.contains(node) {
                return Err(MosaicError::render_precondition(format!(
                    "element {node} is not a live node"
                )));
            }
        }

        self.repaint()?;
        if let Some(anchor) = self.inner.anchor.take() {
            doc.clear_children(anchor)?;
            doc.replace_node(anchor, root)?;
        }
        self.inner.lifecycle.set(LifecycleState::Painted);

        tracing::debug!(tid = %self.tid(), iid = %self.iid(), root = %root, first_paint, "mosaic.painted");
        if first_paint {
            self.run_created();
        }
        Ok(())
    }

    /// Recompute binding values and commit the ones that changed.
    ///
    /// A destroyed component ignores the call. Calling it from inside this
    /// component's own render pass fails with
    /// [`MosaicError::ReentrantRepaint`].
    pub fn repaint(&self) -> Result<()> {
        match self.state() {
            LifecycleState::Destroyed => {
                tracing::debug!(tid = %self.tid(), iid = %self.iid(), "mosaic.repaint_skipped");
                return Ok(());
            }
            LifecycleState::Repainting => return Err(self.reentrant()),
            _ => {}
        }
        let values = (self.inner.definition.view)(&self.inner.data, &self.inner.actions).into_values();
        check_value_count(self.tid(), self.parts(), &values)?;
        self.patch(values)
    }

    /// Run `will_destroy` and stop rendering. Removing the element from the
    /// document is up to the caller.
    pub fn destroy(&self) {
        if self.state() == LifecycleState::Destroyed {
            return;
        }
        if let Some(hook) = &self.inner.definition.options.will_destroy {
            hook(self);
        }
        self.inner.lifecycle.set(LifecycleState::Destroyed);
        tracing::debug!(tid = %self.tid(), iid = %self.iid(), "mosaic.destroyed");
    }

    // -------------------------------------------------------------------------
    // Render internals
    // -------------------------------------------------------------------------

    /// The single entry point for data-driven renders. Runs immediately.
    fn request_repaint(&self) -> Result<()> {
        if self.state() == LifecycleState::Destroyed {
            return Ok(());
        }
        self.repaint()?;
        if let Some(hook) = &self.inner.definition.options.updated {
            hook(&self.inner.data, &self.inner.actions);
        }
        Ok(())
    }

    fn before_change(&self, old: &Value) {
        if self.state() == LifecycleState::Destroyed {
            return;
        }
        if let Some(hook) = &self.inner.definition.options.will_update {
            hook(old);
        }
    }

    /// Dirty-check every Part in index order and commit the changed ones.
    fn patch(&self, values: Vec<DynamicValue>) -> Result<()> {
        let doc = self.document();
        let root = self.element();
        let policy = self.inner.definition.options.compare;
        let parts = Rc::clone(self.parts());

        let previous = self.inner.lifecycle.replace(LifecycleState::Repainting);
        let mut commits = 0;
        let mut skipped = 0;
        let mut effects = CommitEffects::NONE;
        let mut outcome = Ok(());
        {
            let mut slots = self.inner.slots.borrow_mut();
            for (part, value) in parts.iter().zip(&values) {
                let slot = &mut slots[part.index()];
                let previous = slot.last_value().cloned();
                if !slot.check_was_changed(value, policy) {
                    skipped += 1;
                    continue;
                }
                match part.commit(doc, root, value, slot) {
                    Ok(done) => {
                        commits += 1;
                        effects |= done;
                    }
                    Err(err) => {
                        slot.revert(previous);
                        outcome = Err(err);
                        break;
                    }
                }
            }
        }
        // A hook may have destroyed the component mid-pass.
        if self.state() == LifecycleState::Repainting {
            self.inner.lifecycle.set(previous);
        }
        *self.inner.values.borrow_mut() = values;

        let mut stats = self.inner.stats.get();
        stats.repaints += 1;
        stats.commits += commits;
        stats.skipped += skipped;
        stats.effects |= effects;
        self.inner.stats.set(stats);

        tracing::trace!(
            tid = %self.tid(),
            iid = %self.iid(),
            commits,
            skipped,
            effects = ?effects,
            "mosaic.repaint"
        );
        outcome
    }

    /// Render into the current element without inserting it anywhere.
    ///
    /// Returns the root and whether this call performed the first paint.
    pub(crate) fn render_detached(&self) -> Result<(NodeId, bool)> {
        match self.state() {
            LifecycleState::Painted | LifecycleState::Repainting => Ok((self.element(), false)),
            LifecycleState::Destroyed => Err(MosaicError::render_precondition(format!(
                "component {}/{} has been destroyed",
                self.tid(),
                self.iid()
            ))),
            LifecycleState::Constructed => {
                self.repaint()?;
                // Mounted by a parent, so the anchor is no longer the target.
                self.inner.anchor.set(None);
                self.inner.lifecycle.set(LifecycleState::Painted);
                Ok((self.element(), true))
            }
        }
    }

    /// Paint or repaint this component as the only child of `location`.
    pub(crate) fn mount_at(&self, location: NodeId) -> Result<CommitEffects> {
        let doc = self.document();
        let (root, first_paint) = self.render_detached()?;
        if doc.children(location) != [root] {
            release_children(doc, location)?;
            doc.append_child(location, root)?;
        }
        if first_paint {
            self.run_created();
            Ok(CommitEffects::NESTED_PAINT)
        } else {
            self.repaint()?;
            Ok(CommitEffects::NESTED_REPAINT)
        }
    }

    pub(crate) fn run_created(&self) {
        if let Some(hook) = &self.inner.definition.options.created {
            hook(self);
        }
    }

    fn reentrant(&self) -> MosaicError {
        MosaicError::ReentrantRepaint {
            tid: self.tid().clone(),
            iid: self.iid(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn change_hooks(link: &Link) -> ChangeHooks {
    let before = Rc::clone(link);
    let after = Rc::clone(link);
    ChangeHooks::new(
        move |old| {
            if let Some(mosaic) = upgrade(&before) {
                mosaic.before_change(old);
            }
        },
        move || match upgrade(&after) {
            Some(mosaic) => mosaic.request_repaint(),
            None => Ok(()),
        },
    )
}

fn upgrade(link: &Link) -> Option<Mosaic> {
    link.get()?.upgrade().map(|inner| Mosaic { inner })
}

fn check_value_count(tid: &TemplateId, parts: &[Part], values: &[DynamicValue]) -> Result<()> {
    if parts.len() == values.len() {
        Ok(())
    } else {
        Err(MosaicError::ValueCountMismatch {
            tid: tid.clone(),
            expected: parts.len(),
            actual: values.len(),
        })
    }
}

/// Shallow merge: object fields of `patch` overwrite those of `base`.
fn merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            base.extend(patch);
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, patch) => patch,
    }
}
