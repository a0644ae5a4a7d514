//! Component options and their validation.
//!
//! Options are a plain struct. Fill the fields you need and take the rest
//! from `Default`:
//!
//! ```ignore
//! use mosaic::component::MosaicOptions;
//! use serde_json::json;
//!
//! let options = MosaicOptions {
//!     data: json!({ "count": 0 }),
//!     tid: Some("counter".into()),
//!     ..MosaicOptions::new(|data, _actions| {
//!         el("span").bind(data.field("count")).build()
//!     })
//! };
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::{json, Value};

use super::actions::Actions;
use super::ids::next_template_id;
use super::mosaic::Mosaic;
use crate::dom::{Document, Event, NodeId};
use crate::error::{MosaicError, Result};
use crate::reactive::Observable;
use crate::template::{ComparePolicy, TemplateResult};
use crate::types::TemplateId;

// =============================================================================
// Callback Types
// =============================================================================

/// Renders the component: called once to parse the template, then on every
/// render pass to compute binding values.
pub type ViewFn = Rc<dyn Fn(&Observable, &Actions) -> TemplateResult>;

/// Named action, bound per instance to that instance's data.
pub type ActionFn = Rc<dyn Fn(&Observable, &Event) -> Result<()>>;

/// Called once the component is first painted.
pub type CreatedHook = Rc<dyn Fn(&Mosaic)>;

/// Called with the pre-mutation data before a data-driven repaint.
pub type WillUpdateHook = Rc<dyn Fn(&Value)>;

/// Called after a data-driven repaint.
pub type UpdatedHook = Rc<dyn Fn(&Observable, &Actions)>;

/// Called when the component is destroyed.
pub type WillDestroyHook = Rc<dyn Fn(&Mosaic)>;

// =============================================================================
// Anchor
// =============================================================================

/// Where a component attaches: a node, or the `id` attribute of an attached
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Node(NodeId),
    Id(String),
}

impl From<NodeId> for Anchor {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Anchor {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

// =============================================================================
// Options
// =============================================================================

/// Construction options for a [`Mosaic`].
#[derive(Clone)]
pub struct MosaicOptions {
    /// Attached element the first paint replaces. Renders always go into the
    /// instance's own clone of the template.
    pub element: Option<Anchor>,
    /// Initial data. Must be a JSON object.
    pub data: Value,
    /// Required.
    pub view: Option<ViewFn>,
    pub actions: Vec<(String, ActionFn)>,
    pub created: Option<CreatedHook>,
    pub will_update: Option<WillUpdateHook>,
    pub updated: Option<UpdatedHook>,
    pub will_destroy: Option<WillDestroyHook>,
    /// Explicit type id. Generated when `None`.
    pub tid: Option<String>,
    /// How Parts decide whether a value changed.
    pub compare: ComparePolicy,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            element: None,
            data: json!({}),
            view: None,
            actions: Vec::new(),
            created: None,
            will_update: None,
            updated: None,
            will_destroy: None,
            tid: None,
            compare: ComparePolicy::default(),
        }
    }
}

impl fmt::Debug for MosaicOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MosaicOptions")
            .field("element", &self.element)
            .field("data", &self.data)
            .field("view", &self.view.is_some())
            .field(
                "actions",
                &self.actions.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("tid", &self.tid)
            .field("compare", &self.compare)
            .finish_non_exhaustive()
    }
}

impl MosaicOptions {
    /// Options with `view` set and everything else defaulted.
    pub fn new(view: impl Fn(&Observable, &Actions) -> TemplateResult + 'static) -> Self {
        Self {
            view: Some(Rc::new(view)),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_element(mut self, element: impl Into<Anchor>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn with_tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = Some(tid.into());
        self
    }

    pub fn with_compare(mut self, compare: ComparePolicy) -> Self {
        self.compare = compare;
        self
    }

    pub fn with_action(
        mut self,
        name: impl Into<String>,
        action: impl Fn(&Observable, &Event) -> Result<()> + 'static,
    ) -> Self {
        self.actions.push((name.into(), Rc::new(action)));
        self
    }

    pub fn on_created(mut self, hook: impl Fn(&Mosaic) + 'static) -> Self {
        self.created = Some(Rc::new(hook));
        self
    }

    pub fn on_will_update(mut self, hook: impl Fn(&Value) + 'static) -> Self {
        self.will_update = Some(Rc::new(hook));
        self
    }

    pub fn on_updated(mut self, hook: impl Fn(&Observable, &Actions) + 'static) -> Self {
        self.updated = Some(Rc::new(hook));
        self
    }

    pub fn on_will_destroy(mut self, hook: impl Fn(&Mosaic) + 'static) -> Self {
        self.will_destroy = Some(Rc::new(hook));
        self
    }

    /// Check every option and resolve the anchor. Reads the document but
    /// never mutates it. All violations are reported together.
    pub(crate) fn validate(self, doc: &Document) -> Result<(Definition, Option<NodeId>)> {
        let mut options: Vec<&'static str> = Vec::new();
        let mut details: Vec<String> = Vec::new();

        if self.view.is_none() {
            options.push("view");
            details.push("view is required".into());
        }

        if !self.data.is_object() {
            options.push("data");
            details.push(format!("data must be an object, got {}", json_kind(&self.data)));
        }

        if self.tid.as_deref().is_some_and(|tid| tid.trim().is_empty()) {
            options.push("tid");
            details.push("tid must not be empty".into());
        }

        let mut names: Vec<&str> = self.actions.iter().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable();
        if names.iter().any(|name| name.is_empty()) {
            options.push("actions");
            details.push("action names must not be empty".into());
        } else if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            options.push("actions");
            details.push(format!("action {:?} is declared twice", pair[0]));
        }

        let anchor = match &self.element {
            None => None,
            Some(Anchor::Node(node)) if doc.contains(*node) => Some(*node),
            Some(Anchor::Node(node)) => {
                options.push("element");
                details.push(format!("node {node} does not exist"));
                None
            }
            Some(Anchor::Id(id)) => {
                let found = doc.get_element_by_id(id);
                if found.is_none() {
                    options.push("element");
                    details.push(format!("no attached element has id {id:?}"));
                }
                found
            }
        };

        let view = match self.view.clone() {
            Some(view) if options.is_empty() => view,
            _ => {
                return Err(MosaicError::Configuration {
                    options,
                    details: details.join("; "),
                });
            }
        };

        let tid = self
            .tid
            .as_deref()
            .map_or_else(next_template_id, TemplateId::new);
        Ok((
            Definition {
                tid,
                view,
                options: self,
            },
            anchor,
        ))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validated options shared by every instance of one component type.
pub(crate) struct Definition {
    pub(crate) tid: TemplateId,
    pub(crate) view: ViewFn,
    pub(crate) options: MosaicOptions,
}
