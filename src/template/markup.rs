//! Markup builder - produces [`TemplateResult`]s for views.
//!
//! A view describes its markup with nested [`Element`] builders. Static
//! attributes and text go into the skeleton; every dynamic binding records a
//! [`PartDescriptor`] (where it is, what kind it is) and its current value, in
//! document order.
//!
//! ```ignore
//! use mosaic::template::markup::el;
//!
//! let result = el("div")
//!     .attr("class", "counter")
//!     .child(el("span").bind(count))
//!     .child(el("button").on("click", actions.handler("increment")).text("+"))
//!     .build();
//! ```
//!
//! Content bindings (`bind`) own all children of their element; the element
//! cannot also carry static children.

use std::rc::Rc;

use super::part::{Part, PartKind};
use super::value::DynamicValue;
use crate::dom::{Document, NodeId};
use crate::error::DomError;

// =============================================================================
// Skeleton
// =============================================================================

/// The static shape of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<Markup>,
    },
    Text(String),
}

impl Markup {
    /// Build the skeleton as a detached subtree of `doc`.
    pub fn render(&self, doc: &Document) -> Result<NodeId, DomError> {
        match self {
            Markup::Text(text) => Ok(doc.create_text(text.as_str())),
            Markup::Element {
                tag,
                attributes,
                children,
            } => {
                let node = doc.create_element(tag.as_str());
                for (name, value) in attributes {
                    doc.set_attribute(node, name, value)?;
                }
                for child in children {
                    let child = child.render(doc)?;
                    doc.append_child(node, child)?;
                }
                Ok(node)
            }
        }
    }
}

/// Where a dynamic binding lives, relative to the template root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    /// Child indices from the template root to the bound node.
    pub path: Vec<usize>,
    pub kind: PartKind,
}

// =============================================================================
// Template Result
// =============================================================================

/// What a view returns: the skeleton, the binding descriptors and the current
/// binding values (one per descriptor).
#[derive(Debug, Clone)]
pub struct TemplateResult {
    skeleton: Rc<Markup>,
    parts: Vec<PartDescriptor>,
    values: Vec<DynamicValue>,
}

impl TemplateResult {
    pub fn skeleton(&self) -> &Markup {
        &self.skeleton
    }

    pub fn parts(&self) -> &[PartDescriptor] {
        &self.parts
    }

    pub fn values(&self) -> &[DynamicValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<DynamicValue> {
        self.values
    }

    /// Turn the descriptors into Parts, indexed in document order.
    pub fn create_parts(&self) -> Vec<Part> {
        self.parts
            .iter()
            .enumerate()
            .map(|(index, descriptor)| {
                Part::new(index, descriptor.path.clone(), descriptor.kind.clone())
            })
            .collect()
    }

    /// Build the DOM fragment for this template as a detached subtree.
    pub fn render_fragment(&self, doc: &Document) -> Result<NodeId, DomError> {
        self.skeleton.render(doc)
    }
}

impl From<Element> for TemplateResult {
    fn from(element: Element) -> Self {
        element.build()
    }
}

// =============================================================================
// Element Builder
// =============================================================================

/// Start an element builder.
pub fn el(tag: impl Into<String>) -> Element {
    Element {
        tag: tag.into(),
        attributes: Vec::new(),
        children: Vec::new(),
        parts: Vec::new(),
        values: Vec::new(),
        content_bound: false,
    }
}

/// Element builder. See the [module docs](self).
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Markup>,
    parts: Vec<PartDescriptor>,
    values: Vec<DynamicValue>,
    content_bound: bool,
}

impl Element {
    /// Static attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Dynamic attribute. `Null`/`false` remove it, `true` sets it empty.
    pub fn bind_attr(mut self, name: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.push_part(PartKind::Attribute(name.into()), value.into());
        self
    }

    /// Event binding. Bind a handler, or `Null` for no listener.
    pub fn on(mut self, event: impl Into<String>, handler: impl Into<DynamicValue>) -> Self {
        self.push_part(PartKind::Event(event.into()), handler.into());
        self
    }

    /// Dynamic content: text, a nested component, or a list.
    pub fn bind(mut self, value: impl Into<DynamicValue>) -> Self {
        if !self.children.is_empty() {
            tracing::warn!(tag = %self.tag, "content binding discards static children");
            self.children.clear();
            let (parts, values): (Vec<_>, Vec<_>) = std::mem::take(&mut self.parts)
                .into_iter()
                .zip(std::mem::take(&mut self.values))
                .filter(|(part, _)| part.path.is_empty())
                .unzip();
            self.parts = parts;
            self.values = values;
        }
        self.content_bound = true;
        self.push_part(PartKind::Child, value.into());
        self
    }

    /// Static text child.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        if self.content_bound {
            tracing::warn!(tag = %self.tag, "ignoring static text on a content-bound element");
            return self;
        }
        self.children.push(Markup::Text(text.into()));
        self
    }

    /// Nested element.
    pub fn child(mut self, child: Element) -> Self {
        if self.content_bound {
            tracing::warn!(tag = %self.tag, "ignoring child of a content-bound element");
            return self;
        }
        let index = self.children.len();
        let (skeleton, parts, values) = child.into_parts();
        for mut part in parts {
            part.path.insert(0, index);
            self.parts.push(part);
        }
        self.values.extend(values);
        self.children.push(skeleton);
        self
    }

    /// Add several children in order.
    pub fn children(self, children: impl IntoIterator<Item = Element>) -> Self {
        children.into_iter().fold(self, Element::child)
    }

    pub fn build(self) -> TemplateResult {
        let (skeleton, parts, values) = self.into_parts();
        TemplateResult {
            skeleton: Rc::new(skeleton),
            parts,
            values,
        }
    }

    fn push_part(&mut self, kind: PartKind, value: DynamicValue) {
        self.parts.push(PartDescriptor {
            path: Vec::new(),
            kind,
        });
        self.values.push(value);
    }

    fn into_parts(self) -> (Markup, Vec<PartDescriptor>, Vec<DynamicValue>) {
        let skeleton = Markup::Element {
            tag: self.tag,
            attributes: self.attributes,
            children: self.children,
        };
        (skeleton, self.parts, self.values)
    }
}
