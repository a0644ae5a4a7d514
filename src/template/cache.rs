//! Template cache - parse once per component type, instantiate many times.
//!
//! Maps a [`TemplateId`] to its parsed [`Template`]: the DOM fragment built
//! from the view's skeleton plus the ordered Part list. Entries are created at
//! most once and never change afterwards. Instances clone the fragment; the
//! cached fragment itself never enters the document.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::markup::TemplateResult;
use super::part::Part;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::types::TemplateId;

// =============================================================================
// Template
// =============================================================================

/// A parsed template shared by every instance of one component type.
#[derive(Debug)]
pub struct Template {
    tid: TemplateId,
    fragment: NodeId,
    parts: Rc<[Part]>,
}

impl Template {
    pub fn new(tid: TemplateId, fragment: NodeId, parts: impl Into<Rc<[Part]>>) -> Self {
        Self {
            tid,
            fragment,
            parts: parts.into(),
        }
    }

    /// Decompose a view's output into a detached fragment and its Parts.
    pub fn from_result(tid: TemplateId, doc: &Document, result: &TemplateResult) -> Result<Self> {
        let fragment = result.render_fragment(doc)?;
        Ok(Self::new(tid, fragment, result.create_parts()))
    }

    pub fn tid(&self) -> &TemplateId {
        &self.tid
    }

    /// Detached root of the parsed markup. Clone it, never insert it.
    pub fn fragment(&self) -> NodeId {
        self.fragment
    }

    pub fn parts(&self) -> &Rc<[Part]> {
        &self.parts
    }
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Default)]
struct CacheInner {
    templates: HashMap<TemplateId, Rc<Template>>,
    parses: u64,
}

/// Shared handle to the template registry. Cloning shares the entries.
#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    inner: Rc<RefCell<CacheInner>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the template for `tid`, calling `parse` only when it is absent.
    ///
    /// The registry is not borrowed while `parse` runs, so a view may
    /// construct nested components of other types. If `parse` itself ends up
    /// registering `tid`, the first entry wins.
    pub fn get_or_create(
        &self,
        tid: &TemplateId,
        parse: impl FnOnce() -> Result<Template>,
    ) -> Result<Rc<Template>> {
        if let Some(template) = self.get(tid) {
            return Ok(template);
        }

        let template = Rc::new(parse()?);
        let mut inner = self.inner.borrow_mut();
        inner.parses += 1;
        let entry = inner
            .templates
            .entry(tid.clone())
            .or_insert_with(|| template);
        tracing::debug!(
            tid = %tid,
            parts = entry.parts().len(),
            "template.parsed"
        );
        Ok(Rc::clone(entry))
    }

    pub fn get(&self, tid: &TemplateId) -> Option<Rc<Template>> {
        self.inner.borrow().templates.get(tid).cloned()
    }

    pub fn contains(&self, tid: &TemplateId) -> bool {
        self.inner.borrow().templates.contains_key(tid)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times a parse function has run.
    pub fn parse_count(&self) -> u64 {
        self.inner.borrow().parses
    }
}
