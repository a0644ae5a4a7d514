//! Runtime - the document and template cache components share.

use crate::component::{Mosaic, MosaicOptions};
use crate::dom::Document;
use crate::error::Result;
use crate::template::TemplateCache;

/// Context every component is constructed against. Cloning shares it.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    document: Document,
    templates: TemplateCache,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime over an existing document, with an empty template cache.
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            templates: TemplateCache::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Construct a component and paint it.
    pub fn mount(&self, options: MosaicOptions) -> Result<Mosaic> {
        let mosaic = Mosaic::new(self, options)?;
        mosaic.paint()?;
        Ok(mosaic)
    }
}
