//! Templates, Parts and the cache that shares them.
//!
//! - [`markup`] - builder views use to describe markup and bindings
//! - [`Part`] / [`PartState`] - dirty check and commit per binding point
//! - [`TemplateCache`] - one parsed [`Template`] per component type
//! - [`DynamicValue`] / [`ComparePolicy`] - binding values and how they compare

mod cache;
pub mod markup;
mod part;
mod value;

pub use cache::{Template, TemplateCache};
pub use markup::{el, Element, Markup, PartDescriptor, TemplateResult};
pub use part::{Part, PartKind, PartState};
pub(crate) use part::release_children;
pub use value::{ComparePolicy, DynamicValue};
