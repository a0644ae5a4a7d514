//! Components.
//!
//! - [`Mosaic`] - a component instance and its lifecycle
//! - [`MosaicOptions`] - construction options, validated up front
//! - [`Actions`] - named handlers bound to an instance's data
//! - [`ids`] - template and instance id allocation

mod actions;
pub mod ids;
mod mosaic;
mod options;

pub use actions::Actions;
pub use ids::{next_instance_id, next_template_id, reset_ids};
pub use mosaic::Mosaic;
pub use options::{
    ActionFn, Anchor, CreatedHook, MosaicOptions, UpdatedHook, ViewFn, WillDestroyHook,
    WillUpdateHook,
};
