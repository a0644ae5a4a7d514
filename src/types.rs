//! Core types shared across the runtime.
//!
//! - [`TemplateId`] / [`InstanceId`] - component type and instance identity
//! - [`LifecycleState`] - where a component is in its lifecycle
//! - [`CommitEffects`] - what a single Part commit did to the document
//! - [`RenderStats`] - per-instance render counters

use std::fmt;
use std::rc::Rc;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier shared by every instance created from the same component
/// definition. Keys the template cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(Rc<str>);

impl TemplateId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Rc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TemplateId {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

/// Identifier unique to one concrete component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Component lifecycle.
///
/// ```text
/// Constructed -> Painted <-> Repainting
///       \            |
///        +-------> Destroyed
/// ```
///
/// `Repainting` is only observable from inside callbacks that run during a
/// commit pass (nested component hooks, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Constructed,
    Painted,
    Repainting,
    Destroyed,
}

impl LifecycleState {
    pub fn is_painted(self) -> bool {
        matches!(self, Self::Painted | Self::Repainting)
    }
}

// =============================================================================
// Commit Effects (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// DOM work performed by a commit, as a bitfield.
    ///
    /// Combine with bitwise OR: `CommitEffects::LISTENER_DETACHED | CommitEffects::LISTENER_ATTACHED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CommitEffects: u8 {
        const NONE = 0;
        const ATTRIBUTE_SET = 1 << 0;
        const ATTRIBUTE_REMOVED = 1 << 1;
        const LISTENER_ATTACHED = 1 << 2;
        const LISTENER_DETACHED = 1 << 3;
        const TEXT_SET = 1 << 4;
        const CHILDREN_REPLACED = 1 << 5;
        const NESTED_PAINT = 1 << 6;
        const NESTED_REPAINT = 1 << 7;
    }
}

// =============================================================================
// Render Stats
// =============================================================================

/// Counters accumulated over the lifetime of one component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Completed repaint passes.
    pub repaints: u64,
    /// Parts whose value changed and were committed.
    pub commits: u64,
    /// Parts skipped because their value was unchanged.
    pub skipped: u64,
    /// Union of every effect produced so far.
    pub effects: CommitEffects,
}
