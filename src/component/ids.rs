//! Identifier allocation for component types and instances.

use std::cell::Cell;

use crate::types::{InstanceId, TemplateId};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Counter for generated template ids.
    static TEMPLATE_COUNTER: Cell<u64> = const { Cell::new(0) };

    /// Counter for instance ids. Never reused.
    static INSTANCE_COUNTER: Cell<u64> = const { Cell::new(0) };
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocate a template id for a definition that did not name one.
pub fn next_template_id() -> TemplateId {
    TEMPLATE_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        TemplateId::from(format!("m{id}"))
    })
}

/// Allocate a fresh instance id.
pub fn next_instance_id() -> InstanceId {
    INSTANCE_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        InstanceId::from_raw(id)
    })
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset both counters.
pub fn reset_ids() {
    TEMPLATE_COUNTER.with(|counter| counter.set(0));
    INSTANCE_COUNTER.with(|counter| counter.set(0));
}
