//! Error types.
//!
//! Every failure in the runtime is synchronous and local, so errors are plain
//! values returned to the caller. Nothing is retried and nothing is swallowed.

use thiserror::Error;

use crate::dom::NodeId;
use crate::types::{InstanceId, TemplateId};

pub type Result<T> = std::result::Result<T, MosaicError>;

/// Failures raised by the document environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0} does not exist or has been disposed")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("path {path:?} does not resolve below node {root}")]
    UnresolvedPath { root: NodeId, path: Vec<usize> },

    #[error("inserting node {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Crate-wide error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MosaicError {
    #[error("invalid option(s) {}: {details}", options.join(", "))]
    Configuration {
        options: Vec<&'static str>,
        details: String,
    },

    #[error("cannot paint: {reason}")]
    RenderPrecondition { reason: String },

    #[error("view for template {tid} produced {actual} value(s) for {expected} part(s)")]
    ValueCountMismatch {
        tid: TemplateId,
        expected: usize,
        actual: usize,
    },

    #[error("component {tid}/{iid} was asked to repaint while already repainting")]
    ReentrantRepaint { tid: TemplateId, iid: InstanceId },

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl MosaicError {
    pub(crate) fn render_precondition(reason: impl Into<String>) -> Self {
        Self::RenderPrecondition {
            reason: reason.into(),
        }
    }

    /// Names of the offending options, empty for non-configuration errors.
    #[must_use]
    pub fn options(&self) -> &[&'static str] {
        match self {
            Self::Configuration { options, .. } => options,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_names_every_option() {
        let err = MosaicError::Configuration {
            options: vec!["view", "data"],
            details: "view is required; data must be an object".into(),
        };
        let message = err.to_string();
        assert!(message.contains("view, data"));
        assert_eq!(err.options(), &["view", "data"]);
    }

    #[test]
    fn test_dom_errors_convert() {
        let err: MosaicError = DomError::UnknownNode(NodeId::from_raw(7)).into();
        assert_eq!(err.to_string(), "node #7 does not exist or has been disposed");
        assert!(err.options().is_empty());
    }
}
