use crate::foundation::core::NodeId;

/// Convenience result type used across the engine.
pub type CompositorResult<T> = Result<T, CompositorError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Invalid domains are deliberately absent: a zero-size domain is a data state
/// that propagates through values (see [`crate::Value::invalid`]) and resolves
/// to an invalid result at the graph sinks, never an error.
#[derive(thiserror::Error, Debug)]
pub enum CompositorError {
    /// The node graph contains at least one cycle; lists every node still on one.
    #[error("cyclic node graph: nodes {nodes:?} form a cycle")]
    CyclicGraph {
        /// Ids of the nodes participating in (or downstream of) a cycle.
        nodes: Vec<NodeId>,
    },

    /// A node type identifier could not be resolved to a known kind.
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    /// A fused shader program failed to build from its group.
    ///
    /// Recovered during execution by demoting the group to a pass-through of
    /// its primary input; surfaces to callers only through diagnostics.
    #[error("shader compile error: {0}")]
    ShaderCompile(String),

    /// Invalid user-provided graph, parameter, or buffer data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompositorError {
    /// Build a [`CompositorError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CompositorError::ShaderCompile`] value.
    pub fn shader_compile(msg: impl Into<String>) -> Self {
        Self::ShaderCompile(msg.into())
    }

    /// Build a [`CompositorError::UnknownNodeType`] value.
    pub fn unknown_node_type(name: impl Into<String>) -> Self {
        Self::UnknownNodeType(name.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
