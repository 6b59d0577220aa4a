use std::collections::{HashMap, HashSet};

use crate::{
    foundation::core::NodeId,
    foundation::error::{CompositorError, CompositorResult},
    graph::kinds::NodeKind,
};

/// One node of the externally authored graph: type, id, and static parameters.
///
/// Parameters are read-only during one compile+execute cycle and are parsed
/// into typed values where consumed.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Node {
    /// Unique id within the graph.
    pub id: NodeId,
    /// Node type.
    pub kind: NodeKind,
    /// Node-specific static parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Node {
    /// Node without parameters.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            params: serde_json::Value::Null,
        }
    }

    /// Node with parameters.
    pub fn with_params(id: NodeId, kind: NodeKind, params: serde_json::Value) -> Self {
        Self { id, kind, params }
    }
}

/// A connection from one node's output socket to another node's input socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Link {
    /// Producing node.
    pub from_node: NodeId,
    /// Output socket index on the producer.
    pub from_output: u16,
    /// Consuming node.
    pub to_node: NodeId,
    /// Input socket index on the consumer.
    pub to_input: u16,
}

/// The immutable DAG of node descriptors consumed by the compiler.
///
/// Fan-out is permitted (one output feeding several inputs); each input socket
/// carries at most one upstream connection.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct NodeGraph {
    /// All nodes, in authoring order.
    pub nodes: Vec<Node>,
    /// All connections.
    pub links: Vec<Link>,
}

impl NodeGraph {
    /// Build and validate a graph.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> CompositorResult<Self> {
        let graph = Self { nodes, links };
        graph.validate()?;
        Ok(graph)
    }

    /// Check structural invariants: unique ids, link endpoints and socket
    /// indices in range, at most one link per input socket. Cycles are not
    /// checked here; the compiler reports them with the offending node ids.
    pub fn validate(&self) -> CompositorResult<()> {
        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(CompositorError::validation(format!(
                    "duplicate node id {:?}",
                    node.id
                )));
            }
        }

        let by_id: HashMap<NodeId, &Node> = self.nodes.iter().map(|n| (n.id, n)).collect();
        let mut taken_inputs = HashSet::with_capacity(self.links.len());
        for link in &self.links {
            let from = by_id.get(&link.from_node).ok_or_else(|| {
                CompositorError::validation(format!(
                    "link references missing node {:?}",
                    link.from_node
                ))
            })?;
            let to = by_id.get(&link.to_node).ok_or_else(|| {
                CompositorError::validation(format!(
                    "link references missing node {:?}",
                    link.to_node
                ))
            })?;

            if link.from_output >= from.kind.descriptor().output_count {
                return Err(CompositorError::validation(format!(
                    "node {:?} ({}) has no output socket {}",
                    from.id,
                    from.kind.name(),
                    link.from_output
                )));
            }
            if usize::from(link.to_input) >= to.kind.descriptor().inputs.len() {
                return Err(CompositorError::validation(format!(
                    "node {:?} ({}) has no input socket {}",
                    to.id,
                    to.kind.name(),
                    link.to_input
                )));
            }
            if !taken_inputs.insert((link.to_node, link.to_input)) {
                return Err(CompositorError::validation(format!(
                    "input socket {} of node {:?} has more than one connection",
                    link.to_input, link.to_node
                )));
            }
        }
        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The link feeding an input socket, if connected.
    pub(crate) fn link_into(&self, node: NodeId, input: u16) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.to_node == node && l.to_input == input)
    }

    /// Links reading from any output of `node`.
    pub(crate) fn links_from(&self, node: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.from_node == node)
    }
}
