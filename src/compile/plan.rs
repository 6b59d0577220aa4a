use std::collections::{HashMap, VecDeque};

use crate::{
    compile::fuse::{self, Unit},
    foundation::core::{NodeId, Pixel},
    foundation::error::{CompositorError, CompositorResult},
    graph::kinds::NodeKind,
    graph::model::NodeGraph,
    shader::codegen,
};

/// Identifier of an operation within a [`Plan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpId(pub u32);

/// Where an operation input reads its value from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputSource {
    /// Output of an earlier operation in the plan.
    Operation {
        /// Producing operation.
        op: OpId,
        /// Output index on the producer.
        output: u16,
    },
    /// Unconnected socket: the declared default, bound as a single value.
    Default(Pixel),
}

/// One resolved input of an operation: its source plus the domain
/// reconciliation policy applied when binding at execution time.
#[derive(Clone, Copy, Debug)]
pub struct InputBinding {
    /// Value source.
    pub source: InputSource,
    /// Domain priority of the consuming socket (0 = most authoritative).
    pub domain_priority: u16,
    /// Whether the consuming socket reads the scalar fast path.
    pub expects_single_value: bool,
}

/// What an operation executes.
#[derive(Clone, Debug)]
pub enum OpKind {
    /// One node, dispatched on its own.
    Standalone {
        /// The node.
        node: NodeId,
    },
    /// A maximal run of fused nodes compiled into one program.
    ShaderGroup {
        /// Member nodes in topological order.
        nodes: Vec<NodeId>,
        /// Generated program listing; the shader-cache key.
        source: String,
        /// For each operation input, the in-group socket it feeds.
        input_map: Vec<(NodeId, u16)>,
        /// Group output sockets, i.e. member outputs consumed outside.
        outputs: Vec<(NodeId, u16)>,
    },
}

/// A unit of execution: consumes bound input values, produces output values.
#[derive(Clone, Debug)]
pub struct Operation {
    /// Plan-unique id; also the operation's index in [`Plan::operations`].
    pub id: OpId,
    /// What to execute.
    pub kind: OpKind,
    /// Resolved inputs in socket order (groups: discovery order).
    pub inputs: Vec<InputBinding>,
    /// Number of outputs this operation produces.
    pub output_count: u16,
    /// Per-output count of consuming operations, used by the scheduler to
    /// release buffers after the last consumer has run.
    pub(crate) consumer_counts: Vec<u32>,
}

/// The compiled execution plan: operations in topological order plus the
/// graph sinks whose results are exported.
#[derive(Clone, Debug)]
pub struct Plan {
    /// Operations in execution order.
    pub operations: Vec<Operation>,
    /// Output sink nodes paired with the operation that binds their input.
    pub outputs: Vec<(NodeId, OpId)>,
}

/// Compile the node graph into an ordered operation plan.
///
/// Fails with [`CompositorError::CyclicGraph`] (listing the offending node
/// ids) or [`CompositorError::Validation`] before any execution occurs;
/// no runtime state is touched.
#[tracing::instrument(skip(graph), fields(nodes = graph.nodes.len(), links = graph.links.len()))]
pub fn compile(graph: &NodeGraph) -> CompositorResult<Plan> {
    graph.validate()?;
    let topo = topo_sort(graph)?;
    let units = fuse::partition(graph, &topo);
    tracing::debug!(units = units.len(), "partitioned graph");

    let by_id: HashMap<NodeId, &crate::graph::model::Node> =
        graph.nodes.iter().map(|n| (n.id, n)).collect();

    // (producer node, output socket) -> (operation, operation output index)
    let mut produced: HashMap<(NodeId, u16), (OpId, u16)> = HashMap::new();
    let mut operations: Vec<Operation> = Vec::with_capacity(units.len());
    let mut outputs: Vec<(NodeId, OpId)> = Vec::new();

    for unit in &units {
        let id = OpId(operations.len() as u32);
        match unit {
            Unit::Single(node_id) => {
                let node = by_id[node_id];
                let descriptor = node.kind.descriptor();
                crate::exec::operations::validate_params(node)?;

                let mut inputs = Vec::with_capacity(descriptor.inputs.len());
                for (socket, decl) in descriptor.inputs.iter().enumerate() {
                    let source = match graph.link_into(*node_id, socket as u16) {
                        Some(link) => {
                            let (op, output) = produced[&(link.from_node, link.from_output)];
                            InputSource::Operation { op, output }
                        }
                        None => InputSource::Default(decl.default),
                    };
                    inputs.push(InputBinding {
                        source,
                        domain_priority: decl.domain_priority,
                        expects_single_value: decl.expects_single_value,
                    });
                }

                for output in 0..descriptor.output_count {
                    produced.insert((*node_id, output), (id, output));
                }
                if node.kind == NodeKind::Output {
                    outputs.push((*node_id, id));
                }
                operations.push(Operation {
                    id,
                    kind: OpKind::Standalone { node: *node_id },
                    inputs,
                    output_count: descriptor.output_count,
                    consumer_counts: vec![0; descriptor.output_count as usize],
                });
            }
            Unit::Group(members) => {
                let member_set: std::collections::HashSet<NodeId> =
                    members.iter().copied().collect();

                let mut inputs = Vec::new();
                let mut input_map = Vec::new();
                for node_id in members {
                    let node = by_id[node_id];
                    for (socket, decl) in node.kind.descriptor().inputs.iter().enumerate() {
                        let socket = socket as u16;
                        match graph.link_into(*node_id, socket) {
                            Some(link) if member_set.contains(&link.from_node) => {}
                            Some(link) => {
                                let (op, output) = produced[&(link.from_node, link.from_output)];
                                inputs.push(InputBinding {
                                    source: InputSource::Operation { op, output },
                                    domain_priority: decl.domain_priority,
                                    expects_single_value: decl.expects_single_value,
                                });
                                input_map.push((*node_id, socket));
                            }
                            None => {
                                inputs.push(InputBinding {
                                    source: InputSource::Default(decl.default),
                                    domain_priority: decl.domain_priority,
                                    expects_single_value: decl.expects_single_value,
                                });
                                input_map.push((*node_id, socket));
                            }
                        }
                    }
                }

                let mut group_outputs = Vec::new();
                for node_id in members {
                    let node = by_id[node_id];
                    for output in 0..node.kind.descriptor().output_count {
                        let consumed_outside = graph.links_from(*node_id).any(|l| {
                            l.from_output == output && !member_set.contains(&l.to_node)
                        });
                        if consumed_outside {
                            group_outputs.push((*node_id, output));
                        }
                    }
                }
                if group_outputs.is_empty() {
                    // Nothing outside reads this group; it is dead code.
                    tracing::debug!(?members, "dropping shader group with no consumers");
                    continue;
                }

                for (index, socket) in group_outputs.iter().enumerate() {
                    produced.insert(*socket, (id, index as u16));
                }

                let source = codegen::group_source(graph, members, &input_map, &group_outputs);
                operations.push(Operation {
                    id,
                    kind: OpKind::ShaderGroup {
                        nodes: members.clone(),
                        source,
                        input_map,
                        outputs: group_outputs.clone(),
                    },
                    inputs,
                    output_count: group_outputs.len() as u16,
                    consumer_counts: vec![0; group_outputs.len()],
                });
            }
        }
    }

    // Consumer refcounts, computed once from the emitted bindings.
    let mut counts: Vec<Vec<u32>> = operations
        .iter()
        .map(|op| vec![0; op.output_count as usize])
        .collect();
    for op in &operations {
        for binding in &op.inputs {
            if let InputSource::Operation { op, output } = binding.source {
                counts[op.0 as usize][output as usize] += 1;
            }
        }
    }
    for (op, op_counts) in operations.iter_mut().zip(counts) {
        op.consumer_counts = op_counts;
    }

    Ok(Plan { operations, outputs })
}

/// Kahn topological sort; reports every node left on a cycle.
fn topo_sort(graph: &NodeGraph) -> CompositorResult<Vec<NodeId>> {
    let mut indegree: HashMap<NodeId, u32> =
        graph.nodes.iter().map(|n| (n.id, 0)).collect();
    for link in &graph.links {
        if let Some(d) = indegree.get_mut(&link.to_node) {
            *d += 1;
        }
    }

    let mut queue: VecDeque<NodeId> = graph
        .nodes
        .iter()
        .filter(|n| indegree[&n.id] == 0)
        .map(|n| n.id)
        .collect();

    let mut order = Vec::with_capacity(graph.nodes.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        for link in graph.links_from(id) {
            let d = indegree
                .get_mut(&link.to_node)
                .map_or(u32::MAX, |d| {
                    *d -= 1;
                    *d
                });
            if d == 0 {
                queue.push_back(link.to_node);
            }
        }
    }

    if order.len() < graph.nodes.len() {
        let mut nodes: Vec<NodeId> = indegree
            .into_iter()
            .filter(|&(_, d)| d > 0)
            .map(|(id, _)| id)
            .collect();
        nodes.sort();
        return Err(CompositorError::CyclicGraph { nodes });
    }
    Ok(order)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
