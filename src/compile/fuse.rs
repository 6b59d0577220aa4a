use std::collections::{HashMap, HashSet};

use crate::{
    foundation::core::NodeId,
    graph::kinds::NodeClass,
    graph::model::NodeGraph,
};

/// One schedulable unit produced by partitioning: a standalone node or a
/// maximal run of fused nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Unit {
    Single(NodeId),
    Group(Vec<NodeId>),
}

/// Partition the topologically ordered graph into units.
///
/// Fusable nodes greedily join the open group; because a standalone consumer
/// of any open-group member closes the group before it executes, every fusable
/// producer of a joining node is either inside the open group or already
/// materialized by a closed unit. A graph of only fusable nodes therefore
/// becomes exactly one group, and a standalone node between two fusable nodes
/// splits them into separate groups.
pub(crate) fn partition(graph: &NodeGraph, topo: &[NodeId]) -> Vec<Unit> {
    let class_of: HashMap<NodeId, NodeClass> = graph
        .nodes
        .iter()
        .map(|n| (n.id, n.kind.class()))
        .collect();

    let mut units = Vec::new();
    let mut open: Vec<NodeId> = Vec::new();
    let mut open_set: HashSet<NodeId> = HashSet::new();

    let close =
        |open: &mut Vec<NodeId>, open_set: &mut HashSet<NodeId>, units: &mut Vec<Unit>| {
            if !open.is_empty() {
                units.push(Unit::Group(std::mem::take(open)));
                open_set.clear();
            }
        };

    for &id in topo {
        match class_of.get(&id).copied() {
            Some(NodeClass::Fusable) => {
                open.push(id);
                open_set.insert(id);
            }
            Some(NodeClass::Standalone) | Some(NodeClass::Unsupported) => {
                let reads_open = graph
                    .links
                    .iter()
                    .any(|l| l.to_node == id && open_set.contains(&l.from_node));
                if reads_open {
                    close(&mut open, &mut open_set, &mut units);
                }
                units.push(Unit::Single(id));
            }
            None => {}
        }
    }
    close(&mut open, &mut open_set, &mut units);
    units
}

#[cfg(test)]
#[path = "../../tests/unit/compile/fuse.rs"]
mod tests;
