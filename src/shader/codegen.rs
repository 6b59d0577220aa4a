//! Textual listings for fused shader groups.
//!
//! The listing is the cache key for compiled programs, so it must be
//! deterministic and must capture everything that affects per-pixel behavior:
//! group topology, node kinds, and node parameters. Registers are numbered
//! structurally (external inputs first, then member outputs in topological
//! order), so two structurally identical groups share one cache entry even
//! across different graphs.

use std::collections::HashMap;

use crate::{
    foundation::core::NodeId,
    graph::model::NodeGraph,
};

/// Register assignment for one fused group, shared by the listing and the
/// program builder so both agree on numbering.
pub(crate) struct GroupLayout {
    /// Register per (member node, output socket).
    output_regs: HashMap<(NodeId, u16), u16>,
    /// Register per externally fed (member node, input socket); external
    /// bindings occupy the first `input_count` registers.
    external_regs: HashMap<(NodeId, u16), u16>,
    reg_count: u16,
    input_count: u16,
}

impl GroupLayout {
    pub(crate) fn new(
        graph: &NodeGraph,
        members: &[NodeId],
        input_map: &[(NodeId, u16)],
    ) -> Self {
        let mut external_regs = HashMap::with_capacity(input_map.len());
        for (index, socket) in input_map.iter().enumerate() {
            external_regs.insert(*socket, index as u16);
        }

        let mut output_regs = HashMap::new();
        let mut next = input_map.len() as u16;
        for id in members {
            if let Some(node) = graph.node(*id) {
                for output in 0..node.kind.descriptor().output_count {
                    output_regs.insert((*id, output), next);
                    next += 1;
                }
            }
        }

        Self {
            output_regs,
            external_regs,
            reg_count: next,
            input_count: input_map.len() as u16,
        }
    }

    /// Register feeding an input socket of a member node: either the external
    /// binding's register or an in-group producer's output register.
    pub(crate) fn arg(&self, graph: &NodeGraph, node: NodeId, socket: u16) -> u16 {
        if let Some(&reg) = self.external_regs.get(&(node, socket)) {
            return reg;
        }
        match graph.link_into(node, socket) {
            Some(link) => self.output_regs[&(link.from_node, link.from_output)],
            // Unreachable for well-formed plans: every unconnected socket has
            // an external default binding.
            None => 0,
        }
    }

    /// Registers assigned to a member node's outputs.
    pub(crate) fn outputs_of(&self, node: NodeId, count: u16) -> Vec<u16> {
        (0..count).map(|o| self.output_regs[&(node, o)]).collect()
    }

    pub(crate) fn reg_count(&self) -> u16 {
        self.reg_count
    }

    pub(crate) fn input_count(&self) -> u16 {
        self.input_count
    }
}

/// Generate the deterministic listing for a fused group.
pub(crate) fn group_source(
    graph: &NodeGraph,
    members: &[NodeId],
    input_map: &[(NodeId, u16)],
    outputs: &[(NodeId, u16)],
) -> String {
    let layout = GroupLayout::new(graph, members, input_map);

    let mut source = String::from("program fused-v1\n");
    source.push_str(&format!("in {}\n", layout.input_count()));

    for id in members {
        let Some(node) = graph.node(*id) else { continue };
        let descriptor = node.kind.descriptor();

        let dsts = layout
            .outputs_of(*id, descriptor.output_count)
            .iter()
            .map(|r| format!("r{r}"))
            .collect::<Vec<_>>()
            .join(",");
        let args = (0..descriptor.inputs.len() as u16)
            .map(|socket| format!("r{}", layout.arg(graph, *id, socket)))
            .collect::<Vec<_>>()
            .join(", ");

        if node.params.is_null() {
            source.push_str(&format!("{dsts} = {}({args})\n", descriptor.name));
        } else {
            source.push_str(&format!(
                "{dsts} = {}[{}]({args})\n",
                descriptor.name, node.params
            ));
        }
    }

    for socket in outputs {
        source.push_str(&format!("out r{}\n", layout.output_regs[socket]));
    }
    source
}

#[cfg(test)]
#[path = "../../tests/unit/shader/codegen.rs"]
mod tests;
