use super::*;
use crate::{
    compile::plan::compile,
    domain::value::{PixelBuffer, RealizeOptions},
    foundation::core::Size2,
    graph::model::{Link, Node},
};

fn size(w: i32, h: i32) -> Size2 {
    Size2::new(w, h).unwrap()
}

fn link(from: u32, from_output: u16, to: u32, to_input: u16) -> Link {
    Link {
        from_node: NodeId(from),
        from_output,
        to_node: NodeId(to),
        to_input,
    }
}

fn flat_image(w: i32, h: i32, pixel: crate::foundation::core::Pixel) -> Value {
    Value::from_buffer(
        PixelBuffer::filled(size(w, h), pixel),
        Domain::identity(size(w, h)),
        RealizeOptions::default(),
    )
    .unwrap()
}

fn source(id: u32, name: &str) -> Node {
    Node::with_params(
        NodeId(id),
        NodeKind::ImageInput,
        serde_json::json!({ "name": name }),
    )
}

#[test]
fn an_all_single_value_graph_allocates_no_pixels() {
    let graph = NodeGraph {
        nodes: vec![
            Node::with_params(NodeId(1), NodeKind::Value, serde_json::json!({
                "value": 0.25
            })),
            Node::new(NodeId(2), NodeKind::Invert),
            Node::new(NodeId(3), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(64, 64));

    let results = execute(&plan, &graph, &mut ctx, &ExternalInputs::new()).unwrap();
    let out = &results[&NodeId(3)];
    assert!(out.is_single());
    assert_eq!(out.single_value_or([0.0; 4]), [0.75, 0.75, 0.75, 0.25]);
    assert_eq!(ctx.pool().allocations(), 0);
}

#[test]
fn mixing_two_sizes_realizes_exactly_the_smaller_input() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "big"),
            source(2, "small"),
            Node::new(NodeId(3), NodeKind::Mix),
            Node::new(NodeId(4), NodeKind::Output),
        ],
        links: vec![link(1, 0, 3, 1), link(2, 0, 3, 2), link(3, 0, 4, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(100, 100));
    let mut externals = ExternalInputs::new();
    externals.insert("big", flat_image(100, 100, [1.0, 0.0, 0.0, 1.0]));
    externals.insert("small", flat_image(50, 50, [0.0, 0.0, 1.0, 1.0]));

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    let out = &results[&NodeId(4)];
    // The mix follows its highest-priority input's domain.
    assert_eq!(out.domain().size, size(100, 100));
    assert_eq!(ctx.stats().realizations, 1);
    assert_eq!(
        out.buffer_ref().unwrap().get(10, 10),
        [0.5, 0.0, 0.5, 1.0]
    );
}

#[test]
fn unsupported_nodes_do_not_break_the_chain() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::new(NodeId(2), NodeKind::Denoise),
            Node::new(NodeId(3), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));
    let input = flat_image(8, 8, [0.4; 4]);
    let mut externals = ExternalInputs::new();
    externals.insert("in", input.clone());

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert!(results[&NodeId(3)].shares_storage_with(&input));
    assert_eq!(ctx.diagnostics().len(), 1);
}

#[test]
fn a_collapsed_branch_invalidates_the_group_output() {
    // Scaling by zero collapses the domain transform; realizing that branch
    // inside the mix must surface as invalidity, not as black pixels.
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::with_params(NodeId(6), NodeKind::Value, serde_json::json!({
                "value": 0.0
            })),
            Node::new(NodeId(2), NodeKind::Scale),
            Node::new(NodeId(3), NodeKind::Mix),
            Node::new(NodeId(4), NodeKind::Output),
        ],
        links: vec![
            link(1, 0, 2, 0),
            link(6, 0, 2, 1),
            link(1, 0, 3, 1),
            link(2, 0, 3, 2),
            link(3, 0, 4, 0),
        ],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));
    let mut externals = ExternalInputs::new();
    externals.insert("in", flat_image(8, 8, [0.5, 0.0, 0.0, 0.5]));

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert!(!results[&NodeId(4)].is_valid());
}

#[test]
fn unsupported_nodes_pass_pixels_between_fused_groups() {
    // invert -> denoise -> invert: the fallback hands the first group's
    // buffer to the second untouched, so the sink sees the original pixels.
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::new(NodeId(2), NodeKind::Invert),
            Node::new(NodeId(3), NodeKind::Denoise),
            Node::new(NodeId(4), NodeKind::Invert),
            Node::new(NodeId(5), NodeKind::Output),
        ],
        links: vec![
            link(1, 0, 2, 0),
            link(2, 0, 3, 0),
            link(3, 0, 4, 0),
            link(4, 0, 5, 0),
        ],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));
    let mut externals = ExternalInputs::new();
    externals.insert("in", flat_image(8, 8, [0.25, 0.25, 0.25, 1.0]));

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    let out = &results[&NodeId(5)];
    assert!(out.is_valid());
    assert_eq!(out.buffer_ref().unwrap().get(3, 3), [0.25, 0.25, 0.25, 1.0]);
    assert_eq!(ctx.diagnostics().len(), 1);
}

#[test]
fn a_failing_shader_group_passes_its_primary_input_through() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::with_params(NodeId(2), NodeKind::Math, serde_json::json!({
                "op": "modulo"
            })),
            Node::new(NodeId(3), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));
    let input = flat_image(8, 8, [0.4; 4]);
    let mut externals = ExternalInputs::new();
    externals.insert("in", input.clone());

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert!(results[&NodeId(3)].shares_storage_with(&input));
    assert!(!ctx.diagnostics().is_empty());
}

#[test]
fn invalidity_propagates_to_the_sink_without_failing() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "unbound"),
            Node::new(NodeId(2), NodeKind::Invert),
            Node::new(NodeId(3), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));

    let results = execute(&plan, &graph, &mut ctx, &ExternalInputs::new()).unwrap();
    assert!(!results[&NodeId(3)].is_valid());
    assert!(!ctx.diagnostics().is_empty());
}

#[test]
fn repeated_evaluations_hit_the_shader_cache() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::new(NodeId(2), NodeKind::Invert),
            Node::new(NodeId(3), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));
    let mut externals = ExternalInputs::new();
    externals.insert("in", flat_image(8, 8, [0.4; 4]));

    execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert_eq!(ctx.stats().shader_cache_misses, 1);

    ctx.reset();
    execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert_eq!(ctx.stats().shader_cache_hits, 1);
    assert_eq!(ctx.stats().shader_cache_misses, 0);
}

#[test]
fn released_buffers_are_reused_within_a_run() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::new(NodeId(2), NodeKind::BoxBlur),
            Node::new(NodeId(3), NodeKind::BoxBlur),
            Node::new(NodeId(4), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0), link(3, 0, 4, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(32, 32));
    let mut externals = ExternalInputs::new();
    externals.insert("in", flat_image(32, 32, [0.4; 4]));

    execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert!(ctx.pool().pool_hits() > 0);
}

#[test]
fn geometric_chains_resample_once_at_the_consumer() {
    // The translate only retags the domain; the one realization in the run is
    // the mix pulling the moved branch back onto its own grid.
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::with_params(NodeId(6), NodeKind::Value, serde_json::json!({
                "value": 3.0
            })),
            Node::new(NodeId(2), NodeKind::Translate),
            Node::new(NodeId(4), NodeKind::Mix),
            Node::new(NodeId(5), NodeKind::Output),
        ],
        links: vec![
            link(1, 0, 2, 0),
            link(6, 0, 2, 1),
            link(1, 0, 4, 1),
            link(2, 0, 4, 2),
            link(4, 0, 5, 0),
        ],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(16, 16));
    let mut externals = ExternalInputs::new();
    externals.insert("in", flat_image(16, 16, [0.5; 4]));

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert!(results[&NodeId(5)].is_valid());
    assert_eq!(results[&NodeId(5)].domain().size, size(16, 16));
    // The untouched branch matches the mix's domain and is not resampled.
    assert_eq!(ctx.stats().realizations, 1);
}

#[test]
fn every_sink_gets_its_own_result() {
    let graph = NodeGraph {
        nodes: vec![
            source(1, "in"),
            Node::new(NodeId(2), NodeKind::Invert),
            Node::new(NodeId(3), NodeKind::Output),
            Node::new(NodeId(4), NodeKind::Output),
        ],
        links: vec![link(1, 0, 2, 0), link(2, 0, 3, 0), link(1, 0, 4, 0)],
    };
    let plan = compile(&graph).unwrap();
    let mut ctx = Context::new(size(8, 8));
    let input = flat_image(8, 8, [0.25; 4]);
    let mut externals = ExternalInputs::new();
    externals.insert("in", input.clone());

    let results = execute(&plan, &graph, &mut ctx, &externals).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[&NodeId(4)].shares_storage_with(&input));
    assert_eq!(
        results[&NodeId(3)].buffer_ref().unwrap().get(0, 0),
        [0.75, 0.75, 0.75, 0.25]
    );
}
