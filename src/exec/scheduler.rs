use std::collections::HashMap;
use std::rc::Rc;

use crate::{
    compile::plan::{InputBinding, InputSource, OpKind, Operation, Plan},
    domain::domain::{Domain, compute_domain},
    domain::realize::realize,
    domain::value::{Value, ValueKind},
    exec::context::Context,
    exec::operations,
    exec::pool::BufferPool,
    foundation::core::NodeId,
    foundation::error::{CompositorError, CompositorResult},
    graph::kinds::NodeKind,
    graph::model::NodeGraph,
    shader::program::{Feed, Program},
};

/// Externally supplied image values, bound to `image_input` nodes by name.
#[derive(Default)]
pub struct ExternalInputs {
    values: HashMap<String, Value>,
}

impl ExternalInputs {
    /// Empty set of inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under a name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look up a bound value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Execute a compiled plan.
///
/// Operations run strictly in plan order on one logical thread; inputs are
/// bound at execution time, realized into the operation's computed domain
/// where they disagree, and released to the Context's buffer pool once their
/// last consumer has run. Recoverable failures (shader compile, missing
/// external inputs, unsupported nodes) degrade to pass-through behavior plus a
/// diagnostic; execution always completes and returns one result per `output`
/// sink, keyed by the sink's node id. Callers must check result validity.
#[tracing::instrument(skip_all, fields(operations = plan.operations.len()))]
pub fn execute(
    plan: &Plan,
    graph: &NodeGraph,
    ctx: &mut Context,
    externals: &ExternalInputs,
) -> CompositorResult<HashMap<NodeId, Value>> {
    let mut slots: Vec<Vec<Option<Value>>> = Vec::with_capacity(plan.operations.len());
    let mut remaining: Vec<Vec<u32>> = plan
        .operations
        .iter()
        .map(|op| op.consumer_counts.clone())
        .collect();
    let mut results = HashMap::with_capacity(plan.outputs.len());

    for op in &plan.operations {
        let raw: Vec<Value> = op
            .inputs
            .iter()
            .map(|binding| match binding.source {
                InputSource::Operation { op: src, output } => slots[src.0 as usize]
                    [output as usize]
                    .clone()
                    .unwrap_or_else(Value::invalid),
                InputSource::Default(pixel) => Value::single(pixel),
            })
            .collect();

        let outputs = match &op.kind {
            OpKind::Standalone { node } => {
                let node = graph.node(*node).ok_or_else(|| {
                    CompositorError::validation(format!(
                        "plan references missing node {node:?}"
                    ))
                })?;
                if node.kind == NodeKind::Output {
                    results.insert(node.id, raw[0].clone());
                    Vec::new()
                } else {
                    operations::execute_standalone(node, &raw, ctx, externals)?
                }
            }
            OpKind::ShaderGroup {
                nodes,
                source,
                input_map,
                outputs,
            } => execute_group(graph, op, nodes, source, input_map, outputs, &raw, ctx),
        };
        ctx.stats.operations += 1;
        debug_assert_eq!(outputs.len(), op.output_count as usize);

        // Outputs nobody consumes are reclaimed immediately.
        let mut stored = Vec::with_capacity(outputs.len());
        for (index, value) in outputs.into_iter().enumerate() {
            if op.consumer_counts.get(index).copied().unwrap_or(0) == 0 {
                reclaim(value, &mut ctx.pool);
                stored.push(None);
            } else {
                stored.push(Some(value));
            }
        }
        slots.push(stored);
        drop(raw);

        // Release inputs whose last consumer has now run.
        for binding in &op.inputs {
            if let InputSource::Operation { op: src, output } = binding.source {
                let count = &mut remaining[src.0 as usize][output as usize];
                *count -= 1;
                if *count == 0
                    && let Some(value) = slots[src.0 as usize][output as usize].take()
                {
                    reclaim(value, &mut ctx.pool);
                }
            }
        }
    }

    Ok(results)
}

/// Return a value's storage to the pool if this was the last reference.
fn reclaim(value: Value, pool: &mut BufferPool) {
    if let ValueKind::Buffer(rc) = value.into_kind()
        && let Ok(buffer) = Rc::try_unwrap(rc)
    {
        pool.release(buffer.size(), buffer.into_data());
    }
}

/// Realize a value into `domain`, counting only realizations that actually
/// materialized new pixels.
fn realize_counted(value: &Value, domain: &Domain, ctx: &mut Context) -> Value {
    let out = realize(value, domain, &mut ctx.pool);
    if out.is_buffer() && !out.shares_storage_with(value) {
        ctx.stats.realizations += 1;
    }
    out
}

/// Execute one shader group operation. Never fails: a program that does not
/// build demotes the group to a pass-through of its primary input with a
/// diagnostic attached to the Context.
#[allow(clippy::too_many_arguments)]
fn execute_group(
    graph: &NodeGraph,
    op: &Operation,
    nodes: &[NodeId],
    source: &str,
    input_map: &[(NodeId, u16)],
    outputs: &[(NodeId, u16)],
    raw: &[Value],
    ctx: &mut Context,
) -> Vec<Value> {
    let program =
        match ctx.program_for(source, || Program::build(graph, nodes, input_map, outputs)) {
            Ok(program) => program,
            Err(error) => {
                tracing::warn!(%error, "shader group demoted to pass-through");
                ctx.push_diagnostic(format!(
                    "shader group failed to compile ({error}); passing primary input through"
                ));
                let primary = primary_input(&op.inputs, raw)
                    .cloned()
                    .unwrap_or_else(Value::invalid);
                return (0..op.output_count).map(|_| primary.pass_through()).collect();
            }
        };

    if raw.iter().any(|v| !v.is_valid()) {
        return (0..op.output_count).map(|_| Value::invalid()).collect();
    }

    let domain = compute_domain(
        op.inputs
            .iter()
            .map(|b| b.domain_priority)
            .zip(raw.iter()),
    );

    match domain {
        // Every input is a single value: evaluate once, allocate nothing.
        None => {
            let pixels: Vec<_> = raw.iter().map(|v| v.single_value_or([0.0; 4])).collect();
            program
                .run_single(&pixels)
                .into_iter()
                .map(Value::single)
                .collect()
        }
        Some(domain) => {
            let realized: Vec<Value> = raw
                .iter()
                .map(|value| {
                    if value.is_buffer() {
                        realize_counted(value, &domain, ctx)
                    } else {
                        value.clone()
                    }
                })
                .collect();
            // A degenerate domain transform realizes to the invalid value;
            // that invalidity must reach the sinks, not turn into black.
            if realized.iter().any(|v| !v.is_valid()) {
                for value in realized {
                    reclaim(value, &mut ctx.pool);
                }
                return (0..op.output_count).map(|_| Value::invalid()).collect();
            }
            let feeds: Vec<Feed<'_>> = realized
                .iter()
                .map(|value| match value.kind() {
                    ValueKind::Single(pixel) => Feed::Const(*pixel),
                    ValueKind::Buffer(buffer) => Feed::Rows(buffer.data()),
                })
                .collect();

            let out = program.run(&feeds, &domain, &mut ctx.pool);

            // Resampled temporaries go straight back to the pool; aliases of
            // still-live inputs survive the try_unwrap and are skipped.
            drop(feeds);
            for value in realized {
                reclaim(value, &mut ctx.pool);
            }
            out
        }
    }
}

/// The highest-domain-priority input, the group's primary image.
fn primary_input<'a>(bindings: &[InputBinding], raw: &'a [Value]) -> Option<&'a Value> {
    let mut best: Option<(u16, &Value)> = None;
    for (binding, value) in bindings.iter().zip(raw) {
        match best {
            Some((p, _)) if p <= binding.domain_priority => {}
            _ => best = Some((binding.domain_priority, value)),
        }
    }
    best.map(|(_, v)| v)
}

#[cfg(test)]
#[path = "../../tests/unit/exec/scheduler.rs"]
mod tests;
