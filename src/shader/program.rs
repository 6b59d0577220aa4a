use rayon::prelude::*;

use crate::{
    domain::domain::Domain,
    domain::value::{PixelBuffer, RealizeOptions, Value},
    exec::pool::BufferPool,
    foundation::core::{NodeId, PIXEL_ZERO, Pixel},
    foundation::error::{CompositorError, CompositorResult},
    foundation::math::lerp,
    graph::kinds::{MathOp, NodeKind},
    graph::model::NodeGraph,
    shader::codegen::GroupLayout,
};

/// What one program input reads during execution: a constant (single values
/// stay lazy) or the rows of a buffer realized to the program's domain.
pub(crate) enum Feed<'a> {
    Const(Pixel),
    Rows(&'a [Pixel]),
}

#[derive(Clone, Copy, Debug)]
enum Instr {
    Const { dst: u16, value: Pixel },
    Math { dst: u16, op: MathOp, a: u16, b: u16 },
    Mix { dst: u16, fac: u16, a: u16, b: u16 },
    Invert { dst: u16, image: u16 },
    SetAlpha { dst: u16, image: u16, alpha: u16 },
    Separate { dst: [u16; 4], image: u16 },
    Combine { dst: u16, r: u16, g: u16, b: u16, a: u16 },
}

#[derive(serde::Deserialize)]
struct ValueParams {
    value: f32,
}

#[derive(serde::Deserialize)]
struct ColorParams {
    color: [f32; 4],
}

#[derive(serde::Deserialize)]
struct MathParams {
    op: String,
}

/// A fused group compiled to a per-pixel register program.
///
/// Built lazily at first execution and cached on the Context keyed by the
/// generated listing, so identical subgraphs across frames never recompile.
#[derive(Debug)]
pub(crate) struct Program {
    instrs: Vec<Instr>,
    reg_count: usize,
    input_count: usize,
    outputs: Vec<u16>,
}

impl Program {
    /// Compile a group's member nodes into instructions. Malformed parameters
    /// surface as [`CompositorError::ShaderCompile`]; the scheduler recovers
    /// by demoting the group to a pass-through.
    pub(crate) fn build(
        graph: &NodeGraph,
        members: &[NodeId],
        input_map: &[(NodeId, u16)],
        outputs: &[(NodeId, u16)],
    ) -> CompositorResult<Program> {
        let layout = GroupLayout::new(graph, members, input_map);
        let mut instrs = Vec::with_capacity(members.len());

        for id in members {
            let node = graph.node(*id).ok_or_else(|| {
                CompositorError::shader_compile(format!("group references missing node {id:?}"))
            })?;
            let dst = layout.outputs_of(*id, node.kind.descriptor().output_count);
            let arg = |socket: u16| layout.arg(graph, *id, socket);

            let instr = match node.kind {
                NodeKind::Value => {
                    let params: ValueParams = parse_params(node)?;
                    Instr::Const {
                        dst: dst[0],
                        value: [params.value; 4],
                    }
                }
                NodeKind::RgbColor => {
                    let params: ColorParams = parse_params(node)?;
                    Instr::Const {
                        dst: dst[0],
                        value: params.color,
                    }
                }
                NodeKind::Math => {
                    let params: MathParams = parse_params(node)?;
                    Instr::Math {
                        dst: dst[0],
                        op: MathOp::parse(&params.op)?,
                        a: arg(0),
                        b: arg(1),
                    }
                }
                NodeKind::Mix => Instr::Mix {
                    dst: dst[0],
                    fac: arg(0),
                    a: arg(1),
                    b: arg(2),
                },
                NodeKind::Invert => Instr::Invert {
                    dst: dst[0],
                    image: arg(0),
                },
                NodeKind::SetAlpha => Instr::SetAlpha {
                    dst: dst[0],
                    image: arg(0),
                    alpha: arg(1),
                },
                NodeKind::SeparateColor => Instr::Separate {
                    dst: [dst[0], dst[1], dst[2], dst[3]],
                    image: arg(0),
                },
                NodeKind::CombineColor => Instr::Combine {
                    dst: dst[0],
                    r: arg(0),
                    g: arg(1),
                    b: arg(2),
                    a: arg(3),
                },
                other => {
                    return Err(CompositorError::shader_compile(format!(
                        "node kind '{}' is not fusable",
                        other.name()
                    )));
                }
            };
            instrs.push(instr);
        }

        let layout_outputs = outputs
            .iter()
            .map(|(node, socket)| layout.outputs_of(*node, socket + 1)[*socket as usize])
            .collect();

        Ok(Program {
            instrs,
            reg_count: layout.reg_count() as usize,
            input_count: layout.input_count() as usize,
            outputs: layout_outputs,
        })
    }

    /// Evaluate once for a single pixel's inputs (the single-value fast path).
    pub(crate) fn run_single(&self, inputs: &[Pixel]) -> Vec<Pixel> {
        debug_assert_eq!(inputs.len(), self.input_count);
        let mut regs = vec![PIXEL_ZERO; self.reg_count];
        regs[..self.input_count].copy_from_slice(inputs);
        self.eval(&mut regs);
        self.outputs.iter().map(|&r| regs[r as usize]).collect()
    }

    /// Evaluate over every pixel of `domain`, producing one buffer per group
    /// output. Inputs must already be realized to `domain` (buffers) or be
    /// constants.
    pub(crate) fn run(
        &self,
        feeds: &[Feed<'_>],
        domain: &Domain,
        pool: &mut BufferPool,
    ) -> Vec<Value> {
        debug_assert_eq!(feeds.len(), self.input_count);
        let size = domain.size;
        let width = size.width as usize;
        let height = size.height as usize;

        let mut out_bufs: Vec<Vec<Pixel>> =
            (0..self.outputs.len()).map(|_| pool.acquire(size)).collect();

        let mut per_row: Vec<Vec<&mut [Pixel]>> =
            (0..height).map(|_| Vec::with_capacity(out_bufs.len())).collect();
        for buf in out_bufs.iter_mut() {
            for (y, row) in buf.chunks_mut(width).enumerate() {
                per_row[y].push(row);
            }
        }

        per_row.into_par_iter().enumerate().for_each(|(y, mut rows)| {
            let mut regs = vec![PIXEL_ZERO; self.reg_count];
            let base = y * width;
            for x in 0..width {
                for (i, feed) in feeds.iter().enumerate() {
                    regs[i] = match feed {
                        Feed::Const(p) => *p,
                        Feed::Rows(data) => data[base + x],
                    };
                }
                self.eval(&mut regs);
                for (k, &r) in self.outputs.iter().enumerate() {
                    rows[k][x] = regs[r as usize];
                }
            }
        });

        out_bufs
            .into_iter()
            .map(|data| {
                Value::buffer_unchecked(
                    PixelBuffer::from_pool(size, data),
                    *domain,
                    RealizeOptions::default(),
                )
            })
            .collect()
    }

    fn eval(&self, regs: &mut [Pixel]) {
        for instr in &self.instrs {
            match *instr {
                Instr::Const { dst, value } => regs[dst as usize] = value,
                Instr::Math { dst, op, a, b } => {
                    let (pa, pb) = (regs[a as usize], regs[b as usize]);
                    let mut out = PIXEL_ZERO;
                    for c in 0..4 {
                        out[c] = op.apply(pa[c], pb[c]);
                    }
                    regs[dst as usize] = out;
                }
                Instr::Mix { dst, fac, a, b } => {
                    let t = regs[fac as usize][0];
                    let (pa, pb) = (regs[a as usize], regs[b as usize]);
                    let mut out = PIXEL_ZERO;
                    for c in 0..4 {
                        out[c] = lerp(pa[c], pb[c], t);
                    }
                    regs[dst as usize] = out;
                }
                Instr::Invert { dst, image } => {
                    let p = regs[image as usize];
                    regs[dst as usize] = [1.0 - p[0], 1.0 - p[1], 1.0 - p[2], p[3]];
                }
                Instr::SetAlpha { dst, image, alpha } => {
                    let p = regs[image as usize];
                    let a = regs[alpha as usize][0];
                    regs[dst as usize] = [p[0], p[1], p[2], a];
                }
                Instr::Separate { dst, image } => {
                    let p = regs[image as usize];
                    for c in 0..4 {
                        // Scalar channels broadcast across all components.
                        regs[dst[c] as usize] = [p[c]; 4];
                    }
                }
                Instr::Combine { dst, r, g, b, a } => {
                    regs[dst as usize] = [
                        regs[r as usize][0],
                        regs[g as usize][0],
                        regs[b as usize][0],
                        regs[a as usize][0],
                    ];
                }
            }
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    node: &crate::graph::model::Node,
) -> CompositorResult<T> {
    serde_json::from_value(node.params.clone()).map_err(|e| {
        CompositorError::shader_compile(format!(
            "bad parameters for {} node {:?}: {e}",
            node.kind.name(),
            node.id
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/shader/program.rs"]
mod tests;
