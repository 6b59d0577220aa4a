//! Execution of standalone operations: geometric domain transforms,
//! multi-pass compute kernels, selectors, and degraded-support fallbacks.

use rayon::prelude::*;

use crate::{
    domain::domain::Domain,
    domain::value::{PixelBuffer, RealizeOptions, Value},
    exec::context::Context,
    exec::scheduler::ExternalInputs,
    foundation::core::{PIXEL_ZERO, Pixel},
    foundation::error::{CompositorError, CompositorResult},
    graph::kinds::NodeKind,
    graph::model::Node,
};

#[derive(serde::Deserialize)]
struct BoxBlurParams {
    #[serde(default = "default_radius")]
    radius: u32,
}

// Absent params and `{}` must agree on the same radius.
impl Default for BoxBlurParams {
    fn default() -> Self {
        Self {
            radius: default_radius(),
        }
    }
}

fn default_radius() -> u32 {
    1
}

#[derive(serde::Deserialize)]
struct ImageInputParams {
    name: String,
}

/// Parse standalone-node parameters, treating absent params as defaults.
fn parse_params<T>(node: &Node) -> CompositorResult<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if node.params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(node.params.clone()).map_err(|e| {
        CompositorError::validation(format!(
            "bad parameters for {} node {:?}: {e}",
            node.kind.name(),
            node.id
        ))
    })
}

fn parse_params_required<T>(node: &Node) -> CompositorResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(node.params.clone()).map_err(|e| {
        CompositorError::validation(format!(
            "bad parameters for {} node {:?}: {e}",
            node.kind.name(),
            node.id
        ))
    })
}

/// Check a standalone node's parameters at compile time so execution cannot
/// hit malformed static data.
pub(crate) fn validate_params(node: &Node) -> CompositorResult<()> {
    match node.kind {
        NodeKind::BoxBlur => parse_params::<BoxBlurParams>(node).map(|_| ()),
        NodeKind::ImageInput => parse_params_required::<ImageInputParams>(node).map(|_| ()),
        _ => Ok(()),
    }
}

/// Execute one standalone operation. `raw` holds the bound input values in
/// socket order; `Output` sinks are handled by the scheduler and never reach
/// this function.
pub(crate) fn execute_standalone(
    node: &Node,
    raw: &[Value],
    ctx: &mut Context,
    externals: &ExternalInputs,
) -> CompositorResult<Vec<Value>> {
    match node.kind {
        // Geometric operations accumulate into the domain transform and alias
        // the input's pixels; a chain of them costs one eventual resample.
        NodeKind::Translate => {
            let image = &raw[0];
            // Buffer-driven offsets fall back to 0.
            let x = f64::from(image_scalar(&raw[1], 0.0));
            let y = f64::from(image_scalar(&raw[2], 0.0));
            Ok(vec![image.share_data(
                image.domain().translated(x, y),
                image.options(),
            )])
        }
        NodeKind::Rotate => {
            let image = &raw[0];
            // Buffer-driven angles fall back to 0.
            let angle = f64::from(image_scalar(&raw[1], 0.0));
            Ok(vec![image.share_data(
                image.domain().rotated(angle),
                image.options(),
            )])
        }
        NodeKind::Scale => {
            let image = &raw[0];
            // Buffer-driven factors fall back to 1.
            let sx = f64::from(image_scalar(&raw[1], 1.0));
            let sy = f64::from(image_scalar(&raw[2], 1.0));
            Ok(vec![image.share_data(
                image.domain().scaled(sx, sy),
                image.options(),
            )])
        }
        NodeKind::Switch => {
            // Selector resolved as a single value before binding; a
            // buffer-driven selector falls back to 0 (input `a`).
            let selector = image_scalar(&raw[0], 0.0);
            let chosen = if selector >= 0.5 { &raw[2] } else { &raw[1] };
            Ok(vec![chosen.pass_through()])
        }
        NodeKind::BoxBlur => {
            let params: BoxBlurParams = parse_params(node)?;
            Ok(vec![box_blur(&raw[0], params.radius, ctx)])
        }
        NodeKind::Coordinates => {
            let size = ctx.render_size();
            if size.is_zero() {
                return Ok(vec![Value::invalid()]);
            }
            let grid = ctx.coordinate_grid(size);
            Ok(vec![Value::buffer(
                grid,
                Domain::identity(size),
                RealizeOptions::default(),
            )?])
        }
        NodeKind::ImageInput => {
            let params: ImageInputParams = parse_params_required(node)?;
            match externals.get(&params.name) {
                Some(value) => Ok(vec![value.pass_through()]),
                None => {
                    ctx.push_diagnostic(format!(
                        "external input '{}' is not bound; producing an invalid result",
                        params.name
                    ));
                    Ok(vec![Value::invalid()])
                }
            }
        }
        kind if kind.class() == crate::graph::kinds::NodeClass::Unsupported => {
            ctx.push_diagnostic(format!(
                "node '{}' is not supported in this execution path; passing input through",
                kind.name()
            ));
            Ok(vec![raw[0].pass_through()])
        }
        other => Err(CompositorError::validation(format!(
            "node kind '{}' cannot execute as a standalone operation",
            other.name()
        ))),
    }
}

/// Scalar fast path for an input socket; the per-call fallback applies when a
/// buffer is connected where a scalar is expected.
fn image_scalar(value: &Value, fallback: f32) -> f32 {
    value.single_value_or([fallback; 4])[0]
}

/// Two-pass separable box blur. Constants and invalid inputs pass through
/// unchanged (blurring a constant is the identity).
fn box_blur(image: &Value, radius: u32, ctx: &mut Context) -> Value {
    let Some(buffer) = image.buffer_ref() else {
        return image.pass_through();
    };
    if !image.is_valid() || radius == 0 {
        return image.pass_through();
    }

    let size = buffer.size();
    let width = size.width as usize;
    let r = radius as i32;

    let mut horizontal = ctx.pool.acquire(size);
    let src = buffer.data();
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let base = y * width;
            for (x, out) in row.iter_mut().enumerate() {
                *out = box_average(|i| src[base + i as usize], x as i32, r, size.width);
            }
        });

    let mut vertical = ctx.pool.acquire(size);
    let mid = &horizontal;
    vertical
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = box_average(|i| mid[(i as usize) * width + x], y as i32, r, size.height);
            }
        });

    ctx.pool.release(size, horizontal);
    Value::buffer_unchecked(
        PixelBuffer::from_pool(size, vertical),
        image.domain(),
        image.options(),
    )
}

fn box_average(fetch: impl Fn(i32) -> Pixel, center: i32, radius: i32, extent: i32) -> Pixel {
    let lo = (center - radius).max(0);
    let hi = (center + radius).min(extent - 1);
    let mut sum = [0.0f64; 4];
    for i in lo..=hi {
        let p = fetch(i);
        for c in 0..4 {
            sum[c] += f64::from(p[c]);
        }
    }
    let n = f64::from(hi - lo + 1);
    let mut out = PIXEL_ZERO;
    for c in 0..4 {
        out[c] = (sum[c] / n) as f32;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/exec/operations.rs"]
mod tests;
