use kurbo::Point;
use rayon::prelude::*;

use crate::{
    domain::domain::Domain,
    domain::value::{Interpolation, PixelBuffer, RealizeOptions, Value, ValueKind},
    exec::pool::BufferPool,
    foundation::core::Pixel,
    foundation::math::{clamp_extent, lerp, wrap_repeat},
};

/// Resample a value from its native domain into `target`.
///
/// - An invalid source or target yields the invalid value (never an error).
/// - A single value stays single, re-tagged with `target` (lazy; see
///   [`materialize`] for the constant-fill path).
/// - A buffer whose domain already equals `target` (within
///   [`crate::DOMAIN_EPSILON`]) is returned unchanged, sharing storage.
/// - Otherwise every target pixel is mapped through
///   `source.transform⁻¹ ∘ target.transform` and sampled with the value's
///   interpolation, repeating per `repeat_x`/`repeat_y` and edge-clamping
///   otherwise.
pub fn realize(value: &Value, target: &Domain, pool: &mut BufferPool) -> Value {
    if !value.is_valid() || !target.is_valid() {
        return Value::invalid();
    }

    // Reborrow past the Rc so the row loop below only captures Sync data.
    let buffer: &PixelBuffer = match value.kind() {
        ValueKind::Single(pixel) => return Value::single_in(*pixel, *target),
        ValueKind::Buffer(buffer) => buffer,
    };

    if value.domain().approx_eq(target) {
        return value.clone();
    }

    let source_transform = value.domain().transform;
    if source_transform.determinant().abs() < 1e-12 {
        return Value::invalid();
    }
    // Target pixel centers -> shared space -> source pixel space.
    let mapping = source_transform.inverse() * target.transform;

    let options = value.options();
    let width = target.size.width as usize;
    let mut data = pool.acquire(target.size);
    data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let p = mapping * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            *out = sample(buffer, p.x as f32, p.y as f32, options);
        }
    });

    let realized = PixelBuffer::from_pool(target.size, data);
    Value::buffer_unchecked(realized, *target, options)
}

/// Force a single value into an actual constant-fill buffer over `target`.
///
/// Buffer values are realized as by [`realize`]; invalid values stay invalid.
/// This is the only way a single value ever allocates pixels.
pub fn materialize(value: &Value, target: &Domain, pool: &mut BufferPool) -> Value {
    if !value.is_valid() || !target.is_valid() {
        return Value::invalid();
    }
    match value.kind() {
        ValueKind::Buffer(_) => realize(value, target, pool),
        ValueKind::Single(pixel) => {
            let mut data = pool.acquire(target.size);
            data.fill(*pixel);
            let buffer = PixelBuffer::from_pool(target.size, data);
            Value::buffer_unchecked(buffer, *target, value.options())
        }
    }
}

/// Fetch one texel applying the wrap policy per axis.
fn tap(buffer: &PixelBuffer, ix: i32, iy: i32, options: RealizeOptions) -> Pixel {
    let size = buffer.size();
    let x = if options.repeat_x {
        wrap_repeat(ix, size.width)
    } else {
        clamp_extent(ix, size.width)
    };
    let y = if options.repeat_y {
        wrap_repeat(iy, size.height)
    } else {
        clamp_extent(iy, size.height)
    };
    buffer.get(x, y)
}

/// Sample at continuous source-space coordinates (pixel `i` spans `[i, i+1)`).
fn sample(buffer: &PixelBuffer, sx: f32, sy: f32, options: RealizeOptions) -> Pixel {
    match options.interpolation {
        Interpolation::Nearest => tap(
            buffer,
            sx.floor() as i32,
            sy.floor() as i32,
            options,
        ),
        Interpolation::Bilinear => {
            let fx = sx - 0.5;
            let fy = sy - 0.5;
            let x0 = fx.floor();
            let y0 = fy.floor();
            let tx = fx - x0;
            let ty = fy - y0;
            let (x0, y0) = (x0 as i32, y0 as i32);

            let p00 = tap(buffer, x0, y0, options);
            let p10 = tap(buffer, x0 + 1, y0, options);
            let p01 = tap(buffer, x0, y0 + 1, options);
            let p11 = tap(buffer, x0 + 1, y0 + 1, options);

            let mut out = [0.0f32; 4];
            for c in 0..4 {
                out[c] = lerp(lerp(p00[c], p10[c], tx), lerp(p01[c], p11[c], tx), ty);
            }
            out
        }
        Interpolation::Bicubic => {
            let fx = sx - 0.5;
            let fy = sy - 0.5;
            let x0 = fx.floor();
            let y0 = fy.floor();
            let tx = fx - x0;
            let ty = fy - y0;
            let (x0, y0) = (x0 as i32, y0 as i32);

            let mut columns = [[0.0f32; 4]; 4];
            for (j, column) in columns.iter_mut().enumerate() {
                let iy = y0 + j as i32 - 1;
                let mut taps = [[0.0f32; 4]; 4];
                for (i, t) in taps.iter_mut().enumerate() {
                    *t = tap(buffer, x0 + i as i32 - 1, iy, options);
                }
                for c in 0..4 {
                    column[c] = catmull_rom(taps[0][c], taps[1][c], taps[2][c], taps[3][c], tx);
                }
            }
            let mut out = [0.0f32; 4];
            for c in 0..4 {
                out[c] = catmull_rom(
                    columns[0][c],
                    columns[1][c],
                    columns[2][c],
                    columns[3][c],
                    ty,
                );
            }
            out
        }
    }
}

fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
#[path = "../../tests/unit/domain/realize.rs"]
mod tests;
