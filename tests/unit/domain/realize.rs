use super::*;
use crate::{domain::value::Value, foundation::core::Size2};

fn size(w: i32, h: i32) -> Size2 {
    Size2::new(w, h).unwrap()
}

fn gradient(w: i32, h: i32, options: RealizeOptions) -> Value {
    let size = size(w, h);
    let data = (0..size.num_pixels())
        .map(|i| {
            let x = (i as i32 % w) as f32;
            let y = (i as i32 / w) as f32;
            [x, y, 0.0, 1.0]
        })
        .collect();
    Value::from_buffer(
        PixelBuffer::new(size, data).unwrap(),
        Domain::identity(size),
        options,
    )
    .unwrap()
}

fn nearest() -> RealizeOptions {
    RealizeOptions {
        interpolation: Interpolation::Nearest,
        ..RealizeOptions::default()
    }
}

#[test]
fn matching_domain_is_a_no_op_sharing_storage() {
    let mut pool = BufferPool::default();
    let value = gradient(8, 8, RealizeOptions::default());
    let out = realize(&value, &value.domain(), &mut pool);
    assert!(out.shares_storage_with(&value));
    assert_eq!(pool.allocations(), 0);
}

#[test]
fn single_values_realize_lazily() {
    let mut pool = BufferPool::default();
    let value = Value::single([0.3; 4]);
    let target = Domain::identity(size(128, 128));
    let out = realize(&value, &target, &mut pool);
    assert!(out.is_single());
    assert!(out.domain().approx_eq(&target));
    assert_eq!(pool.allocations(), 0);
}

#[test]
fn invalid_source_or_target_yields_invalid() {
    let mut pool = BufferPool::default();
    let value = gradient(4, 4, RealizeOptions::default());
    assert!(!realize(&value, &Domain::invalid(), &mut pool).is_valid());
    assert!(!realize(&Value::invalid(), &value.domain(), &mut pool).is_valid());
}

#[test]
fn integer_translation_shifts_pixels_exactly() {
    let mut pool = BufferPool::default();
    let value = gradient(8, 8, nearest());
    // The source sits 3 pixels to the right of the target grid, so target
    // pixel x reads source pixel x - 3 (edge-clamped below 0).
    let shifted = value.share_data(value.domain().translated(3.0, 0.0), value.options());
    let target = Domain::identity(size(8, 8));

    let out = realize(&shifted, &target, &mut pool);
    let buffer = out.buffer_ref().unwrap();
    assert_eq!(buffer.get(5, 2), [2.0, 2.0, 0.0, 1.0]);
    assert_eq!(buffer.get(3, 0), [0.0, 0.0, 0.0, 1.0]);
    // Clamp: everything left of the source edge reads column 0.
    assert_eq!(buffer.get(0, 4), [0.0, 4.0, 0.0, 1.0]);
    assert_eq!(pool.allocations(), 1);
}

#[test]
fn repeat_wraps_instead_of_clamping() {
    let mut pool = BufferPool::default();
    let options = RealizeOptions {
        repeat_x: true,
        ..nearest()
    };
    let value = gradient(4, 4, options);
    let shifted = value.share_data(value.domain().translated(1.0, 0.0), options);
    let target = Domain::identity(size(4, 4));

    let out = realize(&shifted, &target, &mut pool);
    let buffer = out.buffer_ref().unwrap();
    // Target x=0 maps to source x=-1, wrapped to the last column.
    assert_eq!(buffer.get(0, 0), [3.0, 0.0, 0.0, 1.0]);
    assert_eq!(buffer.get(1, 0), [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn composed_translations_match_a_single_combined_one() {
    let mut pool = BufferPool::default();
    let value = gradient(8, 8, nearest());
    let target = Domain::identity(size(8, 8));

    let step_a = value.share_data(value.domain().translated(1.0, 0.0), value.options());
    let once = realize(&step_a, &target, &mut pool);
    let step_b = once.share_data(once.domain().translated(1.0, 0.0), once.options());
    let twice = realize(&step_b, &target, &mut pool);

    let combined = value.share_data(value.domain().translated(2.0, 0.0), value.options());
    let direct = realize(&combined, &target, &mut pool);

    assert_eq!(
        twice.buffer_ref().unwrap().data(),
        direct.buffer_ref().unwrap().data()
    );
}

#[test]
fn bilinear_midpoint_averages_neighbors() {
    let mut pool = BufferPool::default();
    let value = gradient(4, 1, RealizeOptions::default());
    let shifted = value.share_data(value.domain().translated(0.5, 0.0), value.options());
    let target = Domain::identity(size(4, 1));

    let out = realize(&shifted, &target, &mut pool);
    let buffer = out.buffer_ref().unwrap();
    // Target pixel 2 samples halfway between source pixels 1 and 2.
    let p = buffer.get(2, 0);
    assert!((p[0] - 1.5).abs() < 1e-5);
}

#[test]
fn materialize_fills_singles_into_real_buffers() {
    let mut pool = BufferPool::default();
    let value = Value::single([0.25, 0.5, 0.75, 1.0]);
    let target = Domain::identity(size(6, 3));

    let out = materialize(&value, &target, &mut pool);
    let buffer = out.buffer_ref().unwrap();
    assert_eq!(buffer.size(), size(6, 3));
    assert!(buffer.data().iter().all(|p| *p == [0.25, 0.5, 0.75, 1.0]));
    assert_eq!(pool.allocations(), 1);
}

#[test]
fn degenerate_source_transform_is_invalid_not_a_panic() {
    let mut pool = BufferPool::default();
    let value = gradient(4, 4, nearest());
    let collapsed = value.share_data(
        Domain::new(value.domain().size, kurbo::Affine::scale(0.0)),
        value.options(),
    );
    let out = realize(&collapsed, &Domain::identity(size(4, 4)), &mut pool);
    assert!(!out.is_valid());
}
