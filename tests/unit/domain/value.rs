use super::*;
use crate::foundation::core::Size2;

fn size(w: i32, h: i32) -> Size2 {
    Size2::new(w, h).unwrap()
}

fn buffer_value(w: i32, h: i32, pixel: crate::foundation::core::Pixel) -> Value {
    let domain = Domain::identity(size(w, h));
    Value::from_buffer(
        PixelBuffer::filled(domain.size, pixel),
        domain,
        RealizeOptions::default(),
    )
    .unwrap()
}

#[test]
fn single_values_carry_the_degenerate_domain() {
    let v = Value::single([0.5, 0.5, 0.5, 1.0]);
    assert!(v.is_single());
    assert!(v.is_valid());
    assert_eq!(v.domain().size, size(1, 1));
    assert_eq!(v.single_value_or([0.0; 4]), [0.5, 0.5, 0.5, 1.0]);
}

#[test]
fn invalid_is_single_and_not_valid() {
    let v = Value::invalid();
    assert!(v.is_single());
    assert!(!v.is_valid());
}

#[test]
fn buffer_size_must_match_domain() {
    let buffer = PixelBuffer::filled(size(4, 4), [0.0; 4]);
    let mismatched = Domain::identity(size(8, 8));
    assert!(Value::from_buffer(buffer, mismatched, RealizeOptions::default()).is_err());
}

#[test]
fn share_data_aliases_storage_without_copying() {
    let original = buffer_value(6, 4, [1.0, 0.0, 0.0, 1.0]);
    let moved = original.share_data(
        original.domain().translated(10.0, 0.0),
        original.options(),
    );

    assert!(moved.shares_storage_with(&original));
    assert!(!moved.domain().approx_eq(&original.domain()));
    assert_eq!(moved.buffer_ref().unwrap().size(), size(6, 4));
}

#[test]
fn pass_through_aliases_storage_and_domain() {
    let original = buffer_value(3, 3, [0.2; 4]);
    let alias = original.pass_through();
    assert!(alias.shares_storage_with(&original));
    assert!(alias.domain().approx_eq(&original.domain()));
}

#[test]
fn single_value_or_falls_back_for_buffers() {
    let v = buffer_value(2, 2, [0.9; 4]);
    assert_eq!(v.single_value_or([0.1; 4]), [0.1; 4]);
}

#[test]
fn distinct_buffers_do_not_share_storage() {
    let a = buffer_value(2, 2, [0.0; 4]);
    let b = buffer_value(2, 2, [0.0; 4]);
    assert!(!a.shares_storage_with(&b));
    assert!(!a.shares_storage_with(&Value::single([0.0; 4])));
}

#[test]
fn pixel_buffer_rejects_mismatched_data_length() {
    assert!(PixelBuffer::new(size(3, 3), vec![[0.0; 4]; 8]).is_err());
    let buffer = PixelBuffer::new(size(3, 3), vec![[0.0; 4]; 9]).unwrap();
    assert_eq!(buffer.size(), size(3, 3));
}
