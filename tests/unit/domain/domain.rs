use super::*;
use crate::{
    domain::value::{PixelBuffer, RealizeOptions, Value},
    foundation::core::Size2,
};
use kurbo::Affine;

fn size(w: i32, h: i32) -> Size2 {
    Size2::new(w, h).unwrap()
}

fn buffer_value(w: i32, h: i32) -> Value {
    let domain = Domain::identity(size(w, h));
    Value::from_buffer(
        PixelBuffer::filled(domain.size, [0.25, 0.5, 0.75, 1.0]),
        domain,
        RealizeOptions::default(),
    )
    .unwrap()
}

#[test]
fn zero_size_is_invalid() {
    assert!(!Domain::invalid().is_valid());
    assert!(!Domain::identity(size(10, 0)).is_valid());
    assert!(Domain::identity(size(10, 7)).is_valid());
    assert!(Domain::single_value().is_valid());
}

#[test]
fn equality_tolerates_epsilon_transform_noise() {
    let a = Domain::identity(size(64, 64)).translated(2.0, 3.0);
    let b = Domain::identity(size(64, 64)).translated(2.0 + 1e-7, 3.0);
    assert!(a.approx_eq(&b));

    let c = Domain::identity(size(64, 64)).translated(2.5, 3.0);
    assert!(!a.approx_eq(&c));

    let d = Domain::identity(size(32, 64)).translated(2.0, 3.0);
    assert!(!a.approx_eq(&d));
}

#[test]
fn geometric_chain_accumulates_into_one_transform() {
    let chained = Domain::identity(size(10, 10))
        .translated(4.0, -2.0)
        .rotated(0.5)
        .scaled(2.0, 3.0);

    let composed = Affine::scale_non_uniform(2.0, 3.0)
        * Affine::rotate(0.5)
        * Affine::translate((4.0, -2.0));
    assert!(chained.approx_eq(&Domain::new(size(10, 10), composed)));
    assert_eq!(chained.size, size(10, 10));
}

#[test]
fn highest_priority_buffer_input_wins() {
    let big = buffer_value(100, 100);
    let small = buffer_value(50, 50);

    let domain = compute_domain([(0, &big), (1, &small)]).unwrap();
    assert_eq!(domain.size, size(100, 100));

    // Priority is the ordinal, not the order of appearance.
    let domain = compute_domain([(1, &small), (0, &big)]).unwrap();
    assert_eq!(domain.size, size(100, 100));
}

#[test]
fn single_values_and_invalid_buffers_never_define_the_domain() {
    let scalar = Value::single([0.5; 4]);
    let invalid = Value::invalid();
    assert!(compute_domain([(0, &scalar), (1, &invalid)]).is_none());

    let buffer = buffer_value(8, 8);
    let domain = compute_domain([(0, &scalar), (7, &buffer)]).unwrap();
    assert_eq!(domain.size, size(8, 8));
}

#[test]
fn priority_ties_go_to_the_earliest_socket() {
    let a = buffer_value(16, 16);
    let b = buffer_value(32, 32);
    let domain = compute_domain([(1, &a), (1, &b)]).unwrap();
    assert_eq!(domain.size, size(16, 16));
}
