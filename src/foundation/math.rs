use kurbo::Affine;

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub(crate) fn affine_approx_eq(a: Affine, b: Affine, eps: f64) -> bool {
    let ca = a.as_coeffs();
    let cb = b.as_coeffs();
    ca.iter().zip(cb.iter()).all(|(x, y)| (x - y).abs() <= eps)
}

/// Wrap an integer coordinate into `[0, n)` (Euclidean modulo).
pub(crate) fn wrap_repeat(i: i32, n: i32) -> i32 {
    debug_assert!(n > 0);
    i.rem_euclid(n)
}

/// Clamp an integer coordinate into `[0, n)`.
pub(crate) fn clamp_extent(i: i32, n: i32) -> i32 {
    debug_assert!(n > 0);
    i.clamp(0, n - 1)
}
