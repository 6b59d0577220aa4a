use kurbo::Affine;

use crate::{
    domain::value::Value,
    foundation::core::Size2,
    foundation::math::affine_approx_eq,
};

/// Tolerance for considering two domain transforms equal.
pub const DOMAIN_EPSILON: f64 = 1e-4;

/// The pixel-grid size of a buffer and the affine transform placing that grid
/// in the shared logical space of the graph.
///
/// Domains are value types: copied freely and never mutated after creation.
/// A zero size component marks the domain (and any value tagged with it)
/// invalid; validity is a data state, not an error (see
/// [`crate::CompositorError`]).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Domain {
    /// Pixel-grid dimensions.
    pub size: Size2,
    /// Placement of the grid in shared logical space.
    pub transform: Affine,
}

impl Domain {
    /// Domain with the given size, placed at the origin with no rotation or scale.
    pub fn identity(size: Size2) -> Self {
        Self {
            size,
            transform: Affine::IDENTITY,
        }
    }

    /// Domain with the given size and placement.
    pub fn new(size: Size2, transform: Affine) -> Self {
        Self { size, transform }
    }

    /// The undefined domain carried by invalid values.
    pub fn invalid() -> Self {
        Self::identity(Size2::ZERO)
    }

    /// The degenerate 1x1 domain carried by single-value results; compatible
    /// with any requested size.
    pub fn single_value() -> Self {
        Self::identity(Size2 {
            width: 1,
            height: 1,
        })
    }

    /// Whether both size components are positive.
    pub fn is_valid(&self) -> bool {
        !self.size.is_zero()
    }

    /// Size equality plus transform equality within [`DOMAIN_EPSILON`].
    pub fn approx_eq(&self, other: &Domain) -> bool {
        self.size == other.size
            && affine_approx_eq(self.transform, other.transform, DOMAIN_EPSILON)
    }

    /// Same grid, translated in shared space. Accumulates into the transform;
    /// no resampling happens until the value is realized.
    pub fn translated(self, x: f64, y: f64) -> Self {
        Self {
            size: self.size,
            transform: Affine::translate((x, y)) * self.transform,
        }
    }

    /// Same grid, rotated in shared space (radians, counter-clockwise).
    pub fn rotated(self, angle_rad: f64) -> Self {
        Self {
            size: self.size,
            transform: Affine::rotate(angle_rad) * self.transform,
        }
    }

    /// Same grid, scaled in shared space.
    pub fn scaled(self, sx: f64, sy: f64) -> Self {
        Self {
            size: self.size,
            transform: Affine::scale_non_uniform(sx, sy) * self.transform,
        }
    }
}

/// Select the output domain for an operation from its prioritized inputs.
///
/// Each entry pairs a socket's domain priority ordinal (0 = most authoritative,
/// the main image input) with the value bound to it. The lowest ordinal among
/// buffer-kind, valid inputs wins; ties go to the earliest socket. Returns
/// `None` when every input is a single value (or invalid), in which case the
/// operation itself degenerates to a single value.
pub fn compute_domain<'a, I>(inputs: I) -> Option<Domain>
where
    I: IntoIterator<Item = (u16, &'a Value)>,
{
    let mut best: Option<(u16, Domain)> = None;
    for (priority, value) in inputs {
        if !value.is_buffer() || !value.domain().is_valid() {
            continue;
        }
        match best {
            Some((p, _)) if p <= priority => {}
            _ => best = Some((priority, value.domain())),
        }
    }
    best.map(|(_, domain)| domain)
}

#[cfg(test)]
#[path = "../../tests/unit/domain/domain.rs"]
mod tests;
