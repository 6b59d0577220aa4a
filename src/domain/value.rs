use std::rc::Rc;

use crate::{
    domain::domain::Domain,
    foundation::core::{Pixel, Size2},
    foundation::error::{CompositorError, CompositorResult},
};

/// Interpolation used when a value is resampled into another domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Bilinear sampling.
    #[default]
    Bilinear,
    /// Cubic (Catmull-Rom) sampling.
    Bicubic,
}

/// Wrap and interpolation policy applied when realizing a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RealizeOptions {
    /// Repeat horizontally instead of edge-clamping.
    pub repeat_x: bool,
    /// Repeat vertically instead of edge-clamping.
    pub repeat_y: bool,
    /// Sampling filter.
    pub interpolation: Interpolation,
}

/// An owned rectangle of pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    size: Size2,
    data: Vec<Pixel>,
}

impl PixelBuffer {
    /// Wrap existing pixel data; `data.len()` must match `size`.
    pub fn new(size: Size2, data: Vec<Pixel>) -> CompositorResult<Self> {
        if data.len() != size.num_pixels() {
            return Err(CompositorError::validation(format!(
                "pixel buffer length {} does not match size {}x{}",
                data.len(),
                size.width,
                size.height
            )));
        }
        Ok(Self { size, data })
    }

    /// Allocate a buffer filled with one pixel value.
    pub fn filled(size: Size2, pixel: Pixel) -> Self {
        Self {
            size,
            data: vec![pixel; size.num_pixels()],
        }
    }

    /// Buffer dimensions.
    pub fn size(&self) -> Size2 {
        self.size
    }

    /// Raw row-major pixel data.
    pub fn data(&self) -> &[Pixel] {
        &self.data
    }

    /// Pixel at an in-bounds coordinate.
    pub fn get(&self, x: i32, y: i32) -> Pixel {
        debug_assert!(x >= 0 && x < self.size.width && y >= 0 && y < self.size.height);
        self.data[(y as usize) * (self.size.width as usize) + (x as usize)]
    }

    /// Wrap storage acquired from the buffer pool, which is sized by contract.
    pub(crate) fn from_pool(size: Size2, data: Vec<Pixel>) -> Self {
        debug_assert_eq!(data.len(), size.num_pixels());
        Self { size, data }
    }

    /// Consume the buffer, handing its storage back (pool reclamation).
    pub(crate) fn into_data(self) -> Vec<Pixel> {
        self.data
    }
}

/// Storage of a [`Value`]: a constant pixel or a shared buffer.
///
/// Buffers are shared by non-atomic reference counting; the scheduler is a
/// single logical thread of control, so `Rc` suffices (pixel loops only borrow
/// the data).
#[derive(Clone, Debug)]
pub enum ValueKind {
    /// A constant: no buffer is materialized until genuinely required.
    Single(Pixel),
    /// A full pixel buffer, possibly aliased by other values.
    Buffer(Rc<PixelBuffer>),
}

/// The output of any operation: a single value or a buffer, tagged with the
/// [`Domain`] it lives in and the options governing its realization.
///
/// A value's kind never changes after construction; transformations that would
/// need a different kind produce a new value.
#[derive(Clone, Debug)]
pub struct Value {
    kind: ValueKind,
    domain: Domain,
    options: RealizeOptions,
}

impl Value {
    /// A single-value result carrying the degenerate single-value domain.
    pub fn single(pixel: Pixel) -> Self {
        Self {
            kind: ValueKind::Single(pixel),
            domain: Domain::single_value(),
            options: RealizeOptions::default(),
        }
    }

    /// A single-value result tagged with an explicit domain.
    pub(crate) fn single_in(pixel: Pixel, domain: Domain) -> Self {
        Self {
            kind: ValueKind::Single(pixel),
            domain,
            options: RealizeOptions::default(),
        }
    }

    /// The invalid value: zero-size domain, propagated through the graph.
    pub fn invalid() -> Self {
        Self {
            kind: ValueKind::Single([0.0; 4]),
            domain: Domain::invalid(),
            options: RealizeOptions::default(),
        }
    }

    /// Wrap a shared buffer. The domain's size must equal the buffer's.
    pub fn buffer(
        buffer: Rc<PixelBuffer>,
        domain: Domain,
        options: RealizeOptions,
    ) -> CompositorResult<Self> {
        if buffer.size() != domain.size {
            return Err(CompositorError::validation(format!(
                "buffer size {}x{} does not match domain size {}x{}",
                buffer.size().width,
                buffer.size().height,
                domain.size.width,
                domain.size.height
            )));
        }
        Ok(Self {
            kind: ValueKind::Buffer(buffer),
            domain,
            options,
        })
    }

    /// Wrap a buffer whose size is guaranteed by construction to match.
    pub(crate) fn buffer_unchecked(
        buffer: PixelBuffer,
        domain: Domain,
        options: RealizeOptions,
    ) -> Value {
        debug_assert_eq!(buffer.size(), domain.size);
        Value {
            kind: ValueKind::Buffer(Rc::new(buffer)),
            domain,
            options,
        }
    }

    /// Wrap an owned buffer (convenience over [`Value::buffer`]).
    pub fn from_buffer(
        buffer: PixelBuffer,
        domain: Domain,
        options: RealizeOptions,
    ) -> CompositorResult<Self> {
        Self::buffer(Rc::new(buffer), domain, options)
    }

    /// Whether this value is a constant.
    pub fn is_single(&self) -> bool {
        matches!(self.kind, ValueKind::Single(_))
    }

    /// Whether this value carries a buffer.
    pub fn is_buffer(&self) -> bool {
        matches!(self.kind, ValueKind::Buffer(_))
    }

    /// Whether the value's domain is defined.
    pub fn is_valid(&self) -> bool {
        self.domain.is_valid()
    }

    /// The domain this value lives in.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Realization options attached to this value.
    pub fn options(&self) -> RealizeOptions {
        self.options
    }

    /// Storage of this value.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Borrow the backing buffer, if any.
    pub fn buffer_ref(&self) -> Option<&PixelBuffer> {
        match &self.kind {
            ValueKind::Buffer(b) => Some(b),
            ValueKind::Single(_) => None,
        }
    }

    pub(crate) fn buffer_rc(&self) -> Option<&Rc<PixelBuffer>> {
        match &self.kind {
            ValueKind::Buffer(b) => Some(b),
            ValueKind::Single(_) => None,
        }
    }

    pub(crate) fn into_kind(self) -> ValueKind {
        self.kind
    }

    /// Alias this value's storage under a new domain and options. Never copies
    /// pixel data; ownership of the buffer is shared until the last alias is
    /// dropped.
    pub fn share_data(&self, domain: Domain, options: RealizeOptions) -> Value {
        Value {
            kind: self.kind.clone(),
            domain,
            options,
        }
    }

    /// Alias this value's storage, propagating domain and options verbatim.
    /// Used by operations that are identity with respect to buffer contents.
    pub fn pass_through(&self) -> Value {
        self.clone()
    }

    /// The scalar fast path: this value's constant, or `default` when the
    /// value is a buffer. Call sites document their default.
    pub fn single_value_or(&self, default: Pixel) -> Pixel {
        match self.kind {
            ValueKind::Single(p) => p,
            ValueKind::Buffer(_) => default,
        }
    }

    /// Whether two values alias the same backing buffer.
    pub fn shares_storage_with(&self, other: &Value) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Buffer(a), ValueKind::Buffer(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/domain/value.rs"]
mod tests;
