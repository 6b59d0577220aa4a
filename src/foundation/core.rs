use crate::foundation::error::{CompositorError, CompositorResult};

/// Identifier of a node in the externally supplied node graph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

/// One RGBA pixel. Channels are linear float; alpha is not premultiplied by the engine.
pub type Pixel = [f32; 4];

/// Fully transparent black, the neutral pixel.
pub const PIXEL_ZERO: Pixel = [0.0, 0.0, 0.0, 0.0];

/// Opaque white, the conventional default for color image sockets.
pub const PIXEL_WHITE: Pixel = [1.0, 1.0, 1.0, 1.0];

/// Integer pixel-grid dimensions of a buffer or domain.
///
/// Both components are non-negative; a zero component denotes an
/// undefined/invalid extent (see [`crate::Domain::is_valid`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size2 {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Size2 {
    /// The undefined/invalid extent.
    pub const ZERO: Size2 = Size2 {
        width: 0,
        height: 0,
    };

    /// Build a size, rejecting negative components.
    pub fn new(width: i32, height: i32) -> CompositorResult<Self> {
        if width < 0 || height < 0 {
            return Err(CompositorError::validation(
                "Size2 components must be non-negative",
            ));
        }
        Ok(Self { width, height })
    }

    /// Whether either component is zero (the undefined extent).
    pub fn is_zero(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total pixel count.
    pub fn num_pixels(self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}
