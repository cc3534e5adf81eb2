//! Color types and raster operations.
//!
//! A surface stores opaque packed [`Pixel`] values whose meaning is given
//! by its [`PixelFormat`](crate::pixel_format::PixelFormat). `Rgba8` is the
//! format-independent color used when colors must be mixed: glyph ramps,
//! subpixel filtering and alpha blending.

/// A packed pixel value in some surface format.
pub type Pixel = u32;

// ============================================================================
// Rgba8
// ============================================================================

/// 8-bit per channel RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const OPAQUE: u8 = 255;

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn new_opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, Self::OPAQUE)
    }

    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Blend `self` (source, using its own alpha) over `dst`.
    ///
    /// `d = ((s - d) * a >> 8) + d` per channel; the result is opaque.
    #[inline]
    pub fn blend_over(self, dst: Rgba8) -> Rgba8 {
        let a = self.a as i32;
        let ch = |s: u8, d: u8| -> u8 {
            let (s, d) = (s as i32, d as i32);
            ((((s - d) * a) >> 8) + d) as u8
        };
        Rgba8::new_opaque(ch(self.r, dst.r), ch(self.g, dst.g), ch(self.b, dst.b))
    }

    /// Weighted mix toward `fg`: `(bg * (total - w) + fg * w) / total`.
    #[inline]
    pub fn mix(bg: Rgba8, fg: Rgba8, weight: u32, total: u32) -> Rgba8 {
        let inv = total - weight;
        let ch = |b: u8, f: u8| -> u8 { ((b as u32 * inv + f as u32 * weight) / total) as u8 };
        Rgba8::new_opaque(ch(bg.r, fg.r), ch(bg.g, fg.g), ch(bg.b, fg.b))
    }
}

// ============================================================================
// Raster operations
// ============================================================================

/// Combination rule between a source pixel and the destination pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterOp {
    /// Copy the source over the destination.
    #[default]
    Set,
    And,
    Or,
    Xor,
}

impl RasterOp {
    /// Combine `src` into `dst`.
    #[inline]
    pub fn apply(self, dst: Pixel, src: Pixel) -> Pixel {
        match self {
            RasterOp::Set => src,
            RasterOp::And => dst & src,
            RasterOp::Or => dst | src,
            RasterOp::Xor => dst ^ src,
        }
    }
}
