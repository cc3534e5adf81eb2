//! Packed pixel formats.
//!
//! A [`PixelFormat`] describes how an RGB(A) color is packed into 1 to 4
//! bytes: one bit mask per channel. All color conversion for a surface goes
//! through `map_rgb`/`map_rgba` (color to pixel) and `get_rgb`/`get_rgba`
//! (pixel to color).

use crate::color::{Pixel, Rgba8};
use crate::error::{RasterError, Result};

// ============================================================================
// Channel
// ============================================================================

/// One channel: mask, shift to its lowest bit, and bits lost from 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Channel {
    mask: u32,
    shift: u32,
    loss: u32,
}

impl Channel {
    fn new(mask: u32) -> Self {
        if mask == 0 {
            return Self {
                mask: 0,
                shift: 0,
                loss: 8,
            };
        }
        let bits = mask.count_ones().min(8);
        Self {
            mask,
            shift: mask.trailing_zeros(),
            loss: 8 - bits,
        }
    }

    #[inline]
    fn pack(&self, v: u8) -> u32 {
        if self.mask == 0 {
            return 0;
        }
        (((v as u32) >> self.loss) << self.shift) & self.mask
    }

    /// Expand a channel value so that its maximum maps to 255.
    #[inline]
    fn unpack(&self, p: Pixel) -> u8 {
        if self.mask == 0 {
            return 0;
        }
        let v = (p & self.mask) >> self.shift;
        let max = (1u32 << (8 - self.loss)) - 1;
        ((v * 255 + max / 2) / max) as u8
    }
}

// ============================================================================
// PixelFormat
// ============================================================================

/// Channel layout of a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    bytes_per_pixel: u8,
    r: Channel,
    g: Channel,
    b: Channel,
    a: Channel,
}

impl PixelFormat {
    /// Build a format from explicit masks.
    pub fn new(bytes_per_pixel: u8, rmask: u32, gmask: u32, bmask: u32, amask: u32) -> Result<Self> {
        if !(1..=4).contains(&bytes_per_pixel) {
            return Err(RasterError::UnsupportedPixelFormat(bytes_per_pixel));
        }
        Ok(Self::from_masks(bytes_per_pixel, rmask, gmask, bmask, amask))
    }

    /// 8-bit packed 3-3-2 "indexed" format.
    pub fn indexed8() -> Self {
        Self::from_masks(1, 0xE0, 0x1C, 0x03, 0)
    }

    pub fn rgb565() -> Self {
        Self::from_masks(2, 0xF800, 0x07E0, 0x001F, 0)
    }

    pub fn rgb888() -> Self {
        Self::from_masks(3, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0)
    }

    pub fn argb8888() -> Self {
        Self::from_masks(4, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000)
    }

    /// The RGBA companion format used to carry per-pixel alpha in glyph
    /// ramps for a destination of `bytes_per_pixel`. `None` for 8-bit
    /// destinations, which have no room for alpha.
    pub fn alpha_companion(bytes_per_pixel: u8) -> Option<Self> {
        match bytes_per_pixel {
            2 => Some(Self::from_masks(2, 0xF000, 0x0F00, 0x00F0, 0x000F)),
            3 => Some(Self::from_masks(3, 0x00FC_0000, 0x0003_F000, 0x0000_0FC0, 0x0000_003F)),
            4 => Some(Self::from_masks(4, 0xFF00_0000, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF)),
            _ => None,
        }
    }

    fn from_masks(bytes_per_pixel: u8, rmask: u32, gmask: u32, bmask: u32, amask: u32) -> Self {
        Self {
            bytes_per_pixel,
            r: Channel::new(rmask),
            g: Channel::new(gmask),
            b: Channel::new(bmask),
            a: Channel::new(amask),
        }
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> u8 {
        self.bytes_per_pixel
    }

    #[inline]
    pub fn bits_per_pixel(&self) -> u32 {
        self.bytes_per_pixel as u32 * 8
    }

    /// `true` if the format stores per-pixel alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.a.mask != 0
    }

    /// Pack an opaque color. The alpha channel, if any, is set to opaque.
    #[inline]
    pub fn map_rgb(&self, r: u8, g: u8, b: u8) -> Pixel {
        self.r.pack(r) | self.g.pack(g) | self.b.pack(b) | self.a.mask
    }

    /// Pack a color including its alpha.
    #[inline]
    pub fn map_rgba(&self, c: Rgba8) -> Pixel {
        self.r.pack(c.r) | self.g.pack(c.g) | self.b.pack(c.b) | self.a.pack(c.a)
    }

    /// Unpack the color channels; alpha is reported as opaque.
    #[inline]
    pub fn get_rgb(&self, p: Pixel) -> Rgba8 {
        Rgba8::new_opaque(self.r.unpack(p), self.g.unpack(p), self.b.unpack(p))
    }

    /// Unpack all channels; formats without alpha report opaque.
    #[inline]
    pub fn get_rgba(&self, p: Pixel) -> Rgba8 {
        let a = if self.has_alpha() { self.a.unpack(p) } else { Rgba8::OPAQUE };
        Rgba8::new(self.r.unpack(p), self.g.unpack(p), self.b.unpack(p), a)
    }
}
