//! Brushes for area fills.
//!
//! A solid brush paints every pixel of a span with one color. Tiled brushes
//! repeat a pixel image and stippled brushes repeat a 1-bit mask; both are
//! anchored at the brush origin in screen space, so adjacent fills line up.

use std::sync::Arc;

use crate::basics::Point;
use crate::color::Pixel;

/// How a brush paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushType {
    #[default]
    Solid,
    /// Repeat the brush tile.
    Tiled,
    /// Set bits paint the brush color, clear bits are left untouched.
    Stippled,
    /// Set bits paint the brush color, clear bits paint the background color.
    OpaqueStippled,
}

// ============================================================================
// Tile
// ============================================================================

/// A pixel image in the destination surface's format, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Tile {
    /// Returns `None` if `pixels` does not hold exactly `width * height`
    /// values or the tile is empty.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != (width * height) as usize {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tile row `y`, already wrapped.
    #[inline]
    fn row(&self, y: usize) -> &[Pixel] {
        let w = self.width as usize;
        &self.pixels[y * w..(y + 1) * w]
    }
}

// ============================================================================
// Stipple
// ============================================================================

/// A 1-bit mask. Bit `x` of a row is `bits[x / 8] & (1 << (x % 8))`, so the
/// leftmost pixel is the least significant bit of the first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stipple {
    width: u32,
    height: u32,
    pitch: usize,
    bits: Vec<u8>,
}

impl Stipple {
    pub fn new(width: u32, height: u32, pitch: usize, bits: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || pitch * 8 < width as usize {
            return None;
        }
        if bits.len() < pitch * height as usize {
            return None;
        }
        Some(Self { width, height, pitch, bits })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn bit(&self, x: usize, y: usize) -> bool {
        self.bits[(x >> 3) + self.pitch * y] & (1 << (x % 8)) != 0
    }
}

/// Wrap `v - origin` into `0..period`.
#[inline]
fn wrap(v: i32, origin: i32, period: u32) -> usize {
    (v - origin).rem_euclid(period as i32) as usize
}

// ============================================================================
// Brush
// ============================================================================

/// Brush state resolved for one drawing call.
///
/// `origin` is in screen coordinates.
#[derive(Debug, Clone, Default)]
pub struct Brush {
    pub kind: BrushType,
    pub color: Pixel,
    pub tile: Option<Arc<Tile>>,
    pub stipple: Option<Arc<Stipple>>,
    pub origin: Point,
}

impl Brush {
    pub fn solid(color: Pixel) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Produce the pixels of the span `[x, x + w)` on row `y`.
    ///
    /// `put(x, pixel)` is called for every pixel the brush paints, in
    /// increasing `x`. Transparent stipple bits are skipped. A tiled or
    /// stippled brush without its image paints nothing.
    pub fn span_pixels<F: FnMut(i32, Pixel)>(&self, x: i32, y: i32, w: i32, bk_color: Pixel, mut put: F) {
        if w <= 0 {
            return;
        }
        match self.kind {
            BrushType::Solid => {
                for cx in x..x + w {
                    put(cx, self.color);
                }
            }
            BrushType::Tiled => {
                let Some(tile) = self.tile.as_deref() else {
                    return;
                };
                let row = tile.row(wrap(y, self.origin.y, tile.height));
                let mut cx = x;
                while cx < x + w {
                    let tx = wrap(cx, self.origin.x, tile.width);
                    let n = (tile.width as usize - tx).min((x + w - cx) as usize);
                    for (i, &p) in row[tx..tx + n].iter().enumerate() {
                        put(cx + i as i32, p);
                    }
                    cx += n as i32;
                }
            }
            BrushType::Stippled | BrushType::OpaqueStippled => {
                let Some(stipple) = self.stipple.as_deref() else {
                    return;
                };
                let opaque = self.kind == BrushType::OpaqueStippled;
                let my = wrap(y, self.origin.y, stipple.height);
                for cx in x..x + w {
                    let mx = wrap(cx, self.origin.x, stipple.width);
                    if stipple.bit(mx, my) {
                        put(cx, self.color);
                    } else if opaque {
                        put(cx, bk_color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(b: &Brush, x: i32, y: i32, w: i32) -> Vec<(i32, Pixel)> {
        let mut out = Vec::new();
        b.span_pixels(x, y, w, 99, |cx, p| out.push((cx, p)));
        out
    }

    fn checker_stipple() -> Arc<Stipple> {
        // 2x2 checkerboard: row 0 = 0b01, row 1 = 0b10.
        Arc::new(Stipple::new(2, 2, 1, vec![0b01, 0b10]).unwrap())
    }

    #[test]
    fn test_solid() {
        let b = Brush::solid(7);
        assert_eq!(collect(&b, 3, 0, 3), vec![(3, 7), (4, 7), (5, 7)]);
        assert!(collect(&b, 3, 0, 0).is_empty());
    }

    #[test]
    fn test_tile_anchored_at_origin() {
        let tile = Arc::new(Tile::new(3, 1, vec![10, 11, 12]).unwrap());
        let b = Brush {
            kind: BrushType::Tiled,
            tile: Some(tile),
            origin: Point::new(1, 0),
            ..Brush::default()
        };
        let got: Vec<_> = collect(&b, -1, 5, 6).into_iter().map(|(_, p)| p).collect();
        // x = -1 is two pixels left of the origin: (-1 - 1) mod 3 = 1.
        assert_eq!(got, vec![11, 12, 10, 11, 12, 10]);
    }

    #[test]
    fn test_stipple_transparent_and_opaque() {
        let mut b = Brush {
            kind: BrushType::Stippled,
            color: 1,
            stipple: Some(checker_stipple()),
            ..Brush::default()
        };
        assert_eq!(collect(&b, 0, 0, 4), vec![(0, 1), (2, 1)]);
        assert_eq!(collect(&b, 0, 1, 4), vec![(1, 1), (3, 1)]);
        b.kind = BrushType::OpaqueStippled;
        assert_eq!(collect(&b, 0, 0, 3), vec![(0, 1), (1, 99), (2, 1)]);
        // Negative coordinates wrap the same way.
        assert_eq!(collect(&b, -2, -2, 1), vec![(-2, 1)]);
    }

    #[test]
    fn test_missing_image_paints_nothing() {
        let b = Brush {
            kind: BrushType::Tiled,
            ..Brush::default()
        };
        assert!(collect(&b, 0, 0, 5).is_empty());
        assert!(Tile::new(2, 2, vec![0; 3]).is_none());
        assert!(Stipple::new(9, 1, 1, vec![0]).is_none());
    }
}
