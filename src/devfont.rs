//! Device fonts and logical fonts.
//!
//! A [`DevFont`] is one concrete glyph source: it reports metrics and hands
//! out glyph bitmaps of one [`GlyphBmpType`]. A [`LogFont`] is what a
//! device context selects: a requested size and style resolved to a primary
//! (single-byte) device font plus an optional multi-byte fallback.
//!
//! Glyph values are 32 bits wide. Bit 31 selects the multi-byte device font
//! and the low 31 bits are the glyph index inside it.

use std::borrow::Cow;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use crate::basics::{angle_to_radians, iround, tenths_to_angle};
use crate::color::Rgba8;

// ============================================================================
// Glyph values
// ============================================================================

/// A glyph value: device font selector bit plus glyph index.
pub type Glyph32 = u32;

/// Glyph value that advances by zero and draws nothing.
pub const INV_GLYPH_VALUE: Glyph32 = 0xFFFF_FFFF;

const MBC_GLYPH_BIT: u32 = 0x8000_0000;

/// `true` if the glyph belongs to the multi-byte device font.
#[inline]
pub fn is_mbc_glyph(glyph: Glyph32) -> bool {
    glyph & MBC_GLYPH_BIT != 0
}

/// Glyph index inside its device font.
#[inline]
pub fn real_glyph(glyph: Glyph32) -> u32 {
    glyph & !MBC_GLYPH_BIT
}

/// Tag `index` as a glyph of the multi-byte device font.
#[inline]
pub fn mbc_glyph(index: u32) -> Glyph32 {
    index | MBC_GLYPH_BIT
}

// ============================================================================
// Font style
// ============================================================================

/// Style bits of a logical or device font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FontStyle(u32);

impl FontStyle {
    pub const REGULAR: FontStyle = FontStyle(0);
    pub const BOLD: FontStyle = FontStyle(0x0001);
    /// Grey-filtered rendering of mono glyphs ("book" weight).
    pub const BOOK: FontStyle = FontStyle(0x0002);
    /// One-pixel halo around mono glyphs ("light" weight).
    pub const LIGHT: FontStyle = FontStyle(0x0004);
    /// LCD subpixel filtering of mono glyphs.
    pub const SUBPIXEL: FontStyle = FontStyle(0x0008);
    pub const ITALIC: FontStyle = FontStyle(0x0010);
    pub const UNDERLINE: FontStyle = FontStyle(0x0020);
    pub const STRUCKOUT: FontStyle = FontStyle(0x0040);
    pub const FLIP_HORZ: FontStyle = FontStyle(0x0100);
    pub const FLIP_VERT: FontStyle = FontStyle(0x0200);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: FontStyle) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[inline]
    pub const fn intersects(self, other: FontStyle) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn remove(&mut self, other: FontStyle) {
        self.0 &= !other.0;
    }

    /// Exactly one of the two flip flags is set.
    #[inline]
    pub fn single_flip(self) -> bool {
        self.contains(Self::FLIP_HORZ) != self.contains(Self::FLIP_VERT)
    }
}

impl BitOr for FontStyle {
    type Output = FontStyle;

    #[inline]
    fn bitor(self, rhs: FontStyle) -> FontStyle {
        FontStyle(self.0 | rhs.0)
    }
}

impl BitOrAssign for FontStyle {
    #[inline]
    fn bitor_assign(&mut self, rhs: FontStyle) {
        self.0 |= rhs.0;
    }
}

// ============================================================================
// Glyph metrics and bitmaps
// ============================================================================

/// Kind of bitmap a device font produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphBmpType {
    /// 1 bit per pixel, most significant bit leftmost.
    Mono,
    /// 8-bit coverage per pixel.
    Grey,
    /// 3 coverage bytes (R, G, B) per pixel, LCD-filtered.
    Subpixel,
    /// Pre-rasterized color image.
    Prerender,
}

/// Pen displacement after a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Advance {
    /// Advance length along the baseline.
    pub len: i32,
    pub dx: i32,
    pub dy: i32,
}

impl Advance {
    /// An advance of `len` pixels along a baseline rotated by
    /// `rotation_tenths` tenths of a degree (counter-clockwise, y down).
    pub fn along(len: i32, rotation_tenths: i32) -> Self {
        if rotation_tenths == 0 {
            return Self { len, dx: len, dy: 0 };
        }
        let (vx, vy) = rotate_vector(len, tenths_to_angle(rotation_tenths));
        Self { len, dx: vx, dy: -vy }
    }
}

/// `(len * cos a, len * sin a)` rounded, with `a` in 1/64 degree units.
#[inline]
pub fn rotate_vector(len: i32, angle: i32) -> (i32, i32) {
    let rad = angle_to_radians(angle);
    (iround(len as f64 * rad.cos()), iround(len as f64 * rad.sin()))
}

/// Glyph ink box relative to the pen position on the baseline.
/// `y` is the top edge, negative above the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BBox {
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// A mono, grey or subpixel glyph bitmap.
///
/// `scale` is the integer magnification the caller must apply; the bits
/// themselves are unscaled.
#[derive(Debug, Clone)]
pub struct GlyphBitmap<'a> {
    pub bits: Cow<'a, [u8]>,
    pub pitch: usize,
    pub scale: u16,
}

/// A pre-rasterized glyph image. Pixels with zero alpha are transparent.
#[derive(Debug, Clone)]
pub struct PrerenderedGlyph<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: Cow<'a, [Rgba8]>,
}

// ============================================================================
// DevFont
// ============================================================================

/// A device font backend.
///
/// Only the bitmap slot matching [`DevFont::bmp_type`] needs to be
/// provided; the others default to `None`, which the glyph pipeline treats
/// as "nothing to draw".
pub trait DevFont: Send + Sync {
    fn name(&self) -> &str;

    /// Styles the font renders natively; these are never synthesized.
    fn style(&self) -> FontStyle {
        FontStyle::REGULAR
    }

    fn bmp_type(&self) -> GlyphBmpType;

    /// Line height in pixels, including the scale factor.
    fn font_height(&self) -> i32;
    fn font_ascent(&self) -> i32;
    fn font_descent(&self) -> i32;

    /// Integer magnification of the bitmaps.
    fn scale(&self) -> u16 {
        1
    }

    fn is_glyph_existed(&self, glyph: u32) -> bool;

    fn glyph_advance(&self, logfont: &LogFont, glyph: u32) -> Advance;

    fn glyph_bbox(&self, logfont: &LogFont, glyph: u32) -> BBox;

    fn mono_bitmap(&self, _logfont: &LogFont, _glyph: u32) -> Option<GlyphBitmap<'_>> {
        None
    }

    /// Grey coverage bitmap; for [`GlyphBmpType::Subpixel`] fonts, three
    /// bytes per pixel.
    fn grey_bitmap(&self, _logfont: &LogFont, _glyph: u32) -> Option<GlyphBitmap<'_>> {
        None
    }

    fn prerendered_bitmap(&self, _logfont: &LogFont, _glyph: u32) -> Option<PrerenderedGlyph<'_>> {
        None
    }
}

// ============================================================================
// LogFont
// ============================================================================

/// A logical font.
///
/// `rotation` is in tenths of a degree, counter-clockwise.
#[derive(Clone)]
pub struct LogFont {
    pub size: i32,
    pub ascent: i32,
    pub descent: i32,
    pub rotation: i32,
    pub style: FontStyle,
    sbc: Arc<dyn DevFont>,
    mbc: Option<Arc<dyn DevFont>>,
}

impl LogFont {
    /// A logical font using `sbc` for every glyph, with its metrics.
    pub fn new(sbc: Arc<dyn DevFont>) -> Self {
        Self {
            size: sbc.font_height(),
            ascent: sbc.font_ascent(),
            descent: sbc.font_descent(),
            rotation: 0,
            style: FontStyle::REGULAR,
            sbc,
            mbc: None,
        }
    }

    /// Add a multi-byte fallback font; metrics grow to cover both.
    pub fn with_mbc(mut self, mbc: Arc<dyn DevFont>) -> Self {
        self.ascent = self.ascent.max(mbc.font_ascent());
        self.descent = self.descent.max(mbc.font_descent());
        self.size = self.size.max(self.ascent + self.descent);
        self.mbc = Some(mbc);
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_rotation(mut self, tenths: i32) -> Self {
        self.rotation = tenths;
        self
    }

    #[inline]
    pub fn sbc(&self) -> &dyn DevFont {
        self.sbc.as_ref()
    }

    #[inline]
    pub fn mbc(&self) -> Option<&dyn DevFont> {
        self.mbc.as_deref()
    }

    /// Device font serving `glyph`. Multi-byte glyphs fall back to the
    /// primary font when no multi-byte font is attached.
    #[inline]
    pub fn select_devfont(&self, glyph: Glyph32) -> &dyn DevFont {
        match (is_mbc_glyph(glyph), self.mbc.as_deref()) {
            (true, Some(mbc)) => mbc,
            _ => self.sbc.as_ref(),
        }
    }

    /// Rotation in 1/64 degree units.
    #[inline]
    pub fn rotation_angle(&self) -> i32 {
        tenths_to_angle(self.rotation)
    }
}

impl fmt::Debug for LogFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFont")
            .field("size", &self.size)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .field("rotation", &self.rotation)
            .field("style", &self.style)
            .field("sbc", &self.sbc.name())
            .field("mbc", &self.mbc.as_ref().map(|f| f.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFont {
        name: &'static str,
        ascent: i32,
        descent: i32,
    }

    impl DevFont for FixedFont {
        fn name(&self) -> &str {
            self.name
        }
        fn bmp_type(&self) -> GlyphBmpType {
            GlyphBmpType::Mono
        }
        fn font_height(&self) -> i32 {
            self.ascent + self.descent
        }
        fn font_ascent(&self) -> i32 {
            self.ascent
        }
        fn font_descent(&self) -> i32 {
            self.descent
        }
        fn is_glyph_existed(&self, _glyph: u32) -> bool {
            true
        }
        fn glyph_advance(&self, logfont: &LogFont, _glyph: u32) -> Advance {
            Advance::along(8, logfont.rotation)
        }
        fn glyph_bbox(&self, _logfont: &LogFont, _glyph: u32) -> BBox {
            BBox::new(0, -self.ascent, 8, self.font_height())
        }
    }

    fn make_font(name: &'static str, ascent: i32, descent: i32) -> Arc<dyn DevFont> {
        Arc::new(FixedFont { name, ascent, descent })
    }

    #[test]
    fn test_glyph_value_bits() {
        let g = mbc_glyph(0x4E2D);
        assert!(is_mbc_glyph(g));
        assert_eq!(real_glyph(g), 0x4E2D);
        assert!(!is_mbc_glyph(65));
        assert_eq!(real_glyph(INV_GLYPH_VALUE), 0x7FFF_FFFF);
    }

    #[test]
    fn test_style_flags() {
        let mut s = FontStyle::BOLD | FontStyle::FLIP_HORZ;
        assert!(s.contains(FontStyle::BOLD));
        assert!(!s.contains(FontStyle::ITALIC));
        assert!(s.single_flip());
        s |= FontStyle::FLIP_VERT;
        assert!(!s.single_flip());
        s.remove(FontStyle::BOLD);
        assert!(!s.intersects(FontStyle::BOLD));
        assert!(!FontStyle::REGULAR.contains(FontStyle::REGULAR));
    }

    #[test]
    fn test_advance_rotation() {
        assert_eq!(Advance::along(10, 0), Advance { len: 10, dx: 10, dy: 0 });
        // 90 degrees counter-clockwise goes up the screen.
        assert_eq!(Advance::along(10, 900), Advance { len: 10, dx: 0, dy: -10 });
        assert_eq!(Advance::along(10, 1800), Advance { len: 10, dx: -10, dy: 0 });
        let a = Advance::along(10, 450);
        assert_eq!((a.dx, a.dy), (7, -7));
    }

    #[test]
    fn test_select_devfont() {
        let lf = LogFont::new(make_font("ascii", 10, 2));
        assert_eq!(lf.select_devfont(mbc_glyph(1)).name(), "ascii");
        let lf = lf.with_mbc(make_font("cjk", 12, 4));
        assert_eq!(lf.select_devfont(65).name(), "ascii");
        assert_eq!(lf.select_devfont(mbc_glyph(1)).name(), "cjk");
        assert_eq!((lf.ascent, lf.descent, lf.size), (12, 4, 16));
    }
}
