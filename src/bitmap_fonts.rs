//! In-memory bitmap device fonts.
//!
//! All backends here keep their glyphs in one flat buffer indexed by a
//! per-glyph table; glyph indices start at `first_glyph`. Every glyph of a
//! font shares the font height. Metrics reported to the glyph pipeline are
//! multiplied by the integer scale while the bitmaps stay unscaled.

use std::borrow::Cow;

use crate::color::Rgba8;
use crate::devfont::{Advance, BBox, DevFont, FontStyle, GlyphBitmap, GlyphBmpType, LogFont, PrerenderedGlyph};

// ============================================================================
// Shared glyph table
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct GlyphEntry {
    width: u16,
    offset: usize,
    len: usize,
}

#[derive(Debug, Clone)]
struct GlyphTable<T> {
    name: String,
    height: u16,
    ascent: u16,
    first: u32,
    scale: u16,
    style: FontStyle,
    entries: Vec<GlyphEntry>,
    data: Vec<T>,
}

impl<T: Clone> GlyphTable<T> {
    /// Build from per-glyph `(width, data)` pairs, each holding
    /// `unit(width) * height` values.
    fn build(
        name: &str,
        height: u16,
        ascent: u16,
        first: u32,
        glyphs: Vec<(u16, Vec<T>)>,
        unit: impl Fn(u16) -> usize,
    ) -> Option<Self> {
        if height == 0 || ascent > height || glyphs.is_empty() {
            return None;
        }
        let mut entries = Vec::with_capacity(glyphs.len());
        let mut data = Vec::new();
        for (width, g) in glyphs {
            let len = unit(width) * height as usize;
            if g.len() != len {
                return None;
            }
            entries.push(GlyphEntry {
                width,
                offset: data.len(),
                len,
            });
            data.extend(g);
        }
        Some(Self {
            name: name.to_string(),
            height,
            ascent,
            first,
            scale: 1,
            style: FontStyle::REGULAR,
            entries,
            data,
        })
    }

    #[inline]
    fn entry(&self, glyph: u32) -> Option<&GlyphEntry> {
        let i = glyph.checked_sub(self.first)?;
        self.entries.get(i as usize)
    }

    #[inline]
    fn glyph_data(&self, glyph: u32) -> Option<(&GlyphEntry, &[T])> {
        let e = self.entry(glyph)?;
        Some((e, &self.data[e.offset..e.offset + e.len]))
    }

    #[inline]
    fn scale(&self) -> i32 {
        self.scale as i32
    }

    fn width(&self, glyph: u32) -> i32 {
        self.entry(glyph).map_or(0, |e| e.width as i32) * self.scale()
    }

    fn advance(&self, logfont: &LogFont, glyph: u32) -> Advance {
        Advance::along(self.width(glyph), logfont.rotation)
    }

    fn bbox(&self, glyph: u32) -> BBox {
        let s = self.scale();
        BBox::new(0, -(self.ascent as i32) * s, self.width(glyph), self.height as i32 * s)
    }
}

/// Bytes per row of a mono glyph `width` pixels wide.
#[inline]
fn mono_pitch(width: u16) -> usize {
    (width as usize + 7) / 8
}

/// Pack rows of `#`/`.` characters into MSB-first mono bits.
/// Any character other than `#` or `X` is a clear pixel.
fn pack_rows(rows: &[&str]) -> Option<(u16, Vec<u8>)> {
    let width = rows.first()?.chars().count();
    let pitch = mono_pitch(width as u16);
    let mut bits = vec![0u8; pitch * rows.len()];
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != width {
            return None;
        }
        for (x, c) in row.chars().enumerate() {
            if c == '#' || c == 'X' {
                bits[y * pitch + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    Some((width as u16, bits))
}

macro_rules! impl_common_builders {
    ($t:ty) => {
        impl $t {
            /// Magnify every glyph by an integer factor.
            pub fn with_scale(mut self, scale: u16) -> Self {
                self.table.scale = scale.max(1);
                self
            }

            /// Styles the font provides natively.
            pub fn with_native_style(mut self, style: FontStyle) -> Self {
                self.table.style = style;
                self
            }

            /// Number of glyphs in the font.
            pub fn glyph_count(&self) -> usize {
                self.table.entries.len()
            }
        }
    };
}

macro_rules! impl_common_metrics {
    () => {
        fn name(&self) -> &str {
            &self.table.name
        }

        fn style(&self) -> FontStyle {
            self.table.style
        }

        fn font_height(&self) -> i32 {
            self.table.height as i32 * self.table.scale()
        }

        fn font_ascent(&self) -> i32 {
            self.table.ascent as i32 * self.table.scale()
        }

        fn font_descent(&self) -> i32 {
            (self.table.height - self.table.ascent) as i32 * self.table.scale()
        }

        fn scale(&self) -> u16 {
            self.table.scale
        }

        fn is_glyph_existed(&self, glyph: u32) -> bool {
            self.table.entry(glyph).is_some()
        }

        fn glyph_advance(&self, logfont: &LogFont, glyph: u32) -> Advance {
            self.table.advance(logfont, glyph)
        }

        fn glyph_bbox(&self, _logfont: &LogFont, glyph: u32) -> BBox {
            self.table.bbox(glyph)
        }
    };
}

// ============================================================================
// RawBitmapFont
// ============================================================================

/// Fixed-width mono bitmap font.
#[derive(Debug, Clone)]
pub struct RawBitmapFont {
    table: GlyphTable<u8>,
}

impl RawBitmapFont {
    /// `bits` holds `count` glyphs of `height` rows, each row
    /// `(width + 7) / 8` bytes, most significant bit leftmost.
    pub fn new(name: &str, width: u16, height: u16, ascent: u16, first_glyph: u32, bits: &[u8]) -> Option<Self> {
        let glyph_len = mono_pitch(width) * height as usize;
        if width == 0 || glyph_len == 0 || bits.len() % glyph_len != 0 {
            return None;
        }
        let glyphs = bits.chunks_exact(glyph_len).map(|g| (width, g.to_vec())).collect();
        GlyphTable::build(name, height, ascent, first_glyph, glyphs, mono_pitch).map(|table| Self { table })
    }

    /// Build from glyph pictures, one string per row: `#` is ink.
    /// All glyphs must have the same size.
    pub fn from_rows(name: &str, ascent: u16, first_glyph: u32, glyphs: &[&[&str]]) -> Option<Self> {
        let height = glyphs.first()?.len() as u16;
        let mut packed = Vec::with_capacity(glyphs.len());
        for g in glyphs {
            packed.push(pack_rows(g)?);
        }
        let width = packed[0].0;
        if packed.iter().any(|(w, _)| *w != width) || glyphs.iter().any(|g| g.len() as u16 != height) {
            return None;
        }
        GlyphTable::build(name, height, ascent, first_glyph, packed, mono_pitch).map(|table| Self { table })
    }
}

impl_common_builders!(RawBitmapFont);

impl DevFont for RawBitmapFont {
    impl_common_metrics!();

    fn bmp_type(&self) -> GlyphBmpType {
        GlyphBmpType::Mono
    }

    fn mono_bitmap(&self, _logfont: &LogFont, glyph: u32) -> Option<GlyphBitmap<'_>> {
        let (e, bits) = self.table.glyph_data(glyph)?;
        Some(GlyphBitmap {
            bits: Cow::Borrowed(bits),
            pitch: mono_pitch(e.width),
            scale: self.table.scale,
        })
    }
}

// ============================================================================
// VarBitmapFont
// ============================================================================

/// Mono bitmap font with a width per glyph.
#[derive(Debug, Clone)]
pub struct VarBitmapFont {
    table: GlyphTable<u8>,
}

impl VarBitmapFont {
    /// Build from glyph pictures of equal height and any width.
    pub fn from_rows(name: &str, ascent: u16, first_glyph: u32, glyphs: &[&[&str]]) -> Option<Self> {
        let height = glyphs.first()?.len() as u16;
        let mut packed = Vec::with_capacity(glyphs.len());
        for g in glyphs {
            if g.len() as u16 != height {
                return None;
            }
            packed.push(pack_rows(g)?);
        }
        GlyphTable::build(name, height, ascent, first_glyph, packed, mono_pitch).map(|table| Self { table })
    }
}

impl_common_builders!(VarBitmapFont);

impl DevFont for VarBitmapFont {
    impl_common_metrics!();

    fn bmp_type(&self) -> GlyphBmpType {
        GlyphBmpType::Mono
    }

    fn mono_bitmap(&self, _logfont: &LogFont, glyph: u32) -> Option<GlyphBitmap<'_>> {
        let (e, bits) = self.table.glyph_data(glyph)?;
        Some(GlyphBitmap {
            bits: Cow::Borrowed(bits),
            pitch: mono_pitch(e.width),
            scale: self.table.scale,
        })
    }
}

// ============================================================================
// GreyBitmapFont
// ============================================================================

/// Font with 8-bit coverage glyphs, or LCD-filtered RGB coverage triples.
#[derive(Debug, Clone)]
pub struct GreyBitmapFont {
    table: GlyphTable<u8>,
    channels: usize,
}

impl GreyBitmapFont {
    /// Glyphs are `(width, coverage)` with `width * height` bytes each.
    pub fn new(name: &str, height: u16, ascent: u16, first_glyph: u32, glyphs: Vec<(u16, Vec<u8>)>) -> Option<Self> {
        GlyphTable::build(name, height, ascent, first_glyph, glyphs, |w| w as usize)
            .map(|table| Self { table, channels: 1 })
    }

    /// Glyphs are `(width, coverage)` with `3 * width * height` bytes each,
    /// one R, G, B coverage triple per pixel.
    pub fn subpixel(name: &str, height: u16, ascent: u16, first_glyph: u32, glyphs: Vec<(u16, Vec<u8>)>) -> Option<Self> {
        GlyphTable::build(name, height, ascent, first_glyph, glyphs, |w| w as usize * 3)
            .map(|table| Self { table, channels: 3 })
    }
}

impl_common_builders!(GreyBitmapFont);

impl DevFont for GreyBitmapFont {
    impl_common_metrics!();

    fn bmp_type(&self) -> GlyphBmpType {
        if self.channels == 3 {
            GlyphBmpType::Subpixel
        } else {
            GlyphBmpType::Grey
        }
    }

    fn grey_bitmap(&self, _logfont: &LogFont, glyph: u32) -> Option<GlyphBitmap<'_>> {
        let (e, bits) = self.table.glyph_data(glyph)?;
        Some(GlyphBitmap {
            bits: Cow::Borrowed(bits),
            pitch: e.width as usize * self.channels,
            scale: self.table.scale,
        })
    }
}

// ============================================================================
// PrerenderedFont
// ============================================================================

/// Font whose glyphs are small color images.
#[derive(Debug, Clone)]
pub struct PrerenderedFont {
    table: GlyphTable<Rgba8>,
}

impl PrerenderedFont {
    /// Glyphs are `(width, pixels)` with `width * height` pixels each.
    /// Zero alpha marks transparent pixels.
    pub fn new(name: &str, height: u16, ascent: u16, first_glyph: u32, glyphs: Vec<(u16, Vec<Rgba8>)>) -> Option<Self> {
        GlyphTable::build(name, height, ascent, first_glyph, glyphs, |w| w as usize).map(|table| Self { table })
    }
}

impl_common_builders!(PrerenderedFont);

impl DevFont for PrerenderedFont {
    impl_common_metrics!();

    fn bmp_type(&self) -> GlyphBmpType {
        GlyphBmpType::Prerender
    }

    fn prerendered_bitmap(&self, _logfont: &LogFont, glyph: u32) -> Option<PrerenderedGlyph<'_>> {
        let (e, pixels) = self.table.glyph_data(glyph)?;
        Some(PrerenderedGlyph {
            width: e.width as u32,
            height: self.table.height as u32,
            pixels: Cow::Borrowed(pixels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn make_raw() -> RawBitmapFont {
        RawBitmapFont::from_rows(
            "raw",
            3,
            65,
            &[&["#..", "###", "#.#", "..."], &["...", ".#.", ".#.", "..."]],
        )
        .unwrap()
    }

    #[test]
    fn test_raw_font_metrics_and_bits() {
        let f = make_raw();
        let lf = LogFont::new(Arc::new(f.clone()));
        assert_eq!((f.font_height(), f.font_ascent(), f.font_descent()), (4, 3, 1));
        assert!(f.is_glyph_existed(66));
        assert!(!f.is_glyph_existed(67) && !f.is_glyph_existed(64));
        assert_eq!(f.glyph_bbox(&lf, 65), BBox::new(0, -3, 3, 4));
        assert_eq!(f.glyph_advance(&lf, 65).dx, 3);
        let bmp = f.mono_bitmap(&lf, 65).unwrap();
        assert_eq!(bmp.pitch, 1);
        assert_eq!(&bmp.bits[..], &[0x80, 0xE0, 0xA0, 0x00]);
        assert!(f.mono_bitmap(&lf, 99).is_none());
    }

    #[test]
    fn test_raw_font_from_packed_bits() {
        let f = RawBitmapFont::new("packed", 9, 2, 2, 0, &[0xFF, 0x80, 0x00, 0x00]).unwrap();
        assert_eq!(f.glyph_count(), 1);
        assert!(RawBitmapFont::new("bad", 9, 2, 2, 0, &[0xFF, 0x80, 0x00]).is_none());
    }

    #[test]
    fn test_scaled_metrics() {
        let f = make_raw().with_scale(2);
        let lf = LogFont::new(Arc::new(f.clone()));
        assert_eq!(f.font_height(), 8);
        assert_eq!(f.glyph_bbox(&lf, 65), BBox::new(0, -6, 6, 8));
        assert_eq!(f.glyph_advance(&lf, 65).len, 6);
        assert_eq!(f.mono_bitmap(&lf, 65).unwrap().scale, 2);
    }

    #[test]
    fn test_var_font_widths() {
        let f = VarBitmapFont::from_rows("var", 2, 32, &[&[".", "."], &["#####.....", ".........#"]]).unwrap();
        let lf = LogFont::new(Arc::new(f.clone()));
        assert_eq!(f.glyph_advance(&lf, 32).dx, 1);
        assert_eq!(f.glyph_advance(&lf, 33).dx, 10);
        let bmp = f.mono_bitmap(&lf, 33).unwrap();
        assert_eq!(bmp.pitch, 2);
        assert_eq!(&bmp.bits[..], &[0xF8, 0x00, 0x00, 0x40]);
        assert!(VarBitmapFont::from_rows("bad", 2, 0, &[&["#", "#"], &["#"]]).is_none());
    }

    #[test]
    fn test_grey_and_subpixel_fonts() {
        let g = GreyBitmapFont::new("grey", 2, 2, 0, vec![(2, vec![0, 128, 255, 16])]).unwrap();
        let lf = LogFont::new(Arc::new(g.clone()));
        assert_eq!(g.bmp_type(), GlyphBmpType::Grey);
        assert_eq!(g.grey_bitmap(&lf, 0).unwrap().pitch, 2);
        assert!(g.mono_bitmap(&lf, 0).is_none());

        let s = GreyBitmapFont::subpixel("lcd", 1, 1, 0, vec![(2, vec![1, 2, 3, 4, 5, 6])]).unwrap();
        assert_eq!(s.bmp_type(), GlyphBmpType::Subpixel);
        assert_eq!(s.grey_bitmap(&lf, 0).unwrap().pitch, 6);
        assert!(GreyBitmapFont::subpixel("bad", 1, 1, 0, vec![(2, vec![0; 4])]).is_none());
    }

    #[test]
    fn test_prerendered_font() {
        let red = Rgba8::new_opaque(255, 0, 0);
        let f = PrerenderedFont::new("bmp", 1, 1, 0, vec![(2, vec![red, Rgba8::default()])]).unwrap();
        let lf = LogFont::new(Arc::new(f.clone()));
        let img = f.prerendered_bitmap(&lf, 0).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.pixels[0], red);
    }
}
