//! Scalable TrueType device font using `ttf-parser`.
//!
//! Outlines are scaled to the requested pixel size, rotated by the logical
//! font's rotation and rasterized into 8-bit coverage with 4x4
//! supersampling and the non-zero winding rule. Glyph values are Unicode
//! scalar values.

use std::borrow::Cow;

use crate::basics::angle_to_radians;
use crate::devfont::{Advance, BBox, DevFont, GlyphBitmap, GlyphBmpType, LogFont};
use crate::error::{RasterError, Result};

/// Subsamples per pixel along each axis.
const SUBSAMPLES: usize = 4;

/// Curve segments used when flattening one Bezier.
const CURVE_STEPS: usize = 8;

// ============================================================================
// Outline collection
// ============================================================================

/// Flattened contours in pixel space, y down, relative to the pen origin.
struct OutlineCollector {
    contours: Vec<Vec<(f64, f64)>>,
    scale: f64,
    cos: f64,
    sin: f64,
    last: (f64, f64),
}

impl OutlineCollector {
    fn new(scale: f64, angle: i32) -> Self {
        let rad = angle_to_radians(angle);
        Self {
            contours: Vec::new(),
            scale,
            cos: rad.cos(),
            sin: rad.sin(),
            last: (0.0, 0.0),
        }
    }

    /// Font units to rotated pixel space.
    #[inline]
    fn map(&self, x: f32, y: f32) -> (f64, f64) {
        let x = x as f64 * self.scale;
        let y = -(y as f64) * self.scale;
        (x * self.cos + y * self.sin, -x * self.sin + y * self.cos)
    }

    fn push(&mut self, p: (f64, f64)) {
        if let Some(c) = self.contours.last_mut() {
            c.push(p);
        }
        self.last = p;
    }
}

impl ttf_parser::OutlineBuilder for OutlineCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.contours.push(vec![p]);
        self.last = p;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.push(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.last;
        let c = self.map(x1, y1);
        let p = self.map(x, y);
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let u = 1.0 - t;
            self.push((
                u * u * p0.0 + 2.0 * u * t * c.0 + t * t * p.0,
                u * u * p0.1 + 2.0 * u * t * c.1 + t * t * p.1,
            ));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last;
        let c1 = self.map(x1, y1);
        let c2 = self.map(x2, y2);
        let p = self.map(x, y);
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let u = 1.0 - t;
            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            self.push((
                a * p0.0 + b * c1.0 + c * c2.0 + d * p.0,
                a * p0.1 + b * c1.1 + c * c2.1 + d * p.1,
            ));
        }
    }

    fn close(&mut self) {}
}

/// Integer pixel box covering every contour point.
fn outline_bbox(contours: &[Vec<(f64, f64)>]) -> Option<BBox> {
    let mut pts = contours.iter().flatten();
    let first = pts.next()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.0, first.1, first.0, first.1);
    for p in pts {
        x0 = x0.min(p.0);
        y0 = y0.min(p.1);
        x1 = x1.max(p.0);
        y1 = y1.max(p.1);
    }
    let (l, t) = (x0.floor() as i32, y0.floor() as i32);
    let (r, b) = (x1.ceil() as i32, y1.ceil() as i32);
    Some(BBox::new(l, t, (r - l).max(1), (b - t).max(1)))
}

/// Rasterize closed contours into `bbox.w * bbox.h` coverage bytes.
fn rasterize(contours: &[Vec<(f64, f64)>], bbox: &BBox) -> Vec<u8> {
    let (w, h) = (bbox.w as usize, bbox.h as usize);
    let mut hits = vec![0u16; w * h];
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    let step = 1.0 / SUBSAMPLES as f64;

    for py in 0..h {
        for sub in 0..SUBSAMPLES {
            let sy = bbox.y as f64 + py as f64 + (sub as f64 + 0.5) * step;
            crossings.clear();
            for c in contours.iter().filter(|c| c.len() > 2) {
                for i in 0..c.len() {
                    let a = c[i];
                    let b = c[(i + 1) % c.len()];
                    if a.1 == b.1 {
                        continue;
                    }
                    let (lo, hi, dir) = if a.1 < b.1 { (a, b, 1) } else { (b, a, -1) };
                    if sy < lo.1 || sy >= hi.1 {
                        continue;
                    }
                    let x = lo.0 + (sy - lo.1) * (hi.0 - lo.0) / (hi.1 - lo.1);
                    crossings.push((x, dir));
                }
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let from = (pair[0].0 - bbox.x as f64) * SUBSAMPLES as f64 - 0.5;
                let to = (pair[1].0 - bbox.x as f64) * SUBSAMPLES as f64 - 0.5;
                let k0 = from.ceil().max(0.0) as usize;
                let k1 = to.floor().min((w * SUBSAMPLES) as f64 - 1.0);
                if k1 < 0.0 {
                    continue;
                }
                for k in k0..=k1 as usize {
                    hits[py * w + k / SUBSAMPLES] += 1;
                }
            }
        }
    }

    let full = (SUBSAMPLES * SUBSAMPLES) as u32;
    hits.into_iter()
        .map(|n| ((n as u32 * 255) / full).min(255) as u8)
        .collect()
}

// ============================================================================
// TtfFont
// ============================================================================

/// TrueType font rendered at a fixed pixel size.
pub struct TtfFont {
    name: String,
    data: Vec<u8>,
    face_index: u32,
    /// Pixels per font unit.
    scale: f64,
    ascent: i32,
    descent: i32,
}

impl TtfFont {
    /// Load a font face from raw TTF/OTF bytes, sized so that ascent plus
    /// descent spans `pixel_height` pixels.
    pub fn from_data(name: &str, data: Vec<u8>, face_index: u32, pixel_height: u16) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| RasterError::FontData(format!("{}: {:?}", name, e)))?;
        let units = face.ascender() as i32 - face.descender() as i32;
        if units <= 0 || pixel_height == 0 {
            return Err(RasterError::FontData(format!("{}: degenerate vertical metrics", name)));
        }
        let scale = pixel_height as f64 / units as f64;
        let ascent = (face.ascender() as f64 * scale).round() as i32;
        let descent = (pixel_height as i32 - ascent).max(0);
        Ok(Self {
            name: name.to_string(),
            data,
            face_index,
            scale,
            ascent,
            descent,
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }

    fn glyph_id(face: &ttf_parser::Face<'_>, glyph: u32) -> Option<ttf_parser::GlyphId> {
        char::from_u32(glyph).and_then(|c| face.glyph_index(c))
    }

    fn outline(&self, logfont: &LogFont, glyph: u32) -> Option<Vec<Vec<(f64, f64)>>> {
        let face = self.face()?;
        let id = Self::glyph_id(&face, glyph)?;
        let mut collector = OutlineCollector::new(self.scale, logfont.rotation_angle());
        face.outline_glyph(id, &mut collector)?;
        Some(collector.contours)
    }
}

impl DevFont for TtfFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn bmp_type(&self) -> GlyphBmpType {
        GlyphBmpType::Grey
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

    fn is_glyph_existed(&self, glyph: u32) -> bool {
        self.face().map_or(false, |f| Self::glyph_id(&f, glyph).is_some())
    }

    fn glyph_advance(&self, logfont: &LogFont, glyph: u32) -> Advance {
        let len = self
            .face()
            .and_then(|f| Self::glyph_id(&f, glyph).and_then(|id| f.glyph_hor_advance(id)))
            .map_or(0, |a| (a as f64 * self.scale).round() as i32);
        Advance::along(len, logfont.rotation)
    }

    fn glyph_bbox(&self, logfont: &LogFont, glyph: u32) -> BBox {
        self.outline(logfont, glyph)
            .and_then(|c| outline_bbox(&c))
            .unwrap_or_default()
    }

    fn grey_bitmap(&self, logfont: &LogFont, glyph: u32) -> Option<GlyphBitmap<'_>> {
        let contours = self.outline(logfont, glyph)?;
        let bbox = outline_bbox(&contours)?;
        Some(GlyphBitmap {
            bits: Cow::Owned(rasterize(&contours, &bbox)),
            pitch: bbox.w as usize,
            scale: 1,
        })
    }
}
