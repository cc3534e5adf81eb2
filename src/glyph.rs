//! Glyph drawing pipeline.
//!
//! [`draw_one_glyph`] places one glyph on the baseline, synthesizes bold
//! and italic when the device font lacks them, fills the background box in
//! opaque mode, hands the processed bitmap to a scanline renderer and
//! finally draws underline and strike-out lines. The measuring helpers
//! share the same advance rules so that measured and drawn text agree.

use log::{trace, warn};

use crate::basics::{tenths_to_angle, Point, Rect, Size};
use crate::clip_region::ClipRegion;
use crate::color::Pixel;
use crate::devfont::{
    real_glyph, rotate_vector, Advance, BBox, DevFont, FontStyle, Glyph32, GlyphBmpType, LogFont, INV_GLYPH_VALUE,
};
use crate::error::Result;
use crate::glyph_bits::{expand_bold_bits, expand_scale_bits, flip_bytes_horz, flip_mono_horz, flip_vert, GlyphScratch};
use crate::glyph_scanline::{render_glyph, BkRows, GlyphImage, GlyphPaint, GlyphRamps, Renderer, Slant};
use crate::line_clipper::clip_line;
use crate::pixel_sink::DrawContext;
use crate::polygon_generator::monotone_vertical_polygon_generator;
use crate::surface::Surface;

// ============================================================================
// Text alignment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorzAlign {
    /// Glyphs advance to the right of the reference point.
    #[default]
    Left,
    /// Glyphs advance to the left of the reference point.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertAlign {
    /// The reference point is on the top of the font box.
    #[default]
    Top,
    Baseline,
    Bottom,
}

/// Position of a text reference point relative to the glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextAlign {
    pub horz: HorzAlign,
    pub vert: VertAlign,
}

impl TextAlign {
    pub const fn new(horz: HorzAlign, vert: VertAlign) -> Self {
        Self { horz, vert }
    }

    #[inline]
    fn left_to_right(&self) -> bool {
        self.horz != HorzAlign::Right
    }
}

// ============================================================================
// Text state and output target
// ============================================================================

/// Text attributes of a device context for one drawing or measuring call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextState<'a> {
    pub logfont: &'a LogFont,
    pub align: TextAlign,
    pub text_color: Pixel,
    pub bk_color: Pixel,
    pub bk_transparent: bool,
    pub ramps: &'a GlyphRamps,
    pub char_extra: i32,
    pub line_extra: i32,
}

/// Where glyphs are drawn. `bound` is the largest output rectangle any
/// glyph may touch, in screen coordinates.
pub(crate) struct GlyphCanvas<'a> {
    pub surface: &'a mut Surface,
    pub clip: &'a ClipRegion,
    pub bound: Rect,
    pub scratch: &'a mut GlyphScratch,
}

/// Metrics of a glyph as returned by [`get_glyph_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphInfo {
    /// Ink box relative to the pen position.
    pub bbox: BBox,
    pub advance: Advance,
    pub height: i32,
    pub descent: i32,
    pub bmp_type: GlyphBmpType,
}

#[inline]
fn is_mono(df: &dyn DevFont) -> bool {
    df.bmp_type() == GlyphBmpType::Mono
}

/// Extra columns of synthesized bold: one unscaled column, mono only.
#[inline]
fn synthetic_bold(logfont: &LogFont, df: &dyn DevFont) -> i32 {
    if logfont.style.contains(FontStyle::BOLD) && !df.style().contains(FontStyle::BOLD) && is_mono(df) {
        df.scale() as i32
    } else {
        0
    }
}

/// Book and light filters spread one pixel around mono glyphs.
#[inline]
fn has_halo(logfont: &LogFont, df: &dyn DevFont) -> bool {
    is_mono(df) && logfont.style.intersects(FontStyle::BOOK | FontStyle::LIGHT)
}

// ============================================================================
// Advance
// ============================================================================

/// A glyph placed at a pen position.
#[derive(Debug, Clone, Copy)]
struct Placement {
    /// Advance length including bold, character spacing and halo.
    len: i32,
    /// Pen displacement.
    adv: Point,
    /// Ink box in absolute coordinates, widened by `bold`.
    bbox: BBox,
    bold: i32,
}

fn place_glyph(st: &TextState<'_>, glyph: Glyph32, x: i32, y: i32) -> Placement {
    let lf = st.logfont;
    let df = lf.select_devfont(glyph);
    let real = real_glyph(glyph);
    let ltr = st.align.left_to_right();

    let mut bbox = df.glyph_bbox(lf, real);
    bbox.x += x;
    bbox.y += y;
    let bold = synthetic_bold(lf, df);
    bbox.w += bold;

    let a = df.glyph_advance(lf, real);
    let extra = bold + st.char_extra;
    if !ltr {
        bbox.x -= extra + a.len;
    }

    let (mut dx, mut dy) = (a.dx, a.dy);
    if extra != 0 {
        if lf.rotation == 0 {
            dx += extra;
        } else {
            let (ex, ey) = rotate_vector(extra, lf.rotation_angle());
            dx += ex;
            dy -= ey;
        }
    }

    let mut len = a.len + extra;
    let mut adv = if ltr { Point::new(dx, dy) } else { Point::new(-dx, -dy) };
    if has_halo(lf, df) {
        len += 1;
        adv.x += if ltr { 1 } else { -1 };
    }
    Placement { len, adv, bbox, bold }
}

/// Move a reference point to the baseline according to the vertical
/// alignment. Rotated fonts move along the rotated vertical axis.
pub(crate) fn baseline_point(logfont: &LogFont, vert: VertAlign, p: Point) -> Point {
    let (len, angle) = match vert {
        VertAlign::Baseline => return p,
        VertAlign::Top => (logfont.ascent, 2700),
        VertAlign::Bottom => (-logfont.descent, 2700),
    };
    if logfont.rotation == 0 {
        return Point::new(p.x, p.y + len);
    }
    let (vx, vy) = rotate_vector(len, tenths_to_angle(logfont.rotation + angle));
    Point::new(p.x + vx, p.y - vy)
}

/// Extra width of synthesized italic text.
pub fn italic_added_width(logfont: &LogFont) -> i32 {
    if logfont.style.contains(FontStyle::ITALIC) && !logfont.sbc().style().contains(FontStyle::ITALIC) {
        (logfont.size + 1) >> 1
    } else {
        0
    }
}

/// Metrics of one glyph without any device context state. Synthesized
/// bold adds one pixel to the advance.
pub fn get_glyph_info(logfont: &LogFont, glyph: Glyph32) -> Option<GlyphInfo> {
    if glyph == INV_GLYPH_VALUE {
        return None;
    }
    let df = logfont.select_devfont(glyph);
    let real = real_glyph(glyph);
    let mut advance = df.glyph_advance(logfont, real);
    if logfont.style.contains(FontStyle::BOLD) {
        advance.len += 1;
        advance.dx += 1;
    }
    Some(GlyphInfo {
        bbox: df.glyph_bbox(logfont, real),
        advance,
        height: df.font_height(),
        descent: df.font_descent(),
        bmp_type: df.bmp_type(),
    })
}

/// Total advance of `glyphs` and the size of the box they occupy.
pub(crate) fn glyphs_extent(st: &TextState<'_>, glyphs: &[Glyph32]) -> (i32, Size) {
    let mut advance = 0;
    let mut end = Point::default();
    for &g in glyphs.iter().filter(|&&g| g != INV_GLYPH_VALUE) {
        let p = place_glyph(st, g, 0, 0);
        advance += p.len;
        end.x += p.adv.x;
        end.y += p.adv.y;
    }
    let rc = BackArea::new(st.logfont, Point::default(), end, false).bound().normalized();
    (advance, Size::new(rc.width(), rc.height()))
}

// ============================================================================
// Background box
// ============================================================================

/// The area behind a glyph run from `p0` to `p1` on the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackArea {
    Roman(Rect),
    /// Sheared box; `reverse` when exactly one flip flag is set.
    Italic { rc: Rect, reverse: bool },
    /// Four corners: top start, top end, bottom end, bottom start.
    Rotated([Point; 4]),
}

impl BackArea {
    fn new(logfont: &LogFont, p0: Point, p1: Point, halo: bool) -> Self {
        if logfont.rotation != 0 {
            let up = rotate_vector(logfont.ascent, tenths_to_angle(logfont.rotation + 900));
            let down = rotate_vector(logfont.descent, tenths_to_angle(logfont.rotation + 2700));
            let at = |p: Point, v: (i32, i32)| Point::new(p.x + v.0, p.y - v.1);
            return BackArea::Rotated([at(p0, up), at(p1, up), at(p1, down), at(p0, down)]);
        }

        let mut rc = Rect::from_xywh(p0.x, p0.y - logfont.ascent, p1.x - p0.x, logfont.size);
        if halo {
            rc.inflate(1, 1);
        }
        if logfont.style.contains(FontStyle::ITALIC) && !logfont.sbc().style().contains(FontStyle::ITALIC) {
            BackArea::Italic {
                rc,
                reverse: logfont.style.single_flip(),
            }
        } else {
            BackArea::Roman(rc)
        }
    }

    fn bound(&self) -> Rect {
        match *self {
            BackArea::Roman(rc) => rc,
            BackArea::Italic { mut rc, .. } => {
                rc.right += rc.height() >> 1;
                rc
            }
            BackArea::Rotated(pts) => {
                let mut rc = Rect::new(pts[0].x, pts[0].y, pts[0].x, pts[0].y);
                for p in &pts[1..] {
                    rc.left = rc.left.min(p.x);
                    rc.right = rc.right.max(p.x);
                    rc.top = rc.top.min(p.y);
                    rc.bottom = rc.bottom.max(p.y);
                }
                rc
            }
        }
    }

    /// Fill with the context's current color.
    fn fill(&self, ctx: &mut DrawContext<'_>) -> Result<()> {
        match *self {
            BackArea::Roman(rc) => ctx.fill_box(&rc),
            BackArea::Italic { rc, reverse } => {
                let (w, h) = (rc.width(), rc.height());
                for i in 0..h {
                    let shift = if reverse { i >> 1 } else { (h - i) >> 1 };
                    let x = rc.left + shift;
                    ctx.draw_hline_clip(x, x + w - 1, rc.top + i);
                }
            }
            BackArea::Rotated(pts) => {
                monotone_vertical_polygon_generator(&pts, |x1, x2, y| ctx.draw_hline_clip(x1, x2, y))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Decoration lines
// ============================================================================

/// The segment `a`-`b` moved `dist` pixels toward the glyph tops.
fn parallel(logfont: &LogFont, a: Point, b: Point, dist: i32) -> (Point, Point) {
    let (vx, vy) = rotate_vector(dist, tenths_to_angle(logfont.rotation + 900));
    (Point::new(a.x + vx, a.y - vy), Point::new(b.x + vx, b.y - vy))
}

fn draw_clipped_line(ctx: &mut DrawContext<'_>, a: Point, b: Point) {
    if let Some(walk) = clip_line(a, b, &ctx.rc_output()) {
        for p in walk.points() {
            ctx.set_pixel_clip(p.x, p.y);
        }
    }
}

/// Underline and strike-out for the glyph run from `a` to `b`.
fn draw_glyph_lines(ctx: &mut DrawContext<'_>, logfont: &LogFont, text: Pixel, a: Point, b: Point) {
    if a == b {
        return;
    }
    let style = logfont.style;
    let (h, descent) = (logfont.size, logfont.descent);
    let upright_italic = logfont.rotation == 0 && style.contains(FontStyle::ITALIC);
    ctx.set_color(text);

    if style.contains(FontStyle::UNDERLINE) {
        let (mut p1, mut p2) = if style.contains(FontStyle::FLIP_VERT) {
            parallel(logfont, a, b, h - (descent << 1))
        } else {
            (a, b)
        };
        if upright_italic {
            let shift = if style.contains(FontStyle::FLIP_HORZ) {
                ((h - descent) >> 1) - 1
            } else {
                descent >> 1
            };
            p1.x += shift;
            p2.x += shift;
        }
        draw_clipped_line(ctx, p1, p2);
    }

    if style.contains(FontStyle::STRUCKOUT) {
        let dist = (h >> 1) - descent + style.contains(FontStyle::FLIP_VERT) as i32;
        let (mut p1, mut p2) = parallel(logfont, a, b, dist);
        if upright_italic {
            p1.x += h >> 2;
            p2.x += h >> 2;
        }
        draw_clipped_line(ctx, p1, p2);
    }
}

// ============================================================================
// Glyph foreground
// ============================================================================

/// Mono renderer for the logical font's weight style.
fn mono_renderer(st: &TextState<'_>) -> Renderer {
    let style = st.logfont.style;
    if style.contains(FontStyle::BOOK) {
        if st.ramps.book.is_some() {
            return Renderer::Book;
        }
    } else if style.contains(FontStyle::LIGHT) {
        if st.text_color != st.bk_color {
            return Renderer::Light;
        }
    } else if style.contains(FontStyle::SUBPIXEL) {
        return Renderer::Subpixel;
    }
    Renderer::Regular
}

/// Glyph geometry shared by the bitmap paths.
struct Foreground {
    origin: Point,
    /// Bitmap box size, bold included, scale included.
    w: i32,
    h: i32,
    bold: i32,
    slant: Slant,
}

fn fill_glyph(ctx: &mut DrawContext<'_>, scratch: &mut GlyphScratch, st: &TextState<'_>, glyph: Glyph32, fg: &Foreground) -> Result<()> {
    let lf = st.logfont;
    let df = lf.select_devfont(glyph);
    let real = real_glyph(glyph);
    let style = lf.style;
    let scale = (df.scale() as i32).max(1);
    let fmt = *ctx.format();
    let paint = GlyphPaint {
        text: st.text_color,
        text_rgb: fmt.get_rgb(st.text_color),
        bk_rgb: fmt.get_rgb(st.bk_color),
        ramps: st.ramps,
    };
    let missing = |kind: &str| warn!("{} reports {} glyphs but returned none for {:#x}", df.name(), kind, real);

    match df.bmp_type() {
        GlyphBmpType::Mono => {
            let renderer = mono_renderer(st);
            let Some(bmp) = df.mono_bitmap(lf, real) else {
                missing("mono");
                return Ok(());
            };
            let bold = fg.bold > 0;
            let flip = style.intersects(FontStyle::FLIP_HORZ | FontStyle::FLIP_VERT);
            if renderer == Renderer::Subpixel {
                scratch.prepare_bk(fg.w.max(0) as usize)?;
            }

            let (w, h, pitch, img_scale, in_scratch) = if scale > 1 && renderer != Renderer::Regular {
                let (w, pitch) =
                    expand_scale_bits(&bmp.bits, bmp.pitch, fg.w / scale - bold as i32, fg.h / scale, scale, bold, &mut scratch.bits)?;
                (w, fg.h / scale * scale, pitch, 1, true)
            } else if bold {
                let (src_w, h) = (fg.w / scale - 1, fg.h / scale);
                let pitch = expand_bold_bits(&bmp.bits, bmp.pitch, src_w, h, &mut scratch.bits)?;
                (src_w + 1, h, pitch, scale, true)
            } else {
                (fg.w / scale, fg.h / scale, bmp.pitch, scale, false)
            };

            let in_scratch = if flip && !in_scratch {
                let len = (pitch * h.max(0) as usize).min(bmp.bits.len());
                scratch.load_bits(&bmp.bits[..len])?;
                true
            } else {
                in_scratch
            };
            if style.contains(FontStyle::FLIP_HORZ) {
                flip_mono_horz(&mut scratch.bits, w, h, pitch);
            }
            if style.contains(FontStyle::FLIP_VERT) {
                flip_vert(&mut scratch.bits, h, pitch);
            }

            let data: &[u8] = if in_scratch { &scratch.bits[..] } else { &bmp.bits };
            trace!("glyph {:#x}: {:?} {}x{} scale {}", real, renderer, w, h, img_scale);
            let image = GlyphImage::Mono {
                bits: data,
                pitch,
                w,
                h,
                scale: img_scale,
            };
            let bk = BkRows {
                prev: &mut scratch.prev_bk,
                curr: &mut scratch.curr_bk,
                next: &mut scratch.next_bk,
            };
            render_glyph(ctx, renderer, image, fg.origin, &fg.slant, &paint, bk)
        }
        GlyphBmpType::Grey => {
            let Some(bmp) = df.grey_bitmap(lf, real) else {
                missing("grey");
                return Ok(());
            };
            let (w, h) = if scale > 1 { (fg.w / scale, fg.h / scale) } else { (fg.w, fg.h) };
            let flip = style.intersects(FontStyle::FLIP_HORZ | FontStyle::FLIP_VERT);
            let data: &[u8] = if flip {
                scratch.load_bits(&bmp.bits)?;
                if style.contains(FontStyle::FLIP_HORZ) {
                    flip_bytes_horz(&mut scratch.bits, w, h, bmp.pitch, 1);
                }
                if style.contains(FontStyle::FLIP_VERT) {
                    flip_vert(&mut scratch.bits, h, bmp.pitch);
                }
                &scratch.bits[..]
            } else {
                &bmp.bits
            };
            trace!("glyph {:#x}: grey {}x{} scale {}", real, w, h, scale);
            let image = GlyphImage::Grey {
                bits: data,
                pitch: bmp.pitch,
                w,
                h,
                scale,
            };
            let bk = BkRows {
                prev: &mut scratch.prev_bk,
                curr: &mut scratch.curr_bk,
                next: &mut scratch.next_bk,
            };
            render_glyph(ctx, Renderer::BookGrey, image, fg.origin, &fg.slant, &paint, bk)
        }
        GlyphBmpType::Subpixel => {
            let Some(bmp) = df.grey_bitmap(lf, real) else {
                missing("subpixel");
                return Ok(());
            };
            let image = GlyphImage::Lcd {
                bits: &bmp.bits,
                pitch: bmp.pitch,
                w: fg.w,
                h: fg.h,
            };
            let bk = BkRows {
                prev: &mut scratch.prev_bk,
                curr: &mut scratch.curr_bk,
                next: &mut scratch.next_bk,
            };
            render_glyph(ctx, Renderer::LcdSubpixel, image, fg.origin, &fg.slant, &paint, bk)
        }
        GlyphBmpType::Prerender => {
            let Some(bmp) = df.prerendered_bitmap(lf, real) else {
                missing("pre-rendered");
                return Ok(());
            };
            let (w, h) = (bmp.width as i32, bmp.height as i32);
            scratch.load_pixels(&bmp.pixels)?;
            let pixels = &mut scratch.pixels;
            if style.contains(FontStyle::FLIP_HORZ) && w > 0 {
                for row in pixels.chunks_exact_mut(w as usize) {
                    row.reverse();
                }
            }
            if style.contains(FontStyle::FLIP_VERT) {
                flip_vert(pixels, h, w.max(0) as usize);
            }
            let image = GlyphImage::Prerendered {
                pixels: &scratch.pixels[..],
                w,
                h,
            };
            let bk = BkRows {
                prev: &mut scratch.prev_bk,
                curr: &mut scratch.curr_bk,
                next: &mut scratch.next_bk,
            };
            render_glyph(ctx, Renderer::Prerendered, image, fg.origin, &fg.slant, &paint, bk)
        }
    }
}

// ============================================================================
// One glyph
// ============================================================================

/// Draw `glyph` with its pen position on the baseline at `(x, y)` in
/// screen coordinates and return the pen displacement.
///
/// An invalid glyph value draws nothing and advances by zero.
pub(crate) fn draw_one_glyph(canvas: &mut GlyphCanvas<'_>, st: &TextState<'_>, glyph: Glyph32, x: i32, y: i32) -> Result<Advance> {
    if glyph == INV_GLYPH_VALUE {
        return Ok(Advance::default());
    }
    let y = y + st.line_extra;
    let lf = st.logfont;
    let df = lf.select_devfont(glyph);
    let placed = place_glyph(st, glyph, x, y);
    let advance = Advance {
        len: placed.len,
        dx: placed.adv.x,
        dy: placed.adv.y,
    };

    let italic = if lf.style.contains(FontStyle::ITALIC) && !df.style().contains(FontStyle::ITALIC) {
        df.font_height() >> 1
    } else {
        0
    };
    let halo = has_halo(lf, df);
    let bbox = placed.bbox;
    let mut fg_rc = Rect::from_xywh(bbox.x, bbox.y, bbox.w + italic, bbox.h);
    if halo {
        fg_rc.inflate(1, 1);
    }

    let pen = Point::new(x, y);
    let end = Point::new(x + placed.adv.x, y + placed.adv.y);
    let need_back = !st.bk_transparent || lf.style.intersects(FontStyle::UNDERLINE | FontStyle::STRUCKOUT);
    let back = need_back.then(|| {
        if st.align.left_to_right() {
            BackArea::new(lf, pen, end, halo)
        } else {
            BackArea::new(lf, end, pen, halo)
        }
    });

    let mut rc_front = fg_rc;
    rc_front.bottom += 1;
    let rc_output = back.map_or(rc_front, |b| b.bound().bound(&rc_front));
    let Some(rc_output) = rc_output.intersect(&canvas.bound) else {
        return Ok(advance);
    };
    let Some(mut ctx) = DrawContext::new(&mut *canvas.surface, canvas.clip, rc_output) else {
        return Ok(advance);
    };

    if let (false, Some(b)) = (st.bk_transparent, back) {
        ctx.set_color(st.bk_color);
        b.fill(&mut ctx)?;
    }

    if fg_rc.intersect(&ctx.rc_output()).is_some() {
        let fg = Foreground {
            origin: Point::new(fg_rc.left, fg_rc.top),
            w: bbox.w,
            h: bbox.h,
            bold: placed.bold,
            slant: Slant {
                italic: italic != 0,
                ascent: y - bbox.y,
                advance: placed.len,
                single_flip: lf.style.single_flip(),
            },
        };
        fill_glyph(&mut ctx, &mut *canvas.scratch, st, glyph, &fg)?;
    }

    draw_glyph_lines(&mut ctx, lf, st.text_color, pen, end);
    Ok(advance)
}

/// Draw `glyphs` from the baseline point `(x, y)`, accumulating the pen
/// position. Returns the total advance length and the pen displacement.
pub(crate) fn draw_glyph_string(canvas: &mut GlyphCanvas<'_>, st: &TextState<'_>, glyphs: &[Glyph32], x: i32, y: i32) -> Result<Advance> {
    let mut total = Advance::default();
    for &g in glyphs {
        let a = draw_one_glyph(canvas, st, g, x + total.dx, y + total.dy)?;
        total.len += a.len;
        total.dx += a.dx;
        total.dy += a.dy;
    }
    Ok(total)
}
