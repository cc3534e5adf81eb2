//! Device context: drawing attributes plus the logical-coordinate drawing
//! API.
//!
//! A [`DeviceContext`] owns its surface, its clip region (kept in screen
//! coordinates and never larger than the device rectangle) and the
//! per-context glyph scratch arena. Every drawing call converts its
//! logical geometry to screen space, opens one [`DrawContext`] bracket
//! bounded by what the call can touch, and drops it before returning.
//!
//! Primitives that only walk a generator return nothing. Primitives that
//! collect spans, fill floods or draw glyphs grow tables and can fail with
//! [`RasterError::ResourceExhausted`](crate::error::RasterError); output
//! written before the failure stays on the surface.

use std::sync::Arc;

use log::trace;

use crate::arc_generator::{circle_arc_generator, ellipse_arc_generator, fill_arc_generator, wide_arc_generator, ArcSpec};
use crate::basics::{Point, Rect, Size};
use crate::brush::{Brush, BrushType, Stipple, Tile};
use crate::clip_region::ClipRegion;
use crate::color::{Pixel, RasterOp};
use crate::coord::{CoordSpace, MapMode};
use crate::curves::spline_points;
use crate::devfont::{Advance, Glyph32, LogFont};
use crate::ellipse_generator::{circle_generator, ellipse_generator};
use crate::error::Result;
use crate::flood_fill::{flood_fill_generator, FloodTarget};
use crate::glyph::{self, GlyphCanvas, GlyphInfo, TextAlign, TextState};
use crate::glyph_bits::GlyphScratch;
use crate::glyph_scanline::GlyphRamps;
use crate::line_clipper::clip_line;
use crate::pixel_sink::DrawContext;
use crate::polygon_generator::{monotone_vertical_polygon_generator, polygon_generator, polygon_is_monotone_vertical};
use crate::surface::Surface;
use crate::wide_line::{wide_polyline, LineCap, LineJoin, PenType, RowSpans, WidePen};

/// Background mode for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BkMode {
    Transparent,
    #[default]
    Opaque,
}

/// Open a drawing bracket with the context's raster op.
fn open<'a>(surface: &'a mut Surface, clip: &'a ClipRegion, rc: Rect, rop: RasterOp) -> Option<DrawContext<'a>> {
    let mut ctx = DrawContext::new(surface, clip, rc)?;
    ctx.set_rop(rop);
    Some(ctx)
}

/// Run a span generator into `spans`, stopping at the first failed add.
fn collect_spans<G>(spans: &mut RowSpans, gen: G) -> Result<()>
where
    G: FnOnce(&mut dyn FnMut(i32, i32, i32)),
{
    let mut res = Ok(());
    gen(&mut |x1, x2, y| {
        if res.is_ok() {
            res = spans.add(x1.min(x2), x1.max(x2), y);
        }
    });
    res?;
    spans.normalize();
    Ok(())
}

/// Run a point generator into `spans`.
fn collect_points<G>(spans: &mut RowSpans, gen: G) -> Result<()>
where
    G: FnOnce(&mut dyn FnMut(i32, i32)),
{
    collect_spans(spans, |cb| gen(&mut |x, y| cb(x, x, y)))
}

/// Run a pair generator (both endpoints of a row) into `spans`.
fn collect_pairs<G>(spans: &mut RowSpans, gen: G) -> Result<()>
where
    G: FnOnce(&mut dyn FnMut(i32, i32, i32)),
{
    collect_spans(spans, |cb| {
        gen(&mut |x1, x2, y| {
            cb(x1, x1, y);
            cb(x2, x2, y);
        })
    })
}

// ============================================================================
// Text attributes
// ============================================================================

struct TextAttrs {
    font: Option<LogFont>,
    align: TextAlign,
    text_color: Pixel,
    bk_color: Pixel,
    bk_mode: BkMode,
    char_extra: i32,
    line_extra: i32,
    ramps: GlyphRamps,
}

impl TextAttrs {
    fn state<'a>(&'a self, font: &'a LogFont) -> TextState<'a> {
        TextState {
            logfont: font,
            align: self.align,
            text_color: self.text_color,
            bk_color: self.bk_color,
            bk_transparent: self.bk_mode == BkMode::Transparent,
            ramps: &self.ramps,
            char_extra: self.char_extra,
            line_extra: self.line_extra,
        }
    }
}

// ============================================================================
// Flood target
// ============================================================================

struct FloodPainter<'a> {
    ctx: DrawContext<'a>,
    skip: Pixel,
    brush: Brush,
    bk_color: Pixel,
}

impl FloodTarget for FloodPainter<'_> {
    #[inline]
    fn is_fill_candidate(&self, x: i32, y: i32) -> bool {
        self.ctx.get_pixel(x, y) == Some(self.skip)
    }

    fn fill_span(&mut self, x1: i32, x2: i32, y: i32) {
        self.ctx.fill_hline_clip(x1, x2, y, &self.brush, self.bk_color);
    }
}

// ============================================================================
// DeviceContext
// ============================================================================

/// Drawing state over one surface.
pub struct DeviceContext {
    surface: Surface,
    coords: CoordSpace,
    clip: ClipRegion,
    rop: RasterOp,
    pen_pos: Point,

    pen_color: Pixel,
    pen: WidePen,

    brush_color: Pixel,
    brush_type: BrushType,
    brush_tile: Option<Arc<Tile>>,
    brush_stipple: Option<Arc<Stipple>>,
    /// Device coordinates.
    brush_origin: Point,

    text: TextAttrs,
    scratch: GlyphScratch,
}

impl DeviceContext {
    /// A screen-equivalent context covering the whole surface. The mapping
    /// mode has no effect on such a context.
    pub fn new(surface: Surface) -> Self {
        let rc = surface.rect();
        Self::build(surface, CoordSpace::screen(rc))
    }

    /// A window-style context whose device origin is `dev_rc.left/top` in
    /// screen space. Drawing is clipped to `dev_rc`.
    pub fn with_device_rect(surface: Surface, dev_rc: Rect) -> Self {
        Self::build(surface, CoordSpace::window(dev_rc.normalized()))
    }

    fn build(surface: Surface, coords: CoordSpace) -> Self {
        let fmt = *surface.format();
        let black = fmt.map_rgb(0, 0, 0);
        let white = fmt.map_rgb(255, 255, 255);
        let clip = coords
            .dev_rc()
            .intersect(&surface.rect())
            .map_or_else(ClipRegion::empty, ClipRegion::from_rect);
        Self {
            surface,
            coords,
            clip,
            rop: RasterOp::Set,
            pen_pos: Point::default(),
            pen_color: black,
            pen: WidePen::default(),
            brush_color: white,
            brush_type: BrushType::Solid,
            brush_tile: None,
            brush_stipple: None,
            brush_origin: Point::default(),
            text: TextAttrs {
                font: None,
                align: TextAlign::default(),
                text_color: black,
                bk_color: white,
                bk_mode: BkMode::Opaque,
                char_extra: 0,
                line_extra: 0,
                ramps: GlyphRamps::compute(&fmt, black, white, false),
            },
            scratch: GlyphScratch::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Surface access
    // ------------------------------------------------------------------------

    #[inline]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn into_surface(self) -> Surface {
        self.surface
    }

    /// Device rectangle in screen coordinates.
    #[inline]
    pub fn dev_rc(&self) -> Rect {
        self.coords.dev_rc()
    }

    #[inline]
    pub fn map_rgb(&self, r: u8, g: u8, b: u8) -> Pixel {
        self.surface.format().map_rgb(r, g, b)
    }

    /// Bytes currently held by the glyph scratch arena.
    pub fn scratch_bytes(&self) -> usize {
        self.scratch.capacity_bytes()
    }

    // ------------------------------------------------------------------------
    // Coordinates
    // ------------------------------------------------------------------------

    #[inline]
    pub fn lp_to_dp(&self, p: Point) -> Point {
        self.coords.lp_to_dp(p)
    }

    #[inline]
    pub fn dp_to_lp(&self, p: Point) -> Point {
        self.coords.dp_to_lp(p)
    }

    #[inline]
    pub fn lp_to_sp(&self, p: Point) -> Point {
        self.coords.lp_to_sp(p)
    }

    #[inline]
    pub fn sp_to_lp(&self, p: Point) -> Point {
        self.coords.sp_to_lp(p)
    }

    #[inline]
    pub fn extent_x_lp_to_sp(&self, e: i32) -> i32 {
        self.coords.extent_x_lp_to_sp(e)
    }

    #[inline]
    pub fn extent_y_lp_to_sp(&self, e: i32) -> i32 {
        self.coords.extent_y_lp_to_sp(e)
    }

    #[inline]
    fn sp(&self, x: i32, y: i32) -> Point {
        self.coords.lp_to_sp(Point::new(x, y))
    }

    pub fn map_mode(&self) -> MapMode {
        self.coords.mapping.mode
    }

    pub fn set_map_mode(&mut self, mode: MapMode) -> MapMode {
        std::mem::replace(&mut self.coords.mapping.mode, mode)
    }

    pub fn set_window_org(&mut self, org: Point) {
        self.coords.mapping.set_window_org(org);
    }

    pub fn set_viewport_org(&mut self, org: Point) {
        self.coords.mapping.set_viewport_org(org);
    }

    /// Rejects a zero extent on either axis.
    pub fn set_window_ext(&mut self, ext: Point) -> Result<()> {
        self.coords.mapping.set_window_ext(ext)
    }

    /// Rejects a zero extent on either axis.
    pub fn set_viewport_ext(&mut self, ext: Point) -> Result<()> {
        self.coords.mapping.set_viewport_ext(ext)
    }

    // ------------------------------------------------------------------------
    // Clipping
    // ------------------------------------------------------------------------

    /// Current clip region in screen coordinates.
    #[inline]
    pub fn clip_region(&self) -> &ClipRegion {
        &self.clip
    }

    /// Replace the clip region. `rgn` is in device coordinates and is
    /// limited to the device rectangle.
    pub fn set_clip_region(&mut self, rgn: &ClipRegion) {
        let mut clip = rgn.clone();
        let o = self.coords.dp_to_sp(Point::new(0, 0));
        clip.offset(o.x, o.y);
        match self.coords.dev_rc().intersect(&self.surface.rect()) {
            Some(rc) => clip.intersect_rect(rc),
            None => clip = ClipRegion::empty(),
        }
        self.clip = clip;
    }

    /// Back to the whole device rectangle.
    pub fn reset_clip_region(&mut self) {
        self.clip = self
            .coords
            .dev_rc()
            .intersect(&self.surface.rect())
            .map_or_else(ClipRegion::empty, ClipRegion::from_rect);
    }

    // ------------------------------------------------------------------------
    // Pen and brush attributes
    // ------------------------------------------------------------------------

    pub fn raster_op(&self) -> RasterOp {
        self.rop
    }

    pub fn set_raster_op(&mut self, rop: RasterOp) -> RasterOp {
        std::mem::replace(&mut self.rop, rop)
    }

    pub fn pen_color(&self) -> Pixel {
        self.pen_color
    }

    pub fn set_pen_color(&mut self, color: Pixel) -> Pixel {
        std::mem::replace(&mut self.pen_color, color)
    }

    /// Pen width in logical units. Zero with a solid pen selects the thin
    /// one-pixel line.
    pub fn set_pen_width(&mut self, width: u32) -> u32 {
        std::mem::replace(&mut self.pen.width, width)
    }

    pub fn set_pen_type(&mut self, pen_type: PenType) -> PenType {
        std::mem::replace(&mut self.pen.pen_type, pen_type)
    }

    pub fn set_pen_cap_style(&mut self, cap: LineCap) -> LineCap {
        std::mem::replace(&mut self.pen.cap, cap)
    }

    pub fn set_pen_join_style(&mut self, join: LineJoin) -> LineJoin {
        std::mem::replace(&mut self.pen.join, join)
    }

    /// Dash list (alternating on/off lengths) and its start offset.
    pub fn set_pen_dashes(&mut self, offset: u32, dashes: &[u8]) {
        self.pen.dash_offset = offset;
        self.pen.dashes = dashes.to_vec();
    }

    pub fn pen(&self) -> &WidePen {
        &self.pen
    }

    pub fn brush_color(&self) -> Pixel {
        self.brush_color
    }

    pub fn set_brush_color(&mut self, color: Pixel) -> Pixel {
        std::mem::replace(&mut self.brush_color, color)
    }

    pub fn set_brush_type(&mut self, kind: BrushType) -> BrushType {
        std::mem::replace(&mut self.brush_type, kind)
    }

    pub fn set_brush_info(&mut self, tile: Option<Arc<Tile>>, stipple: Option<Arc<Stipple>>) {
        self.brush_tile = tile;
        self.brush_stipple = stipple;
    }

    /// Brush anchor in device coordinates.
    pub fn set_brush_origin(&mut self, origin: Point) -> Point {
        std::mem::replace(&mut self.brush_origin, origin)
    }

    /// The brush resolved for one call, anchored in screen space.
    fn brush(&self) -> Brush {
        Brush {
            kind: self.brush_type,
            color: self.brush_color,
            tile: self.brush_tile.clone(),
            stipple: self.brush_stipple.clone(),
            origin: self.coords.dp_to_sp(self.brush_origin),
        }
    }

    /// Current pen width in screen pixels.
    fn screen_pen(&self) -> WidePen {
        let mut pen = self.pen.clone();
        if pen.width > 0 {
            pen.width = self.coords.extent_x_lp_to_sp(pen.width as i32).max(1) as u32;
        }
        pen
    }

    // ------------------------------------------------------------------------
    // Text attributes
    // ------------------------------------------------------------------------

    fn update_ramps(&mut self) {
        let t = &mut self.text;
        t.ramps = GlyphRamps::compute(self.surface.format(), t.text_color, t.bk_color, t.bk_mode == BkMode::Transparent);
        trace!("glyph ramps recomputed");
    }

    pub fn text_color(&self) -> Pixel {
        self.text.text_color
    }

    pub fn set_text_color(&mut self, color: Pixel) -> Pixel {
        let old = std::mem::replace(&mut self.text.text_color, color);
        self.update_ramps();
        old
    }

    pub fn bk_color(&self) -> Pixel {
        self.text.bk_color
    }

    pub fn set_bk_color(&mut self, color: Pixel) -> Pixel {
        let old = std::mem::replace(&mut self.text.bk_color, color);
        self.update_ramps();
        old
    }

    pub fn bk_mode(&self) -> BkMode {
        self.text.bk_mode
    }

    pub fn set_bk_mode(&mut self, mode: BkMode) -> BkMode {
        let old = std::mem::replace(&mut self.text.bk_mode, mode);
        self.update_ramps();
        old
    }

    pub fn set_text_align(&mut self, align: TextAlign) -> TextAlign {
        std::mem::replace(&mut self.text.align, align)
    }

    /// Extra advance added after every glyph.
    pub fn set_char_extra(&mut self, extra: i32) -> i32 {
        std::mem::replace(&mut self.text.char_extra, extra)
    }

    /// Offset added to the baseline of every glyph.
    pub fn set_line_extra(&mut self, extra: i32) -> i32 {
        std::mem::replace(&mut self.text.line_extra, extra)
    }

    pub fn font(&self) -> Option<&LogFont> {
        self.text.font.as_ref()
    }

    /// Select `font` and return the previous one.
    pub fn select_font(&mut self, font: LogFont) -> Option<LogFont> {
        let old = self.text.font.replace(font);
        self.update_ramps();
        old
    }

    // ------------------------------------------------------------------------
    // Span painting
    // ------------------------------------------------------------------------

    /// Paint merged spans in one color.
    fn paint_spans(&mut self, spans: &RowSpans, color: Pixel) {
        let Some(rc) = spans.bound() else {
            return;
        };
        let Some(mut ctx) = open(&mut self.surface, &self.clip, rc, self.rop) else {
            return;
        };
        for (x1, x2, y) in spans.iter() {
            ctx.draw_span_color(x1, x2, y, color);
        }
    }

    /// Paint merged spans with the brush.
    fn brush_spans(&mut self, spans: &RowSpans) {
        let Some(rc) = spans.bound() else {
            return;
        };
        let brush = self.brush();
        let bk = self.text.bk_color;
        let Some(mut ctx) = open(&mut self.surface, &self.clip, rc, self.rop) else {
            return;
        };
        for (x1, x2, y) in spans.iter() {
            ctx.fill_hline_clip(x1, x2, y, &brush, bk);
        }
    }

    // ------------------------------------------------------------------------
    // Pixels and thin lines
    // ------------------------------------------------------------------------

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Pixel) {
        let p = self.sp(x, y);
        if let Some(mut ctx) = open(&mut self.surface, &self.clip, Rect::from_xywh(p.x, p.y, 1, 1), self.rop) {
            ctx.draw_pixel_color(p.x, p.y, color);
        }
    }

    /// Pixel at a logical position, or `None` outside the device rectangle.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        let p = self.sp(x, y);
        if !self.coords.dev_rc().contains(p.x, p.y) {
            return None;
        }
        self.surface.get_pixel(p.x, p.y)
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.pen_pos = Point::new(x, y);
    }

    pub fn pen_pos(&self) -> Point {
        self.pen_pos
    }

    /// Thin line from the pen position to `(x, y)`, which becomes the new
    /// pen position. Both endpoints are drawn.
    pub fn line_to(&mut self, x: i32, y: i32) {
        let start = self.sp(self.pen_pos.x, self.pen_pos.y);
        self.pen_pos = Point::new(x, y);
        let end = self.sp(x, y);
        self.thin_line(start, end);
    }

    fn thin_line(&mut self, a: Point, b: Point) {
        // Step from the lexicographically smaller end so that a line and
        // its reverse touch the same pixels.
        let (a, b) = if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) };
        let mut rc = Rect::new(a.x, a.y, b.x, b.y).normalized();
        rc.inflate(1, 1);
        let color = self.pen_color;
        let Some(mut ctx) = open(&mut self.surface, &self.clip, rc, self.rop) else {
            return;
        };
        ctx.set_color(color);

        if a == b {
            ctx.set_pixel_clip(a.x, a.y);
        } else if a.y == b.y {
            ctx.draw_hline_clip(a.x, b.x, a.y);
        } else if a.x == b.x {
            ctx.draw_vline_clip(a.y, b.y, a.x);
        } else {
            let out = ctx.rc_output();
            if let Some(walk) = clip_line(a, b, &out) {
                for p in walk.points() {
                    ctx.set_pixel_clip(p.x, p.y);
                }
            }
        }
    }

    /// Thin line between two logical points; the pen ends at `(x2, y2)`.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.move_to(x1, y1);
        self.line_to(x2, y2);
    }

    pub fn poly_line_to(&mut self, pts: &[Point]) {
        let Some((first, rest)) = pts.split_first() else {
            return;
        };
        self.move_to(first.x, first.y);
        for p in rest {
            self.line_to(p.x, p.y);
        }
    }

    /// Outline with both corners inclusive, in the pen color.
    pub fn rectangle(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.outline_rect(Point::new(x0, y0), Point::new(x1, y1), 1, self.rop);
    }

    /// Dotted XOR outline; drawing it twice restores the surface.
    pub fn focus_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.outline_rect(Point::new(x0, y0), Point::new(x1, y1), 2, RasterOp::Xor);
    }

    fn outline_rect(&mut self, p0: Point, p1: Point, step: i32, rop: RasterOp) {
        let a = self.sp(p0.x, p0.y);
        let b = self.sp(p1.x, p1.y);
        let color = self.pen_color;
        let rc = Rect::new(a.x, a.y, b.x, b.y).normalized();
        let (l, t, r, btm) = (rc.left, rc.top, rc.right, rc.bottom);
        let Some(mut ctx) = open(&mut self.surface, &self.clip, Rect::new(l, t, r + 1, btm + 1), rop) else {
            return;
        };
        ctx.set_color(color);
        ctx.set_step(step);
        if l == r && t == btm {
            ctx.set_pixel_clip(l, t);
            return;
        }
        ctx.draw_hline_clip(l, r, t);
        if t != btm {
            ctx.draw_hline_clip(l, r, btm);
        }
        // Corners already belong to the horizontal edges.
        if btm - t > 1 {
            ctx.draw_vline_clip(t + 1, btm - 1, l);
            if l != r {
                ctx.draw_vline_clip(t + 1, btm - 1, r);
            }
        }
    }

    /// Dotted horizontal (`horizontal`) or vertical line of `len` pixels
    /// from `(x, y)`, touching every other pixel.
    pub fn draw_hv_dot_line(&mut self, x: i32, y: i32, len: i32, horizontal: bool) {
        if len < 1 {
            return;
        }
        let p = self.sp(x, y);
        let rc = if horizontal {
            Rect::from_xywh(p.x, p.y, len, 1)
        } else {
            Rect::from_xywh(p.x, p.y, 1, len)
        };
        let color = self.pen_color;
        let Some(mut ctx) = open(&mut self.surface, &self.clip, rc, self.rop) else {
            return;
        };
        ctx.set_color(color);
        ctx.set_step(2);
        if horizontal {
            ctx.draw_hline_clip(p.x, p.x + len - 1, p.y);
        } else {
            ctx.draw_vline_clip(p.y, p.y + len - 1, p.x);
        }
    }

    // ------------------------------------------------------------------------
    // Area fills
    // ------------------------------------------------------------------------

    /// Fill `w x h` logical units from `(x, y)` with the brush.
    pub fn fill_box(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 {
            return;
        }
        let a = self.sp(x, y);
        let b = self.sp(x + w, y + h);
        let rc = Rect::new(a.x, a.y, b.x, b.y).normalized();
        let brush = self.brush();
        let bk = self.text.bk_color;
        let Some(mut ctx) = open(&mut self.surface, &self.clip, rc, self.rop) else {
            return;
        };
        if brush.kind == BrushType::Solid {
            ctx.set_color(brush.color);
            ctx.fill_box(&rc);
        } else {
            for row in rc.top..rc.bottom {
                ctx.fill_hline_clip(rc.left, rc.right - 1, row, &brush, bk);
            }
        }
    }

    /// Fill a polygon with the brush. Vertically monotone polygons use the
    /// single-span generator, others the even-odd edge-list generator.
    pub fn fill_polygon(&mut self, pts: &[Point]) -> Result<()> {
        if pts.len() < 3 {
            return Ok(());
        }
        let is_mv = polygon_is_monotone_vertical(pts);
        let screen: Vec<Point> = pts.iter().map(|p| self.sp(p.x, p.y)).collect();
        let bound = Rect::from_points(&screen);

        let mut spans = RowSpans::new();
        if bound.width() == 1 || bound.height() == 1 {
            spans.add(bound.left, bound.right - 1, bound.top)?;
            for y in bound.top + 1..bound.bottom {
                spans.add(bound.left, bound.left, y)?;
            }
            spans.normalize();
        } else {
            let mut res = Ok(());
            let mut add = |x1: i32, x2: i32, y: i32| {
                if res.is_ok() {
                    res = spans.add(x1.min(x2), x1.max(x2), y);
                }
            };
            if is_mv {
                monotone_vertical_polygon_generator(&screen, &mut add)?;
            } else {
                polygon_generator(&screen, Some((bound.top, bound.bottom - 1)), &mut add)?;
            }
            res?;
            spans.normalize();
        }
        trace!("fill polygon of {} vertices, monotone = {}", pts.len(), is_mv);
        self.brush_spans(&spans);
        Ok(())
    }

    /// Fill the 4-connected area around `(x, y)` that has the start pixel's
    /// color, with the brush. Starting on the brush color does nothing.
    pub fn flood_fill(&mut self, x: i32, y: i32) -> Result<()> {
        let p = self.sp(x, y);
        let Some(dst) = self.coords.dev_rc().intersect(&self.surface.rect()) else {
            return Ok(());
        };
        let Some(skip) = self.surface.get_pixel(p.x, p.y) else {
            return Ok(());
        };
        if !dst.contains(p.x, p.y) || skip == self.brush_color {
            return Ok(());
        }
        let brush = self.brush();
        let bk_color = self.text.bk_color;
        let Some(ctx) = open(&mut self.surface, &self.clip, dst, self.rop) else {
            return Ok(());
        };
        let mut painter = FloodPainter {
            ctx,
            skip,
            brush,
            bk_color,
        };
        flood_fill_generator(&mut painter, &dst, p.x, p.y)
    }

    // ------------------------------------------------------------------------
    // Circles and ellipses
    // ------------------------------------------------------------------------

    /// Circle outline in the pen color. The radius scales with the
    /// horizontal extent; below one it is the single centre pixel.
    pub fn circle(&mut self, x: i32, y: i32, r: i32) -> Result<()> {
        let c = self.sp(x, y);
        let r = self.coords.extent_x_lp_to_sp(r);
        let mut spans = RowSpans::new();
        collect_pairs(&mut spans, |cb| circle_generator(c.x, c.y, r, cb))?;
        self.paint_spans(&spans, self.pen_color);
        Ok(())
    }

    pub fn fill_circle(&mut self, x: i32, y: i32, r: i32) -> Result<()> {
        let c = self.sp(x, y);
        let r = self.coords.extent_x_lp_to_sp(r);
        let mut spans = RowSpans::new();
        collect_spans(&mut spans, |cb| circle_generator(c.x, c.y, r, cb))?;
        self.brush_spans(&spans);
        Ok(())
    }

    /// Ellipse outline in the pen color; a zero radius on either axis is
    /// the single centre pixel.
    pub fn ellipse(&mut self, x: i32, y: i32, rx: i32, ry: i32) -> Result<()> {
        let c = self.sp(x, y);
        let (rx, ry) = (self.coords.extent_x_lp_to_sp(rx), self.coords.extent_y_lp_to_sp(ry));
        let mut spans = RowSpans::new();
        collect_pairs(&mut spans, |cb| ellipse_generator(c.x, c.y, rx, ry, cb))?;
        self.paint_spans(&spans, self.pen_color);
        Ok(())
    }

    pub fn fill_ellipse(&mut self, x: i32, y: i32, rx: i32, ry: i32) -> Result<()> {
        let c = self.sp(x, y);
        let (rx, ry) = (self.coords.extent_x_lp_to_sp(rx), self.coords.extent_y_lp_to_sp(ry));
        let mut spans = RowSpans::new();
        collect_spans(&mut spans, |cb| ellipse_generator(c.x, c.y, rx, ry, cb))?;
        self.brush_spans(&spans);
        Ok(())
    }

    /// Circle arc from `ang1` over the signed sweep `ang2`, both in 1/64
    /// degree, in the pen color.
    pub fn circle_arc(&mut self, x: i32, y: i32, r: i32, ang1: i32, ang2: i32) -> Result<()> {
        let c = self.sp(x, y);
        let r = self.coords.extent_x_lp_to_sp(r);
        let mut spans = RowSpans::new();
        if r < 1 {
            spans.add(c.x, c.x, c.y)?;
        } else {
            collect_points(&mut spans, |cb| circle_arc_generator(c.x, c.y, r, ang1, ang2, cb))?;
        }
        self.paint_spans(&spans, self.pen_color);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Arcs with pen width
    // ------------------------------------------------------------------------

    fn arc_to_sp(&self, a: &ArcSpec) -> ArcSpec {
        let p = self.sp(a.x, a.y);
        ArcSpec::new(
            p.x,
            p.y,
            self.coords.extent_x_lp_to_sp(a.width),
            self.coords.extent_y_lp_to_sp(a.height),
            a.angle1,
            a.angle2,
        )
    }

    /// Arc of the ellipse inscribed in `(x, y, width, height)`, stroked
    /// with the pen width. Arcs are always drawn solid.
    pub fn arc_ex(&mut self, x: i32, y: i32, width: i32, height: i32, ang1: i32, ang2: i32) -> Result<()> {
        self.poly_arc_ex(&[ArcSpec::new(x, y, width, height, ang1, ang2)])
    }

    pub fn poly_arc_ex(&mut self, arcs: &[ArcSpec]) -> Result<()> {
        let width = self.screen_pen().width as i32;
        let clip = self.clip.bound();
        let mut spans = RowSpans::new();
        for a in arcs {
            let arc = self.arc_to_sp(a);
            if width == 0 {
                collect_points(&mut spans, |cb| ellipse_arc_generator(&arc, &clip, cb))?;
            } else {
                collect_spans(&mut spans, |cb| wide_arc_generator(&arc, width, &clip, cb))?;
            }
        }
        self.paint_spans(&spans, self.pen_color);
        Ok(())
    }

    /// Pie slice of the ellipse inscribed in `(x, y, width, height)`,
    /// filled with the brush.
    pub fn fill_arc_ex(&mut self, x: i32, y: i32, width: i32, height: i32, ang1: i32, ang2: i32) -> Result<()> {
        self.poly_fill_arc_ex(&[ArcSpec::new(x, y, width, height, ang1, ang2)])
    }

    pub fn poly_fill_arc_ex(&mut self, arcs: &[ArcSpec]) -> Result<()> {
        let clip = self.clip.bound();
        let mut spans = RowSpans::new();
        for a in arcs {
            let arc = self.arc_to_sp(a);
            collect_spans(&mut spans, |cb| fill_arc_generator(&arc, &clip, cb))?;
        }
        self.brush_spans(&spans);
        Ok(())
    }

    /// Rounded rectangle with corner radii `rw`, `rh`: brush interior, pen
    /// outline. Returns `false` for an empty rectangle or radii that do not
    /// fit.
    pub fn round_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, rw: i32, rh: i32) -> Result<bool> {
        if x0 >= x1 || y0 >= y1 {
            return Ok(false);
        }
        let (cw, ch) = (rw * 2, rh * 2);
        if cw > x1 - x0 || ch > y1 - y0 || cw < 0 || ch < 0 {
            return Ok(false);
        }

        if rw == 0 || rh == 0 {
            self.fill_box(x0, y0, x1 - x0, y1 - y0);
            let pts = [
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
                Point::new(x0, y0),
            ];
            self.poly_line_ex(&pts)?;
            return Ok(true);
        }

        const QUARTER: i32 = 90 * 64;
        let corners = [
            ArcSpec::new(x0, y0, cw, ch, QUARTER, QUARTER),
            ArcSpec::new(x1 - cw, y0, cw, ch, 0, QUARTER),
            ArcSpec::new(x1 - cw, y1 - ch, cw, ch, -QUARTER, QUARTER),
            ArcSpec::new(x0, y1 - ch, cw, ch, -QUARTER, -QUARTER),
        ];
        self.poly_fill_arc_ex(&corners)?;
        self.fill_box(x0 + rw, y0, (x1 - x0) - cw, rh);
        self.fill_box(x0, y0 + rh, x1 - x0, (y1 - y0) - ch);
        self.fill_box(x0 + rw, y1 - rh, (x1 - x0) - cw, rh);

        self.poly_arc_ex(&corners)?;
        self.line_ex(x0 + rw, y0, x1 - rw, y0)?;
        self.line_ex(x0 + rw, y1, x1 - rw, y1)?;
        self.line_ex(x0, y0 + rh, x0, y1 - rh)?;
        self.line_ex(x1, y0 + rh, x1, y1 - rh)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Wide and dashed lines
    // ------------------------------------------------------------------------

    /// Line stroked with the full pen. A zero-width solid pen draws the
    /// thin line and moves the pen position.
    pub fn line_ex(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<()> {
        self.poly_line_ex(&[Point::new(x1, y1), Point::new(x2, y2)])
    }

    /// Polyline stroked with the full pen: caps at the two open ends,
    /// joins at every interior vertex, dashes continued across vertices.
    pub fn poly_line_ex(&mut self, pts: &[Point]) -> Result<()> {
        if pts.len() < 2 {
            return Ok(());
        }
        if self.pen.is_thin() {
            self.poly_line_to(pts);
            return Ok(());
        }
        let screen: Vec<Point> = pts.iter().map(|p| self.sp(p.x, p.y)).collect();
        let spans = wide_polyline(&screen, &self.screen_pen())?;
        self.paint_spans(&spans.off, self.text.bk_color);
        self.paint_spans(&spans.on, self.pen_color);
        Ok(())
    }

    /// Cubic Bezier through the control points `cp`, flattened and drawn
    /// with the pen.
    pub fn spline_to(&mut self, cp: &[Point; 4]) -> Result<()> {
        let pts = spline_points(cp);
        self.poly_line_ex(&pts)?;
        if let Some(last) = pts.last() {
            self.move_to(last.x, last.y);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Glyphs
    // ------------------------------------------------------------------------

    /// Draw one glyph at a logical point interpreted by the vertical text
    /// alignment. Returns the advance in device pixels.
    pub fn draw_glyph(&mut self, x: i32, y: i32, glyph: Glyph32) -> Result<Advance> {
        self.draw_glyph_string(x, y, &[glyph])
    }

    /// Draw `glyphs` along the baseline, accumulating the pen position.
    /// Without a selected font nothing is drawn.
    pub fn draw_glyph_string(&mut self, x: i32, y: i32, glyphs: &[Glyph32]) -> Result<Advance> {
        let Some(font) = self.text.font.as_ref() else {
            return Ok(Advance::default());
        };
        let Some(bound) = self.coords.dev_rc().intersect(&self.surface.rect()) else {
            return Ok(Advance::default());
        };
        let p = self.coords.lp_to_sp(Point::new(x, y));
        let p = glyph::baseline_point(font, self.text.align.vert, p);
        let st = self.text.state(font);
        let mut canvas = GlyphCanvas {
            surface: &mut self.surface,
            clip: &self.clip,
            bound,
            scratch: &mut self.scratch,
        };
        glyph::draw_glyph_string(&mut canvas, &st, glyphs, p.x, p.y)
    }

    /// Total advance of `glyphs` and the size of the box they cover.
    pub fn get_glyphs_extent(&self, glyphs: &[Glyph32]) -> (i32, Size) {
        match self.text.font.as_ref() {
            Some(font) => glyph::glyphs_extent(&self.text.state(font), glyphs),
            None => (0, Size::default()),
        }
    }

    pub fn get_glyph_info(&self, glyph: Glyph32) -> Option<GlyphInfo> {
        glyph::get_glyph_info(self.text.font.as_ref()?, glyph)
    }

    /// Extra width synthesized italic adds to a run of the current font.
    pub fn italic_added_width(&self) -> i32 {
        self.text.font.as_ref().map_or(0, glyph::italic_added_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap_fonts::RawBitmapFont;
    use crate::devfont::FontStyle;
    use crate::error::init_logging;
    use crate::glyph::{HorzAlign, VertAlign};
    use crate::pixel_format::PixelFormat;

    const A: Pixel = 3;
    const B: Pixel = 5;
    const C: Pixel = 7;
    const PEN: Pixel = 9;

    fn make_dc(w: u32, h: u32) -> DeviceContext {
        let s = Surface::new(w, h, PixelFormat::indexed8()).unwrap();
        let mut dc = DeviceContext::new(s);
        dc.set_pen_color(PEN);
        dc
    }

    fn make_font() -> LogFont {
        let glyphs: &[&[&str]] = &[&["#.#", ".#.", "###", "..."], &["###", "#..", "#..", "..."]];
        let f = RawBitmapFont::from_rows("fixed-3x4", 3, 0x41, glyphs).unwrap();
        LogFont::new(Arc::new(f))
    }

    fn written(dc: &DeviceContext) -> Vec<(i32, i32)> {
        let s = dc.surface();
        let mut out = Vec::new();
        for y in 0..s.height() as i32 {
            for x in 0..s.width() as i32 {
                if s.get_pixel(x, y) != Some(0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_flood_fill_inner_box() {
        init_logging();
        let mut dc = make_dc(100, 100);
        dc.set_brush_color(A);
        dc.fill_box(10, 10, 80, 80);
        dc.set_brush_color(B);
        dc.fill_box(30, 30, 20, 20);
        dc.set_brush_color(C);
        dc.flood_fill(40, 40).unwrap();

        let s = dc.surface();
        assert_eq!(s.count_pixels(C), 400);
        assert_eq!(s.count_pixels(B), 0);
        assert_eq!(s.count_pixels(A), 80 * 80 - 400);
        assert_eq!(s.count_pixels(0), 100 * 100 - 80 * 80);
        assert!((30..50).all(|y| (30..50).all(|x| s.get_pixel(x, y) == Some(C))));
    }

    #[test]
    fn test_flood_fill_is_idempotent() {
        let mut dc = make_dc(40, 40);
        dc.set_brush_color(A);
        dc.fill_box(5, 5, 20, 20);
        let before = dc.surface().data().to_vec();
        for (x, y) in [(5, 5), (12, 17), (24, 24)] {
            dc.flood_fill(x, y).unwrap();
            assert_eq!(dc.surface().data(), &before[..]);
        }
    }

    #[test]
    fn test_flood_fill_respects_boundary() {
        let mut dc = make_dc(60, 60);
        dc.rectangle(10, 10, 40, 30);
        let outline = written(&dc);
        dc.set_brush_color(C);
        dc.flood_fill(20, 20).unwrap();

        let s = dc.surface();
        assert_eq!(s.count_pixels(C), 29 * 19);
        for y in 0..60 {
            for x in 0..60 {
                let inside = x > 10 && x < 40 && y > 10 && y < 30;
                if !inside && !outline.contains(&(x, y)) {
                    assert_eq!(s.get_pixel(x, y), Some(0), "({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_circle_and_ellipse() {
        let mut dc = make_dc(100, 100);
        dc.circle(50, 50, 0).unwrap();
        assert_eq!(written(&dc), vec![(50, 50)]);

        for (rx, ry) in [(0, 7), (7, 0), (0, 0)] {
            let mut e = make_dc(100, 100);
            e.ellipse(50, 50, rx, ry).unwrap();
            assert_eq!(written(&e), vec![(50, 50)]);
        }
    }

    #[test]
    fn test_circle_outline_and_fill() {
        let mut dc = make_dc(40, 40);
        dc.circle(20, 20, 5).unwrap();
        let pts = written(&dc);
        assert!(pts.contains(&(25, 20)) && pts.contains(&(15, 20)));
        assert!(pts.contains(&(20, 15)) && pts.contains(&(20, 25)));
        assert!(!pts.contains(&(20, 20)));

        let mut f = make_dc(40, 40);
        f.set_brush_color(A);
        f.fill_circle(20, 20, 5).unwrap();
        assert_eq!(f.surface().get_pixel(20, 20), Some(A));
        // The fill covers the outline exactly.
        for (x, y) in pts {
            assert_eq!(f.surface().get_pixel(x, y), Some(A));
        }
    }

    #[test]
    fn test_xor_fill_touches_each_pixel_once() {
        let mut dc = make_dc(40, 40);
        dc.set_raster_op(RasterOp::Xor);
        dc.set_brush_color(A);
        dc.fill_ellipse(20, 20, 9, 4).unwrap();
        assert_eq!(dc.surface().get_pixel(20, 20), Some(A));
        assert_eq!(dc.surface().count_pixels(0) + dc.surface().count_pixels(A), 1600);
        dc.fill_ellipse(20, 20, 9, 4).unwrap();
        assert_eq!(dc.surface().count_pixels(0), 1600);
    }

    #[test]
    fn test_line_symmetry() {
        let lines = [(0, 0, 2, 1), (3, 17, 29, 4), (5, 5, 6, 30), (31, 2, 1, 9), (10, 10, 25, 10), (8, 3, 8, 27)];
        for (x1, y1, x2, y2) in lines {
            let mut fwd = make_dc(32, 32);
            fwd.line(x1, y1, x2, y2);
            let mut back = make_dc(32, 32);
            back.line(x2, y2, x1, y1);
            assert_eq!(written(&fwd), written(&back), "line {:?}", (x1, y1, x2, y2));
            assert!(written(&fwd).contains(&(x1, y1)) && written(&fwd).contains(&(x2, y2)));
        }
    }

    #[test]
    fn test_pen_position_and_poly_line() {
        let mut dc = make_dc(20, 20);
        dc.poly_line_to(&[Point::new(1, 1), Point::new(5, 1), Point::new(5, 4)]);
        assert_eq!(dc.pen_pos(), Point::new(5, 4));
        assert_eq!(written(&dc).len(), 5 + 3);
    }

    #[test]
    fn test_clip_containment() {
        init_logging();
        let mut dc = make_dc(80, 60);
        dc.set_clip_region(&ClipRegion::from_rect(Rect::new(20, 15, 45, 35)));
        dc.set_brush_color(A);
        dc.select_font(make_font());

        dc.line(0, 0, 79, 59);
        dc.line(0, 25, 79, 25);
        dc.rectangle(5, 5, 70, 50);
        dc.circle(30, 30, 20).unwrap();
        dc.fill_ellipse(40, 20, 30, 10).unwrap();
        dc.fill_polygon(&[Point::new(0, 0), Point::new(79, 10), Point::new(10, 59)]).unwrap();
        dc.arc_ex(10, 10, 50, 40, 0, 270 * 64).unwrap();
        dc.fill_arc_ex(10, 10, 50, 40, 45 * 64, 90 * 64).unwrap();
        dc.set_pen_width(7);
        dc.poly_line_ex(&[Point::new(0, 40), Point::new(40, 0), Point::new(79, 40)]).unwrap();
        dc.round_rect(12, 12, 70, 50, 8, 6).unwrap();
        dc.draw_glyph_string(18, 20, &[0x41, 0x42, 0x41, 0x42, 0x41, 0x42, 0x41, 0x42, 0x41]).unwrap();
        dc.set_brush_color(C);
        dc.flood_fill(21, 16).unwrap();

        let clip = Rect::new(20, 15, 45, 35);
        let pts = written(&dc);
        assert!(!pts.is_empty());
        assert!(pts.iter().all(|&(x, y)| clip.contains(x, y)));
    }

    #[test]
    fn test_clipped_lines_match_unclipped_inside_clip() {
        let clip = Rect::new(15, 5, 38, 49);
        let lines = [(4, 43, 22, 1), (0, 0, 59, 53), (59, 2, 1, 50), (16, 0, 37, 59), (0, 30, 59, 27)];
        for (x1, y1, x2, y2) in lines {
            let mut full = make_dc(60, 60);
            full.line(x1, y1, x2, y2);
            let mut clipped = make_dc(60, 60);
            clipped.set_clip_region(&ClipRegion::from_rect(clip));
            clipped.line(x1, y1, x2, y2);
            let expected: Vec<_> = written(&full).into_iter().filter(|&(x, y)| clip.contains(x, y)).collect();
            assert_eq!(written(&clipped), expected, "line {:?}", (x1, y1, x2, y2));
        }
    }

    #[test]
    fn test_window_context_translates_and_clips() {
        let s = Surface::new(50, 40, PixelFormat::indexed8()).unwrap();
        let mut dc = DeviceContext::with_device_rect(s, Rect::new(10, 5, 30, 25));
        dc.set_pixel(0, 0, A);
        assert_eq!(dc.surface().get_pixel(10, 5), Some(A));
        assert_eq!(dc.get_pixel(0, 0), Some(A));
        assert_eq!(dc.get_pixel(-1, 0), None);

        dc.set_brush_color(B);
        dc.fill_box(-100, -100, 500, 500);
        assert_eq!(dc.surface().count_pixels(B), 20 * 20);
        assert_eq!(dc.surface().get_pixel(9, 5), Some(0));
    }

    #[test]
    fn test_mapping_round_trip_and_extents() {
        let s = Surface::new(100, 100, PixelFormat::indexed8()).unwrap();
        let mut dc = DeviceContext::with_device_rect(s, Rect::new(0, 0, 100, 100));
        dc.set_pen_color(PEN);
        dc.set_map_mode(MapMode::Anisotropic);
        dc.set_window_org(Point::new(-7, 4));
        dc.set_window_ext(Point::new(2, 3)).unwrap();
        dc.set_viewport_ext(Point::new(3, 7)).unwrap();
        assert!(dc.set_window_ext(Point::new(0, 5)).is_err());

        for (x, y) in [(0, 0), (13, -8), (-40, 91), (255, 3)] {
            let p = Point::new(x, y);
            let back = dc.dp_to_lp(dc.lp_to_dp(p));
            assert!((back.x - x).abs() <= 1 && (back.y - y).abs() <= 1, "{:?} -> {:?}", p, back);
        }
        assert_eq!(dc.extent_x_lp_to_sp(6), 9);

        // A radius of 3 logical units is 7 device pixels wide.
        dc.set_window_org(Point::new(0, 0));
        dc.set_viewport_ext(Point::new(7, 7)).unwrap();
        dc.set_window_ext(Point::new(3, 3)).unwrap();
        dc.circle(0, 0, 3).unwrap();
        assert_eq!(dc.surface().get_pixel(7, 0), Some(PEN));
    }

    #[test]
    fn test_rectangle_and_focus_rect() {
        let mut dc = make_dc(20, 20);
        dc.rectangle(12, 9, 2, 3);
        assert_eq!(dc.surface().count_pixels(PEN), 2 * 11 + 2 * 5);

        let mut f = make_dc(20, 20);
        f.focus_rect(2, 3, 12, 9);
        let dots = written(&f);
        assert!(dots.contains(&(2, 3)) && !dots.contains(&(3, 3)) && dots.contains(&(4, 3)));
        f.focus_rect(2, 3, 12, 9);
        assert!(written(&f).is_empty());
        assert_eq!(f.raster_op(), RasterOp::Set);
    }

    #[test]
    fn test_short_focus_rect_keeps_side_pixels() {
        // Three rows tall: each side is one pixel at an odd row.
        let mut f = make_dc(20, 20);
        f.focus_rect(2, 4, 12, 6);
        let dots = written(&f);
        assert!(dots.contains(&(2, 5)) && dots.contains(&(12, 5)));
        assert!(dots.contains(&(2, 4)) && dots.contains(&(2, 6)));
    }

    #[test]
    fn test_dot_lines() {
        let mut dc = make_dc(20, 20);
        dc.draw_hv_dot_line(3, 2, 7, true);
        assert_eq!(written(&dc), vec![(3, 2), (5, 2), (7, 2), (9, 2)]);
        let mut v = make_dc(20, 20);
        v.draw_hv_dot_line(4, 1, 4, false);
        assert_eq!(written(&v), vec![(4, 1), (4, 3)]);
        v.draw_hv_dot_line(4, 1, 0, false);
        assert_eq!(written(&v).len(), 2);
    }

    #[test]
    fn test_fill_polygon_monotone_and_general() {
        let mut dc = make_dc(30, 30);
        dc.set_brush_color(A);
        let tri = [Point::new(5, 5), Point::new(20, 5), Point::new(5, 20)];
        dc.fill_polygon(&tri).unwrap();
        assert_eq!(dc.surface().get_pixel(6, 6), Some(A));
        assert_eq!(dc.surface().get_pixel(19, 19), Some(0));

        // A "U": the notch between the arms stays empty.
        let mut u = make_dc(30, 30);
        u.set_brush_color(B);
        let shape = [
            Point::new(2, 2),
            Point::new(8, 2),
            Point::new(8, 15),
            Point::new(20, 15),
            Point::new(20, 2),
            Point::new(26, 2),
            Point::new(26, 25),
            Point::new(2, 25),
        ];
        u.fill_polygon(&shape).unwrap();
        assert_eq!(u.surface().get_pixel(4, 10), Some(B));
        assert_eq!(u.surface().get_pixel(23, 10), Some(B));
        assert_eq!(u.surface().get_pixel(14, 8), Some(0));
        assert_eq!(u.surface().get_pixel(14, 20), Some(B));

        let mut flat = make_dc(30, 30);
        flat.set_brush_color(C);
        flat.fill_polygon(&[Point::new(3, 4), Point::new(9, 4), Point::new(6, 4)]).unwrap();
        assert_eq!(flat.surface().count_pixels(C), 7);
        assert!(flat.fill_polygon(&[Point::new(1, 1), Point::new(2, 2)]).is_ok());
    }

    #[test]
    fn test_wide_lines_and_dashes() {
        let mut dc = make_dc(40, 20);
        dc.set_pen_width(3);
        dc.line_ex(5, 10, 25, 10).unwrap();
        assert_eq!(dc.surface().count_pixels(PEN), 3 * 20);
        // Wide lines leave the pen position alone.
        assert_eq!(dc.pen_pos(), Point::default());

        let mut d = make_dc(40, 20);
        d.set_bk_color(B);
        d.set_pen_type(PenType::DoubleDash);
        d.set_pen_dashes(0, &[2, 3]);
        d.line_ex(0, 5, 10, 5).unwrap();
        let row: Vec<Pixel> = (0..10).map(|x| d.surface().get_pixel(x, 5).unwrap()).collect();
        assert_eq!(row, vec![PEN, PEN, B, B, B, PEN, PEN, B, B, B]);
    }

    #[test]
    fn test_xor_polyline_joins_are_not_doubled() {
        let mut dc = make_dc(40, 40);
        dc.set_raster_op(RasterOp::Xor);
        dc.set_pen_width(5);
        dc.set_pen_join_style(LineJoin::Round);
        dc.set_pen_cap_style(LineCap::Round);
        let pts = [Point::new(5, 5), Point::new(30, 8), Point::new(12, 33)];
        dc.poly_line_ex(&pts).unwrap();
        let expected = wide_polyline(&pts, dc.pen()).unwrap().on.pixel_count();
        assert_eq!(dc.surface().count_pixels(PEN), expected);
        dc.poly_line_ex(&pts).unwrap();
        assert!(written(&dc).is_empty());
    }

    #[test]
    fn test_arcs() {
        let mut dc = make_dc(60, 60);
        dc.circle_arc(30, 30, 10, 0, 90 * 64).unwrap();
        let pts = written(&dc);
        assert!(pts.contains(&(40, 30)) && pts.contains(&(30, 20)));
        assert!(pts.iter().all(|&(x, y)| x >= 30 && y <= 30));

        let mut pie = make_dc(60, 60);
        pie.set_brush_color(A);
        pie.fill_arc_ex(10, 10, 40, 40, 0, 90 * 64).unwrap();
        assert_eq!(pie.surface().get_pixel(35, 25), Some(A));
        assert_eq!(pie.surface().get_pixel(25, 35), Some(0));

        let mut thick = make_dc(60, 60);
        thick.set_pen_width(4);
        thick.arc_ex(10, 10, 40, 40, 0, 360 * 64).unwrap();
        assert_eq!(thick.surface().get_pixel(50, 30), Some(PEN));
        assert_eq!(thick.surface().get_pixel(30, 30), Some(0));
    }

    #[test]
    fn test_huge_arcs_draw_only_inside_clip() {
        let clip = Rect::new(10, 10, 30, 25);
        let mut full = make_dc(40, 40);
        let mut part = make_dc(40, 40);
        part.set_clip_region(&ClipRegion::from_rect(clip));
        for dc in [&mut full, &mut part] {
            dc.set_brush_color(A);
            dc.fill_arc_ex(-3000, -2980, 6000, 6000, 0, 120 * 64).unwrap();
            dc.set_pen_width(3);
            dc.arc_ex(-40, 15, 60, 60, 0, 360 * 64).unwrap();
        }
        let expected: Vec<_> = written(&full).into_iter().filter(|&(x, y)| clip.contains(x, y)).collect();
        assert!(!expected.is_empty());
        assert_eq!(written(&part), expected);
    }

    #[test]
    fn test_round_rect() {
        let mut dc = make_dc(50, 50);
        dc.set_brush_color(A);
        assert!(!dc.round_rect(10, 10, 5, 30, 2, 2).unwrap());
        assert!(!dc.round_rect(10, 10, 20, 20, 6, 2).unwrap());
        assert!(!dc.round_rect(10, 10, 20, 20, -1, 2).unwrap());
        assert!(written(&dc).is_empty());

        assert!(dc.round_rect(10, 10, 40, 30, 5, 4).unwrap());
        let s = dc.surface();
        assert_eq!(s.get_pixel(25, 20), Some(A));
        assert_eq!(s.get_pixel(25, 10), Some(PEN));
        assert_eq!(s.get_pixel(10, 20), Some(PEN));
        // The corner itself is cut off.
        assert_eq!(s.get_pixel(10, 10), Some(0));

        let mut sq = make_dc(50, 50);
        sq.set_brush_color(A);
        assert!(sq.round_rect(10, 10, 20, 20, 0, 3).unwrap());
        assert_eq!(sq.surface().get_pixel(10, 10), Some(PEN));
        assert_eq!(sq.surface().get_pixel(15, 15), Some(A));
    }

    #[test]
    fn test_spline_endpoints() {
        let mut dc = make_dc(60, 60);
        let cp = [Point::new(5, 50), Point::new(15, 5), Point::new(45, 5), Point::new(55, 50)];
        dc.spline_to(&cp).unwrap();
        assert_eq!(dc.surface().get_pixel(5, 50), Some(PEN));
        assert!(dc.surface().count_pixels(PEN) > 50);
        let end = dc.pen_pos();
        assert!((end.x - 55).abs() <= 1 && (end.y - 50).abs() <= 1);
    }

    #[test]
    fn test_tiled_brush_fill() {
        let mut dc = make_dc(20, 20);
        let tile = Tile::new(2, 1, vec![A, B]).unwrap();
        dc.set_brush_type(BrushType::Tiled);
        dc.set_brush_info(Some(Arc::new(tile)), None);
        dc.fill_box(0, 0, 4, 1);
        let row: Vec<Pixel> = (0..4).map(|x| dc.surface().get_pixel(x, 0).unwrap()).collect();
        assert_eq!(row, vec![A, B, A, B]);
    }

    #[test]
    fn test_text_drawing_and_alignment() {
        let s = Surface::new(30, 20, PixelFormat::rgb888()).unwrap();
        let mut dc = DeviceContext::new(s);
        let white = dc.map_rgb(255, 255, 255);
        dc.set_text_color(white);
        dc.set_bk_mode(BkMode::Transparent);
        assert_eq!(dc.draw_glyph(2, 5, 0x41).unwrap(), Advance::default());

        dc.select_font(make_font());
        dc.set_text_align(TextAlign::new(HorzAlign::Left, VertAlign::Top));
        let adv = dc.draw_glyph(2, 5, 0x41).unwrap();
        assert_eq!(adv.len, 3);
        let at = |x: i32, y: i32| dc.surface().get_pixel(x, y) == Some(white);
        assert!(at(2, 5) && !at(3, 5) && at(4, 5));
        assert!(at(3, 6));
        assert!(at(2, 7) && at(3, 7) && at(4, 7));
        assert_eq!(dc.surface().count_pixels(white), 6);
    }

    #[test]
    fn test_glyph_advance_additivity() {
        let s = Surface::new(10, 10, PixelFormat::rgb888()).unwrap();
        let mut dc = DeviceContext::new(s);
        assert_eq!(dc.get_glyphs_extent(&[0x41]), (0, Size::default()));
        dc.select_font(make_font());
        let a = dc.get_glyph_info(0x41).unwrap().advance;
        let b = dc.get_glyph_info(0x42).unwrap().advance;
        let (total, size) = dc.get_glyphs_extent(&[0x41, 0x42]);
        assert_eq!(total, a.len + b.len);
        assert_eq!(size.cx, a.dx + b.dx);

        dc.select_font(make_font().with_style(FontStyle::ITALIC));
        assert_eq!(dc.italic_added_width(), 2);
    }

    #[test]
    fn test_ramps_follow_color_changes() {
        let s = Surface::new(4, 4, PixelFormat::rgb888()).unwrap();
        let mut dc = DeviceContext::new(s);
        let before = dc.text.ramps.clone();
        let red = dc.map_rgb(255, 0, 0);
        dc.set_text_color(red);
        assert_ne!(dc.text.ramps, before);
        let fmt = PixelFormat::rgb888();
        assert_eq!(dc.text.ramps, GlyphRamps::compute(&fmt, red, dc.bk_color(), false));
        dc.set_bk_mode(BkMode::Transparent);
        assert_eq!(dc.text.ramps, GlyphRamps::compute(&fmt, red, dc.bk_color(), true));
    }
}
