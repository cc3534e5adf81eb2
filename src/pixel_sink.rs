//! Clipped output primitives.
//!
//! [`DrawContext`] is the only writer of surface pixels. It is created for
//! one drawing call with an output rectangle that bounds everything the
//! call may write, and it is dropped when the call ends. Every write is
//! limited to the output rectangle and the clip region.
//!
//! When one clip rectangle covers the whole output rectangle the context
//! runs in "no clip" mode and skips the band walk entirely.
//!
//! Span arguments are inclusive: `draw_hline_clip(x1, x2, y)` touches both
//! `x1` and `x2`.

use log::{debug, trace};

use crate::basics::{Rect, Span};
use crate::brush::Brush;
use crate::clip_region::ClipRegion;
use crate::color::{Pixel, RasterOp, Rgba8};
use crate::pixel_format::PixelFormat;
use crate::surface::Surface;

// ============================================================================
// DrawContext
// ============================================================================

/// Drawing bracket over a surface and a clip region.
pub struct DrawContext<'a> {
    surface: &'a mut Surface,
    clip: &'a ClipRegion,
    rc_output: Rect,
    cur_pixel: Pixel,
    rop: RasterOp,
    step: i32,
    cur_band: Option<usize>,
    no_clip: bool,
}

impl<'a> DrawContext<'a> {
    /// Open a drawing bracket limited to `rc_output`.
    ///
    /// `rc_output` is intersected with the surface and the clip bound.
    /// Returns `None` when nothing can be drawn.
    pub fn new(surface: &'a mut Surface, clip: &'a ClipRegion, rc_output: Rect) -> Option<Self> {
        let rc = rc_output
            .normalized()
            .intersect(&surface.rect())
            .and_then(|rc| rc.intersect(&clip.bound()));
        let Some(rc_output) = rc else {
            debug!("empty output rect {:?}, nothing to draw", rc_output);
            return None;
        };

        let mut ctx = Self {
            surface,
            clip,
            rc_output,
            cur_pixel: 0,
            rop: RasterOp::Set,
            step: 1,
            cur_band: None,
            no_clip: false,
        };
        ctx.check_no_clip();
        Some(ctx)
    }

    /// Re-evaluate the fast path for the current output rectangle.
    fn check_no_clip(&mut self) {
        self.no_clip = self.clip.rects().iter().any(|rc| rc.covers(&self.rc_output));
        trace!("output {:?}: no_clip = {}", self.rc_output, self.no_clip);
    }

    #[inline]
    pub fn rc_output(&self) -> Rect {
        self.rc_output
    }

    #[inline]
    pub fn is_no_clip(&self) -> bool {
        self.no_clip
    }

    #[inline]
    pub fn format(&self) -> &PixelFormat {
        self.surface.format()
    }

    #[inline]
    pub fn color(&self) -> Pixel {
        self.cur_pixel
    }

    #[inline]
    pub fn set_color(&mut self, p: Pixel) {
        self.cur_pixel = p;
    }

    #[inline]
    pub fn set_rop(&mut self, rop: RasterOp) {
        self.rop = rop;
    }

    /// Dotted stride: lines touch every `step`-th pixel.
    #[inline]
    pub fn set_step(&mut self, step: i32) {
        self.step = step.max(1);
    }

    /// Read a surface pixel, ignoring clipping.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        self.surface.get_pixel(x, y)
    }

    // ------------------------------------------------------------------------
    // Raw writes
    // ------------------------------------------------------------------------

    #[inline]
    fn put(&mut self, x: i32, y: i32, p: Pixel) {
        debug_assert!(self.rc_output.contains(x, y), "write at ({}, {}) outside {:?}", x, y, self.rc_output);
        let v = match self.rop {
            RasterOp::Set => p,
            op => op.apply(self.surface.get_pixel(x, y).unwrap_or(0), p),
        };
        self.surface.put_pixel(x, y, v);
    }

    /// Band of the clip region covering `y`, reusing the last band found.
    fn band_at(&mut self, y: i32) -> &'a [Rect] {
        let clip: &'a ClipRegion = self.clip;
        match clip.which_band(y, self.cur_band) {
            Some(start) => {
                self.cur_band = Some(start);
                clip.band(start)
            }
            None => &[],
        }
    }

    fn visible(&mut self, x: i32, y: i32) -> bool {
        if !self.rc_output.contains(x, y) {
            return false;
        }
        if self.no_clip {
            return true;
        }
        self.band_at(y).iter().any(|rc| rc.contains(x, y))
    }

    /// Call `f(self, a, b)` for every visible inclusive run `[a, b]` of
    /// `[x1, x2]` on row `y`.
    fn for_each_visible_run<F>(&mut self, x1: i32, x2: i32, y: i32, mut f: F)
    where
        F: FnMut(&mut Self, i32, i32),
    {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let out = self.rc_output;
        if y < out.top || y >= out.bottom {
            return;
        }
        if self.no_clip {
            let (a, b) = (x1.max(out.left), x2.min(out.right - 1));
            if a <= b {
                f(self, a, b);
            }
            return;
        }
        for rc in self.band_at(y) {
            let Some(eff) = rc.intersect(&out) else {
                continue;
            };
            let (a, b) = (x1.max(eff.left), x2.min(eff.right - 1));
            if a <= b {
                f(self, a, b);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Pen-colored primitives
    // ------------------------------------------------------------------------

    /// Set `(x, y)` to the current color if visible.
    pub fn set_pixel_clip(&mut self, x: i32, y: i32) {
        if self.visible(x, y) {
            self.put(x, y, self.cur_pixel);
        }
    }

    /// Set both `(x1, y)` and `(x2, y)`, once when they coincide.
    pub fn set_pixel_pair_clip(&mut self, x1: i32, x2: i32, y: i32) {
        self.set_pixel_clip(x1, y);
        if x1 != x2 {
            self.set_pixel_clip(x2, y);
        }
    }

    /// Horizontal run `[x1, x2]` in the current color, honoring the
    /// dotted stride. Dots are aligned to the smaller endpoint, which is
    /// always drawn.
    pub fn draw_hline_clip(&mut self, x1: i32, x2: i32, y: i32) {
        if x1 == x2 {
            self.set_pixel_clip(x1, y);
            return;
        }
        let origin = x1.min(x2);
        let step = self.step;
        let p = self.cur_pixel;
        self.for_each_visible_run(x1, x2, y, |ctx, a, b| {
            let mut x = a + (step - (a - origin) % step) % step;
            while x <= b {
                ctx.put(x, y, p);
                x += step;
            }
        });
    }

    /// Vertical run `[y1, y2]` in the current color on column `x`, dots
    /// aligned to the smaller endpoint.
    pub fn draw_vline_clip(&mut self, y1: i32, y2: i32, x: i32) {
        if y1 == y2 {
            self.set_pixel_clip(x, y1);
            return;
        }
        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        let origin = y1;
        let out = self.rc_output;
        if x < out.left || x >= out.right {
            return;
        }
        let (y1, y2) = (y1.max(out.top), y2.min(out.bottom - 1));
        if y1 > y2 {
            return;
        }

        let step = self.step;
        let p = self.cur_pixel;
        let draw_run = |ctx: &mut Self, a: i32, b: i32| {
            let mut y = a + (step - (a - origin) % step) % step;
            while y <= b {
                ctx.put(x, y, p);
                y += step;
            }
        };

        if self.no_clip {
            draw_run(self, y1, y2);
            return;
        }
        let clip: &'a ClipRegion = self.clip;
        for rc in clip.rects() {
            if rc.bottom <= y1 {
                continue;
            }
            if rc.top > y2 {
                break;
            }
            if x < rc.left || x >= rc.right {
                continue;
            }
            draw_run(self, y1.max(rc.top), y2.min(rc.bottom - 1));
        }
    }

    /// Fill `rc` (exclusive right/bottom) with the current color.
    pub fn fill_box(&mut self, rc: &Rect) {
        let Some(rc) = rc.normalized().intersect(&self.rc_output) else {
            return;
        };
        let p = self.cur_pixel;
        for y in rc.top..rc.bottom {
            self.for_each_visible_run(rc.left, rc.right - 1, y, |ctx, a, b| {
                for x in a..=b {
                    ctx.put(x, y, p);
                }
            });
        }
    }

    // ------------------------------------------------------------------------
    // Explicit-color primitives
    // ------------------------------------------------------------------------

    /// Set `(x, y)` to `p` if visible.
    pub fn draw_pixel_color(&mut self, x: i32, y: i32, p: Pixel) {
        if self.visible(x, y) {
            self.put(x, y, p);
        }
    }

    /// Horizontal run `[x1, x2]` in color `p`, ignoring the dotted stride.
    pub fn draw_span_color(&mut self, x1: i32, x2: i32, y: i32, p: Pixel) {
        self.for_each_visible_run(x1, x2, y, |ctx, a, b| {
            for x in a..=b {
                ctx.put(x, y, p);
            }
        });
    }

    /// Alpha-blend `c` over the destination pixel at `(x, y)`.
    ///
    /// The destination alpha is kept; the raster op applies to the result.
    pub fn blend_pixel(&mut self, x: i32, y: i32, c: Rgba8) {
        if c.a == 0 || !self.visible(x, y) {
            return;
        }
        let fmt = *self.surface.format();
        let dst_px = self.surface.get_pixel(x, y).unwrap_or(0);
        let dst = fmt.get_rgba(dst_px);
        let out = if c.a == Rgba8::OPAQUE { c } else { c.blend_over(dst) };
        self.put(x, y, fmt.map_rgba(out.with_alpha(dst.a)));
    }

    /// Copy a row of source pixels starting at `(x, y)`. Pixels equal to
    /// `transparent` are skipped.
    pub fn draw_src_span(&mut self, x: i32, y: i32, src: &[Pixel], transparent: Option<Pixel>) {
        if src.is_empty() {
            return;
        }
        let x2 = x + src.len() as i32 - 1;
        self.for_each_visible_run(x, x2, y, |ctx, a, b| {
            for cx in a..=b {
                let p = src[(cx - x) as usize];
                if transparent != Some(p) {
                    ctx.put(cx, y, p);
                }
            }
        });
    }

    // ------------------------------------------------------------------------
    // Brush primitives
    // ------------------------------------------------------------------------

    /// Horizontal run `[x1, x2]` painted with `brush`.
    pub fn fill_hline_clip(&mut self, x1: i32, x2: i32, y: i32, brush: &Brush, bk_color: Pixel) {
        self.for_each_visible_run(x1, x2, y, |ctx, a, b| {
            brush.span_pixels(a, y, b - a + 1, bk_color, |cx, p| ctx.put(cx, y, p));
        });
    }

    /// Paint a list of spans (`width` pixels from `x`) with `brush`.
    pub fn fill_spans(&mut self, spans: &[Span], brush: &Brush, bk_color: Pixel) {
        let step = self.step;
        self.step = 1;
        for s in spans.iter().filter(|s| s.width > 0) {
            self.fill_hline_clip(s.x, s.x + s.width - 1, s.y, brush, bk_color);
        }
        self.step = step;
    }
}

impl Drop for DrawContext<'_> {
    fn drop(&mut self) {
        trace!("leave drawing {:?}", self.rc_output);
    }
}
