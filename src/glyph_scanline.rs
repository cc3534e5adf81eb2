//! Per-bitmap-type glyph scanline renderers.
//!
//! Each renderer turns one glyph bitmap row into pixel writes through the
//! [`DrawContext`]. Mono bitmaps go through one of four renderers chosen
//! by the logical font's weight style: regular run-length blit, the "book"
//! 3x3 weighted grey filter, the "light" one-pixel halo, or the LCD
//! subpixel filter. Grey, LCD and pre-rendered bitmaps each have their own
//! renderer.
//!
//! The book and light filters spread ink one pixel beyond the bitmap, so
//! the first and the last bitmap line each produce two output rows.

use log::warn;

use crate::basics::Point;
use crate::color::{Pixel, Rgba8};
use crate::error::Result;
use crate::glyph_bits::BitLine;
use crate::pixel_format::PixelFormat;
use crate::pixel_sink::DrawContext;

/// Total weight of the subpixel filter kernel.
const ALL_WGHT: u32 = 32;
/// Weight kept by an ink pixel itself.
const ROUND_WGHT: u32 = 16;
/// Weight of each horizontal or vertical neighbour.
const NEIGHBOR_WGHT: u32 = 3;
/// Weight of each diagonal neighbour.
const NEAR_WGHT: u32 = 1;

// ============================================================================
// Color ramps
// ============================================================================

/// Grey levels 0..=16 used for coverage bitmaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrayRamp {
    /// Opaque pixels running from the background to the text color.
    Opaque([Pixel; 17]),
    /// The text color with rising alpha, blended over the destination.
    Alpha([Rgba8; 17]),
}

/// Color ramps derived from the text color, background color and mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRamps {
    pub gray: GrayRamp,
    /// Alpha ramp of the book filter; `None` when the surface has no
    /// alpha companion format.
    pub book: Option<[Rgba8; 17]>,
    /// Light filter pixels: a value distinct from both colors, the
    /// background color, the text color.
    pub light: [Pixel; 3],
}

/// The text color with alpha `0, 16, .., 240, 255`, quantized through the
/// alpha companion format.
fn alpha_ramp(companion: &PixelFormat, text: Rgba8) -> [Rgba8; 17] {
    let mut ramp = [Rgba8::default(); 17];
    for (i, slot) in ramp.iter_mut().enumerate() {
        let a = if i == 16 { 255 } else { (i * 16) as u8 };
        *slot = companion.get_rgba(companion.map_rgba(text.with_alpha(a)));
    }
    ramp
}

impl GlyphRamps {
    /// Build the ramps for `text` over `bk` on a surface of `format`.
    pub fn compute(format: &PixelFormat, text: Pixel, bk: Pixel, bk_transparent: bool) -> Self {
        let companion = PixelFormat::alpha_companion(format.bytes_per_pixel());
        let text_rgb = format.get_rgb(text);

        let gray = match companion {
            Some(ref c) if bk_transparent => GrayRamp::Alpha(alpha_ramp(c, text_rgb)),
            _ if format.bits_per_pixel() > 8 => {
                let bk_rgb = format.get_rgb(bk);
                let delta = |t: u8, b: u8| (t as i32 - b as i32) / 16;
                let (dr, dg, db) = (
                    delta(text_rgb.r, bk_rgb.r),
                    delta(text_rgb.g, bk_rgb.g),
                    delta(text_rgb.b, bk_rgb.b),
                );
                let mut ramp = [bk; 17];
                let (mut r, mut g, mut b) = (bk_rgb.r as i32, bk_rgb.g as i32, bk_rgb.b as i32);
                for slot in ramp.iter_mut().take(16).skip(1) {
                    r += dr;
                    g += dg;
                    b += db;
                    *slot = format.map_rgb(r as u8, g as u8, b as u8);
                }
                ramp[16] = text;
                GrayRamp::Opaque(ramp)
            }
            _ => {
                let mut ramp = [bk; 17];
                ramp[16] = text;
                GrayRamp::Opaque(ramp)
            }
        };

        let mut trans = bk ^ 1;
        if trans == text {
            trans = bk ^ 3;
        }

        Self {
            gray,
            book: companion.map(|c| alpha_ramp(&c, text_rgb)),
            light: [trans, bk, text],
        }
    }
}

// ============================================================================
// Glyph job
// ============================================================================

/// Which renderer draws a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Renderer {
    Regular,
    Book,
    Light,
    Subpixel,
    BookGrey,
    LcdSubpixel,
    Prerendered,
}

/// Glyph bitmap after bold, scale and flip processing.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GlyphImage<'a> {
    /// Mono bits; `scale` is left for the renderer when it is the regular
    /// one, otherwise already applied.
    Mono {
        bits: &'a [u8],
        pitch: usize,
        w: i32,
        h: i32,
        scale: i32,
    },
    Grey {
        bits: &'a [u8],
        pitch: usize,
        w: i32,
        h: i32,
        scale: i32,
    },
    /// Three coverage bytes per pixel.
    Lcd {
        bits: &'a [u8],
        pitch: usize,
        w: i32,
        h: i32,
    },
    Prerendered {
        pixels: &'a [Rgba8],
        w: i32,
        h: i32,
    },
}

/// Italic shear parameters shared by every line of one glyph.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Slant {
    pub italic: bool,
    /// Distance from the baseline to the top of the glyph box.
    pub ascent: i32,
    pub advance: i32,
    pub single_flip: bool,
}

impl Slant {
    /// Horizontal shift of bitmap line `line`.
    #[inline]
    pub fn offx(&self, line: i32) -> i32 {
        if !self.italic {
            return 0;
        }
        let offx = (self.ascent - line) >> 1;
        if self.single_flip {
            self.advance - offx
        } else {
            offx
        }
    }
}

/// Colors of one glyph draw.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlyphPaint<'r> {
    pub text: Pixel,
    pub text_rgb: Rgba8,
    pub bk_rgb: Rgba8,
    pub ramps: &'r GlyphRamps,
}

/// Background rows sampled by the subpixel filter.
pub(crate) struct BkRows<'s> {
    pub prev: &'s mut Vec<Rgba8>,
    pub curr: &'s mut Vec<Rgba8>,
    pub next: &'s mut Vec<Rgba8>,
}

/// Draw a whole glyph with its top-left output corner at `origin`.
pub(crate) fn render_glyph(
    ctx: &mut DrawContext<'_>,
    renderer: Renderer,
    image: GlyphImage<'_>,
    origin: Point,
    slant: &Slant,
    paint: &GlyphPaint<'_>,
    bk: BkRows<'_>,
) -> Result<()> {
    match (renderer, image) {
        (Renderer::Prerendered, GlyphImage::Prerendered { pixels, w, h }) => {
            prerendered_glyph(ctx, pixels, w, h, origin);
        }
        (Renderer::LcdSubpixel, GlyphImage::Lcd { bits, pitch, w, h }) => {
            for line in 0..h {
                let row = bits.get(line as usize * pitch..).unwrap_or(&[]);
                lcd_line(ctx, row, w, origin.x, origin.y + line, paint.text_rgb);
            }
        }
        (Renderer::BookGrey, GlyphImage::Grey { bits, pitch, w, h, scale }) => {
            let scale = scale.max(1);
            let mut ypos = origin.y;
            for line in 0..h {
                let row = bits.get(line as usize * pitch..).unwrap_or(&[]);
                bookgrey_line(ctx, row, w, scale, origin.x, ypos, line * scale, slant, &paint.ramps.gray);
                ypos += scale;
            }
        }
        (_, GlyphImage::Mono { bits, pitch, w, h, scale }) => {
            let line_at = |i: i32| -> BitLine<'_> {
                if i < 0 || i >= h {
                    return BitLine::empty();
                }
                BitLine::new(bits.get(i as usize * pitch..).unwrap_or(&[]), w)
            };
            match renderer {
                Renderer::Regular => {
                    let scale = scale.max(1);
                    let mut ypos = origin.y;
                    for line in 0..h {
                        regular_line(ctx, line_at(line), scale, origin.x, ypos, line * scale, slant, paint.text);
                        ypos += scale;
                    }
                }
                Renderer::Book => {
                    if let Some(ramp) = paint.ramps.book.as_ref() {
                        book_glyph(ctx, &line_at, w, h, origin, slant, ramp);
                    }
                }
                Renderer::Light => light_glyph(ctx, &line_at, w, h, origin, slant, &paint.ramps.light),
                Renderer::Subpixel => subpixel_glyph(ctx, &line_at, w, h, origin, slant, paint, bk)?,
                _ => {}
            }
        }
        _ => {}
    }
    Ok(())
}

// ============================================================================
// Regular
// ============================================================================

/// Blit the ink runs of one line in the text color.
#[allow(clippy::too_many_arguments)]
fn regular_line(
    ctx: &mut DrawContext<'_>,
    line: BitLine<'_>,
    scale: i32,
    xpos: i32,
    ypos: i32,
    glyph_line: i32,
    slant: &Slant,
    text: Pixel,
) {
    let mut x = 0;
    for (set, len) in line.runs() {
        let len = len as i32;
        if set {
            for i in 0..scale {
                let left = xpos + x * scale + slant.offx(glyph_line + i);
                ctx.draw_span_color(left, left + len * scale - 1, ypos + i, text);
            }
        }
        x += len;
    }
}

// ============================================================================
// Grey
// ============================================================================

/// Coverage byte to ramp index: 255 is full ink, otherwise the top nibble.
#[inline]
fn grey_level(b: u8) -> usize {
    if b == 255 {
        16
    } else {
        (b >> 4) as usize
    }
}

#[allow(clippy::too_many_arguments)]
fn bookgrey_line(
    ctx: &mut DrawContext<'_>,
    row: &[u8],
    w: i32,
    scale: i32,
    xpos: i32,
    ypos: i32,
    glyph_line: i32,
    slant: &Slant,
    ramp: &GrayRamp,
) {
    for (x, &b) in row.iter().take(w.max(0) as usize).enumerate() {
        let level = grey_level(b);
        if level == 0 {
            continue;
        }
        for i in 0..scale {
            let left = xpos + x as i32 * scale + slant.offx(glyph_line + i);
            let y = ypos + i;
            match ramp {
                GrayRamp::Alpha(r) => {
                    for cx in left..left + scale {
                        ctx.blend_pixel(cx, y, r[level]);
                    }
                }
                GrayRamp::Opaque(r) => ctx.draw_span_color(left, left + scale - 1, y, r[level]),
            }
        }
    }
}

// ============================================================================
// LCD subpixel bitmaps
// ============================================================================

/// Blend each of R, G, B by its own coverage: with `a = v + 1`,
/// `d = (s * a + d * (256 - a)) >> 8` for every non-zero `v`.
fn lcd_line(ctx: &mut DrawContext<'_>, row: &[u8], w: i32, xpos: i32, ypos: i32, fg: Rgba8) {
    let fmt = *ctx.format();
    for (x, cov) in row.chunks_exact(3).take(w.max(0) as usize).enumerate() {
        let cx = xpos + x as i32;
        let Some(old) = ctx.get_pixel(cx, ypos) else {
            continue;
        };
        let cur = fmt.get_rgb(old);
        let ch = |s: u8, d: u8, v: u8| -> u8 {
            if v == 0 {
                return d;
            }
            let a = v as u32 + 1;
            ((s as u32 * a + d as u32 * (256 - a)) >> 8) as u8
        };
        let out = fmt.map_rgb(ch(fg.r, cur.r, cov[0]), ch(fg.g, cur.g, cov[1]), ch(fg.b, cur.b, cov[2]));
        if out != old {
            ctx.draw_pixel_color(cx, ypos, out);
        }
    }
}

// ============================================================================
// Pre-rendered
// ============================================================================

fn prerendered_glyph(ctx: &mut DrawContext<'_>, pixels: &[Rgba8], w: i32, h: i32, origin: Point) {
    let fmt = *ctx.format();
    for y in 0..h {
        for x in 0..w {
            let Some(&c) = pixels.get((y * w + x) as usize) else {
                return;
            };
            match c.a {
                0 => {}
                255 => ctx.draw_pixel_color(origin.x + x, origin.y + y, fmt.map_rgb(c.r, c.g, c.b)),
                _ => ctx.blend_pixel(origin.x + x, origin.y + y, c),
            }
        }
    }
}

// ============================================================================
// Book filter
// ============================================================================

/// Halo row outside the first or last line.
#[inline]
fn book_outer_weight(cur: BitLine<'_>, x: i32) -> u32 {
    3 * cur.bit(x) + cur.bit(x - 1) + cur.bit(x + 1)
}

/// First or last line, with `side` the only neighbour line.
#[inline]
fn book_edge_weight(cur: BitLine<'_>, side: BitLine<'_>, x: i32) -> u32 {
    if cur.get(x) {
        return 16;
    }
    3 * cur.bit(x - 1) + side.bit(x - 1) + 3 * cur.bit(x + 1) + side.bit(x + 1) + 3 * side.bit(x)
}

/// Inner line. The first and last columns use reduced kernels.
#[inline]
fn book_inner_weight(cur: BitLine<'_>, prev: BitLine<'_>, next: BitLine<'_>, x: i32, w: i32) -> u32 {
    if cur.get(x) {
        return 16;
    }
    if x == 0 {
        3 * prev.bit(0) + prev.bit(1) + 3 * next.bit(0) + next.bit(1)
    } else if x == w - 1 {
        3 * cur.bit(x - 1) + 3 * prev.bit(x) + prev.bit(x - 1) + 3 * next.bit(x) + next.bit(x - 1)
    } else {
        3 * cur.bit(x - 1)
            + 3 * cur.bit(x + 1)
            + prev.bit(x - 1)
            + 3 * prev.bit(x)
            + prev.bit(x + 1)
            + next.bit(x - 1)
            + 3 * next.bit(x)
            + next.bit(x + 1)
    }
}

fn book_row<F: Fn(i32) -> u32>(ctx: &mut DrawContext<'_>, w: i32, xpos: i32, ypos: i32, ramp: &[Rgba8; 17], weight: F) {
    for x in 0..w {
        let wt = weight(x) as usize;
        if wt != 0 {
            ctx.blend_pixel(xpos + x, ypos, ramp[wt.min(16)]);
        }
    }
}

fn book_glyph<'b, L>(ctx: &mut DrawContext<'_>, line_at: &L, w: i32, h: i32, origin: Point, slant: &Slant, ramp: &[Rgba8; 17])
where
    L: Fn(i32) -> BitLine<'b>,
{
    let mut ypos = origin.y;
    for line in 0..h {
        let xpos = origin.x + slant.offx(line);
        let (prev, cur, next) = (line_at(line - 1), line_at(line), line_at(line + 1));
        if line == 0 {
            book_row(ctx, w, xpos, ypos, ramp, |x| book_outer_weight(cur, x));
            book_row(ctx, w, xpos, ypos + 1, ramp, |x| book_edge_weight(cur, next, x));
            ypos += 2;
        } else if line == h - 1 {
            book_row(ctx, w, xpos, ypos, ramp, |x| book_edge_weight(cur, prev, x));
            book_row(ctx, w, xpos, ypos + 1, ramp, |x| book_outer_weight(cur, x));
            ypos += 2;
        } else {
            book_row(ctx, w, xpos, ypos, ramp, |x| book_inner_weight(cur, prev, next, x, w));
            ypos += 1;
        }
    }
}

// ============================================================================
// Light filter
// ============================================================================

/// One output row of the light filter. Ink lands one pixel right of its
/// bitmap column; the pixels around it get the halo color.
#[allow(clippy::too_many_arguments)]
fn light_row(
    ctx: &mut DrawContext<'_>,
    w: i32,
    xpos: i32,
    ypos: i32,
    cur: BitLine<'_>,
    prev: BitLine<'_>,
    next: BitLine<'_>,
    light: &[Pixel; 3],
) {
    for x in 0..w {
        if cur.get(x) {
            if x == 0 {
                ctx.draw_pixel_color(xpos, ypos, light[1]);
            }
            ctx.draw_pixel_color(xpos + x + 1, ypos, light[2]);
        } else if cur.get(x - 1) || cur.get(x + 1) || prev.get(x) || next.get(x) {
            ctx.draw_pixel_color(xpos + x + 1, ypos, light[1]);
        }
    }
    if cur.get(w - 1) {
        ctx.draw_pixel_color(xpos + w + 1, ypos, light[1]);
    }
}

fn light_glyph<'b, L>(ctx: &mut DrawContext<'_>, line_at: &L, w: i32, h: i32, origin: Point, slant: &Slant, light: &[Pixel; 3])
where
    L: Fn(i32) -> BitLine<'b>,
{
    let none = BitLine::empty();
    let mut ypos = origin.y;
    for line in 0..h {
        let xpos = origin.x + slant.offx(line);
        let (prev, cur, next) = (line_at(line - 1), line_at(line), line_at(line + 1));
        if line == 0 {
            light_row(ctx, w, xpos, ypos, none, none, cur, light);
            light_row(ctx, w, xpos, ypos + 1, cur, none, next, light);
            ypos += 2;
        } else if line == h - 1 {
            light_row(ctx, w, xpos, ypos, cur, prev, none, light);
            light_row(ctx, w, xpos, ypos + 1, none, cur, none, light);
            ypos += 2;
        } else {
            light_row(ctx, w, xpos, ypos, cur, prev, next, light);
            ypos += 1;
        }
    }
}

// ============================================================================
// Subpixel filter
// ============================================================================

/// Read `row.len()` destination colors starting at `(xpos, y)`; pixels off
/// the surface read as `fallback`.
fn read_bk_row(ctx: &DrawContext<'_>, row: &mut [Rgba8], xpos: i32, y: i32, fallback: Rgba8) {
    let fmt = *ctx.format();
    for (i, slot) in row.iter_mut().enumerate() {
        *slot = ctx
            .get_pixel(xpos + i as i32, y)
            .map_or(fallback, |p| fmt.get_rgb(p));
    }
}

/// Neighbours of a pixel as `(dx, line, weight)` with line `-1` above,
/// `0` current and `1` below.
const SUBPIXEL_KERNEL: [(i32, i32, u32); 8] = [
    (-1, 0, NEIGHBOR_WGHT),
    (1, 0, NEIGHBOR_WGHT),
    (0, -1, NEIGHBOR_WGHT),
    (0, 1, NEIGHBOR_WGHT),
    (-1, -1, NEAR_WGHT),
    (1, -1, NEAR_WGHT),
    (-1, 1, NEAR_WGHT),
    (1, 1, NEAR_WGHT),
];

#[allow(clippy::too_many_arguments)]
fn subpixel_row(
    ctx: &mut DrawContext<'_>,
    w: i32,
    xpos: i32,
    ypos: i32,
    lines: [BitLine<'_>; 3],
    bk: [&[Rgba8]; 3],
    fg: Rgba8,
) {
    let fmt = *ctx.format();
    for x in 0..w {
        let cur = lines[1];
        let out = if !cur.get(x) {
            let weight: u32 = SUBPIXEL_KERNEL
                .iter()
                .map(|&(dx, dl, wt)| wt * lines[(dl + 1) as usize].bit(x + dx))
                .sum();
            if weight == 0 {
                continue;
            }
            Rgba8::mix(bk[1][x as usize], fg, weight, ALL_WGHT)
        } else {
            let mut centre = ALL_WGHT - ROUND_WGHT;
            let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
            for &(dx, dl, wt) in SUBPIXEL_KERNEL.iter() {
                let nx = x + dx;
                if nx < 0 || nx >= w {
                    centre += wt;
                    continue;
                }
                let l = (dl + 1) as usize;
                let c = if lines[l].get(nx) { fg } else { bk[l][nx as usize] };
                r += c.r as u32 * wt;
                g += c.g as u32 * wt;
                b += c.b as u32 * wt;
            }
            r += fg.r as u32 * centre;
            g += fg.g as u32 * centre;
            b += fg.b as u32 * centre;
            Rgba8::new_opaque((r / ALL_WGHT) as u8, (g / ALL_WGHT) as u8, (b / ALL_WGHT) as u8)
        };
        ctx.draw_pixel_color(xpos + x, ypos, fmt.map_rgb(out.r, out.g, out.b));
    }
}

#[allow(clippy::too_many_arguments)]
fn subpixel_glyph<'b, L>(
    ctx: &mut DrawContext<'_>,
    line_at: &L,
    w: i32,
    h: i32,
    origin: Point,
    slant: &Slant,
    paint: &GlyphPaint<'_>,
    bk: BkRows<'_>,
) -> Result<()>
where
    L: Fn(i32) -> BitLine<'b>,
{
    let n = w.max(0) as usize;
    let BkRows { prev, curr, next } = bk;
    if prev.len() < n || curr.len() < n || next.len() < n {
        warn!("subpixel glyph {} px wide needs prepared background rows", n);
        return Ok(());
    }

    for line in 0..h {
        let ypos = origin.y + line;
        let xpos = origin.x + slant.offx(line);
        let cur = line_at(line);
        if line == 0 {
            read_bk_row(ctx, &mut curr[..n], xpos, ypos, paint.bk_rgb);
            if h == 1 {
                next[..n].copy_from_slice(&curr[..n]);
            } else {
                read_bk_row(ctx, &mut next[..n], xpos, ypos + 1, paint.bk_rgb);
            }
            prev[..n].copy_from_slice(&curr[..n]);
        } else {
            std::mem::swap(prev, curr);
            std::mem::swap(curr, next);
            if line == h - 1 {
                next[..n].copy_from_slice(&curr[..n]);
            } else {
                read_bk_row(ctx, &mut next[..n], xpos, ypos + 1, paint.bk_rgb);
            }
        }

        let above = if line == 0 { cur } else { line_at(line - 1) };
        let below = if line == h - 1 { cur } else { line_at(line + 1) };
        subpixel_row(
            ctx,
            w,
            xpos,
            ypos,
            [above, cur, below],
            [&prev[..n], &curr[..n], &next[..n]],
            paint.text_rgb,
        );
    }
    Ok(())
}
