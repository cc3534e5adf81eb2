//! Wide and dashed lines.
//!
//! A polyline stroked with a pen wider than one pixel is turned into a
//! union of convex pieces: one quadrilateral per segment, a cap shape at
//! each open end and a join shape at each interior vertex. Pieces are
//! sampled at pixel centres and merged into per-row spans, so every
//! covered pixel is reported exactly once whatever the overlap between
//! pieces. That keeps XOR drawing correct at joins.
//!
//! Vertex coordinates name pixel centres. A segment covers the pixels whose
//! centres fall inside the half-open box `[edge, edge)` around it, the same
//! top-left rule the polygon generator uses.

use std::collections::BTreeMap;

use crate::basics::{Point, Rect};
use crate::error::{try_grow, Result};

/// Miter joins longer than this many half widths fall back to bevel.
const MITER_LIMIT: f64 = 10.0;

/// Dash pattern used when a dashed pen has an empty dash list.
const DEFAULT_DASHES: [u8; 2] = [4, 4];

// ============================================================================
// Pen description
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PenType {
    #[default]
    Solid,
    /// Odd dash entries are gaps and are left untouched.
    OnOffDash,
    /// Odd dash entries are painted in the background color.
    DoubleDash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    /// Extends each open end by half the pen width.
    Projecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Stroke attributes for wide and dashed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidePen {
    pub width: u32,
    pub pen_type: PenType,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Alternating on/off run lengths in pixels, starting with "on".
    pub dashes: Vec<u8>,
    pub dash_offset: u32,
}

impl Default for WidePen {
    fn default() -> Self {
        Self {
            width: 0,
            pen_type: PenType::Solid,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            dashes: DEFAULT_DASHES.to_vec(),
            dash_offset: 0,
        }
    }
}

impl WidePen {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// True when the pen is drawn with the thin Bresenham line instead.
    #[inline]
    pub fn is_thin(&self) -> bool {
        self.width == 0 && self.pen_type == PenType::Solid
    }

    /// Width actually stroked: dashed zero-width pens stroke one pixel.
    #[inline]
    pub fn stroke_width(&self) -> u32 {
        self.width.max(1)
    }

    /// Dash list with zero entries dropped, or the default pattern.
    fn effective_dashes(&self) -> Vec<f64> {
        let mut d: Vec<f64> = self.dashes.iter().filter(|&&v| v > 0).map(|&v| v as f64).collect();
        if d.is_empty() {
            d = DEFAULT_DASHES.iter().map(|&v| v as f64).collect();
        }
        if d.len() % 2 == 1 {
            let again = d.clone();
            d.extend(again);
        }
        d
    }
}

// ============================================================================
// RowSpans
// ============================================================================

/// Inclusive horizontal spans keyed by row, merged on [`RowSpans::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSpans {
    rows: BTreeMap<i32, Vec<(i32, i32)>>,
}

impl RowSpans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add the inclusive run `[x1, x2]` on row `y`.
    pub fn add(&mut self, x1: i32, x2: i32, y: i32) -> Result<()> {
        if x1 > x2 {
            return Ok(());
        }
        let row = self.rows.entry(y).or_default();
        try_grow(row, 1, "wide line spans")?;
        row.push((x1, x2));
        Ok(())
    }

    /// Sort each row and merge touching or overlapping runs.
    pub fn normalize(&mut self) {
        for row in self.rows.values_mut() {
            row.sort_unstable();
            let mut out: Vec<(i32, i32)> = Vec::with_capacity(row.len());
            for &(a, b) in row.iter() {
                match out.last_mut() {
                    Some(last) if a <= last.1 + 1 => last.1 = last.1.max(b),
                    _ => out.push((a, b)),
                }
            }
            *row = out;
        }
    }

    /// Remove every pixel covered by `other`. Both sets must be normalized.
    pub fn subtract(&mut self, other: &RowSpans) {
        for (y, row) in self.rows.iter_mut() {
            let Some(cut) = other.rows.get(y) else {
                continue;
            };
            let mut out = Vec::with_capacity(row.len());
            for &(a, b) in row.iter() {
                let mut start = a;
                for &(c, d) in cut.iter() {
                    if d < start || c > b {
                        continue;
                    }
                    if c > start {
                        out.push((start, c - 1));
                    }
                    start = start.max(d + 1);
                    if start > b {
                        break;
                    }
                }
                if start <= b {
                    out.push((start, b));
                }
            }
            *row = out;
        }
        self.rows.retain(|_, row| !row.is_empty());
    }

    /// `(x1, x2, y)` triples, top to bottom, left to right.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, i32)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&y, row)| row.iter().map(move |&(a, b)| (a, b, y)))
    }

    /// Number of covered pixels.
    pub fn pixel_count(&self) -> usize {
        self.iter().map(|(a, b, _)| (b - a + 1) as usize).sum()
    }

    /// Bounding rectangle (exclusive right/bottom) of all spans.
    pub fn bound(&self) -> Option<Rect> {
        let (&top, _) = self.rows.iter().next()?;
        let (&bottom, _) = self.rows.iter().next_back()?;
        let mut left = i32::MAX;
        let mut right = i32::MIN;
        for (a, b, _) in self.iter() {
            left = left.min(a);
            right = right.max(b);
        }
        Some(Rect::new(left, top, right + 1, bottom + 1))
    }
}

// ============================================================================
// Convex piece sampling
// ============================================================================

type Vec2 = (f64, f64);

#[inline]
fn to_vec2(p: Point) -> Vec2 {
    (p.x as f64, p.y as f64)
}

/// Add the pixels whose centres lie inside the convex polygon `poly`.
fn fill_convex(poly: &[Vec2], out: &mut RowSpans) -> Result<()> {
    if poly.len() < 3 {
        return Ok(());
    }
    let ymin = poly.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let ymax = poly.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let (y0, y1) = (ymin.ceil() as i32, ymax.ceil() as i32);

    for y in y0..y1 {
        let fy = y as f64;
        let mut xl = f64::INFINITY;
        let mut xr = f64::NEG_INFINITY;
        for i in 0..poly.len() {
            let a = poly[i];
            let b = poly[(i + 1) % poly.len()];
            let (lo, hi) = if a.1 <= b.1 { (a, b) } else { (b, a) };
            if fy < lo.1 || fy > hi.1 {
                continue;
            }
            if lo.1 == hi.1 {
                xl = xl.min(lo.0.min(hi.0));
                xr = xr.max(lo.0.max(hi.0));
                continue;
            }
            let x = lo.0 + (fy - lo.1) * (hi.0 - lo.0) / (hi.1 - lo.1);
            xl = xl.min(x);
            xr = xr.max(x);
        }
        if xl < xr {
            out.add(xl.ceil() as i32, xr.ceil() as i32 - 1, y)?;
        }
    }
    Ok(())
}

/// Add the pixels whose centres lie inside the closed disc at `c`.
fn fill_disc(c: Vec2, radius: f64, out: &mut RowSpans) -> Result<()> {
    let r2 = radius * radius;
    let (y0, y1) = ((c.1 - radius).ceil() as i32, (c.1 + radius).floor() as i32);
    for y in y0..=y1 {
        let dy = y as f64 - c.1;
        let rest = r2 - dy * dy;
        if rest < 0.0 {
            continue;
        }
        let half = rest.sqrt();
        let x1 = (c.0 - half).ceil() as i32;
        let x2 = (c.0 + half).floor() as i32;
        out.add(x1, x2, y)?;
    }
    Ok(())
}

/// Unit direction and length of `a -> b`.
#[inline]
fn direction(a: Vec2, b: Vec2) -> Option<(Vec2, f64)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return None;
    }
    Some(((dx / len, dy / len), len))
}

// ============================================================================
// Stroking one piece
// ============================================================================

struct Stroker {
    hw: f64,
    cap: LineCap,
    join: LineJoin,
}

impl Stroker {
    /// Stroke an open polyline with caps at both ends.
    fn stroke(&self, pts: &[Vec2], out: &mut RowSpans) -> Result<()> {
        // Drop consecutive duplicates; they carry no direction.
        let mut path: Vec<Vec2> = Vec::with_capacity(pts.len());
        for &p in pts {
            if path.last() != Some(&p) {
                path.push(p);
            }
        }

        if path.len() < 2 {
            if let Some(&p) = path.first() {
                self.dot(p, out)?;
            }
            return Ok(());
        }

        let last = path.len() - 1;
        for i in 0..last {
            let (a, b) = (path[i], path[i + 1]);
            let Some((d, _)) = direction(a, b) else {
                continue;
            };
            let ext_a = if i == 0 && self.cap == LineCap::Projecting { self.hw } else { 0.0 };
            let ext_b = if i + 1 == last && self.cap == LineCap::Projecting { self.hw } else { 0.0 };
            let a = (a.0 - d.0 * ext_a, a.1 - d.1 * ext_a);
            let b = (b.0 + d.0 * ext_b, b.1 + d.1 * ext_b);
            let n = (-d.1 * self.hw, d.0 * self.hw);
            let quad = [
                (a.0 + n.0, a.1 + n.1),
                (b.0 + n.0, b.1 + n.1),
                (b.0 - n.0, b.1 - n.1),
                (a.0 - n.0, a.1 - n.1),
            ];
            fill_convex(&quad, out)?;
        }

        for i in 1..last {
            self.join_at(path[i - 1], path[i], path[i + 1], out)?;
        }

        if self.cap == LineCap::Round {
            fill_disc(path[0], self.hw, out)?;
            fill_disc(path[last], self.hw, out)?;
        }
        Ok(())
    }

    /// A zero-length piece: round and projecting caps still leave a mark.
    fn dot(&self, p: Vec2, out: &mut RowSpans) -> Result<()> {
        match self.cap {
            LineCap::Butt => Ok(()),
            LineCap::Round => fill_disc(p, self.hw, out),
            LineCap::Projecting => {
                let h = self.hw;
                let sq = [(p.0 - h, p.1 - h), (p.0 + h, p.1 - h), (p.0 + h, p.1 + h), (p.0 - h, p.1 + h)];
                fill_convex(&sq, out)
            }
        }
    }

    fn join_at(&self, p0: Vec2, v: Vec2, p2: Vec2, out: &mut RowSpans) -> Result<()> {
        let (Some((d1, _)), Some((d2, _))) = (direction(p0, v), direction(v, p2)) else {
            return Ok(());
        };
        let cross = d1.0 * d2.1 - d1.1 * d2.0;
        if cross == 0.0 && d1.0 * d2.0 + d1.1 * d2.1 > 0.0 {
            return Ok(());
        }
        if self.join == LineJoin::Round {
            return fill_disc(v, self.hw, out);
        }

        let s = if cross > 0.0 { -self.hw } else { self.hw };
        let a = (v.0 - d1.1 * s, v.1 + d1.0 * s);
        let b = (v.0 - d2.1 * s, v.1 + d2.0 * s);

        if self.join == LineJoin::Miter && cross != 0.0 {
            // Intersect a + t*d1 with b + u*d2.
            let t = ((b.0 - a.0) * d2.1 - (b.1 - a.1) * d2.0) / cross;
            let m = (a.0 + d1.0 * t, a.1 + d1.1 * t);
            let reach = ((m.0 - v.0).powi(2) + (m.1 - v.1).powi(2)).sqrt();
            if reach <= self.hw * MITER_LIMIT {
                return fill_convex(&[v, a, m, b], out);
            }
        }
        fill_convex(&[v, a, b], out)
    }
}

// ============================================================================
// Dash splitting
// ============================================================================

/// Cut a polyline into alternating on/off pieces following `dashes`,
/// starting `offset` pixels into the pattern.
fn split_dashes(pts: &[Vec2], dashes: &[f64], offset: f64) -> Vec<(bool, Vec<Vec2>)> {
    let total: f64 = dashes.iter().sum();
    let mut idx = 0;
    let mut rest = dashes[0];
    let mut skip = if total > 0.0 { offset % total } else { 0.0 };
    while skip > 0.0 {
        if skip >= rest {
            skip -= rest;
            idx = (idx + 1) % dashes.len();
            rest = dashes[idx];
        } else {
            rest -= skip;
            skip = 0.0;
        }
    }

    let mut pieces: Vec<(bool, Vec<Vec2>)> = Vec::new();
    let mut current = vec![pts[0]];
    for w in pts.windows(2) {
        let (mut a, b) = (w[0], w[1]);
        let Some((d, mut len)) = direction(a, b) else {
            continue;
        };
        while len > rest {
            let cut = (a.0 + d.0 * rest, a.1 + d.1 * rest);
            current.push(cut);
            pieces.push((idx % 2 == 0, std::mem::replace(&mut current, vec![cut])));
            len -= rest;
            a = cut;
            idx = (idx + 1) % dashes.len();
            rest = dashes[idx];
        }
        rest -= len;
        current.push(b);
    }
    if current.len() > 1 {
        pieces.push((idx % 2 == 0, current));
    }
    pieces
}

// ============================================================================
// Public entry
// ============================================================================

/// Pixels of a stroked polyline: `on` in the pen color, `off` in the
/// background color (double-dash pens only). The sets are disjoint.
#[derive(Debug, Clone, Default)]
pub struct WideSpans {
    pub on: RowSpans,
    pub off: RowSpans,
}

/// Stroke the polyline `pts` with `pen`.
///
/// Solid pens produce one connected shape with joins at every interior
/// vertex. Dashed pens cap every dash; a dash that wraps a vertex keeps the
/// join there.
pub fn wide_polyline(pts: &[Point], pen: &WidePen) -> Result<WideSpans> {
    let mut spans = WideSpans::default();
    if pts.is_empty() {
        return Ok(spans);
    }
    let path: Vec<Vec2> = pts.iter().map(|&p| to_vec2(p)).collect();
    let stroker = Stroker {
        hw: pen.stroke_width() as f64 / 2.0,
        cap: pen.cap,
        join: pen.join,
    };

    match pen.pen_type {
        PenType::Solid => stroker.stroke(&path, &mut spans.on)?,
        PenType::OnOffDash | PenType::DoubleDash => {
            let dashes = pen.effective_dashes();
            let double = pen.pen_type == PenType::DoubleDash;
            if path.windows(2).all(|w| w[0] == w[1]) {
                stroker.dot(path[0], &mut spans.on)?;
            }
            for (on, piece) in split_dashes(&path, &dashes, pen.dash_offset as f64) {
                if on {
                    stroker.stroke(&piece, &mut spans.on)?;
                } else if double {
                    stroker.stroke(&piece, &mut spans.off)?;
                }
            }
        }
    }

    spans.on.normalize();
    spans.off.normalize();
    spans.off.subtract(&spans.on);
    Ok(spans)
}
