//! Polygon scan generators.
//!
//! Two generators report horizontal spans `(x1, x2, y)` with both ends
//! inclusive: a fast one for polygons that are monotone in the vertical
//! direction, and a general edge-list generator that handles any simple or
//! self-intersecting polygon with the even-odd rule.

use crate::basics::{ceil_div, Point};
use crate::error::{try_grow, Result};

/// Fixed-point precision of the general generator's edge positions.
const POLY_SHIFT: u32 = 18;
const POLY_ONE: i64 = 1 << POLY_SHIFT;

// ============================================================================
// Monotone polygons
// ============================================================================

/// Test whether a closed vertex list is monotone in the vertical direction.
///
/// Fewer than four vertices always qualify. Otherwise the list must be
/// closed (first vertex equals last) and the vertical direction may change
/// sign at most twice while walking it.
pub fn polygon_is_monotone_vertical(pts: &[Point]) -> bool {
    if pts.len() < 4 {
        return true;
    }
    if pts[0] != pts[pts.len() - 1] {
        return false;
    }

    let mut reversals = 0;
    let mut prev_dir = 0;
    for w in pts.windows(2) {
        let dir = (w[1].y - w[0].y).signum();
        if dir == 0 {
            continue;
        }
        if prev_dir != 0 && dir != prev_dir {
            reversals += 1;
            if reversals > 2 {
                return false;
            }
        }
        prev_dir = dir;
    }
    true
}

/// Walk one edge, writing `x1 + ceil((y - y1) * dx / dy)` for every row
/// `y1 <= y < y2` into `row[pos..]`.
fn scan_edge(from: Point, to: Point, rows: &mut [(i32, i32)], left: bool, mut pos: usize) -> usize {
    let dx = (to.x - from.x) as i64;
    let dy = (to.y - from.y) as i64;
    if dy <= 0 {
        return pos;
    }
    for y in from.y..to.y {
        let x = from.x + ceil_div((y - from.y) as i64 * dx, dy) as i32;
        if let Some(slot) = rows.get_mut(pos) {
            if left {
                slot.0 = x;
            } else {
                slot.1 = x;
            }
        }
        pos += 1;
    }
    pos
}

/// Scan a vertically monotone polygon.
///
/// Rows run from the topmost vertex to one above the bottommost one; each
/// row reports exactly one span. The two sides are found by walking the
/// vertex list backwards and forwards from the topmost vertex.
pub fn monotone_vertical_polygon_generator<F>(pts: &[Point], mut cb: F) -> Result<()>
where
    F: FnMut(i32, i32, i32),
{
    let n = pts.len();
    if n < 3 {
        return Ok(());
    }

    let (mut min_i, mut max_i) = (0, 0);
    let (mut min_y, mut max_y) = (pts[0].y, pts[0].y);
    for (i, p) in pts.iter().enumerate().skip(1) {
        if p.y < min_y {
            min_y = p.y;
            min_i = i;
        } else if p.y > max_y {
            max_y = p.y;
            max_i = i;
        }
    }

    let nr = (max_y - min_y) as usize;
    if nr == 0 {
        return Ok(());
    }

    let mut rows: Vec<(i32, i32)> = Vec::new();
    try_grow(&mut rows, nr, "polygon scanlines")?;
    rows.resize(nr, (0, 0));

    let mut pos = 0;
    let mut prev = min_i;
    loop {
        let cur = (prev + n - 1) % n;
        pos = scan_edge(pts[prev], pts[cur], &mut rows, true, pos);
        prev = cur;
        if cur == max_i {
            break;
        }
    }

    pos = 0;
    prev = min_i;
    loop {
        let cur = (prev + 1) % n;
        pos = scan_edge(pts[prev], pts[cur], &mut rows, false, pos);
        prev = cur;
        if cur == max_i {
            break;
        }
    }

    for (i, &(x1, x2)) in rows.iter().enumerate() {
        cb(x1, x2, min_y + i as i32);
    }
    Ok(())
}

// ============================================================================
// General polygons
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PolyEdge {
    top: i32,
    bottom: i32,
    x: i64,
    dx: i64,
    w: i64,
}

impl PolyEdge {
    fn new(a: Point, b: Point) -> Option<Self> {
        if a.y == b.y {
            return None;
        }
        let (a, b) = if b.y < a.y { (b, a) } else { (a, b) };

        let dx = ((b.x - a.x) as i64 * POLY_ONE) / (b.y - a.y) as i64;
        let mut x = ((a.x as i64) << POLY_SHIFT) + (POLY_ONE / 2) - 1;
        if dx < 0 {
            x += (dx + POLY_ONE).min(0);
        }
        let w = (dx.abs() - POLY_ONE).max(0);
        let edge = PolyEdge { top: a.y, bottom: b.y - 1, x, dx, w };
        (edge.bottom >= edge.top).then_some(edge)
    }

    #[inline]
    fn insert_key(&self) -> i64 {
        self.x + (self.w + self.dx) / 2
    }

    #[inline]
    fn sort_key(&self) -> i64 {
        self.x + self.w / 2
    }

    #[inline]
    fn advance(&mut self, rows: i64) {
        self.x += self.dx * rows;
    }
}

fn insert_active(active: &mut Vec<PolyEdge>, edge: PolyEdge) {
    let key = edge.insert_key();
    let pos = active
        .iter()
        .position(|e| e.insert_key() >= key)
        .unwrap_or(active.len());
    active.insert(pos, edge);
}

/// Scan a general polygon with an active edge list and the even-odd rule.
///
/// Edges are closed implicitly (the last vertex connects to the first).
/// When `rows` is given as an inclusive `(top, bottom)` range, only those
/// scanlines are generated; edges straddling the top are pre-advanced.
pub fn polygon_generator<F>(pts: &[Point], rows: Option<(i32, i32)>, mut cb: F) -> Result<()>
where
    F: FnMut(i32, i32, i32),
{
    let n = pts.len();
    if n < 3 {
        return Ok(());
    }

    let mut inactive: Vec<PolyEdge> = Vec::new();
    try_grow(&mut inactive, n, "polygon edges")?;
    for c in 0..n {
        let prev = pts[(c + n - 1) % n];
        if let Some(edge) = PolyEdge::new(pts[c], prev) {
            inactive.push(edge);
        }
    }
    if inactive.is_empty() {
        return Ok(());
    }

    let mut top = inactive.iter().map(|e| e.top).min().unwrap_or(0);
    let mut bottom = inactive.iter().map(|e| e.bottom).max().unwrap_or(-1);

    let mut active: Vec<PolyEdge> = Vec::new();
    try_grow(&mut active, inactive.len(), "polygon active edges")?;

    if let Some((row_top, row_bottom)) = rows {
        if row_top > top {
            inactive.retain_mut(|e| {
                if e.bottom < row_top {
                    return false;
                }
                if e.top < row_top {
                    e.advance((row_top - e.top) as i64);
                    e.top = row_top;
                }
                true
            });
            top = row_top;
        }
        bottom = bottom.min(row_bottom);
    }

    inactive.sort_by_key(|e| e.top);
    inactive.reverse();

    for y in top..=bottom {
        while inactive.last().map_or(false, |e| e.top == y) {
            if let Some(edge) = inactive.pop() {
                insert_active(&mut active, edge);
            }
        }

        for pair in active.chunks_exact(2) {
            let x1 = (pair[0].x >> POLY_SHIFT) as i32;
            let x2 = ((pair[1].x + pair[1].w) >> POLY_SHIFT) as i32;
            cb(x1, x2, y);
        }

        active.retain_mut(|e| {
            if y >= e.bottom {
                return false;
            }
            e.advance(1);
            true
        });
        active.sort_by_key(PolyEdge::sort_key);
    }

    Ok(())
}
