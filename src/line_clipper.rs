//! Pixel-perfect line clipping.
//!
//! A line is clipped by narrowing its Bresenham walk to the range of steps
//! whose pixels fall inside one rectangle. The walk keeps the original
//! deltas and resumes with the error term it would carry at the first
//! visible step, so the clipped walk touches exactly the pixels the
//! unclipped walk touches inside the rectangle. Step bounds come from exact
//! floor/ceil division.

use crate::basics::{ceil_div, floor_div, Point, Rect};
use crate::line_generator::LineGenerator;

// ============================================================================
// Outcodes
// ============================================================================

pub const OC_LEFT: u32 = 1;
pub const OC_RIGHT: u32 = 2;
pub const OC_TOP: u32 = 4;
pub const OC_BOTTOM: u32 = 8;

/// Outcode of `(x, y)` against `clip` (exclusive right/bottom).
///
/// ```text
///   0101 | 0100 | 0110
///  ------+------+------
///   0001 | 0000 | 0010
///  ------+------+------
///   1001 | 1000 | 1010
/// ```
#[inline]
pub fn outcode(x: i32, y: i32, clip: &Rect) -> u32 {
    let mut code = 0;
    if x < clip.left {
        code |= OC_LEFT;
    } else if x >= clip.right {
        code |= OC_RIGHT;
    }
    if y < clip.top {
        code |= OC_TOP;
    } else if y >= clip.bottom {
        code |= OC_BOTTOM;
    }
    code
}

/// Clip the line `p0`-`p1` to `clip`.
///
/// Returns the walk restricted to the pixels inside `clip`, or `None` when
/// no pixel of the line is inside.
pub fn clip_line(p0: Point, p1: Point, clip: &Rect) -> Option<LineGenerator> {
    let first = outcode(p0.x, p0.y, clip);
    let last = outcode(p1.x, p1.y, clip);
    if (first & last) != 0 || clip.is_empty() {
        return None;
    }
    let line = LineGenerator::new(p0.x, p0.y, p1.x, p1.y);
    if (first | last) == 0 {
        return Some(line);
    }

    let dx = p1.x as i64 - p0.x as i64;
    let dy = p1.y as i64 - p0.y as i64;
    let (x0, y0) = (p0.x as i64, p0.y as i64);
    let (left, top) = (clip.left as i64, clip.top as i64);
    let (right, bottom) = (clip.right as i64 - 1, clip.bottom as i64 - 1);
    let (a0, da, alo, ahi, b0, db, blo, bhi) = if dx.abs() >= dy.abs() {
        (x0, dx, left, right, y0, dy, top, bottom)
    } else {
        (y0, dy, top, bottom, x0, dx, left, right)
    };
    let major = da.abs();
    let minor = db.abs();
    let rem0 = major >> 1;

    // Steps whose major coordinate is inside.
    let (klo, khi) = if da > 0 { (alo - a0, ahi - a0) } else { (a0 - ahi, a0 - alo) };
    let mut kmin = klo.max(0);
    let mut kmax = khi.min(major);

    // Minor steps taken by step k are (rem0 + k * minor) / major.
    let (flo, fhi) = if db > 0 { (blo - b0, bhi - b0) } else { (b0 - bhi, b0 - blo) };
    if minor == 0 {
        if flo > 0 || fhi < 0 {
            return None;
        }
    } else {
        kmin = kmin.max(ceil_div(flo * major - rem0, minor));
        kmax = kmax.min(floor_div((fhi + 1) * major - rem0 - 1, minor));
    }
    if kmin > kmax {
        return None;
    }
    Some(line.window(kmin as i32, kmax as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_generator::line_points;

    fn clipped(x0: i32, y0: i32, x1: i32, y1: i32, clip: &Rect) -> Vec<Point> {
        clip_line(Point::new(x0, y0), Point::new(x1, y1), clip)
            .map(|walk| walk.points().collect())
            .unwrap_or_default()
    }

    fn inside(x0: i32, y0: i32, x1: i32, y1: i32, clip: &Rect) -> Vec<Point> {
        line_points(x0, y0, x1, y1).filter(|p| clip.contains(p.x, p.y)).collect()
    }

    #[test]
    fn test_outcodes() {
        let clip = Rect::new(0, 0, 10, 10);
        assert_eq!(outcode(5, 5, &clip), 0);
        assert_eq!(outcode(-1, -1, &clip), OC_LEFT | OC_TOP);
        assert_eq!(outcode(10, 9, &clip), OC_RIGHT);
        assert_eq!(outcode(3, 10, &clip), OC_BOTTOM);
    }

    #[test]
    fn test_pixel_and_axis_lines() {
        let clip = Rect::new(0, 0, 10, 10);
        assert_eq!(clipped(3, 3, 3, 3, &clip), vec![Point::new(3, 3)]);
        assert!(clipped(12, 3, 12, 3, &clip).is_empty());

        let v = clipped(3, 20, 3, -5, &clip);
        assert_eq!(v.len(), 10);
        assert_eq!((v[0], v[9]), (Point::new(3, 9), Point::new(3, 0)));

        let h = clipped(-4, 2, 14, 2, &clip);
        assert_eq!((h[0], h[h.len() - 1]), (Point::new(0, 2), Point::new(9, 2)));
        assert!(clipped(10, 2, 14, 2, &clip).is_empty());
    }

    #[test]
    fn test_trivial_reject() {
        let clip = Rect::new(0, 0, 10, 10);
        assert!(clip_line(Point::new(-5, -5), Point::new(-1, -20), &clip).is_none());
        assert!(clip_line(Point::new(0, 0), Point::new(5, 5), &Rect::new(4, 4, 4, 9)).is_none());
        // Ends outside on different sides, line misses the corner.
        assert!(clipped(-3, 8, 3, 14, &clip).is_empty());
        assert!(inside(-3, 8, 3, 14, &clip).is_empty());
    }

    #[test]
    fn test_steep_line_keeps_every_inside_pixel() {
        let clip = Rect::new(15, 5, 38, 49);
        let pts = clipped(4, 43, 22, 1, &clip);
        assert!(pts.contains(&Point::new(19, 9)));
        assert!(pts.contains(&Point::new(16, 14)));
        assert_eq!(pts, inside(4, 43, 22, 1, &clip));
    }

    #[test]
    fn test_clipped_walk_matches_unclipped_inside() {
        // Deterministic pseudo-random lines against a few rectangles.
        let mut seed = 0x2545_f491_u32;
        let mut next = |range: i32| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % range as u32) as i32 - range / 4
        };
        let clips = [
            Rect::new(3, 2, 17, 13),
            Rect::new(15, 5, 38, 49),
            Rect::new(0, 0, 1, 40),
            Rect::new(-8, 20, 60, 21),
        ];
        for clip in &clips {
            for _ in 0..500 {
                let (x0, y0, x1, y1) = (next(64), next(64), next(64), next(64));
                assert_eq!(
                    clipped(x0, y0, x1, y1, clip),
                    inside(x0, y0, x1, y1, clip),
                    "line {:?} clip {:?}",
                    (x0, y0, x1, y1),
                    clip
                );
            }
        }
    }
}
