//! Circular and elliptical arc generators.
//!
//! Angles are in 1/64 degree, counter-clockwise from three o'clock, with
//! screen y growing downwards. An arc is given by a start angle and a
//! signed sweep; a negative sweep runs clockwise.
//!
//! `circle_arc_generator` walks the circle pixel by pixel and reports
//! points. The elliptical variants work on an [`ArcSpec`] bounding box:
//! outlines report points, pies and wide arcs report spans. They take the
//! output rectangle and only scan the rows and columns inside it.

use crate::basics::{angle_to_radians, Rect, ANGLE_FULL_TURN, ANGLE_UNITS_PER_DEGREE};
use crate::ellipse_generator::{ellipse_generator, ellipse_row_extents};

/// An arc of the ellipse inscribed in `(x, y, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArcSpec {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Start angle, 1/64 degree.
    pub angle1: i32,
    /// Signed sweep, 1/64 degree.
    pub angle2: i32,
}

impl ArcSpec {
    pub fn new(x: i32, y: i32, width: i32, height: i32, angle1: i32, angle2: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle1,
            angle2,
        }
    }

    #[inline]
    fn center_and_radii(&self) -> (i32, i32, i32, i32) {
        let rx = self.width / 2;
        let ry = self.height / 2;
        (self.x + rx, self.y + ry, rx, ry)
    }
}

// ============================================================================
// Circle arc
// ============================================================================

/// Point at angle `a` on a circle of radius `r`, y flipped to screen space.
fn point_on_arc(r: i32, a: i32) -> (i32, i32) {
    let t = angle_to_radians(a);
    let s = -t.sin() * r as f64;
    let c = t.cos() * r as f64;
    let round = |v: f64| -> i32 {
        if v < 0.0 {
            (v - 0.5) as i32
        } else {
            (v + 0.5) as i32
        }
    };
    (round(c), round(s))
}

#[inline]
fn quadrant(px: i32, py: i32) -> i32 {
    if px >= 0 {
        if py <= 0 {
            0
        } else {
            3
        }
    } else if py < 0 {
        1
    } else {
        2
    }
}

/// Walk the arc of the circle `(x, y, r)` from `ang1` over the sweep `ang2`
/// and report each pixel. A sweep of a full turn or more draws the whole
/// circle.
pub fn circle_arc_generator<F: FnMut(i32, i32)>(
    x: i32,
    y: i32,
    r: i32,
    ang1: i32,
    ang2: i32,
    mut cb: F,
) {
    let (ang1, ang2) = if ang2 < 0 {
        (ang1 + ang2, ang1)
    } else {
        (ang1, ang2 + ang1)
    };

    let (sx, sy) = point_on_arc(r, ang1);
    let (ex, ey) = point_on_arc(r, ang2);
    let (mut px, mut py) = (sx, sy);

    let rr = r as i64 * r as i64;
    let mut xx = px as i64 * px as i64;
    let mut yy = py as i64 * py as i64 - rr;

    let mut q = quadrant(px, py);
    let sq = q;
    let mut qe = quadrant(ex, ey);
    if q > qe {
        qe += 4;
    } else if q == qe && (ang2 < ang1 || ang2 - ang1 >= ANGLE_FULL_TURN) {
        qe += 4;
    }

    let mut dy = if ((q + 1) & 2) == 0 { -1 } else { 1 };
    let mut dx = if (q & 2) == 0 { -1 } else { 1 };

    loop {
        if (q & 1) == 0 {
            if px == 0 {
                if qe == q {
                    break;
                }
                q += 1;
                dy = -dy;
            }
        } else if py == 0 {
            if qe == q {
                break;
            }
            q += 1;
            dx = -dx;
        }

        if qe == q {
            let mut det = 0;
            if (dy > 0 && py >= ey) || (dy <= 0 && py <= ey) {
                det += 1;
            }
            if (dx > 0 && px >= ex) || (dx <= 0 && px <= ex) {
                det += 1;
            }
            if det == 2 {
                break;
            }
        }

        cb(x + px, y + py);

        // Three candidates: step in x, in y, or both. Keep the one closest
        // to the true radius.
        let nx = (px + dx) as i64;
        let ny = (py + dy) as i64;
        let xx_new = nx * nx;
        let yy_new = ny * ny - rr;
        let rr1 = (xx_new + yy).abs();
        let rr2 = (xx_new + yy_new).abs();
        let rr3 = (xx + yy_new).abs();

        if rr3 >= rr1.min(rr2) {
            px += dx;
            xx = xx_new;
        }
        if rr1 > rr2.min(rr3) {
            py += dy;
            yy = yy_new;
        }
    }

    if px != sx || py != sy || sq == qe {
        cb(x + px, y + py);
    }
}

// ============================================================================
// Angle helpers for elliptical arcs
// ============================================================================

/// Normalize `(start, sweep)` to a non-negative start in `[0, full turn)`
/// and a non-negative sweep.
pub fn normalize_sweep(angle1: i32, angle2: i32) -> (i32, i32) {
    let (start, sweep) = if angle2 < 0 {
        (angle1 + angle2, -angle2)
    } else {
        (angle1, angle2)
    };
    (start.rem_euclid(ANGLE_FULL_TURN), sweep)
}

/// `true` if `theta` lies on the arc `(start, sweep)` from [`normalize_sweep`].
#[inline]
pub fn angle_in_sweep(theta: i32, start: i32, sweep: i32) -> bool {
    if sweep >= ANGLE_FULL_TURN {
        return true;
    }
    (theta - start).rem_euclid(ANGLE_FULL_TURN) <= sweep
}

/// Parametric angle of the offset `(dx, dy)` from the centre of an ellipse
/// with radii `rx`, `ry`, in 1/64 degree.
pub fn parametric_angle(dx: i32, dy: i32, rx: i32, ry: i32) -> i32 {
    let a = (-(dy as f64) * rx.max(1) as f64).atan2(dx as f64 * ry.max(1) as f64);
    let units = a.to_degrees() * ANGLE_UNITS_PER_DEGREE as f64;
    (units.round() as i32).rem_euclid(ANGLE_FULL_TURN)
}

// ============================================================================
// Elliptical arcs
// ============================================================================

/// Report every outline pixel of the elliptical arc inside `clip` once,
/// sorted by row.
pub fn ellipse_arc_generator<F: FnMut(i32, i32)>(arc: &ArcSpec, clip: &Rect, mut cb: F) {
    let (cx, cy, rx, ry) = arc.center_and_radii();
    let (start, sweep) = normalize_sweep(arc.angle1, arc.angle2);

    let mut pts: Vec<(i32, i32)> = Vec::new();
    ellipse_generator(cx, cy, rx, ry, |x1, x2, y| {
        for x in [x1, x2] {
            if clip.contains(x, y) {
                pts.push((y, x));
            }
        }
    });
    pts.sort_unstable();
    pts.dedup();

    for (y, x) in pts {
        let (dx, dy) = (x - cx, y - cy);
        if (dx == 0 && dy == 0) || angle_in_sweep(parametric_angle(dx, dy, rx, ry), start, sweep) {
            cb(x, y);
        }
    }
}

/// Report the spans of a pie slice inside `clip`: the part of the filled
/// ellipse whose parametric angle lies on the arc. The centre pixel always
/// belongs.
pub fn fill_arc_generator<F: FnMut(i32, i32, i32)>(arc: &ArcSpec, clip: &Rect, mut cb: F) {
    let (cx, cy, rx, ry) = arc.center_and_radii();
    let (start, sweep) = normalize_sweep(arc.angle1, arc.angle2);
    let rows = ellipse_row_extents(cx, cy, rx, ry);
    let top = cy - ry.max(0);

    let first = (clip.top - top).max(0) as usize;
    let last = (clip.bottom - top).max(0) as usize;
    for (idx, row) in rows.iter().enumerate().take(last).skip(first) {
        let Some((x1, x2)) = *row else {
            continue;
        };
        let y = top + idx as i32;
        let (x1, x2) = (x1.max(clip.left), x2.min(clip.right - 1));
        if x1 > x2 {
            continue;
        }
        if sweep >= ANGLE_FULL_TURN {
            cb(x1, x2, y);
            continue;
        }
        emit_runs(x1, x2, y, &mut cb, |x| {
            let (dx, dy) = (x - cx, y - cy);
            (dx == 0 && dy == 0) || angle_in_sweep(parametric_angle(dx, dy, rx, ry), start, sweep)
        });
    }
}

/// Report the spans of an arc stroked with a pen of `pen_width` pixels:
/// the ring between the ellipses with radii shrunk and grown by half the
/// pen width, restricted to the arc's angle range and to `clip`.
pub fn wide_arc_generator<F: FnMut(i32, i32, i32)>(arc: &ArcSpec, pen_width: i32, clip: &Rect, mut cb: F) {
    let (cx, cy, rx, ry) = arc.center_and_radii();
    let (start, sweep) = normalize_sweep(arc.angle1, arc.angle2);
    let hw = pen_width.max(1) as f64 / 2.0;
    let (orx, ory) = (rx as f64 + hw, ry as f64 + hw);
    let (irx, iry) = (rx as f64 - hw, ry as f64 - hw);
    let reach_x = orx.ceil() as i32;
    let reach_y = ory.ceil() as i32;

    let inside = |dx: f64, dy: f64, ax: f64, ay: f64| -> bool {
        if ax <= 0.0 || ay <= 0.0 {
            return false;
        }
        (dx * dx) / (ax * ax) + (dy * dy) / (ay * ay) <= 1.0
    };

    let (dy1, dy2) = ((-reach_y).max(clip.top - cy), reach_y.min(clip.bottom - 1 - cy));
    let (x1, x2) = ((cx - reach_x).max(clip.left), (cx + reach_x).min(clip.right - 1));
    for dy in dy1..=dy2 {
        let y = cy + dy;
        emit_runs(x1, x2, y, &mut cb, |x| {
            let dx = x - cx;
            let (fx, fy) = (dx as f64, dy as f64);
            if !inside(fx, fy, orx, ory) || inside(fx, fy, irx, iry) {
                return false;
            }
            (dx == 0 && dy == 0) || angle_in_sweep(parametric_angle(dx, dy, rx, ry), start, sweep)
        });
    }
}

/// Report maximal runs of `x` in `[x1, x2]` for which `keep` holds.
fn emit_runs<F, K>(x1: i32, x2: i32, y: i32, cb: &mut F, mut keep: K)
where
    F: FnMut(i32, i32, i32),
    K: FnMut(i32) -> bool,
{
    let mut run: Option<i32> = None;
    for x in x1..=x2 {
        match (keep(x), run) {
            (true, None) => run = Some(x),
            (false, Some(s)) => {
                cb(s, x - 1, y);
                run = None;
            }
            _ => {}
        }
    }
    if let Some(s) = run {
        cb(s, x2, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const EVERYWHERE: Rect = Rect::new(-10_000, -10_000, 10_000, 10_000);

    fn span_pixels(spans: &[(i32, i32, i32)]) -> BTreeSet<(i32, i32)> {
        spans.iter().flat_map(|&(x1, x2, y)| (x1..=x2).map(move |x| (x, y))).collect()
    }

    fn arc_points(x: i32, y: i32, r: i32, a1: i32, a2: i32) -> Vec<(i32, i32)> {
        let mut v = Vec::new();
        circle_arc_generator(x, y, r, a1, a2, |px, py| v.push((px, py)));
        v
    }

    #[test]
    fn test_quarter_arc() {
        let pts = arc_points(0, 0, 10, 0, 90 * 64);
        assert_eq!(pts.len(), 15);
        assert_eq!(pts.first(), Some(&(10, 0)));
        assert_eq!(pts.last(), Some(&(0, -10)));
        assert!(pts.iter().all(|&(x, y)| x >= 0 && y <= 0));
    }

    #[test]
    fn test_negative_sweep_is_same_arc() {
        let a: BTreeSet<_> = arc_points(0, 0, 10, 0, 90 * 64).into_iter().collect();
        let b: BTreeSet<_> = arc_points(0, 0, 10, 90 * 64, -90 * 64).into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_full_turn_draws_whole_circle() {
        let pts = arc_points(0, 0, 10, 0, 360 * 64);
        let unique: BTreeSet<_> = pts.iter().copied().collect();
        assert_eq!(pts.len(), 56);
        assert_eq!(unique.len(), 56);
    }

    #[test]
    fn test_zero_radius_arc() {
        assert_eq!(arc_points(5, 5, 0, 0, 30 * 64), vec![(5, 5)]);
    }

    #[test]
    fn test_sweep_helpers() {
        assert_eq!(normalize_sweep(90 * 64, -90 * 64), (0, 90 * 64));
        assert_eq!(normalize_sweep(-90 * 64, 45 * 64), (270 * 64, 45 * 64));
        assert!(angle_in_sweep(10, 350 * 64, 20 * 64));
        assert!(!angle_in_sweep(180 * 64, 350 * 64, 20 * 64));
        assert_eq!(parametric_angle(5, 0, 5, 3), 0);
        assert_eq!(parametric_angle(0, -3, 5, 3), 90 * 64);
        assert_eq!(parametric_angle(-5, 0, 5, 3), 180 * 64);
    }

    #[test]
    fn test_ellipse_arc_stays_in_quadrant() {
        let arc = ArcSpec::new(0, 0, 40, 20, 0, 90 * 64);
        let mut pts = Vec::new();
        ellipse_arc_generator(&arc, &EVERYWHERE, |x, y| pts.push((x, y)));
        assert!(!pts.is_empty());
        assert!(pts.iter().all(|&(x, y)| x >= 20 && y <= 10));
        assert!(pts.contains(&(40, 10)));
        assert!(pts.contains(&(20, 0)));
    }

    #[test]
    fn test_full_pie_is_filled_ellipse() {
        let arc = ArcSpec::new(0, 0, 8, 8, 0, 360 * 64);
        let mut rows = Vec::new();
        fill_arc_generator(&arc, &EVERYWHERE, |x1, x2, y| rows.push((x1, x2, y)));
        assert_eq!(rows.len(), 9);
        assert!(rows.contains(&(0, 8, 4)));
    }

    #[test]
    fn test_half_pie_upper() {
        let arc = ArcSpec::new(0, 0, 20, 20, 0, 180 * 64);
        let mut spans = Vec::new();
        fill_arc_generator(&arc, &EVERYWHERE, |x1, x2, y| spans.push((x1, x2, y)));
        assert!(spans.iter().all(|&(_, _, y)| y <= 10));
        assert!(spans.contains(&(0, 20, 10)));
    }

    #[test]
    fn test_wide_arc_ring() {
        let arc = ArcSpec::new(0, 0, 20, 20, 0, 360 * 64);
        let mut hit = BTreeSet::new();
        wide_arc_generator(&arc, 4, &EVERYWHERE, |x1, x2, y| {
            for x in x1..=x2 {
                hit.insert((x, y));
            }
        });
        assert!(hit.contains(&(20, 10)));
        assert!(hit.contains(&(10, 0)));
        assert!(!hit.contains(&(10, 10)));
        assert!(!hit.contains(&(10, 5)));
    }

    #[test]
    fn test_large_arcs_clip_before_scanning() {
        let arc = ArcSpec::new(-500, -200, 1400, 900, 10 * 64, 300 * 64);
        let clip = Rect::new(40, 30, 90, 70);
        let inside = |set: BTreeSet<(i32, i32)>| -> BTreeSet<(i32, i32)> {
            set.into_iter().filter(|&(x, y)| clip.contains(x, y)).collect()
        };

        let mut full = Vec::new();
        fill_arc_generator(&arc, &EVERYWHERE, |x1, x2, y| full.push((x1, x2, y)));
        let mut part = Vec::new();
        fill_arc_generator(&arc, &clip, |x1, x2, y| part.push((x1, x2, y)));
        assert!(part.iter().all(|&(x1, x2, y)| clip.contains(x1, y) && clip.contains(x2, y)));
        assert_eq!(span_pixels(&part), inside(span_pixels(&full)));
        assert!(!part.is_empty());

        // The ring crosses the clip around its rightmost point (160, 30).
        let ring = ArcSpec::new(-100, -100, 260, 260, 0, 360 * 64);
        let clip = Rect::new(120, 0, 170, 60);
        let mut full = Vec::new();
        wide_arc_generator(&ring, 5, &EVERYWHERE, |x1, x2, y| full.push((x1, x2, y)));
        let mut part = Vec::new();
        wide_arc_generator(&ring, 5, &clip, |x1, x2, y| part.push((x1, x2, y)));
        assert!(!part.is_empty());
        let expected: BTreeSet<_> = span_pixels(&full).into_iter().filter(|&(x, y)| clip.contains(x, y)).collect();
        assert_eq!(span_pixels(&part), expected);

        let mut full = BTreeSet::new();
        ellipse_arc_generator(&ring, &EVERYWHERE, |x, y| {
            full.insert((x, y));
        });
        let mut part = BTreeSet::new();
        ellipse_arc_generator(&ring, &clip, |x, y| {
            part.insert((x, y));
        });
        assert!(!part.is_empty());
        let expected: BTreeSet<_> = full.into_iter().filter(|&(x, y)| clip.contains(x, y)).collect();
        assert_eq!(part, expected);
    }

    #[test]
    fn test_arc_outside_clip_reports_nothing() {
        let arc = ArcSpec::new(0, 0, 100, 100, 0, 360 * 64);
        let clip = Rect::new(30, 30, 70, 70);
        let mut n = 0;
        ellipse_arc_generator(&arc, &clip, |_, _| n += 1);
        wide_arc_generator(&arc, 3, &clip, |_, _, _| n += 1);
        assert_eq!(n, 0);
    }
}
