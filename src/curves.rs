//! Cubic Bezier flattening by forward differencing.
//!
//! A spline through four control points is reduced to a short polyline.
//! The point count grows with the square root of the control polygon
//! length, so short curves keep a few points and long ones do not explode.

use crate::basics::Point;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on the number of points a spline is flattened into.
pub const MAX_SPLINE_POINTS: usize = 64;

// ============================================================================
// Spline
// ============================================================================

/// Number of polyline points used for the spline with control points `cp`.
///
/// `sqrt(|p0p1| + |p1p2| + |p2p3|) * 1.2`, clamped to `2..=MAX_SPLINE_POINTS`.
pub fn spline_point_count(cp: &[Point; 4]) -> usize {
    let dist = |a: Point, b: Point| {
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        (dx * dx + dy * dy).sqrt()
    };
    let len = dist(cp[0], cp[1]) + dist(cp[1], cp[2]) + dist(cp[2], cp[3]);
    let n = (len.sqrt() * 1.2) as usize;
    n.clamp(2, MAX_SPLINE_POINTS)
}

/// Forward-difference one coordinate of the cubic into `out`.
fn forward_differences(c: [f64; 4], npts: usize, mut store: impl FnMut(usize, i32)) {
    let dt = 1.0 / (npts - 1) as f64;
    let dt2 = dt * dt;
    let dt3 = dt2 * dt;

    let dt2_term = dt2 * 3.0 * (c[2] - 2.0 * c[1] + c[0]);
    let dt3_term = dt3 * (c[3] + 3.0 * (c[1] - c[2]) - c[0]);

    let dddv = 6.0 * dt3_term;
    let mut ddv = -6.0 * dt3_term + 2.0 * dt2_term;
    let mut dv = dt3_term - dt2_term + 3.0 * dt * (c[1] - c[0]);
    let mut v = c[0] + 0.5;

    store(0, c[0] as i32);
    for i in 1..npts {
        ddv += dddv;
        dv += ddv;
        v += dv;
        store(i, v as i32);
    }
}

/// Flatten the cubic Bezier `cp` into `npts` points (at least two).
///
/// The first point is exactly `cp[0]`; the last lands on `cp[3]` up to
/// floating-point accumulation.
pub fn calc_spline(cp: &[Point; 4], npts: usize) -> Vec<Point> {
    let npts = npts.max(2);
    let mut out = vec![Point::new(0, 0); npts];
    let xs = [cp[0].x, cp[1].x, cp[2].x, cp[3].x].map(f64::from);
    let ys = [cp[0].y, cp[1].y, cp[2].y, cp[3].y].map(f64::from);
    forward_differences(xs, npts, |i, v| out[i].x = v);
    forward_differences(ys, npts, |i, v| out[i].y = v);
    out
}

/// Flatten a spline with the automatic point count.
#[inline]
pub fn spline_points(cp: &[Point; 4]) -> Vec<Point> {
    calc_spline(cp, spline_point_count(cp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_count_scales_with_length() {
        let short = [Point::new(0, 0), Point::new(1, 0), Point::new(2, 0), Point::new(3, 0)];
        assert_eq!(spline_point_count(&short), 2);
        let mid = [Point::new(0, 0), Point::new(30, 40), Point::new(60, 0), Point::new(100, 0)];
        // 50 + 50 + 40 = 140, sqrt = 11.83, * 1.2 = 14.2
        assert_eq!(spline_point_count(&mid), 14);
        let huge = [
            Point::new(0, 0),
            Point::new(5000, 0),
            Point::new(5000, 5000),
            Point::new(0, 5000),
        ];
        assert_eq!(spline_point_count(&huge), MAX_SPLINE_POINTS);
    }

    #[test]
    fn test_endpoints() {
        let cp = [Point::new(10, 20), Point::new(40, 80), Point::new(90, -30), Point::new(120, 20)];
        let pts = spline_points(&cp);
        assert_eq!(pts[0], cp[0]);
        let last = pts[pts.len() - 1];
        assert!((last.x - 120).abs() <= 1 && (last.y - 20).abs() <= 1);
    }

    #[test]
    fn test_straight_spline_stays_on_line() {
        let cp = [Point::new(0, 5), Point::new(20, 5), Point::new(40, 5), Point::new(60, 5)];
        let pts = calc_spline(&cp, 7);
        assert_eq!(pts.len(), 7);
        assert!(pts.iter().all(|p| p.y == 5));
        assert!(pts.windows(2).all(|w| w[1].x >= w[0].x));
        assert_eq!(pts[3].x, 30);
    }
}
