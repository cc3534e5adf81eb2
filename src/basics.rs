//! Foundation value types and integer helpers.
//!
//! Plain geometry types shared by every stage of the rasterizer: points,
//! rectangles with exclusive right/bottom edges, sizes, and the exact
//! floor/ceil integer division used by the pixel-perfect line clipper.
//! Also home of the crate's single fixed-point angle unit.

// ============================================================================
// Rounding and integer division
// ============================================================================

/// Round a double to the nearest integer (round half away from zero).
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

/// Integer division rounding toward negative infinity.
///
/// `b` must be non-zero.
#[inline]
pub fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Integer division rounding toward positive infinity.
///
/// `b` must be non-zero.
#[inline]
pub fn ceil_div(a: i64, b: i64) -> i64 {
    -floor_div(-a, b)
}

// ============================================================================
// Angles
// ============================================================================

/// Angle units per degree. Every angle in this crate is expressed in
/// 1/64 of a degree: arc start/sweep angles as well as text rotation.
pub const ANGLE_UNITS_PER_DEGREE: i32 = 64;

/// A full turn in angle units.
pub const ANGLE_FULL_TURN: i32 = 360 * ANGLE_UNITS_PER_DEGREE;

/// Convert a text rotation in tenths of a degree (the `LogFont` unit) to
/// 1/64 degree units. `tenths * 64 / 10`, reduced to `tenths * 32 / 5`.
#[inline]
pub fn tenths_to_angle(tenths: i32) -> i32 {
    ((tenths as i64 * 32) / 5) as i32
}

/// Convert 1/64 degree units to radians.
#[inline]
pub fn angle_to_radians(angle: i32) -> f64 {
    (angle as f64 / ANGLE_UNITS_PER_DEGREE as f64).to_radians()
}

/// Reduce an angle into `[0, ANGLE_FULL_TURN)`.
#[inline]
pub fn normalize_angle(angle: i32) -> i32 {
    angle.rem_euclid(ANGLE_FULL_TURN)
}

// ============================================================================
// Point / Size
// ============================================================================

/// An integer point in logical, device or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair, e.g. the extent of a glyph string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub cx: i32,
    pub cy: i32,
}

impl Size {
    #[inline]
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Integer rectangle. `left`/`top` are inclusive, `right`/`bottom` are
/// exclusive, so a rectangle with `right == left` covers no pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from origin and size.
    #[inline]
    pub const fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// `true` if the rectangle covers no pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Swap edges so that `left <= right` and `top <= bottom`.
    pub fn normalize(&mut self) -> &mut Self {
        if self.left > self.right {
            core::mem::swap(&mut self.left, &mut self.right);
        }
        if self.top > self.bottom {
            core::mem::swap(&mut self.top, &mut self.bottom);
        }
        self
    }

    /// Normalized copy.
    #[inline]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// `true` if pixel `(x, y)` lies inside.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// `true` if `inner` is non-empty and lies entirely inside `self`.
    #[inline]
    pub fn covers(&self, inner: &Rect) -> bool {
        !inner.is_empty()
            && inner.left >= self.left
            && inner.right <= self.right
            && inner.top >= self.top
            && inner.bottom <= self.bottom
    }

    /// `true` if the two rectangles share at least one pixel.
    #[inline]
    pub fn overlaps(&self, r: &Rect) -> bool {
        self.left.max(r.left) < self.right.min(r.right)
            && self.top.max(r.top) < self.bottom.min(r.bottom)
    }

    /// Intersection, or `None` when the rectangles do not overlap.
    pub fn intersect(&self, r: &Rect) -> Option<Rect> {
        let out = Rect::new(
            self.left.max(r.left),
            self.top.max(r.top),
            self.right.min(r.right),
            self.bottom.min(r.bottom),
        );
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Smallest rectangle covering both. An empty operand is ignored.
    pub fn bound(&self, r: &Rect) -> Rect {
        if self.is_empty() {
            return *r;
        }
        if r.is_empty() {
            return *self;
        }
        Rect::new(
            self.left.min(r.left),
            self.top.min(r.top),
            self.right.max(r.right),
            self.bottom.max(r.bottom),
        )
    }

    /// Grow by `dx` on both horizontal edges and `dy` on both vertical ones.
    #[inline]
    pub fn inflate(&mut self, dx: i32, dy: i32) {
        self.left -= dx;
        self.right += dx;
        self.top -= dy;
        self.bottom += dy;
    }

    #[inline]
    pub fn offset(&mut self, dx: i32, dy: i32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    /// Bounding rectangle of a point set, exclusive on the right/bottom.
    pub fn from_points(pts: &[Point]) -> Rect {
        let Some(first) = pts.first() else {
            return Rect::default();
        };
        let mut rc = Rect::new(first.x, first.y, first.x, first.y);
        for p in &pts[1..] {
            rc.left = rc.left.min(p.x);
            rc.right = rc.right.max(p.x);
            rc.top = rc.top.min(p.y);
            rc.bottom = rc.bottom.max(p.y);
        }
        rc.right += 1;
        rc.bottom += 1;
        rc
    }
}

// ============================================================================
// Span
// ============================================================================

/// A horizontal run of `width` pixels starting at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub x: i32,
    pub y: i32,
    pub width: i32,
}

impl Span {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32) -> Self {
        Self { x, y, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iround() {
        assert_eq!(iround(0.4), 0);
        assert_eq!(iround(0.5), 1);
        assert_eq!(iround(-0.5), -1);
        assert_eq!(iround(-1.4), -1);
    }

    #[test]
    fn test_floor_ceil_div() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(-6, 2), -3);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(6, 3), 2);
        assert_eq!(floor_div(7, -2), -4);
    }

    #[test]
    fn test_angle_units() {
        assert_eq!(tenths_to_angle(900), 90 * ANGLE_UNITS_PER_DEGREE);
        assert_eq!(tenths_to_angle(3600), ANGLE_FULL_TURN);
        assert_eq!(normalize_angle(-64), ANGLE_FULL_TURN - 64);
        assert!((angle_to_radians(180 * 64) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_rect_intersect_and_bound() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 20, 20);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 5, 10, 10)));
        assert_eq!(a.bound(&b), Rect::new(0, 0, 20, 20));
        assert_eq!(a.intersect(&Rect::new(10, 0, 20, 10)), None);
        assert_eq!(Rect::default().bound(&a), a);
    }

    #[test]
    fn test_rect_contains_is_exclusive() {
        let r = Rect::from_xywh(2, 3, 4, 5);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 7));
        assert!(!r.contains(5, 8));
        assert!(r.covers(&Rect::new(2, 3, 6, 8)));
        assert!(!r.covers(&Rect::new(2, 3, 7, 8)));
    }

    #[test]
    fn test_rect_normalize_and_points() {
        let r = Rect::new(10, 8, 2, 1).normalized();
        assert_eq!(r, Rect::new(2, 1, 10, 8));
        let pts = [Point::new(3, 9), Point::new(-1, 2), Point::new(4, 4)];
        assert_eq!(Rect::from_points(&pts), Rect::new(-1, 2, 5, 10));
    }
}
