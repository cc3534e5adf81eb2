//! Coordinate spaces: logical, device and screen.
//!
//! Logical coordinates are what drawing calls take. The mapping mode maps
//! them to device coordinates (relative to the context's device rectangle),
//! and a fixed translation by the device origin maps device to screen, the
//! space the surface and clip region live in.
//!
//! All scaling uses truncating integer division in 64-bit intermediates.

use crate::basics::{Point, Rect};
use crate::error::{RasterError, Result};

/// Mapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapMode {
    /// Identity: one logical unit is one device pixel.
    #[default]
    Text,
    /// Independent x/y scaling by `viewport_ext / window_ext`.
    Anisotropic,
}

/// Mapping mode state of a device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub mode: MapMode,
    window_org: Point,
    window_ext: Point,
    viewport_org: Point,
    viewport_ext: Point,
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            mode: MapMode::Text,
            window_org: Point::new(0, 0),
            window_ext: Point::new(1, 1),
            viewport_org: Point::new(0, 0),
            viewport_ext: Point::new(1, 1),
        }
    }
}

#[inline]
fn scale(v: i32, num: i32, den: i32) -> i32 {
    if den == 0 {
        return v;
    }
    (v as i64 * num as i64 / den as i64) as i32
}

impl Mapping {
    pub fn window_org(&self) -> Point {
        self.window_org
    }

    pub fn window_ext(&self) -> Point {
        self.window_ext
    }

    pub fn viewport_org(&self) -> Point {
        self.viewport_org
    }

    pub fn viewport_ext(&self) -> Point {
        self.viewport_ext
    }

    pub fn set_window_org(&mut self, org: Point) {
        self.window_org = org;
    }

    pub fn set_viewport_org(&mut self, org: Point) {
        self.viewport_org = org;
    }

    /// Set the window extent. Zero in either axis is rejected.
    pub fn set_window_ext(&mut self, ext: Point) -> Result<()> {
        if ext.x == 0 || ext.y == 0 {
            return Err(RasterError::DegenerateMapping);
        }
        self.window_ext = ext;
        Ok(())
    }

    /// Set the viewport extent. Zero in either axis is rejected.
    pub fn set_viewport_ext(&mut self, ext: Point) -> Result<()> {
        if ext.x == 0 || ext.y == 0 {
            return Err(RasterError::DegenerateMapping);
        }
        self.viewport_ext = ext;
        Ok(())
    }

    /// `(p - window_org) * viewport_ext / window_ext + viewport_org`.
    pub fn lp_to_dp(&self, p: Point) -> Point {
        if self.mode == MapMode::Text {
            return p;
        }
        Point::new(
            scale(p.x - self.window_org.x, self.viewport_ext.x, self.window_ext.x)
                + self.viewport_org.x,
            scale(p.y - self.window_org.y, self.viewport_ext.y, self.window_ext.y)
                + self.viewport_org.y,
        )
    }

    /// `(p - viewport_org) * window_ext / viewport_ext + window_org`.
    pub fn dp_to_lp(&self, p: Point) -> Point {
        if self.mode == MapMode::Text {
            return p;
        }
        Point::new(
            scale(p.x - self.viewport_org.x, self.window_ext.x, self.viewport_ext.x)
                + self.window_org.x,
            scale(p.y - self.viewport_org.y, self.window_ext.y, self.viewport_ext.y)
                + self.window_org.y,
        )
    }
}

// ============================================================================
// CoordSpace
// ============================================================================

/// Mapping plus the device rectangle in screen space.
///
/// A screen-equivalent space has no device-to-screen translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordSpace {
    pub mapping: Mapping,
    dev_rc: Rect,
    is_screen: bool,
}

impl CoordSpace {
    /// Screen-equivalent space covering `rc`.
    pub fn screen(rc: Rect) -> Self {
        Self {
            mapping: Mapping::default(),
            dev_rc: rc,
            is_screen: true,
        }
    }

    /// Window-style space whose device origin sits at `dev_rc.left/top`.
    pub fn window(dev_rc: Rect) -> Self {
        Self {
            mapping: Mapping::default(),
            dev_rc,
            is_screen: false,
        }
    }

    #[inline]
    pub fn dev_rc(&self) -> Rect {
        self.dev_rc
    }

    #[inline]
    pub fn is_screen(&self) -> bool {
        self.is_screen
    }

    #[inline]
    pub fn dp_to_sp(&self, p: Point) -> Point {
        if self.is_screen {
            return p;
        }
        Point::new(p.x + self.dev_rc.left, p.y + self.dev_rc.top)
    }

    #[inline]
    pub fn sp_to_dp(&self, p: Point) -> Point {
        if self.is_screen {
            return p;
        }
        Point::new(p.x - self.dev_rc.left, p.y - self.dev_rc.top)
    }

    #[inline]
    pub fn lp_to_dp(&self, p: Point) -> Point {
        if self.is_screen {
            return p;
        }
        self.mapping.lp_to_dp(p)
    }

    #[inline]
    pub fn dp_to_lp(&self, p: Point) -> Point {
        if self.is_screen {
            return p;
        }
        self.mapping.dp_to_lp(p)
    }

    #[inline]
    pub fn lp_to_sp(&self, p: Point) -> Point {
        self.dp_to_sp(self.lp_to_dp(p))
    }

    #[inline]
    pub fn sp_to_lp(&self, p: Point) -> Point {
        self.dp_to_lp(self.sp_to_dp(p))
    }

    /// Convert a rectangle, keeping it normalized.
    pub fn rect_lp_to_sp(&self, rc: Rect) -> Rect {
        let a = self.lp_to_sp(Point::new(rc.left, rc.top));
        let b = self.lp_to_sp(Point::new(rc.right, rc.bottom));
        Rect::new(a.x, a.y, b.x, b.y).normalized()
    }

    fn text_like(&self) -> bool {
        self.is_screen || self.mapping.mode == MapMode::Text
    }

    /// Scale a horizontal logical extent (width, radius) to device pixels.
    pub fn extent_x_lp_to_sp(&self, e: i32) -> i32 {
        if self.text_like() {
            return e;
        }
        scale(e, self.mapping.viewport_ext.x, self.mapping.window_ext.x)
    }

    pub fn extent_x_sp_to_lp(&self, e: i32) -> i32 {
        if self.text_like() {
            return e;
        }
        scale(e, self.mapping.window_ext.x, self.mapping.viewport_ext.x)
    }

    pub fn extent_y_lp_to_sp(&self, e: i32) -> i32 {
        if self.text_like() {
            return e;
        }
        scale(e, self.mapping.viewport_ext.y, self.mapping.window_ext.y)
    }

    pub fn extent_y_sp_to_lp(&self, e: i32) -> i32 {
        if self.text_like() {
            return e;
        }
        scale(e, self.mapping.window_ext.y, self.mapping.viewport_ext.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(wext: Point, vext: Point) -> CoordSpace {
        let mut cs = CoordSpace::window(Rect::new(7, 11, 207, 211));
        cs.mapping.mode = MapMode::Anisotropic;
        cs.mapping.set_window_org(Point::new(-5, 3));
        cs.mapping.set_viewport_org(Point::new(2, -9));
        cs.mapping.set_window_ext(wext).unwrap();
        cs.mapping.set_viewport_ext(vext).unwrap();
        cs
    }

    #[test]
    fn test_text_mode_translates_only() {
        let cs = CoordSpace::window(Rect::new(10, 20, 110, 120));
        assert_eq!(cs.lp_to_sp(Point::new(1, 2)), Point::new(11, 22));
        assert_eq!(cs.sp_to_lp(Point::new(11, 22)), Point::new(1, 2));
        assert_eq!(cs.extent_x_lp_to_sp(9), 9);
    }

    #[test]
    fn test_screen_space_is_identity() {
        let mut cs = CoordSpace::screen(Rect::new(10, 20, 110, 120));
        cs.mapping.mode = MapMode::Anisotropic;
        cs.mapping.set_viewport_ext(Point::new(3, 3)).unwrap();
        assert_eq!(cs.lp_to_sp(Point::new(5, 6)), Point::new(5, 6));
    }

    #[test]
    fn test_anisotropic_formula() {
        let cs = scaled(Point::new(2, 4), Point::new(3, 8));
        // (1 - -5) * 3 / 2 + 2 = 11; (5 - 3) * 8 / 4 - 9 = -5
        assert_eq!(cs.lp_to_dp(Point::new(1, 5)), Point::new(11, -5));
        assert_eq!(cs.lp_to_sp(Point::new(1, 5)), Point::new(18, 6));
        assert_eq!(cs.extent_x_lp_to_sp(10), 15);
        assert_eq!(cs.extent_y_lp_to_sp(10), 20);
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let configs = [
            (Point::new(1, 1), Point::new(1, 1)),
            (Point::new(2, 3), Point::new(3, 7)),
            (Point::new(-4, 5), Point::new(-9, 5)),
            (Point::new(10, 10), Point::new(25, 13)),
        ];
        for (w, v) in configs {
            let cs = scaled(w, v);
            for x in -40..40 {
                for y in [-17, 0, 1, 23] {
                    let p = Point::new(x, y);
                    let back = cs.sp_to_lp(cs.lp_to_sp(p));
                    assert!((back.x - p.x).abs() <= 1, "{:?} -> {:?}", p, back);
                    assert!((back.y - p.y).abs() <= 1, "{:?} -> {:?}", p, back);
                }
            }
        }
    }

    #[test]
    fn test_zero_extent_rejected() {
        let mut m = Mapping::default();
        assert_eq!(m.set_window_ext(Point::new(0, 1)), Err(RasterError::DegenerateMapping));
        assert_eq!(m.set_viewport_ext(Point::new(4, 0)), Err(RasterError::DegenerateMapping));
        assert_eq!(m.window_ext(), Point::new(1, 1));
    }
}
