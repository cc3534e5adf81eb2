//! Bresenham line stepping.
//!
//! The generator does not know absolute positions: it reports a step
//! `(dx, dy)` per pixel, starting with `(0, 0)` for the first endpoint.
//! The caller keeps the running position. Both endpoints are included.

use crate::basics::Point;

/// Step iterator for the integer line `(x1, y1)-(x2, y2)`.
#[derive(Debug, Clone)]
pub struct LineGenerator {
    x: i32,
    y: i32,
    x2: i32,
    y2: i32,
    xinc: i32,
    yinc: i32,
    xdelta: i32,
    ydelta: i32,
    rem: i32,
    started: bool,
}

impl LineGenerator {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let xdelta = (x2 - x1).abs();
        let ydelta = (y2 - y1).abs();
        let rem = if xdelta >= ydelta { xdelta >> 1 } else { ydelta >> 1 };
        Self {
            x: x1,
            y: y1,
            x2,
            y2,
            xinc: if x2 > x1 { 1 } else { -1 },
            yinc: if y2 > y1 { 1 } else { -1 },
            xdelta,
            ydelta,
            rem,
            started: false,
        }
    }

    /// Restrict the walk to steps `first..=last`, keeping the error term the
    /// full walk would carry at step `first`.
    ///
    /// Step indices count along the major axis from the first endpoint and
    /// must lie in `0..=major_delta` with `first <= last`.
    pub fn window(mut self, first: i32, last: i32) -> Self {
        let xmajor = self.xdelta >= self.ydelta;
        let (major, minor) = if xmajor { (self.xdelta, self.ydelta) } else { (self.ydelta, self.xdelta) };
        if major == 0 {
            return self;
        }
        let acc = self.rem as i64 + first as i64 * minor as i64;
        let minor_steps = (acc / major as i64) as i32;
        self.rem = (acc % major as i64) as i32;
        if xmajor {
            let x0 = self.x;
            self.x = x0 + self.xinc * first;
            self.y += self.yinc * minor_steps;
            self.x2 = x0 + self.xinc * last;
        } else {
            let y0 = self.y;
            self.y = y0 + self.yinc * first;
            self.x += self.xinc * minor_steps;
            self.y2 = y0 + self.yinc * last;
        }
        self
    }

    /// Absolute pixel positions, starting at the generator's current pixel.
    pub fn points(self) -> impl Iterator<Item = Point> {
        let mut pos = Point::new(self.x, self.y);
        self.map(move |(dx, dy)| {
            pos.x += dx;
            pos.y += dy;
            pos
        })
    }
}

impl Iterator for LineGenerator {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if !self.started {
            self.started = true;
            return Some((0, 0));
        }

        if self.xdelta >= self.ydelta {
            if self.x == self.x2 {
                return None;
            }
            self.x += self.xinc;
            self.rem += self.ydelta;
            if self.rem >= self.xdelta {
                self.rem -= self.xdelta;
                self.y += self.yinc;
                Some((self.xinc, self.yinc))
            } else {
                Some((self.xinc, 0))
            }
        } else {
            if self.y == self.y2 {
                return None;
            }
            self.y += self.yinc;
            self.rem += self.xdelta;
            if self.rem >= self.ydelta {
                self.rem -= self.ydelta;
                self.x += self.xinc;
                Some((self.xinc, self.yinc))
            } else {
                Some((0, self.yinc))
            }
        }
    }
}

/// Drive `step` with every step of the line.
#[inline]
pub fn line_generator<F: FnMut(i32, i32)>(x1: i32, y1: i32, x2: i32, y2: i32, mut step: F) {
    for (dx, dy) in LineGenerator::new(x1, y1, x2, y2) {
        step(dx, dy);
    }
}

/// Absolute pixel positions of the line.
pub fn line_points(x1: i32, y1: i32, x2: i32, y2: i32) -> impl Iterator<Item = Point> {
    LineGenerator::new(x1, y1, x2, y2).points()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let steps: Vec<_> = LineGenerator::new(4, 4, 4, 4).collect();
        assert_eq!(steps, vec![(0, 0)]);
    }

    #[test]
    fn test_axis_lines() {
        let steps: Vec<_> = LineGenerator::new(0, 0, 0, -3).collect();
        assert_eq!(steps, vec![(0, 0), (0, -1), (0, -1), (0, -1)]);
        let steps: Vec<_> = LineGenerator::new(0, 0, 2, 0).collect();
        assert_eq!(steps, vec![(0, 0), (1, 0), (1, 0)]);
    }

    #[test]
    fn test_x_major() {
        let pts: Vec<_> = line_points(0, 0, 4, 2).collect();
        assert_eq!(
            pts,
            vec![
                Point::new(0, 0),
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(3, 2),
                Point::new(4, 2)
            ]
        );
    }

    #[test]
    fn test_y_major_reaches_end() {
        let pts: Vec<_> = line_points(3, -2, -1, 9).collect();
        assert_eq!(pts.len(), 12);
        assert_eq!(pts.last(), Some(&Point::new(-1, 9)));
        for w in pts.windows(2) {
            assert_eq!(w[1].y - w[0].y, 1);
            assert!((w[1].x - w[0].x).abs() <= 1);
        }
    }

    #[test]
    fn test_callback_form() {
        let mut n = 0;
        let mut pos = (10, 10);
        line_generator(10, 10, 20, 13, |dx, dy| {
            pos.0 += dx;
            pos.1 += dy;
            n += 1;
        });
        assert_eq!(n, 11);
        assert_eq!(pos, (20, 13));
    }

    #[test]
    fn test_window_resumes_mid_line() {
        let full: Vec<_> = line_points(4, 43, 22, 1).collect();
        let part: Vec<_> = LineGenerator::new(4, 43, 22, 1).window(25, 38).points().collect();
        assert_eq!(part, full[25..=38].to_vec());
        let part: Vec<_> = LineGenerator::new(-3, 2, 17, 9).window(7, 7).points().collect();
        assert_eq!(part, vec![full_point(-3, 2, 17, 9, 7)]);
    }

    fn full_point(x1: i32, y1: i32, x2: i32, y2: i32, k: usize) -> Point {
        line_points(x1, y1, x2, y2).nth(k).unwrap()
    }
}
