//! Scanline flood fill with a table of flooded segments.
//!
//! Each filled run is recorded per row with pending "look above" and "look
//! below" flags. Rows are rescanned only between runs that are not yet in
//! the table, so every pixel is tested a small constant number of times per
//! adjacent segment and the fill needs no recursion.
//!
//! The fill is not atomic: when the segment table cannot grow, the call
//! aborts with [`RasterError::ResourceExhausted`](crate::error::RasterError)
//! and the runs drawn so far stay on the surface.

use log::debug;

use crate::basics::Rect;
use crate::error::{try_grow, Result};

const FLOOD_IN_USE: u8 = 1;
const FLOOD_TODO_ABOVE: u8 = 2;
const FLOOD_TODO_BELOW: u8 = 4;

/// What the flood fill reads and writes.
pub trait FloodTarget {
    /// `true` when `(x, y)` still has the color being replaced.
    fn is_fill_candidate(&self, x: i32, y: i32) -> bool;

    /// Paint the inclusive run `[x1, x2]` on row `y`.
    fn fill_span(&mut self, x1: i32, x2: i32, y: i32);
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    flags: u8,
    lpos: i32,
    rpos: i32,
    y: i32,
    /// Index of the next segment on the same row; 0 ends the chain.
    next: usize,
}

struct Flooder<'t, T: FloodTarget> {
    target: &'t mut T,
    dst: Rect,
    /// One head slot per row of `dst`, then overflow segments.
    segments: Vec<Segment>,
}

impl<T: FloodTarget> Flooder<'_, T> {
    /// Fill the run around `(x, y)` and record it.
    ///
    /// Returns the first x after the part of the row this call dealt with.
    fn flood(&mut self, x: i32, y: i32) -> Result<i32> {
        if !self.target.is_fill_candidate(x, y) {
            return Ok(x + 1);
        }

        let mut left = x - 1;
        while left >= self.dst.left && self.target.is_fill_candidate(left, y) {
            left -= 1;
        }
        let mut right = x + 1;
        while right < self.dst.right && self.target.is_fill_candidate(right, y) {
            right += 1;
        }
        left += 1;
        right -= 1;

        self.target.fill_span(left, right, y);

        let mut c = (y - self.dst.top) as usize;
        if self.segments[c].flags != 0 {
            while self.segments[c].next != 0 {
                c = self.segments[c].next;
            }
            let n = self.segments.len();
            try_grow(&mut self.segments, 1, "flood segment table")?;
            self.segments.push(Segment {
                flags: 0,
                lpos: 0,
                rpos: 0,
                y,
                next: 0,
            });
            self.segments[c].next = n;
            c = n;
        }

        let mut flags = FLOOD_IN_USE;
        if y > self.dst.top {
            flags |= FLOOD_TODO_ABOVE;
        }
        if y + 1 < self.dst.bottom {
            flags |= FLOOD_TODO_BELOW;
        }
        self.segments[c] = Segment {
            flags,
            lpos: left,
            rpos: right,
            y,
            next: 0,
        };

        Ok(right + 2)
    }

    /// Scan `[left, right]` on row `y` for runs not yet in the table.
    /// Returns `true` if any new run was flooded.
    fn check_line(&mut self, y: i32, mut left: i32, right: i32) -> Result<bool> {
        let mut found = false;
        while left <= right {
            let mut c = (y - self.dst.top) as usize;
            loop {
                let seg = self.segments[c];
                if left >= seg.lpos && left <= seg.rpos {
                    left = seg.rpos + 2;
                    break;
                }
                c = seg.next;
                if c == 0 {
                    left = self.flood(left, y)?;
                    found = true;
                    break;
                }
            }
        }
        Ok(found)
    }
}

/// Flood the 4-connected area of fill candidates around `(x, y)` inside
/// `dst` (exclusive right/bottom).
///
/// A start point outside `dst` draws nothing and succeeds.
pub fn flood_fill_generator<T: FloodTarget>(target: &mut T, dst: &Rect, x: i32, y: i32) -> Result<()> {
    let dst = dst.normalized();
    if !dst.contains(x, y) {
        return Ok(());
    }

    let rows = dst.height() as usize;
    let mut segments = Vec::new();
    try_grow(&mut segments, rows, "flood segment table")?;
    segments.resize(
        rows,
        Segment {
            flags: 0,
            lpos: i32::MAX,
            rpos: i32::MIN,
            y,
            next: 0,
        },
    );

    debug!("flood fill from ({}, {}) in {:?}", x, y, dst);
    let mut fl = Flooder { target, dst, segments };

    let run = |fl: &mut Flooder<'_, T>| -> Result<()> {
        fl.flood(x, y)?;
        loop {
            let mut done = true;
            let mut c = 0;
            while c < fl.segments.len() {
                if fl.segments[c].flags & FLOOD_TODO_BELOW != 0 {
                    fl.segments[c].flags &= !FLOOD_TODO_BELOW;
                    let s = fl.segments[c];
                    if fl.check_line(s.y + 1, s.lpos, s.rpos)? {
                        done = false;
                    }
                }

                if fl.segments[c].flags & FLOOD_TODO_ABOVE != 0 {
                    fl.segments[c].flags &= !FLOOD_TODO_ABOVE;
                    let s = fl.segments[c];
                    if fl.check_line(s.y - 1, s.lpos, s.rpos)? {
                        done = false;
                        // Going up: revisit the previous row right away.
                        if c < rows && c > 0 {
                            c -= 1;
                            continue;
                        }
                    }
                }
                c += 1;
            }
            if done {
                return Ok(());
            }
        }
    };

    run(&mut fl).map_err(|e| {
        debug!("flood fill aborted: {}", e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::init_logging;

    /// Character grid: `.` is fillable, anything else is a wall.
    struct Grid {
        w: i32,
        cells: Vec<u8>,
        fills: usize,
    }

    impl Grid {
        fn parse(rows: &[&str]) -> Self {
            Self {
                w: rows[0].len() as i32,
                cells: rows.iter().flat_map(|r| r.bytes()).collect(),
                fills: 0,
            }
        }

        fn at(&self, x: i32, y: i32) -> u8 {
            self.cells[(y * self.w + x) as usize]
        }

        fn count(&self, c: u8) -> usize {
            self.cells.iter().filter(|&&v| v == c).count()
        }
    }

    impl FloodTarget for Grid {
        fn is_fill_candidate(&self, x: i32, y: i32) -> bool {
            self.at(x, y) == b'.'
        }

        fn fill_span(&mut self, x1: i32, x2: i32, y: i32) {
            self.fills += 1;
            for x in x1..=x2 {
                let i = (y * self.w + x) as usize;
                assert_eq!(self.cells[i], b'.', "pixel ({}, {}) filled twice", x, y);
                self.cells[i] = b'o';
            }
        }
    }

    fn bounds(g: &Grid) -> Rect {
        Rect::new(0, 0, g.w, g.cells.len() as i32 / g.w)
    }

    #[test]
    fn test_fill_enclosed_box() {
        init_logging();
        let mut g = Grid::parse(&[
            "..........",
            ".#######..",
            ".#.....#..",
            ".#.....#..",
            ".#######..",
            "..........",
        ]);
        let rc = bounds(&g);
        flood_fill_generator(&mut g, &rc, 3, 2).unwrap();
        assert_eq!(g.count(b'o'), 10);
        assert_eq!(g.at(0, 0), b'.');
        assert_eq!(g.fills, 2);
    }

    #[test]
    fn test_fill_concave_region_going_up() {
        let mut g = Grid::parse(&[
            ".#.#.#.",
            ".#.#.#.",
            ".#.#.#.",
            ".......",
            "#######",
            ".......",
        ]);
        let rc = bounds(&g);
        flood_fill_generator(&mut g, &rc, 6, 3).unwrap();
        // Everything above the wall row is connected through row 3.
        assert_eq!(g.count(b'o'), 4 * 3 + 7);
        assert_eq!(g.count(b'.'), 7);
    }

    #[test]
    fn test_spiral() {
        let mut g = Grid::parse(&[
            "#########",
            "#.......#",
            "#.#####.#",
            "#.#...#.#",
            "#.#.#.#.#",
            "#.#.#...#",
            "#.#.#####",
            "#...#....",
        ]);
        let rc = bounds(&g);
        let before = g.count(b'.');
        flood_fill_generator(&mut g, &rc, 3, 3).unwrap();
        // Only the four cells right of the bottom-right wall stay unfilled.
        assert_eq!(g.count(b'.'), 4);
        assert_eq!(g.count(b'o'), before - 4);
    }

    #[test]
    fn test_start_outside_or_on_wall() {
        let mut g = Grid::parse(&["...", ".#.", "..."]);
        let rc = bounds(&g);
        flood_fill_generator(&mut g, &rc, 5, 1).unwrap();
        assert_eq!(g.count(b'o'), 0);
        flood_fill_generator(&mut g, &rc, 1, 1).unwrap();
        assert_eq!(g.count(b'o'), 0);
    }

    #[test]
    fn test_sub_rect_bounds() {
        let mut g = Grid::parse(&["......", "......", "......", "......"]);
        flood_fill_generator(&mut g, &Rect::new(1, 1, 4, 3), 2, 2).unwrap();
        assert_eq!(g.count(b'o'), 6);
        assert_eq!(g.at(0, 0), b'.');
        assert_eq!(g.at(4, 2), b'.');
    }
}
