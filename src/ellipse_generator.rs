//! Circle and ellipse scan generators.
//!
//! Both generators report symmetric pixel pairs `(x1, x2, y)`: outline
//! drawing plots the two endpoints, filled drawing draws the horizontal
//! span between them. A scanline may be reported more than once.

/// Midpoint circle generator, eight-way symmetric.
///
/// A radius below one degenerates to the single pixel `(x, y)`.
pub fn circle_generator<F: FnMut(i32, i32, i32)>(x: i32, y: i32, r: i32, mut cb: F) {
    if r < 1 {
        cb(x, x, y);
        return;
    }

    let mut cx = 0;
    let mut cy = r;
    let mut df = 1 - r;
    let mut d_e = 3;
    let mut d_se = -2 * r + 5;

    loop {
        cb(x - cx, x + cx, y + cy);
        if cy != 0 {
            cb(x - cx, x + cx, y - cy);
        }

        if cx != cy {
            cb(x - cy, x + cy, y + cx);
            if cx != 0 {
                cb(x - cy, x + cy, y - cx);
            }
        }

        if df < 0 {
            df += d_e;
            d_e += 2;
            d_se += 2;
        } else {
            df += d_se;
            d_e += 2;
            d_se += 4;
            cy -= 1;
        }
        cx += 1;

        if cx > cy {
            break;
        }
    }
}

/// Ellipse generator, four-way symmetric, stepping a 1/64 fixed-point
/// rotation along the major axis.
///
/// A zero (or negative) radius on either axis degenerates to the single
/// pixel `(x, y)`, the same output as a circle of radius zero.
pub fn ellipse_generator<F: FnMut(i32, i32, i32)>(x: i32, y: i32, rx: i32, ry: i32, mut cb: F) {
    if rx < 1 || ry < 1 {
        cb(x, x, y);
        return;
    }

    let (mut h, mut i, mut j, mut k) = (0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF);

    if rx > ry {
        let mut ix: i32 = 0;
        let mut iy: i32 = rx * 64;
        loop {
            let (oh, oi, oj, ok) = (h, i, j, k);
            h = (ix + 32) >> 6;
            i = (iy + 32) >> 6;
            j = h * ry / rx;
            k = i * ry / rx;

            if (h != oh || k != ok) && h < oi {
                cb(x - h, x + h, y + k);
                if k != 0 {
                    cb(x - h, x + h, y - k);
                }
            }
            if (i != oi || j != oj) && h < i {
                cb(x - i, x + i, y + j);
                if j != 0 {
                    cb(x - i, x + i, y - j);
                }
            }

            ix += iy / rx;
            iy -= ix / rx;
            if i <= h {
                break;
            }
        }
    } else {
        let mut ix: i32 = 0;
        let mut iy: i32 = ry * 64;
        loop {
            let (oh, oi, oj, ok) = (h, i, j, k);
            h = (ix + 32) >> 6;
            i = (iy + 32) >> 6;
            j = h * rx / ry;
            k = i * rx / ry;

            if (j != oj || i != oi) && h < i {
                cb(x - j, x + j, y + i);
                if i != 0 {
                    cb(x - j, x + j, y - i);
                }
            }
            if (k != ok || h != oh) && h < oi {
                cb(x - k, x + k, y + h);
                if h != 0 {
                    cb(x - k, x + k, y - h);
                }
            }

            ix += iy / ry;
            iy -= ix / ry;
            if i <= h {
                break;
            }
        }
    }
}

/// Per-row horizontal extent of a filled ellipse centred at `(x, y)`:
/// `rows[dy + ry] = (x1, x2)`, or `None` where no pair was reported.
pub(crate) fn ellipse_row_extents(x: i32, y: i32, rx: i32, ry: i32) -> Vec<Option<(i32, i32)>> {
    let ry_c = ry.max(0);
    let mut rows: Vec<Option<(i32, i32)>> = vec![None; (2 * ry_c + 1) as usize];
    ellipse_generator(x, y, rx, ry, |x1, x2, yy| {
        let idx = yy - y + ry_c;
        if let Some(slot) = rows.get_mut(idx as usize) {
            *slot = Some(match *slot {
                Some((a, b)) => (a.min(x1), b.max(x2)),
                None => (x1, x2),
            });
        }
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn collect_circle(x: i32, y: i32, r: i32) -> BTreeSet<(i32, i32, i32)> {
        let mut out = BTreeSet::new();
        circle_generator(x, y, r, |a, b, c| {
            out.insert((a, b, c));
        });
        out
    }

    fn collect_ellipse(rx: i32, ry: i32) -> BTreeSet<(i32, i32, i32)> {
        let mut out = BTreeSet::new();
        ellipse_generator(0, 0, rx, ry, |a, b, c| {
            out.insert((a, b, c));
        });
        out
    }

    #[test]
    fn test_circle_radius_zero_is_one_pixel() {
        let mut calls = Vec::new();
        circle_generator(50, 50, 0, |a, b, c| calls.push((a, b, c)));
        assert_eq!(calls, vec![(50, 50, 50)]);
    }

    #[test]
    fn test_circle_radius_three() {
        let got = collect_circle(0, 0, 3);
        let want: BTreeSet<_> = [
            (-3, 3, -1),
            (-3, 3, 0),
            (-3, 3, 1),
            (-2, 2, -2),
            (-2, 2, 2),
            (-1, 1, -3),
            (-1, 1, 3),
            (0, 0, -3),
            (0, 0, 3),
        ]
        .into_iter()
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_degenerate_ellipse_matches_circle_zero() {
        let mut a = Vec::new();
        ellipse_generator(7, 9, 0, 12, |x1, x2, y| a.push((x1, x2, y)));
        let mut b = Vec::new();
        ellipse_generator(7, 9, 12, 0, |x1, x2, y| b.push((x1, x2, y)));
        let mut c = Vec::new();
        circle_generator(7, 9, 0, |x1, x2, y| c.push((x1, x2, y)));
        assert_eq!(a, c);
        assert_eq!(b, c);
    }

    #[test]
    fn test_wide_ellipse() {
        let got = collect_ellipse(6, 3);
        assert!(got.contains(&(-6, 6, 0)));
        assert!(got.contains(&(0, 0, 3)));
        assert!(got.contains(&(0, 0, -3)));
        for &(x1, x2, y) in &got {
            assert_eq!(x1, -x2);
            assert!(x2 <= 6 && y.abs() <= 3);
            assert!(got.contains(&(x1, x2, -y)));
        }
    }

    #[test]
    fn test_tall_ellipse() {
        let got = collect_ellipse(2, 5);
        assert!(got.contains(&(-2, 2, 0)));
        assert!(got.contains(&(0, 0, 5)));
        assert!(got.iter().all(|&(_, x2, y)| x2 <= 2 && y.abs() <= 5));
    }

    #[test]
    fn test_row_extents() {
        let rows = ellipse_row_extents(10, 10, 4, 4);
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[4], Some((6, 14)));
        assert_eq!(rows[0], Some((9, 11)));
        assert!(rows.iter().all(|r| r.is_some()));
    }
}
