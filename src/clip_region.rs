//! Banded clip region.
//!
//! A region is a list of non-overlapping rectangles grouped into bands:
//! every rectangle of one band shares `top` and `bottom`, rectangles inside
//! a band are sorted by `left`, and bands are sorted by `top`. Vertically
//! adjacent bands with identical horizontal intervals are coalesced.
//!
//! Drawing code looks up the band covering a scanline once and then only
//! visits the rectangles of that band.

use crate::basics::Rect;

/// Banded set of clip rectangles in screen coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipRegion {
    rects: Vec<Rect>,
    bound: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionOp {
    Union,
    Intersect,
    Subtract,
}

impl RegionOp {
    #[inline]
    fn keep(self, in_a: bool, in_b: bool) -> bool {
        match self {
            RegionOp::Union => in_a || in_b,
            RegionOp::Intersect => in_a && in_b,
            RegionOp::Subtract => in_a && !in_b,
        }
    }
}

impl ClipRegion {
    /// The empty region.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A region made of one rectangle.
    pub fn from_rect(rc: Rect) -> Self {
        let rc = rc.normalized();
        if rc.is_empty() {
            return Self::empty();
        }
        Self {
            rects: vec![rc],
            bound: rc,
        }
    }

    /// Union of arbitrary, possibly overlapping rectangles.
    pub fn from_rects(rects: &[Rect]) -> Self {
        let mut rgn = Self::empty();
        for rc in rects {
            rgn.union_rect(*rc);
        }
        rgn
    }

    /// All rectangles in band order.
    #[inline]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Bounding rectangle of the whole region.
    #[inline]
    pub fn bound(&self) -> Rect {
        self.bound
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn point_in_region(&self, x: i32, y: i32) -> bool {
        self.which_band(y, None)
            .map(|start| self.band(start).iter().any(|rc| rc.contains(x, y)))
            .unwrap_or(false)
    }

    /// `true` if `rc` shares at least one pixel with the region.
    pub fn rect_in_region(&self, rc: &Rect) -> bool {
        if !self.bound.overlaps(rc) {
            return false;
        }
        self.rects.iter().any(|r| r.overlaps(rc))
    }

    // ------------------------------------------------------------------------
    // Band lookup
    // ------------------------------------------------------------------------

    /// Index of the first rectangle of the band containing rectangle `idx`.
    fn band_start(&self, mut idx: usize) -> usize {
        let top = self.rects[idx].top;
        while idx > 0 && self.rects[idx - 1].top == top {
            idx -= 1;
        }
        idx
    }

    /// Rectangles of the band starting at `start`.
    pub fn band(&self, start: usize) -> &[Rect] {
        let Some(first) = self.rects.get(start) else {
            return &[];
        };
        let top = first.top;
        let len = self.rects[start..]
            .iter()
            .take_while(|rc| rc.top == top)
            .count();
        &self.rects[start..start + len]
    }

    /// Start index of the band covering scanline `y`, or `None` when `y`
    /// is outside the region or falls in a gap between bands.
    ///
    /// `hint` is a previously returned band start; the walk starts there
    /// and moves up or down, so consecutive scanlines cost O(1).
    pub fn which_band(&self, y: i32, hint: Option<usize>) -> Option<usize> {
        let first = self.rects.first()?;
        let last = self.rects.last()?;
        if y < first.top || y >= last.bottom {
            return None;
        }

        let mut i = hint.filter(|&i| i < self.rects.len()).unwrap_or(0);
        if y < self.rects[i].top {
            while i > 0 && y < self.rects[i].top {
                i -= 1;
            }
        } else {
            while i < self.rects.len() && y >= self.rects[i].bottom {
                i += 1;
            }
            if i == self.rects.len() {
                return None;
            }
        }

        let rc = &self.rects[i];
        if y < rc.top || y >= rc.bottom {
            return None;
        }
        Some(self.band_start(i))
    }

    // ------------------------------------------------------------------------
    // Algebra
    // ------------------------------------------------------------------------

    pub fn intersect_rect(&mut self, rc: Rect) {
        self.combine(&[rc.normalized()], RegionOp::Intersect);
    }

    pub fn union_rect(&mut self, rc: Rect) {
        self.combine(&[rc.normalized()], RegionOp::Union);
    }

    pub fn subtract_rect(&mut self, rc: Rect) {
        self.combine(&[rc.normalized()], RegionOp::Subtract);
    }

    pub fn intersect(&mut self, other: &ClipRegion) {
        let rects = other.rects.clone();
        self.combine(&rects, RegionOp::Intersect);
    }

    pub fn union(&mut self, other: &ClipRegion) {
        let rects = other.rects.clone();
        self.combine(&rects, RegionOp::Union);
    }

    pub fn offset(&mut self, dx: i32, dy: i32) {
        for rc in &mut self.rects {
            rc.offset(dx, dy);
        }
        if !self.rects.is_empty() {
            self.bound.offset(dx, dy);
        }
    }

    fn combine(&mut self, other: &[Rect], op: RegionOp) {
        let other: Vec<Rect> = other.iter().copied().filter(|rc| !rc.is_empty()).collect();

        let mut ys: Vec<i32> = self
            .rects
            .iter()
            .chain(other.iter())
            .flat_map(|rc| [rc.top, rc.bottom])
            .collect();
        ys.sort_unstable();
        ys.dedup();

        let mut out: Vec<Rect> = Vec::new();
        let mut last_band: Option<(usize, Vec<(i32, i32)>)> = None;

        for w in ys.windows(2) {
            let (y0, y1) = (w[0], w[1]);
            let a = intervals_at(&self.rects, y0, y1);
            let b = intervals_at(&other, y0, y1);
            let spans = combine_intervals(&a, &b, op);
            if spans.is_empty() {
                last_band = None;
                continue;
            }

            if let Some((start, prev)) = &last_band {
                if *prev == spans && out[*start].bottom == y0 {
                    for rc in &mut out[*start..] {
                        rc.bottom = y1;
                    }
                    continue;
                }
            }

            let start = out.len();
            out.extend(spans.iter().map(|&(l, r)| Rect::new(l, y0, r, y1)));
            last_band = Some((start, spans));
        }

        self.bound = out
            .iter()
            .fold(Rect::default(), |acc, rc| acc.bound(rc));
        self.rects = out;
    }
}

/// Sorted, merged horizontal intervals of `rects` that cover the whole
/// strip `[y0, y1)`.
fn intervals_at(rects: &[Rect], y0: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut iv: Vec<(i32, i32)> = rects
        .iter()
        .filter(|rc| rc.top <= y0 && rc.bottom >= y1)
        .map(|rc| (rc.left, rc.right))
        .collect();
    iv.sort_unstable();
    let mut merged: Vec<(i32, i32)> = Vec::with_capacity(iv.len());
    for (l, r) in iv {
        match merged.last_mut() {
            Some(last) if l <= last.1 => last.1 = last.1.max(r),
            _ => merged.push((l, r)),
        }
    }
    merged
}

/// Apply `op` to two sorted interval lists.
fn combine_intervals(a: &[(i32, i32)], b: &[(i32, i32)], op: RegionOp) -> Vec<(i32, i32)> {
    let mut xs: Vec<i32> = a.iter().chain(b.iter()).flat_map(|&(l, r)| [l, r]).collect();
    xs.sort_unstable();
    xs.dedup();

    let inside = |iv: &[(i32, i32)], x: i32| iv.iter().any(|&(l, r)| l <= x && x < r);

    let mut out: Vec<(i32, i32)> = Vec::new();
    for w in xs.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        if !op.keep(inside(a, x0), inside(b, x0)) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == x0 => last.1 = x1,
            _ => out.push((x0, x1)),
        }
    }
    out
}

// ============================================================================
// Single-rectangle span clipping
// ============================================================================

/// Clip the horizontal run `[x, x + w)` on scanline `y` to `clip`.
///
/// Returns the clipped `(x, w)`, or `None` when nothing is visible.
#[inline]
pub fn clip_hline(clip: &Rect, x: i32, y: i32, w: i32) -> Option<(i32, i32)> {
    if w <= 0 || y < clip.top || y >= clip.bottom {
        return None;
    }
    let l = x.max(clip.left);
    let r = x.saturating_add(w).min(clip.right);
    if r <= l {
        None
    } else {
        Some((l, r - l))
    }
}

/// Clip the vertical run `[y, y + h)` on column `x` to `clip`.
///
/// Returns the clipped `(y, h)`, or `None` when nothing is visible.
#[inline]
pub fn clip_vline(clip: &Rect, x: i32, y: i32, h: i32) -> Option<(i32, i32)> {
    if h <= 0 || x < clip.left || x >= clip.right {
        return None;
    }
    let t = y.max(clip.top);
    let b = y.saturating_add(h).min(clip.bottom);
    if b <= t {
        None
    } else {
        Some((t, b - t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_banded(rgn: &ClipRegion) {
        let rects = rgn.rects();
        for w in rects.windows(2) {
            let (a, b) = (w[0], w[1]);
            if a.top == b.top {
                assert_eq!(a.bottom, b.bottom);
                assert!(a.right < b.left, "{:?} {:?}", a, b);
            } else {
                assert!(a.bottom <= b.top, "{:?} {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_from_rect_and_empty() {
        let r = ClipRegion::from_rect(Rect::new(10, 10, 0, 0));
        assert_eq!(r.rects(), &[Rect::new(0, 0, 10, 10)]);
        assert!(ClipRegion::from_rect(Rect::new(0, 0, 0, 10)).is_empty());
    }

    #[test]
    fn test_union_makes_bands() {
        let rgn = ClipRegion::from_rects(&[Rect::new(0, 0, 10, 10), Rect::new(5, 5, 20, 20)]);
        assert_banded(&rgn);
        assert_eq!(
            rgn.rects(),
            &[
                Rect::new(0, 0, 10, 5),
                Rect::new(0, 5, 20, 10),
                Rect::new(5, 10, 20, 20)
            ]
        );
        assert_eq!(rgn.bound(), Rect::new(0, 0, 20, 20));
    }

    #[test]
    fn test_subtract_hole() {
        let mut rgn = ClipRegion::from_rect(Rect::new(0, 0, 30, 30));
        rgn.subtract_rect(Rect::new(10, 10, 20, 20));
        assert_banded(&rgn);
        assert_eq!(rgn.rects().len(), 4);
        assert!(!rgn.point_in_region(15, 15));
        assert!(rgn.point_in_region(9, 15));
        assert!(rgn.point_in_region(20, 15));
        assert!(rgn.point_in_region(15, 20));
        assert!(!rgn.point_in_region(30, 0));
    }

    #[test]
    fn test_coalesce_identical_bands() {
        let rgn = ClipRegion::from_rects(&[Rect::new(0, 0, 10, 5), Rect::new(0, 5, 10, 10)]);
        assert_eq!(rgn.rects(), &[Rect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn test_intersect_regions() {
        let mut a = ClipRegion::from_rects(&[Rect::new(0, 0, 10, 10), Rect::new(20, 0, 30, 10)]);
        let b = ClipRegion::from_rect(Rect::new(5, 5, 25, 25));
        a.intersect(&b);
        assert_eq!(a.rects(), &[Rect::new(5, 5, 10, 10), Rect::new(20, 5, 25, 10)]);
        a.intersect_rect(Rect::new(100, 100, 110, 110));
        assert!(a.is_empty());
        assert_eq!(a.bound(), Rect::default());
    }

    #[test]
    fn test_which_band_with_hint_and_gaps() {
        let rgn = ClipRegion::from_rects(&[
            Rect::new(0, 0, 5, 4),
            Rect::new(8, 0, 12, 4),
            Rect::new(0, 10, 5, 14),
        ]);
        assert_eq!(rgn.which_band(2, None), Some(0));
        assert_eq!(rgn.band(0).len(), 2);
        assert_eq!(rgn.which_band(6, None), None);
        assert_eq!(rgn.which_band(12, Some(0)), Some(2));
        assert_eq!(rgn.which_band(1, Some(2)), Some(0));
        assert_eq!(rgn.which_band(6, Some(2)), None);
        assert_eq!(rgn.which_band(14, Some(2)), None);
        assert_eq!(rgn.which_band(-1, None), None);
    }

    #[test]
    fn test_rect_in_region_and_offset() {
        let mut rgn = ClipRegion::from_rect(Rect::new(0, 0, 10, 10));
        assert!(rgn.rect_in_region(&Rect::new(9, 9, 20, 20)));
        assert!(!rgn.rect_in_region(&Rect::new(10, 0, 20, 20)));
        rgn.offset(5, 5);
        assert_eq!(rgn.bound(), Rect::new(5, 5, 15, 15));
        assert!(rgn.point_in_region(14, 14));
    }

    #[test]
    fn test_clip_hline_vline() {
        let clip = Rect::new(10, 10, 20, 20);
        assert_eq!(clip_hline(&clip, 5, 12, 10), Some((10, 5)));
        assert_eq!(clip_hline(&clip, 15, 12, 10), Some((15, 5)));
        assert_eq!(clip_hline(&clip, 0, 12, 10), None);
        assert_eq!(clip_hline(&clip, 12, 20, 3), None);
        assert_eq!(clip_vline(&clip, 10, 0, 100), Some((10, 10)));
        assert_eq!(clip_vline(&clip, 20, 0, 100), None);
    }
}
