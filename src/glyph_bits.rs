//! Glyph bitmap helpers: a bounds-checked view over one packed mono row,
//! its run-length iterator, bold and scale synthesis, flips, and the
//! scratch arena the glyph pipeline reuses between glyphs.
//!
//! Mono rows are most significant bit first: pixel `x` of a row is
//! `row[x / 8] & (0x80 >> (x % 8))`.

use crate::color::Rgba8;
use crate::error::{try_grow, Result};

// ============================================================================
// BitLine
// ============================================================================

/// One row of a mono bitmap. Reads outside `[0, width)` are clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitLine<'a> {
    bits: &'a [u8],
    width: i32,
}

impl<'a> BitLine<'a> {
    #[inline]
    pub fn new(bits: &'a [u8], width: i32) -> Self {
        Self { bits, width: width.max(0) }
    }

    /// A row with no set pixels, standing in for a missing neighbour row.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn get(&self, x: i32) -> bool {
        if x < 0 || x >= self.width {
            return false;
        }
        let x = x as usize;
        self.bits.get(x >> 3).map_or(false, |b| b & (0x80 >> (x & 7)) != 0)
    }

    /// `1` if set, `0` otherwise.
    #[inline]
    pub fn bit(&self, x: i32) -> u32 {
        self.get(x) as u32
    }

    pub fn runs(&self) -> BitRuns<'a> {
        BitRuns { line: *self, pos: 0 }
    }
}

/// Iterator over `(is_set, run_length)` pairs of a [`BitLine`].
#[derive(Debug, Clone)]
pub struct BitRuns<'a> {
    line: BitLine<'a>,
    pos: i32,
}

impl Iterator for BitRuns<'_> {
    type Item = (bool, usize);

    fn next(&mut self) -> Option<(bool, usize)> {
        if self.pos >= self.line.width {
            return None;
        }
        let set = self.line.get(self.pos);
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.line.width && self.line.get(self.pos) == set {
            self.pos += 1;
        }
        Some((set, (self.pos - start) as usize))
    }
}

#[inline]
fn set_bit(row: &mut [u8], x: usize) {
    row[x >> 3] |= 0x80 >> (x & 7);
}

/// Bytes per row of a mono bitmap `width` pixels wide.
#[inline]
pub fn mono_pitch(width: i32) -> usize {
    (width.max(0) as usize + 7) / 8
}

/// Clear `dst` and size it to `len` zero bytes.
fn reset(dst: &mut Vec<u8>, len: usize) -> Result<()> {
    dst.clear();
    try_grow(dst, len, "glyph scratch bits")?;
    dst.resize(len, 0);
    Ok(())
}

// ============================================================================
// Bold and scale synthesis
// ============================================================================

/// Widen every set pixel one column to the right.
///
/// The source is `src_w` pixels wide; the result in `dst` is `src_w + 1`
/// pixels wide. Returns the result's pitch.
pub fn expand_bold_bits(src: &[u8], src_pitch: usize, src_w: i32, h: i32, dst: &mut Vec<u8>) -> Result<usize> {
    let pitch = mono_pitch(src_w + 1);
    reset(dst, pitch * h.max(0) as usize)?;
    for (i, out) in dst.chunks_exact_mut(pitch).enumerate() {
        let line = BitLine::new(src.get(i * src_pitch..).unwrap_or(&[]), src_w);
        for j in 0..src_w {
            if line.get(j) {
                set_bit(out, j as usize);
                set_bit(out, j as usize + 1);
            }
        }
    }
    Ok(pitch)
}

/// Magnify by an integer `scale`, optionally widening by one source column
/// first.
///
/// The result is `(src_w + bold) * scale` by `h * scale` pixels. Returns
/// `(width, pitch)`.
pub fn expand_scale_bits(
    src: &[u8],
    src_pitch: usize,
    src_w: i32,
    h: i32,
    scale: i32,
    bold: bool,
    dst: &mut Vec<u8>,
) -> Result<(i32, usize)> {
    let scale = scale.max(1);
    let width = (src_w + bold as i32) * scale;
    let pitch = mono_pitch(width);
    let rows = (h.max(0) * scale) as usize;
    reset(dst, pitch * rows)?;

    for i in 0..h.max(0) as usize {
        let line = BitLine::new(src.get(i * src_pitch..).unwrap_or(&[]), src_w);
        let first = i * scale as usize * pitch;
        let out = &mut dst[first..first + pitch];
        for j in 0..src_w {
            if !line.get(j) {
                continue;
            }
            let cols = if bold { 2 * scale } else { scale };
            for k in 0..cols {
                set_bit(out, (j * scale + k) as usize);
            }
        }
        for k in 1..scale as usize {
            dst.copy_within(first..first + pitch, first + k * pitch);
        }
    }
    Ok((width, pitch))
}

// ============================================================================
// Flips
// ============================================================================

/// Mirror each mono row of `w` pixels left to right, in place.
pub fn flip_mono_horz(bits: &mut [u8], w: i32, h: i32, pitch: usize) {
    let w = w.max(0) as usize;
    for row in bits.chunks_exact_mut(pitch).take(h.max(0) as usize) {
        for j in 0..w / 2 {
            let k = w - 1 - j;
            let a = row[j >> 3] & (0x80 >> (j & 7)) != 0;
            let b = row[k >> 3] & (0x80 >> (k & 7)) != 0;
            if a != b {
                row[j >> 3] ^= 0x80 >> (j & 7);
                row[k >> 3] ^= 0x80 >> (k & 7);
            }
        }
    }
}

/// Mirror each row of `w` pixels of `bpp` bytes left to right, in place.
pub fn flip_bytes_horz(bits: &mut [u8], w: i32, h: i32, pitch: usize, bpp: usize) {
    let w = w.max(0) as usize;
    for row in bits.chunks_exact_mut(pitch).take(h.max(0) as usize) {
        let px = &mut row[..w * bpp];
        px.reverse();
        if bpp > 1 {
            for p in px.chunks_exact_mut(bpp) {
                p.reverse();
            }
        }
    }
}

/// Mirror `h` rows of `pitch` bytes top to bottom, in place.
pub fn flip_vert<T>(bits: &mut [T], h: i32, pitch: usize) {
    let h = h.max(0) as usize;
    for i in 0..h / 2 {
        let (top, bottom) = bits.split_at_mut((h - 1 - i) * pitch);
        top[i * pitch..(i + 1) * pitch].swap_with_slice(&mut bottom[..pitch]);
    }
}

// ============================================================================
// Scratch arena
// ============================================================================

/// Per-context scratch buffers for glyph drawing. They grow to the largest
/// glyph seen and are freed with their owner.
#[derive(Debug, Default)]
pub struct GlyphScratch {
    pub(crate) bits: Vec<u8>,
    pub(crate) pixels: Vec<Rgba8>,
    pub(crate) prev_bk: Vec<Rgba8>,
    pub(crate) curr_bk: Vec<Rgba8>,
    pub(crate) next_bk: Vec<Rgba8>,
}

impl GlyphScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `src` into the bit buffer.
    pub(crate) fn load_bits(&mut self, src: &[u8]) -> Result<()> {
        self.bits.clear();
        try_grow(&mut self.bits, src.len(), "glyph scratch bits")?;
        self.bits.extend_from_slice(src);
        Ok(())
    }

    /// Copy `src` into the pixel buffer.
    pub(crate) fn load_pixels(&mut self, src: &[Rgba8]) -> Result<()> {
        self.pixels.clear();
        try_grow(&mut self.pixels, src.len(), "glyph scratch pixels")?;
        self.pixels.extend_from_slice(src);
        Ok(())
    }

    /// Make the three background rows hold at least `w` pixels.
    pub(crate) fn prepare_bk(&mut self, w: usize) -> Result<()> {
        for row in [&mut self.prev_bk, &mut self.curr_bk, &mut self.next_bk] {
            if row.len() < w {
                try_grow(row, w - row.len(), "glyph background rows")?;
                row.resize(w, Rgba8::default());
            }
        }
        Ok(())
    }

    /// Bytes currently reserved.
    pub fn capacity_bytes(&self) -> usize {
        let px = std::mem::size_of::<Rgba8>();
        self.bits.capacity()
            + px * (self.pixels.capacity()
                + self.prev_bk.capacity()
                + self.curr_bk.capacity()
                + self.next_bk.capacity())
    }
}
