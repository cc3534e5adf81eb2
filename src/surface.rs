//! Surface: an owned pixel buffer with row-oriented access.
//!
//! Rows are stored top-down with a fixed pitch (bytes per row). Pixels are
//! packed little-endian in `bytes_per_pixel` bytes; their meaning is given
//! by the surface [`PixelFormat`]. Every accessor is bounds checked: reads
//! outside the surface return `None` and writes outside it are dropped.

use crate::basics::Rect;
use crate::color::Pixel;
use crate::error::{RasterError, Result};
use crate::pixel_format::PixelFormat;

/// Pixel buffer plus pixel format.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a zero-filled surface.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let bpp = format.bytes_per_pixel();
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(RasterError::InvalidSurface {
                width,
                height,
                bytes_per_pixel: bpp,
            });
        }
        let pitch = width as usize * bpp as usize;
        let len = pitch
            .checked_mul(height as usize)
            .ok_or(RasterError::InvalidSurface {
                width,
                height,
                bytes_per_pixel: bpp,
            })?;
        let mut data = Vec::new();
        crate::error::try_grow(&mut data, len, "surface pixels")?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            pitch,
            format,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel() as usize
    }

    /// The whole surface as a rectangle at the origin.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Row `y` as a byte slice.
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.height as i32 {
            return None;
        }
        let start = y as usize * self.pitch;
        self.data.get(start..start + self.pitch)
    }

    /// Row `y` as a mutable byte slice.
    pub fn row_mut(&mut self, y: i32) -> Option<&mut [u8]> {
        if y < 0 || y >= self.height as i32 {
            return None;
        }
        let start = y as usize * self.pitch;
        self.data.get_mut(start..start + self.pitch)
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.pitch + x as usize * self.bytes_per_pixel())
    }

    /// Read the pixel at `(x, y)`.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        let off = self.offset(x, y)?;
        let bytes = &self.data[off..off + self.bytes_per_pixel()];
        Some(
            bytes
                .iter()
                .rev()
                .fold(0u32, |acc, &b| (acc << 8) | b as u32),
        )
    }

    /// Write the pixel at `(x, y)`. Returns `false` outside the surface.
    pub fn put_pixel(&mut self, x: i32, y: i32, p: Pixel) -> bool {
        let Some(off) = self.offset(x, y) else {
            return false;
        };
        let bpp = self.bytes_per_pixel();
        for (i, b) in self.data[off..off + bpp].iter_mut().enumerate() {
            *b = (p >> (8 * i)) as u8;
        }
        true
    }

    /// Fill the whole surface with one pixel value.
    pub fn fill(&mut self, p: Pixel) {
        let bpp = self.bytes_per_pixel();
        let le = p.to_le_bytes();
        for chunk in self.data.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(&le[..bpp]);
        }
    }

    /// Count pixels equal to `p`.
    pub fn count_pixels(&self, p: Pixel) -> usize {
        let mut n = 0;
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if self.get_pixel(x, y) == Some(p) {
                    n += 1;
                }
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_basic() {
        let s = Surface::new(10, 4, PixelFormat::rgb565()).unwrap();
        assert_eq!(s.width(), 10);
        assert_eq!(s.height(), 4);
        assert_eq!(s.pitch(), 20);
        assert_eq!(s.data().len(), 80);
        assert_eq!(s.rect(), Rect::new(0, 0, 10, 4));
    }

    #[test]
    fn test_surface_rejects_empty() {
        let err = Surface::new(0, 4, PixelFormat::indexed8()).unwrap_err();
        assert!(matches!(err, RasterError::InvalidSurface { width: 0, .. }));
    }

    #[test]
    fn test_pixel_write_read_all_depths() {
        let formats = [
            (PixelFormat::indexed8(), 0xABu32),
            (PixelFormat::rgb565(), 0xBEEF),
            (PixelFormat::rgb888(), 0x12_3456),
            (PixelFormat::argb8888(), 0x8012_3456),
        ];
        for (f, p) in formats {
            let mut s = Surface::new(3, 3, f).unwrap();
            assert!(s.put_pixel(2, 1, p));
            assert_eq!(s.get_pixel(2, 1), Some(p));
            assert_eq!(s.get_pixel(1, 1), Some(0));
        }
    }

    #[test]
    fn test_out_of_bounds_is_dropped() {
        let mut s = Surface::new(3, 3, PixelFormat::indexed8()).unwrap();
        assert!(!s.put_pixel(3, 0, 1));
        assert!(!s.put_pixel(-1, 0, 1));
        assert_eq!(s.get_pixel(0, 3), None);
        assert!(s.row(3).is_none());
        assert_eq!(s.count_pixels(0), 9);
    }

    #[test]
    fn test_fill_and_rows() {
        let mut s = Surface::new(4, 2, PixelFormat::rgb888()).unwrap();
        s.fill(0x01_0203);
        assert_eq!(s.row(1).unwrap(), &[3, 2, 1, 3, 2, 1, 3, 2, 1, 3, 2, 1]);
        s.row_mut(0).unwrap()[0] = 9;
        assert_eq!(s.get_pixel(0, 0), Some(0x01_0209));
        assert_eq!(s.count_pixels(0x01_0203), 7);
    }
}
