//! # gdi-raster
//!
//! Integer 2D rasterization core for a GDI-style device context: exact
//! pixel coverage, no anti-aliasing on geometry, everything clipped against
//! a banded clip region.
//!
//! The crate features:
//!
//! - Logical-to-device-to-screen coordinate mapping with window and
//!   viewport extents
//! - Banded clip regions with rectangle algebra and fast band lookup
//! - Bresenham lines, circles, ellipses, arcs, pies and polygons as span
//!   generators
//! - Wide lines with caps, joins and dashes
//! - Segment-table flood fill
//! - A glyph pipeline for mono, grey, subpixel and pre-rendered glyphs with
//!   synthesized bold, italic, underline, strike-out, flips and rotation
//!
//! ## Architecture
//!
//! Drawing goes through four stages:
//!
//! 1. **Device context** ([`dc::DeviceContext`]) holds attributes and maps
//!    logical coordinates to screen space
//! 2. **Generators** turn geometry into pixels or horizontal spans
//! 3. **Clipping** intersects spans with the clip region band by band
//! 4. **Pixel sink** ([`pixel_sink::DrawContext`]) writes pixels with the
//!    current raster operation

// Foundation types
pub mod basics;
pub mod color;
pub mod error;
pub mod pixel_format;
pub mod surface;

// Coordinates and clipping
pub mod clip_region;
pub mod coord;
pub mod line_clipper;

// Scan generators
pub mod arc_generator;
pub mod curves;
pub mod ellipse_generator;
pub mod line_generator;
pub mod polygon_generator;
pub mod wide_line;

// Output
pub mod brush;
pub mod flood_fill;
pub mod pixel_sink;

// Fonts and glyphs
pub mod bitmap_fonts;
pub mod devfont;
pub mod glyph;
pub mod glyph_bits;
pub mod glyph_scanline;
#[cfg(feature = "font")]
pub mod ttf_font;

// Device context
pub mod dc;

pub use basics::{Point, Rect, Size};
pub use clip_region::ClipRegion;
pub use color::{Pixel, RasterOp, Rgba8};
pub use dc::{BkMode, DeviceContext};
pub use error::{RasterError, Result};
pub use pixel_format::PixelFormat;
pub use surface::Surface;
