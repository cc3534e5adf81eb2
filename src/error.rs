//! Error types for the rasterizer.
//!
//! Geometry and clip degeneracies are never errors: those primitives
//! return early and draw nothing. Only resource growth, surface
//! construction and font data can fail.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RasterError>;

/// Main error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// A growable table or scratch buffer could not be grown. The drawing
    /// call that hit this has aborted and may have left partial output.
    #[error("Resource exhausted while growing {what}")]
    ResourceExhausted { what: &'static str },

    #[error("Invalid surface geometry: {width}x{height} at {bytes_per_pixel} bytes per pixel")]
    InvalidSurface {
        width: u32,
        height: u32,
        bytes_per_pixel: u8,
    },

    #[error("Unsupported pixel format: {0} bytes per pixel")]
    UnsupportedPixelFormat(u8),

    #[error("Window or viewport extent must not be zero")]
    DegenerateMapping,

    #[error("Font data rejected: {0}")]
    FontData(String),
}

impl From<std::collections::TryReserveError> for RasterError {
    fn from(_: std::collections::TryReserveError) -> Self {
        RasterError::ResourceExhausted { what: "buffer" }
    }
}

/// Reserve `additional` slots in `v`, mapping failure to
/// [`RasterError::ResourceExhausted`] tagged with `what`.
pub(crate) fn try_grow<T>(v: &mut Vec<T>, additional: usize, what: &'static str) -> Result<()> {
    v.try_reserve(additional)
        .map_err(|_| RasterError::ResourceExhausted { what })
}

#[cfg(test)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = RasterError::ResourceExhausted { what: "flood segment table" };
        assert_eq!(e.to_string(), "Resource exhausted while growing flood segment table");
        let e = RasterError::UnsupportedPixelFormat(5);
        assert!(e.to_string().contains("5 bytes"));
    }

    #[test]
    fn test_try_grow() {
        init_logging();
        let mut v: Vec<u8> = Vec::new();
        assert!(try_grow(&mut v, 16, "test").is_ok());
        assert!(v.capacity() >= 16);
        let err = try_grow(&mut v, usize::MAX, "test").unwrap_err();
        assert_eq!(err, RasterError::ResourceExhausted { what: "test" });
    }
}
