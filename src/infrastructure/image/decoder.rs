//! Raster image decoding backed by the `image` crate.

use crate::domain::ports::{DecodeError, ImageDecoderPort};

/// Decodes PNG, JPEG, WebP and GIF payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl RasterDecoder {
    /// Creates a decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ImageDecoderPort for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<image::DynamicImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError("empty payload".to_string()));
        }
        image::load_from_memory(bytes).map_err(|e| DecodeError(e.to_string()))
    }
}
