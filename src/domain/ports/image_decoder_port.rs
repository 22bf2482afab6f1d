//! Port definition for image decoding.

/// Failure to turn bytes into a bitmap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode image: {0}")]
pub struct DecodeError(pub String);

/// Port for the image decoder collaborator.
///
/// Decoding is CPU-bound; callers run it off the UI context.
pub trait ImageDecoderPort: Send + Sync {
    /// Decodes raw bytes into a displayable bitmap.
    ///
    /// # Errors
    /// Returns `DecodeError` if the payload is not a recognized image.
    fn decode(&self, bytes: &[u8]) -> Result<image::DynamicImage, DecodeError>;
}
