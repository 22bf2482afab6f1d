//! Domain types for decoded images and their loading status.

use std::sync::Arc;

use reqwest::Url;

/// A decoded, displayable bitmap shared between the cache and surfaces.
pub type Bitmap = Arc<image::DynamicImage>;

/// Approximate memory footprint of a decoded bitmap (bytes-per-row × height).
#[must_use]
pub fn bitmap_cost(image: &image::DynamicImage) -> usize {
    let bytes_per_pixel = usize::from(image.color().bytes_per_pixel());
    let bytes_per_row = (image.width() as usize).saturating_mul(bytes_per_pixel);
    bytes_per_row.saturating_mul(image.height() as usize)
}

/// Stable cache file name for a URL.
/// Generated from a truncated SHA-256 of the serialized URL.
#[must_use]
pub fn locator_digest(url: &Url) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Status of an image on a surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Nothing has been requested yet.
    #[default]
    NotStarted,
    /// A placeholder is shown while the real image loads.
    Placeholder,
    /// Image is being downloaded from the network.
    Downloading,
    /// Image is displayed.
    Ready,
    /// Loading failed with an error message.
    Failed(String),
}

impl ImageStatus {
    /// Returns true if the image is ready for rendering.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the image is currently being loaded.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Downloading)
    }

    /// Returns true if loading failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
