//! Image slot state for list cells.

use crate::domain::entities::{Bitmap, ImageStatus, SurfaceRequestState};
use crate::domain::ports::ImageSurface;

/// A reusable cell that displays one remote image.
#[derive(Default)]
pub struct ImageSlot {
    /// Caller-chosen name, used in logs and reports.
    pub label: String,
    /// Bitmap currently on screen, placeholder included.
    pub image: Option<Bitmap>,
    /// Where the slot is in its load cycle.
    pub status: ImageStatus,
    request: SurfaceRequestState,
}

impl ImageSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Marks the load as failed. Whatever is on screen stays there.
    pub fn set_failed(&mut self, error: String) {
        self.status = ImageStatus::Failed(error);
    }

    /// Cancels outstanding work and clears the cell before it is rebound.
    pub fn prepare_for_reuse(&mut self, label: impl Into<String>) {
        self.request.cancel();
        self.label = label.into();
        self.image = None;
        self.status = ImageStatus::NotStarted;
    }

    /// True once the requested image (not a placeholder) is shown.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.image.is_some() && self.status.is_ready()
    }

    /// True while a download is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Width and height of the shown bitmap.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| (img.width(), img.height()))
    }
}

impl ImageSurface for ImageSlot {
    fn display(&mut self, image: Bitmap) {
        self.image = Some(image);
        self.status = ImageStatus::Ready;
    }

    fn request_state(&self) -> &SurfaceRequestState {
        &self.request
    }

    fn request_state_mut(&mut self) -> &mut SurfaceRequestState {
        &mut self.request
    }

    fn display_placeholder(&mut self, image: Bitmap) {
        self.image = Some(image);
        self.status = ImageStatus::Placeholder;
    }

    fn fetch_started(&mut self) {
        self.status = ImageStatus::Downloading;
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSlot")
            .field("label", &self.label)
            .field("has_image", &self.image.is_some())
            .field("status", &self.status)
            .field("latest_locator", &self.request.latest_locator())
            .finish_non_exhaustive()
    }
}
