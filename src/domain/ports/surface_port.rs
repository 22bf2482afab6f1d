//! Port definition for display surfaces.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::entities::{Bitmap, SurfaceRequestState};

/// A surface shared between the UI and in-flight completions.
pub type SharedSurface<S> = Arc<Mutex<S>>;

/// A display element that can show a bitmap.
///
/// The request state is an owned field of the surface, so it lives
/// and dies with it.
pub trait ImageSurface: Send + 'static {
    /// Replaces the displayed image.
    fn display(&mut self, image: Bitmap);

    /// Shared view of the surface's request state.
    fn request_state(&self) -> &SurfaceRequestState;

    /// Mutable view of the surface's request state.
    fn request_state_mut(&mut self) -> &mut SurfaceRequestState;

    /// Shows a placeholder while the real image is pending.
    fn display_placeholder(&mut self, image: Bitmap) {
        self.display(image);
    }

    /// Called when a network fetch starts for this surface.
    fn fetch_started(&mut self) {}
}
