//! Domain entity definitions.

mod image;
mod locator;
mod surface_state;

pub use image::{Bitmap, ImageStatus, bitmap_cost, locator_digest};
pub use locator::IntoLocator;
pub use surface_state::{ActiveFetch, CancelSignal, FetchId, SurfaceRequestState};
