//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{Bitmap, IntoLocator, SurfaceRequestState};
pub use errors::{ImageLoadError, LoadOutcome};
pub use ports::{HttpFetcherPort, ImageCachePort, ImageDecoderPort, ImageSurface};
