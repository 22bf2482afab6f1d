//! Domain error types.

mod image_load_error;

pub use image_load_error::{ImageLoadError, LoadOutcome};
