//! Display surfaces.

mod image_slot;

pub use image_slot::ImageSlot;
