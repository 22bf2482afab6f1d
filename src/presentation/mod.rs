//! Presentation layer containing display surfaces.

pub mod widgets;

pub use widgets::ImageSlot;
