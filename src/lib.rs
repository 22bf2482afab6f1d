//! Remote image loading for display surfaces.
//!
//! Loads images by URL into surfaces such as list cells, with a shared
//! bounded bitmap cache, an HTTP response cache, one in-flight fetch per
//! surface and supersession-safe delivery on a UI-owned context.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the load coordinator and UI context.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external facilities.
pub mod infrastructure;
/// Presentation layer containing display surfaces.
pub mod presentation;

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = "remote-image-loader";
