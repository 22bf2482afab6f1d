//! Application services.

pub mod image_load_coordinator;
pub mod ui_dispatcher;

pub use image_load_coordinator::{CompletionCallback, CoordinatorConfig, ImageLoadCoordinator};
pub use ui_dispatcher::{UiDispatcher, UiExecutor, UiJob, ui_context};
