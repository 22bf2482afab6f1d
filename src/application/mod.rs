//! Application layer containing the image load coordinator and UI context.

pub mod services;

pub use services::{
    CompletionCallback, CoordinatorConfig, ImageLoadCoordinator, UiDispatcher, UiExecutor,
    ui_context,
};
