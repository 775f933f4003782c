//! Terminal user interface.
//!
//! - `loop_runner` - main event loop and terminal management
//! - `input` - keyboard and press-to-speak mouse handling
//! - `events` - background task event processing
//! - `render` - layout and overlay dispatch
//! - `subscriptions`, `articles`, `catalog`, `status` - panel widgets

mod articles;
mod catalog;
mod events;
mod input;
mod loop_runner;
mod render;
mod status;
mod subscriptions;

pub use loop_runner::{run, Channels};
