//! Terminal user interface.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling per overlay
//! - `events` - Background task result processing
//! - `helpers` - Background task spawning
//! - `render` - Frame layout and overlay dispatch
//! - `sections` - Video feed panel
//! - `manager` - Channel manager overlay
//! - `dialogs` - Prompt, confirmation and duration dialogs
//! - `help` - Keybinding help overlay
//! - `status` - Status bar

mod dialogs;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod manager;
mod render;
mod sections;
mod status;

pub use loop_runner::{run, Action};
