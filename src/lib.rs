//! Terminal client for a categorized video dashboard backend.
//!
//! The backend collects recent videos per channel and groups them by
//! category. This crate fetches that feed, projects it into dashboard
//! sections with relative ages, and manages the category/channel
//! preferences and retention window through the backend's REST API.
//!
//! - [`age`] classifies timestamps into coarse age buckets
//! - [`api`] talks to the backend
//! - [`view`] projects feeds and preferences into renderable views
//! - [`dashboard`] holds controller state and the mutate-then-resync flow
//! - [`ui`] is the ratatui front end

pub mod age;
pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod keybindings;
pub mod model;
pub mod theme;
pub mod ui;
pub mod util;
pub mod view;
