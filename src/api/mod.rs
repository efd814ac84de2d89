//! HTTP client for the dashboard backend.
//!
//! - [`client`] - `ApiClient` with one method per backend endpoint, request
//!   timeouts, the feed cache-buster, and a capped body reader
//! - [`error`] - `ApiError` taxonomy and failure-body detail extraction
//!
//! # Example
//!
//! ```ignore
//! use vidboard::api::{ApiClient, ApiSettings};
//!
//! let client = ApiClient::new(&ApiSettings::default())?;
//! let feed = client.fetch_feed().await?;
//! ```

mod client;
mod error;

pub use client::{ApiClient, ApiSettings};
pub use error::ApiError;
