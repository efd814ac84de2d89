//! Utility functions shared by the client and the terminal front-end.
//!
//! - **URL validation**: scheme/host checks for the server URL and for video
//!   links opened in the browser
//! - **Text processing**: Unicode-aware width calculation, truncation, and
//!   sanitizing of backend-supplied strings

mod text;
mod url_validator;

pub use text::{display_width, sanitize_line, truncate_to_width};
pub use url_validator::{validate_server_url, validate_url_for_open, UrlValidationError};
