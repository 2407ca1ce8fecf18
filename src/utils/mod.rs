//! Shared utility functions.
//!
//! Header parsing and filename resolution used by the resource probe.
//!
//! - [`content_length`] - `Content-Length` and `Accept-Ranges` parsing
//! - [`filename`] - `Content-Disposition` and URL based filename resolution

pub mod content_length;
pub mod filename;

pub use content_length::{accepts_byte_ranges, parse_content_length};
pub use filename::{filename_from_disposition, filename_from_url, DEFAULT_FILENAME};
