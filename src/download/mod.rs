//! Download data model: resources, byte ranges and transfer events.
//!
//! - [`resource`] - [`ResourceDescriptor`] and the metadata [`probe`]
//! - [`range`] - [`ByteRange`] and the [`partition`] function
//! - [`event`] - [`Status`] and [`TransferEvent`]
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::download::{partition, ResourceDescriptor};
//!
//! let resource = ResourceDescriptor::fallback("https://example.com/file.zip");
//! assert_eq!(resource.filename, "file.zip");
//!
//! let ranges = partition(12 * 1024 * 1024, 4);
//! assert_eq!(ranges.len(), 4);
//! assert_eq!(ranges[0].len(), 3 * 1024 * 1024);
//! ```

pub mod event;
pub mod range;
pub mod resource;

pub use event::{Status, TransferEvent};
pub use range::{partition, ByteRange};
pub use resource::{probe, ResourceDescriptor};
