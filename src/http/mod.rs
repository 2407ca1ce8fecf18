//! HTTP module containing HTTP client functionality.
//!
//! The engine treats the HTTP transport as an external collaborator. This
//! module is the single place where that collaborator is constructed: a
//! `reqwest` client wrapped in `reqwest-middleware` with tracing.
//!
//! - [`client`] - HTTP client creation and middleware configuration

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
