//! Builder for [`DownloadQueue`].
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::queue::DownloadQueueBuilder;
//! use reqwest::header::{self, HeaderValue};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), rangefetch::Error> {
//! let queue = DownloadQueueBuilder::new()
//!     .max_concurrent_downloads(2)
//!     .max_retries(5)
//!     .header(header::USER_AGENT, HeaderValue::from_static("rangefetch"))
//!     .connect_timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! assert_eq!(queue.config().max_concurrent_downloads, 2);
//! # Ok(())
//! # }
//! ```

use super::config::EngineConfig;
use super::queue::DownloadQueue;
use crate::error::{Error, Result};
use crate::http::{create_http_client, HttpClientConfig};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Proxy;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tokio::runtime::Handle;

/// Default number of events buffered for each subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A builder used to create a [`DownloadQueue`].
pub struct DownloadQueueBuilder {
    config: EngineConfig,
    http: HttpClientConfig,
    client: Option<ClientWithMiddleware>,
    event_capacity: usize,
}

impl Default for DownloadQueueBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            http: HttpClientConfig::default(),
            client: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl DownloadQueueBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of transfers running at once.
    pub fn max_concurrent_downloads(mut self, max: usize) -> Self {
        self.config.max_concurrent_downloads = max;
        self
    }

    /// Set the number of ranges a parallel transfer is split into.
    pub fn max_connections_per_download(mut self, max: usize) -> Self {
        self.config.max_connections_per_download = max;
        self
    }

    /// Set the number of extra attempts per failing chunk.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the minimum size of a resource for a ranged transfer.
    pub fn split_threshold(mut self, bytes: u64) -> Self {
        self.config.split_threshold = bytes;
        self
    }

    /// Set the minimum delay between two progress events of the same id.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    /// Add the http headers.
    ///
    /// Calling `.headers()` multiple times merges all maps into one.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .extend(headers);
        self
    }

    /// Add one http header.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Route every request through `proxy`.
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.http.proxy = Some(proxy);
        self
    }

    /// Bound the time spent establishing connections.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http.connect_timeout = Some(timeout);
        self
    }

    /// Use a prebuilt client. Header, proxy and timeout settings are then ignored.
    pub fn client(mut self, client: ClientWithMiddleware) -> Self {
        self.client = Some(client);
        self
    }

    /// Number of events buffered for each subscriber before it lags.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Create the [`DownloadQueue`].
    ///
    /// Transfers are spawned on the Tokio runtime this is called from, so the
    /// queue itself may then be driven from any thread.
    ///
    /// # Errors
    ///
    /// [`Error::Internal`] outside a Tokio runtime, [`Error::Reqwest`] if the
    /// HTTP client cannot be built.
    pub fn build(self) -> Result<DownloadQueue> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Internal(format!("No Tokio runtime to spawn transfers on: {}", e)))?;
        let client = match self.client {
            Some(client) => client,
            None => create_http_client(self.http)?,
        };
        Ok(DownloadQueue::new(
            self.config,
            client,
            self.event_capacity,
            runtime,
        ))
    }
}
