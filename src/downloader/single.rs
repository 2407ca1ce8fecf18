//! Whole-resource streaming transfer.

use super::{DownloadOptions, ProgressTicker, DEFAULT_PROGRESS_INTERVAL};
use crate::download::{Status, TransferEvent};
use crate::error::{Error, Result};
use crate::observer::{EventEmitter, EventSource};

use futures::StreamExt;
use reqwest_middleware::ClientWithMiddleware;
use std::time::{Duration, Instant};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, warn};

/// Streams a resource with one plain GET request.
///
/// Used when the server does not support ranges, when the size is unknown,
/// or when the resource is below the split threshold.
#[derive(Clone, Debug)]
pub struct SingleDownloader {
    client: ClientWithMiddleware,
    emitter: EventEmitter,
    progress_interval: Duration,
}

impl SingleDownloader {
    /// Create a single-stream downloader using `client`.
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self {
            client,
            emitter: EventEmitter::new(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Minimum delay between two `Running` events.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Download `options.url` into `options.output_path`.
    ///
    /// Emits `Started`, any number of `Running` events, then `Finished` or
    /// `Failed`. All events describe the whole transfer, and a known size
    /// must match the body length. Transfer failures are only reported
    /// through events, so this always returns `Ok`.
    pub async fn download(&self, options: &DownloadOptions) -> Result<()> {
        let size = options.content_size;
        let start = Instant::now();
        self.emit(&TransferEvent::transfer(Status::Started, 0, size, 0.0));

        match self.fetch(options, start).await {
            Ok(written) => {
                let total = if size > 0 { size } else { written };
                debug!(url = %options.url, written, "Single stream finished");
                self.emit(&TransferEvent::transfer(
                    Status::Finished,
                    written,
                    total,
                    start.elapsed().as_secs_f64(),
                ));
            }
            Err(e) => {
                warn!(url = %options.url, error = %e, "Single stream failed");
                self.emit(&TransferEvent::transfer(
                    Status::Failed,
                    0,
                    size,
                    start.elapsed().as_secs_f64(),
                ));
            }
        }

        Ok(())
    }

    async fn fetch(&self, options: &DownloadOptions, start: Instant) -> Result<u64> {
        debug!("Fetching {}", &options.url);
        let response = self.client.get(options.url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status));
        }

        debug!("Creating destination file {:?}", &options.output_path);
        let mut file = File::create(&options.output_path).await?;

        let mut ticker = ProgressTicker::new(self.progress_interval);
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(item) = stream.next().await {
            let mut chunk = item?;
            written += chunk.len() as u64;
            file.write_all_buf(&mut chunk).await?;

            if ticker.ready() {
                self.emit(&TransferEvent::transfer(
                    Status::Running,
                    written,
                    options.content_size,
                    start.elapsed().as_secs_f64(),
                ));
            }
        }
        file.flush().await?;

        let expected = options.content_size;
        if expected > 0 && written != expected {
            return Err(Error::Truncated {
                expected,
                received: written,
            });
        }
        Ok(written)
    }
}

impl EventSource for SingleDownloader {
    fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}
