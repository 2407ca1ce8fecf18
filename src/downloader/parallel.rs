//! Concurrent ranged transfer.

use super::{DownloadOptions, ProgressTicker, DEFAULT_PROGRESS_INTERVAL};
use crate::download::{partition, ByteRange, Status, TransferEvent};
use crate::error::{Error, Result};
use crate::observer::{EventEmitter, EventSource};

use futures::{future, StreamExt};
use reqwest::{header::RANGE, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::{
    fs::OpenOptions,
    io::{AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, error, warn};

/// Splits a resource into byte ranges fetched by concurrent tasks.
///
/// The output file must already exist at its full length (see
/// [`preallocate`](super::preallocate)); each chunk task writes only inside
/// its own range, so the tasks never overlap and the file needs no locking.
#[derive(Clone, Debug)]
pub struct ParallelDownloader {
    client: ClientWithMiddleware,
    emitter: EventEmitter,
    chunks: usize,
    max_retries: u32,
    progress_interval: Duration,
}

/// What a chunk task reports back to the joining transfer.
#[derive(Debug, Clone, Copy)]
struct ChunkOutcome {
    written: u64,
    finished: bool,
}

impl ParallelDownloader {
    /// Create a downloader splitting transfers into `chunks` ranges, at least one.
    pub fn new(client: ClientWithMiddleware, chunks: usize) -> Self {
        Self {
            client,
            emitter: EventEmitter::new(),
            chunks: chunks.max(1),
            max_retries: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Number of extra attempts a failing chunk gets before it is reported as failed.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Minimum delay between two `Running` events of the same chunk.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Number of ranges a transfer is split into.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Retry limit per chunk.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Download `options.url` into the pre-sized file at `options.output_path`.
    ///
    /// Emits a transfer-level `Started`, one `Started` per chunk carrying the
    /// chunk length, chunk progress and terminal events from the chunk tasks,
    /// and finally a transfer-level terminal event once every chunk task has
    /// been joined. The transfer only `Finished` if every chunk did; a single
    /// failed chunk makes it `Failed`.
    ///
    /// # Errors
    ///
    /// [`Error::TaskFault`] if a chunk task panicked. The transfer-level
    /// `Failed` event is still emitted first.
    pub async fn download(&self, options: &DownloadOptions) -> Result<()> {
        let size = options.content_size;
        let start = Instant::now();
        self.emit(&TransferEvent::transfer(Status::Started, 0, size, 0.0));

        let ranges = partition(size, self.chunks as u64);
        for (id, range) in ranges.iter().enumerate() {
            self.emit(&TransferEvent::chunk(id, Status::Started, 0, range.len(), 0.0));
        }
        debug!(url = %options.url, chunks = ranges.len(), size, "Starting ranged transfer");

        let url: Arc<str> = Arc::from(options.url.as_str());
        let handles: Vec<_> = ranges
            .into_iter()
            .enumerate()
            .map(|(id, range)| {
                let task = ChunkTask {
                    id,
                    range,
                    url: Arc::clone(&url),
                    path: options.output_path.clone(),
                    client: self.client.clone(),
                    emitter: self.emitter.clone(),
                    max_retries: self.max_retries,
                    progress_interval: self.progress_interval,
                };
                tokio::spawn(task.run())
            })
            .collect();

        // Barrier: the transfer-level terminal event follows every chunk.
        let mut written = 0;
        let mut failed_chunks = 0;
        let mut fault: Option<Error> = None;
        for joined in future::join_all(handles).await {
            match joined {
                Ok(outcome) => {
                    written += outcome.written;
                    if !outcome.finished {
                        failed_chunks += 1;
                    }
                }
                Err(e) => {
                    error!(url = %options.url, error = %e, "Chunk task fault");
                    failed_chunks += 1;
                    if fault.is_none() {
                        fault = Some(e.into());
                    }
                }
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        if failed_chunks == 0 {
            self.emit(&TransferEvent::transfer(Status::Finished, size, size, elapsed));
        } else {
            warn!(url = %options.url, failed_chunks, "Ranged transfer incomplete");
            self.emit(&TransferEvent::transfer(Status::Failed, written, size, elapsed));
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl EventSource for ParallelDownloader {
    fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

/// Everything one chunk task owns.
struct ChunkTask {
    id: usize,
    range: ByteRange,
    url: Arc<str>,
    path: PathBuf,
    client: ClientWithMiddleware,
    emitter: EventEmitter,
    max_retries: u32,
    progress_interval: Duration,
}

impl ChunkTask {
    async fn run(self) -> ChunkOutcome {
        let start = Instant::now();
        let total = self.range.len();
        let mut attempt: u32 = 0;

        loop {
            match self.fetch(start).await {
                Ok(written) => {
                    self.emitter.emit(&TransferEvent::chunk(
                        self.id,
                        Status::Finished,
                        written,
                        total,
                        start.elapsed().as_secs_f64(),
                    ));
                    return ChunkOutcome {
                        written,
                        finished: true,
                    };
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(chunk_id = self.id, range = %self.range, attempt, error = %e, "Retrying chunk");
                }
                Err(e) => {
                    warn!(chunk_id = self.id, range = %self.range, error = %e, "Chunk failed");
                    self.emitter.emit(&TransferEvent::chunk(
                        self.id,
                        Status::Failed,
                        0,
                        total,
                        start.elapsed().as_secs_f64(),
                    ));
                    return ChunkOutcome {
                        written: 0,
                        finished: false,
                    };
                }
            }
        }
    }

    /// One attempt at the whole range. Returns the number of bytes written.
    async fn fetch(&self, start: Instant) -> Result<u64> {
        let response = self
            .client
            .get(&*self.url)
            .header(RANGE, self.range.header_value())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::PARTIAL_CONTENT {
            return Err(Error::UnexpectedStatus(status));
        }

        let mut file = OpenOptions::new().write(true).open(&self.path).await?;
        file.seek(SeekFrom::Start(self.range.start)).await?;

        let expected = self.range.len();
        let mut ticker = ProgressTicker::new(self.progress_interval);
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(item) = stream.next().await {
            let bytes = item?;
            // Never write past the end of the range, whatever the server sends.
            let remaining = usize::try_from(expected - written).unwrap_or(usize::MAX);
            let take = bytes.len().min(remaining);
            file.write_all(&bytes[..take]).await?;
            written += take as u64;

            if written == expected {
                break;
            }
            if ticker.ready() {
                self.emitter.emit(&TransferEvent::chunk(
                    self.id,
                    Status::Running,
                    written,
                    expected,
                    start.elapsed().as_secs_f64(),
                ));
            }
        }
        file.flush().await?;

        if written < expected {
            return Err(Error::Truncated {
                expected,
                received: written,
            });
        }
        Ok(written)
    }
}
