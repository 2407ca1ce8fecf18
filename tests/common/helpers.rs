#![allow(dead_code)]

use rangefetch::download::TransferEvent;
use rangefetch::http::{create_http_client, HttpClientConfig};
use rangefetch::observer::TransferObserver;
use reqwest_middleware::ClientWithMiddleware;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const MIB: u64 = 1024 * 1024;

/// Route engine logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// A client without custom configuration.
pub fn test_client() -> ClientWithMiddleware {
    create_http_client(HttpClientConfig::default()).expect("Failed to build client")
}

/// Asserts that a file has the expected content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).expect("Failed to read downloaded file");
    assert_eq!(content.len(), expected.len(), "File size mismatch at {:?}", path);
    assert!(content == expected, "File content mismatch at {:?}", path);
}

/// Observer recording every event it receives.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<TransferEvent>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TransferEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn transfer_events(&self) -> Vec<TransferEvent> {
        self.events()
            .into_iter()
            .filter(TransferEvent::is_transfer_level)
            .collect()
    }

    pub fn chunk_events(&self) -> Vec<TransferEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.chunk_id.is_some())
            .collect()
    }
}

impl TransferObserver for Recorder {
    fn on_update(&self, event: &TransferEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Serves `Range: bytes=<start>-<end>` requests from an in-memory body.
pub struct RangeResponder {
    content: Arc<Vec<u8>>,
}

impl RangeResponder {
    pub fn new(content: Arc<Vec<u8>>) -> Self {
        Self { content }
    }
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(range) = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("bytes="))
        else {
            return ResponseTemplate::new(200).set_body_bytes(self.content.as_slice());
        };

        let mut bounds = range.splitn(2, '-');
        let start: usize = bounds.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let end: usize = bounds
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.content.len() - 1)
            .min(self.content.len() - 1);

        ResponseTemplate::new(206)
            .insert_header(
                "content-range",
                format!("bytes {}-{}/{}", start, end, self.content.len()).as_str(),
            )
            .set_body_bytes(&self.content[start..=end])
    }
}

/// Mount a HEAD advertising `content` (optionally with range support) and a
/// GET serving it, whole or by range.
pub async fn mount_resource(server: &MockServer, content: Arc<Vec<u8>>, accept_ranges: bool) {
    let mut head = ResponseTemplate::new(200)
        .insert_header("content-length", content.len().to_string().as_str())
        .set_body_bytes(content.as_slice());
    if accept_ranges {
        head = head.insert_header("accept-ranges", "bytes");
    }
    Mock::given(method("HEAD"))
        .respond_with(head)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .respond_with(RangeResponder::new(content))
        .mount(server)
        .await;
}
