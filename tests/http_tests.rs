//! Tests for HTTP client construction.

use rangefetch::http::client::{create_http_client, HttpClientConfig};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_create_http_client_default() {
    assert!(create_http_client(HttpClientConfig::default()).is_ok());
}

#[test]
fn test_create_http_client_with_proxy() {
    let config = HttpClientConfig {
        proxy: Some(reqwest::Proxy::all("http://127.0.0.1:3128").unwrap()),
        ..HttpClientConfig::default()
    };
    assert!(create_http_client(config).is_ok());
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "rangefetch-test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("rangefetch-test"));
    let client = create_http_client(HttpClientConfig {
        headers: Some(headers),
        ..HttpClientConfig::default()
    })
    .unwrap();

    let response = client.get(server.uri()).send().await.unwrap();
    assert_eq!(response.status(), 200);
}
