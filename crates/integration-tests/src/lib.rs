//! End-to-end test harness for the catalog server.
//!
//! Each [`TestServer`] runs the full application on an ephemeral port with
//! its own scratch product file, so tests can run in parallel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_products` - Product API and persistence
//! - `api_carts` - Cart API
//! - `realtime` - Live product feed over WebSocket

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use catalog_storefront::config::CatalogConfig;
use catalog_storefront::routes;
use catalog_storefront::state::AppState;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// How long to wait for a frame that should arrive.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait before concluding a frame is not coming.
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// A catalog server running in the background of a test.
pub struct TestServer {
    addr: SocketAddr,
    products_file: PathBuf,
    client: Client,
    handle: JoinHandle<()>,
    _dir: TempDir,
}

impl TestServer {
    /// Start a server with an empty catalog.
    pub async fn start() -> Self {
        Self::start_with_file(None).await
    }

    /// Start a server whose product file already holds `contents`.
    pub async fn start_with_products(contents: &str) -> Self {
        Self::start_with_file(Some(contents)).await
    }

    async fn start_with_file(contents: Option<&str>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let products_file = dir.path().join("products.json");
        if let Some(contents) = contents {
            std::fs::write(&products_file, contents).expect("Failed to write product file");
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to read local address");

        let config = CatalogConfig::local(addr.ip(), addr.port(), products_file.clone());
        let app = routes::app(AppState::new(config).await);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            addr,
            products_file,
            client: Client::new(),
            handle,
            _dir: dir,
        }
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Shared HTTP client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// The product file this server persists to.
    #[must_use]
    pub const fn products_file(&self) -> &PathBuf {
        &self.products_file
    }

    /// Current contents of the product file, parsed.
    #[must_use]
    pub fn products_on_disk(&self) -> Value {
        let raw = std::fs::read_to_string(&self.products_file).expect("Failed to read product file");
        serde_json::from_str(&raw).expect("Product file is not JSON")
    }

    /// POST `body` as JSON to `path`, returning status and parsed body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        into_json(resp).await
    }

    /// PUT `body` as JSON to `path`.
    pub async fn put_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        into_json(resp).await
    }

    /// GET `path`.
    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        into_json(resp).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Request failed");
        into_json(resp).await
    }

    /// Open a WebSocket to the live product feed.
    pub async fn connect_feed(&self) -> FeedClient {
        let url = format!("ws://{}/ws", self.addr);
        let (stream, _) = connect_async(url).await.expect("Failed to connect");
        FeedClient { stream }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn into_json(resp: reqwest::Response) -> (reqwest::StatusCode, Value) {
    let status = resp.status();
    let body = resp.json::<Value>().await.expect("Response is not JSON");
    (status, body)
}

/// A connected live-feed client.
pub struct FeedClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedClient {
    /// Send an `{"event", "data"}` frame.
    pub async fn send(&mut self, event: &str, data: Value) {
        self.send_raw(json!({"event": event, "data": data}).to_string())
            .await;
    }

    /// Send an arbitrary text frame.
    pub async fn send_raw(&mut self, text: String) {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .expect("Failed to send frame");
    }

    /// Send a binary frame.
    pub async fn send_binary(&mut self, bytes: Vec<u8>) {
        self.stream
            .send(Message::Binary(bytes.into()))
            .await
            .expect("Failed to send frame");
    }

    /// Next event frame, failing the test if none arrives in time.
    pub async fn next_event(&mut self) -> Value {
        tokio::time::timeout(EVENT_TIMEOUT, self.read_event())
            .await
            .expect("Timed out waiting for event")
    }

    /// Next event frame if one arrives within `wait`.
    pub async fn try_next_event(&mut self, wait: Duration) -> Option<Value> {
        tokio::time::timeout(wait, self.read_event()).await.ok()
    }

    /// The product list carried by the next event, which must be an
    /// `updateProductList`.
    pub async fn next_product_list(&mut self) -> Vec<Value> {
        let event = self.next_event().await;
        assert_eq!(event["event"], "updateProductList", "unexpected event {event}");
        event["data"].as_array().cloned().expect("data is not a list")
    }

    async fn read_event(&mut self) -> Value {
        loop {
            let message = self
                .stream
                .next()
                .await
                .expect("Feed closed")
                .expect("Feed error");
            if let Message::Text(text) = message {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
        }
    }
}

/// A complete product payload with the given code.
#[must_use]
pub fn product_json(title: &str, code: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{title} description"),
        "price": 19.99,
        "thumbnail": format!("/img/{code}.png"),
        "code": code,
        "stock": 5
    })
}
