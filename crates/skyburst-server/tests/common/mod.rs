use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use skyburst_core::net::messages::{ChannelMessage, FireworkEvent};
use skyburst_core::net::protocol::decode_channel_message;

use skyburst_server::config::ServerConfig;
use skyburst_server::relay::Broadcaster;
use skyburst_server::state::AppState;
use skyburst_server::{build_app, build_app_with_broadcaster};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with default config.
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    /// Start a test server that requires `token` on the epoch trigger.
    pub async fn with_epoch_token(token: &str) -> Self {
        let mut config = ServerConfig::default();
        config.epoch.trigger_token = Some(token.to_string());
        Self::from_config(config).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let (app, state) = build_app(config);
        Self::serve(app, state).await
    }

    pub async fn with_broadcaster(broadcaster: Arc<dyn Broadcaster>) -> Self {
        let (app, state) = build_app_with_broadcaster(ServerConfig::default(), broadcaster);
        Self::serve(app, state).await
    }

    async fn serve(app: axum::Router, state: AppState) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn firework_url(&self) -> String {
        format!("{}/api/firework", self.base_url())
    }

    pub fn epoch_url(&self) -> String {
        format!("{}/api/happy-new-year", self.base_url())
    }

    pub fn stream_url(&self) -> String {
        format!("{}/api/stream", self.base_url())
    }

    /// Wait until the server has registered `n` WebSocket subscribers.
    pub async fn wait_for_ws_subscribers(&self, n: usize) {
        wait_for_count(&self.state.ws_connection_count, n).await;
    }

    /// Wait until the server has registered `n` SSE subscribers.
    pub async fn wait_for_sse_subscribers(&self, n: usize) {
        wait_for_count(&self.state.sse_subscriber_count, n).await;
    }
}

async fn wait_for_count(counter: &std::sync::atomic::AtomicUsize, n: usize) {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        while counter.load(std::sync::atomic::Ordering::Relaxed) < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Timed out waiting for subscribers");
}

/// POST a firework event and return the response.
pub async fn post_firework(server: &TestServer, event: &FireworkEvent) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.firework_url())
        .json(event)
        .send()
        .await
        .unwrap()
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Read raw binary data from a WebSocket stream (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read raw binary data, returning None on timeout.
pub async fn ws_try_read_raw(stream: &mut WsStream, timeout_ms: u64) -> Option<Vec<u8>> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read the next channel message from a WebSocket stream (5s timeout).
pub async fn ws_read_channel_msg(stream: &mut WsStream) -> ChannelMessage {
    let data = ws_read_raw(stream).await;
    decode_channel_message(&data).unwrap()
}
