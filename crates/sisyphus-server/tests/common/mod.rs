// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use sisyphus_domain_types::Command;
use sisyphus_server::{
    dependencies::DefaultServerDependencies, Notifier, ProbeError, Server, ServerConfig,
};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Notifier that records every probed URL and always delivers.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, url: &str, _version: i64) -> Result<(), ProbeError> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub ws_url: String,
    pub notifier: Arc<RecordingNotifier>,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a server on an ephemeral port with an in-memory database.
///
/// The probe period is long enough that the timer never fires during a test.
pub async fn spawn_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to ephemeral port");
    let addr = listener.local_addr().expect("port");
    drop(listener);

    let config = ServerConfig {
        bind_addr: addr,
        database_path: ":memory:".to_string(),
        probe_period: Duration::from_secs(3600),
        ..Default::default()
    };

    let notifier = Arc::new(RecordingNotifier::default());
    let deps = DefaultServerDependencies::with_notifier(config.clone(), notifier.clone())
        .expect("deps");
    let server = Server::with_state(config, deps.into_state());

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    let base_url = format!("http://{addr}");
    wait_for_health(&base_url).await;

    TestServer {
        ws_url: format!("ws://{addr}/ws"),
        base_url,
        notifier,
        client: reqwest::Client::new(),
        handle,
    }
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    let healthz = format!("{base_url}/healthz");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(response) = client.get(&healthz).send().await {
            if response.status().is_success() {
                return;
            }
        }
        if tokio::time::Instant::now() > deadline {
            panic!("server did not become healthy at {healthz}");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Open a socket and wait for its `hello` reply, so the connection is
    /// registered before any broadcast the test triggers.
    pub async fn connect(&self) -> (Socket, Command) {
        let (mut socket, _) = tokio_tungstenite::connect_async(self.ws_url.as_str())
            .await
            .expect("connect websocket");
        send_text(&mut socket, r#"{"action":"hello"}"#).await;
        let hello = next_command(&mut socket).await;
        (socket, hello)
    }

    pub async fn register(&self, url: &str, name: &str) -> reqwest::Response {
        self.client
            .post(self.url("/reg"))
            .form(&[("sp", url), ("name", name)])
            .send()
            .await
            .expect("POST /reg")
    }
}

pub async fn send_text(socket: &mut Socket, text: &str) {
    socket
        .send(WsMessage::Text(text.to_string()))
        .await
        .expect("send frame");
}

/// Next command frame, failing the test after five seconds.
pub async fn next_command(socket: &mut Socket) -> Command {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame within timeout")
            .expect("socket open")
            .expect("valid frame");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).expect("command frame");
        }
    }
}

/// True when the server closes the socket within five seconds.
pub async fn closes(socket: &mut Socket) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        match tokio::time::timeout_at(deadline, socket.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(WsMessage::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}
