#![allow(dead_code)]

use std::time::Duration;

use axum_test::{TestServer, TestWebSocket, WsMessage};
use serde_json::Value;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket test client wrapper
pub struct WsTestClient {
    ws: TestWebSocket,
}

impl WsTestClient {
    /// Connect without credentials
    pub async fn connect_anonymous(server: &TestServer) -> Self {
        let ws = server
            .get_websocket("/ws")
            .await
            .into_websocket()
            .await;

        Self { ws }
    }

    /// Connect passing the token as a query parameter
    pub async fn connect_with_token(server: &TestServer, token: &str) -> Self {
        let ws = server
            .get_websocket("/ws")
            .add_query_param("token", token)
            .await
            .into_websocket()
            .await;

        Self { ws }
    }

    /// Connect passing the token in an Authorization header
    pub async fn connect_with_bearer(server: &TestServer, token: &str) -> Self {
        let ws = server
            .get_websocket("/ws")
            .add_header("Authorization", format!("Bearer {}", token))
            .await
            .into_websocket()
            .await;

        Self { ws }
    }

    /// Receive the next frame as JSON
    pub async fn receive_json(&mut self) -> Value {
        tokio::time::timeout(RECEIVE_TIMEOUT, self.ws.receive_json::<Value>())
            .await
            .expect("timed out waiting for a frame")
    }

    /// Receive frames until one of the given type arrives
    pub async fn receive_type(&mut self, event_type: &str) -> Value {
        loop {
            let frame = self.receive_json().await;
            if frame["type"] == event_type {
                return frame;
            }
        }
    }

    /// Receive the next frame, skipping heartbeats
    pub async fn receive_event(&mut self) -> Value {
        loop {
            let frame = self.receive_json().await;
            if frame["type"] != "heartbeat" {
                return frame;
            }
        }
    }

    /// Receive the raw next message (close frames included)
    pub async fn receive_message(&mut self) -> WsMessage {
        tokio::time::timeout(RECEIVE_TIMEOUT, self.ws.receive_message())
            .await
            .expect("timed out waiting for a message")
    }

    /// Send text message (the server ignores inbound content)
    pub async fn send_text(&mut self, text: impl std::fmt::Display) {
        self.ws.send_text(text).await;
    }

    /// Close the WebSocket connection
    pub async fn close(self) {
        self.ws.close().await;
    }
}

/// Connect several anonymous clients and consume their greetings
pub async fn connect_anonymous_clients(server: &TestServer, count: usize) -> Vec<WsTestClient> {
    let mut clients = Vec::with_capacity(count);
    for _ in 0..count {
        let mut client = WsTestClient::connect_anonymous(server).await;
        let greeting = client.receive_json().await;
        assert_eq!(greeting["type"], "connection_established");
        clients.push(client);
    }
    clients
}
