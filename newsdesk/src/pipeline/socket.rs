//! WebSocket listener for pipeline events.
//!
//! The reader runs on its own task and forwards recognised events over a
//! channel. Dropping the [`PipelineSocket`] detaches the listener.

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, trace, warn};

use super::events::PipelineEvent;
use crate::error::ApiResult;

/// Buffer size for the event channel.
const CHANNEL_CAPACITY: usize = 256;

/// Handle to a connected pipeline socket.
#[derive(Debug)]
pub struct PipelineSocket {
    events: mpsc::Receiver<PipelineEvent>,
    reader: JoinHandle<()>,
}

impl PipelineSocket {
    /// Next event, or `None` once the connection has closed.
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// Discard events that are already buffered. Returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.events.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

impl Drop for PipelineSocket {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Connect to the pipeline socket and join the given chat session.
pub async fn connect(url: &str, session_id: &str) -> ApiResult<PipelineSocket> {
    let (ws, _response) = connect_async(url).await?;
    info!(%url, %session_id, "pipeline socket connected");

    let (mut write, mut read) = ws.split();

    let join = json!({ "event": "join", "data": { "session_id": session_id } });
    write.send(Message::Text(join.to_string().into())).await?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let reader = tokio::spawn(async move {
        // Keep the write half alive for the lifetime of the reader.
        let _write = write;

        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let Some(event) = PipelineEvent::parse_frame(text.as_str()) else {
                        debug!(frame = %text.as_str(), "ignoring unrecognised frame");
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("pipeline socket closed by server");
                    break;
                }
                Ok(other) => trace!(?other, "skipping non-text frame"),
                Err(e) => {
                    warn!(error = %e, "pipeline socket error");
                    break;
                }
            }
        }
    });

    Ok(PipelineSocket { events: rx, reader })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineEventKind;
    use crate::testing::serve;
    use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    async fn scripted(mut socket: WebSocket) {
        let Some(Ok(WsMessage::Text(join))) = socket.recv().await else {
            return;
        };
        let join: serde_json::Value = serde_json::from_str(join.as_str()).unwrap();
        assert_eq!(join["event"], "join");
        let session = join["data"]["session_id"].as_str().unwrap().to_string();

        let frames = [
            r#"{"event":"embedding_start","data":{}}"#.to_string(),
            r#"{"event":"heartbeat"}"#.to_string(),
            "garbage".to_string(),
            format!(r#"{{"event":"search_results","data":{{"count":2,"session_id":"{session}"}}}}"#),
        ];
        let _ = socket.send(WsMessage::Ping(vec![1u8].into())).await;
        for frame in frames {
            if socket.send(WsMessage::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = socket.send(WsMessage::Close(None)).await;
    }

    async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(scripted)
    }

    #[tokio::test]
    async fn forwards_recognised_events_until_close() {
        let addr = serve(Router::new().route("/ws", get(ws_handler))).await;

        let mut socket = connect(&format!("ws://{addr}/ws"), "sess-42").await.unwrap();

        let first = socket.recv().await.unwrap();
        assert_eq!(first.kind, PipelineEventKind::EmbeddingStart);

        let second = socket.recv().await.unwrap();
        assert_eq!(second.kind, PipelineEventKind::SearchResults);
        assert_eq!(second.count(), 2);
        assert_eq!(second.payload["session_id"], "sess-42");

        assert!(socket.recv().await.is_none());
    }

    #[tokio::test]
    async fn drain_discards_buffered_events() {
        let addr = serve(Router::new().route("/ws", get(ws_handler))).await;

        let mut socket = connect(&format!("ws://{addr}/ws"), "sess-1").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(socket.drain(), 2);
        assert_eq!(socket.drain(), 0);
        assert!(socket.recv().await.is_none());
    }

    #[tokio::test]
    async fn connect_fails_without_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(connect(&format!("ws://{addr}/ws"), "s").await.is_err());
    }
}
