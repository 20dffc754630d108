//! HTTP and WebSocket transport in front of the broadcast hub.

use crate::client_manager::OUTBOUND_QUEUE;
use crate::hub::BroadcastHub;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::Board;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Upgrade path of the realtime channel.
pub const WS_PATH: &str = "/_ws";
pub const BOARD_PATH: &str = "/board";
pub const RESET_PATH: &str = "/board/reset";

/// A socket write that takes longer than this ends the connection.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Routes served for one game session.
pub fn router(hub: Arc<BroadcastHub>) -> Router {
    Router::new()
        .route(WS_PATH, get(ws_handler))
        .route(BOARD_PATH, get(get_board))
        .route(RESET_PATH, post(reset_board))
        .with_state(hub)
}

/// A bound listener serving the session routes.
pub struct Server {
    listener: TcpListener,
    hub: Arc<BroadcastHub>,
}

impl Server {
    /// Binds the listener. Port 0 picks a free port, see [`Server::local_addr`].
    pub async fn bind(addr: &str, hub: Arc<BroadcastHub>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, hub })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until the listener fails.
    pub async fn run(self) -> std::io::Result<()> {
        info!("Server listening on {}", self.listener.local_addr()?);
        let app = router(self.hub);
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

async fn get_board(
    State(hub): State<Arc<BroadcastHub>>,
) -> Result<Json<Board>, (StatusCode, String)> {
    hub.session().board().await.map(Json).map_err(|e| {
        error!("Board unavailable: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn reset_board(
    State(hub): State<Arc<BroadcastHub>>,
) -> Result<Json<Board>, (StatusCode, String)> {
    hub.reset().await.map(Json).map_err(|e| {
        error!("Failed to start a new game: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(hub): State<Arc<BroadcastHub>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, hub))
}

/// Runs one observer connection from registration to disconnect.
///
/// Outbound frames are queued by the hub and written by a dedicated task, so a
/// slow socket never stalls a broadcast. Inbound frames are handed to the hub one
/// at a time in arrival order. The connection ends when either side finishes.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, hub: Arc<BroadcastHub>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);

    let id = match hub.on_connect(addr, tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Refusing connection from {}: {}", addr, e);
            let frame = CloseFrame {
                code: close_code::AGAIN,
                reason: Utf8Bytes::from_static("server full"),
            };
            let _ = ws_tx.send(Message::Close(Some(frame))).await;
            return;
        }
    };

    // Ends when the hub drops the queue, a write fails, or a write stalls. The
    // hub drops the queue of an observer that fell too far behind.
    let mut writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            match timeout(WRITE_TIMEOUT, ws_tx.send(Message::Text(text.into()))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Write to {} failed: {}", addr, e);
                    return;
                }
                Err(_) => {
                    warn!("Write to {} timed out", addr);
                    return;
                }
            }
        }
        let _ = timeout(WRITE_TIMEOUT, ws_tx.close()).await;
    });

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let dispatch = hub.on_message(id, text.as_str()).await;
                    debug!("Observer {}: {:?}", id, dispatch);
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes);
                    let dispatch = hub.on_message(id, &text).await;
                    debug!("Observer {}: {:?}", id, dispatch);
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Control frames are answered by the WebSocket layer.
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => {
                    debug!("Read from {} failed: {}", addr, e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    hub.on_disconnect(id).await;
    writer.abort();
}
