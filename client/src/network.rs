//! Connection to the game server: the board read path over HTTP and the
//! realtime reveal channel over WebSocket.

use futures::{SinkExt, StreamExt};
use log::debug;
use shared::{parse_server_event, Board, CardIndex, ClientEvent, ProtocolError, ServerEvent, PING, PONG};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection closed by server")]
    Closed,
}

/// One text frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Update(ServerEvent),
    Pong,
    /// Plain-text reply such as a rejection notice.
    Notice(String),
}

impl Frame {
    /// Sorts a text frame into a snapshot, a pong, or a plain-text notice.
    ///
    /// Anything that is not a valid snapshot, including one naming an off-board
    /// card, is kept as a notice.
    pub fn classify(text: &str) -> Self {
        if text == PONG {
            return Frame::Pong;
        }
        match parse_server_event(text) {
            Ok(event) => Frame::Update(event),
            Err(e) => {
                debug!("Treating frame as notice ({}): {}", e, text);
                Frame::Notice(text.to_string())
            }
        }
    }
}

/// Fetches the current board from `server` (`host:port`).
pub async fn fetch_board(server: &str) -> Result<Board, ClientError> {
    let board = reqwest::get(format!("http://{server}/board"))
        .await?
        .error_for_status()?
        .json::<Board>()
        .await?;
    Ok(board)
}

/// Asks `server` to start a new game and returns the new board.
pub async fn start_new_game(server: &str) -> Result<Board, ClientError> {
    let board = reqwest::Client::new()
        .post(format!("http://{server}/board/reset"))
        .send()
        .await?
        .error_for_status()?
        .json::<Board>()
        .await?;
    Ok(board)
}

/// Realtime channel to the server.
pub struct Connection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection {
    /// Opens the WebSocket at `ws://{server}/_ws`.
    ///
    /// The server answers with the current revealed set as the first frame.
    pub async fn connect(server: &str) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(format!("ws://{server}/_ws")).await?;
        Ok(Self { stream })
    }

    /// Asks the server to reveal `card`. The result arrives as a snapshot.
    pub async fn send_reveal(&mut self, card: CardIndex) -> Result<(), ClientError> {
        let text = serde_json::to_string(&ClientEvent::RevealCard { card })?;
        self.send_text(text).await
    }

    /// Sends the liveness check, answered with [`Frame::Pong`].
    pub async fn send_ping(&mut self) -> Result<(), ClientError> {
        self.send_text(PING.to_string()).await
    }

    pub async fn send_text(&mut self, text: String) -> Result<(), ClientError> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Waits for the next text frame, skipping control frames.
    pub async fn next_frame(&mut self) -> Result<Frame, ClientError> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(Frame::classify(text.as_str())),
                Message::Close(_) => return Err(ClientError::Closed),
                _ => {}
            }
        }
        Err(ClientError::Closed)
    }

    /// Sends a close frame and waits for the handshake to finish.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
