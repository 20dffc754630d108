//! # Board Client Library
//!
//! Terminal client for the shared word board. It fetches the board over HTTP,
//! follows reveals over the realtime WebSocket channel, and draws the grid as
//! text.
//!
//! ## Architecture Overview
//!
//! The server owns the revealed set. The client keeps a replica that is
//! replaced wholesale by every snapshot the server pushes, so a missed or
//! reordered update is repaired by the next one.
//!
//! ### Optimistic Reveals
//! A card the local player reveals is marked immediately. The server echoes the
//! reveal back to every observer, including the sender, and that echo becomes the
//! confirmed state. A rejected reveal is undone by the next snapshot.
//!
//! ### New Games
//! A snapshot that drops previously revealed cards means the server started a
//! new game. The client refetches the board when it sees one.
//!
//! ## Module Organization
//!
//! - `game`: local replica of the board and revealed set
//! - `input`: parsing of typed commands
//! - `network`: HTTP board fetch and the WebSocket connection
//! - `rendering`: text rendering of the grid
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::game::ClientBoard;
//! use client::network::{fetch_board, Connection, Frame};
//! use client::rendering::{RenderConfig, Renderer};
//!
//! # async fn demo() -> Result<(), client::network::ClientError> {
//! let mut state = ClientBoard::new(fetch_board("127.0.0.1:3000").await?);
//! let mut connection = Connection::connect("127.0.0.1:3000").await?;
//! let renderer = Renderer::new(RenderConfig::default());
//!
//! connection.send_reveal(4).await?;
//! if let Frame::Update(event) = connection.next_frame().await? {
//!     state.apply_server_update(&event);
//! }
//! println!("{}", renderer.render(&state));
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
