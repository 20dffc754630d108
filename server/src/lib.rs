//! # Game Server Library
//!
//! This library provides the authoritative server for a shared Codenames board.
//! It owns the one game session of the process, turns reveal requests into
//! session mutations, and keeps every connected observer's view of the revealed
//! cards identical to the server's.
//!
//! ## Core Responsibilities
//!
//! ### Board Generation
//! A board is 25 distinct words drawn from a word corpus, each with a hidden role:
//! one assassin, eight cards for the first team, nine for the second team, and
//! seven bystanders. Both the draw and the role assignment use an injected random
//! generator, so a seeded session always produces the same board.
//!
//! ### Authoritative State
//! The set of revealed cards lives only in the [`game::GameSession`]. It only
//! grows, except when a new game is started, and the only way to change it is a
//! reveal request.
//!
//! ### State Broadcasting
//! Observers never receive deltas. After every reveal the full revealed set is
//! pushed to every observer, including the one that asked for the reveal, which
//! also corrects any optimistic state the client applied locally.
//!
//! ## Module Organization
//!
//! ### Words Module (`words`)
//! Corpus loading and uniform draws without replacement.
//!
//! ### Categories Module (`categories`)
//! Role assignment for a drawn board.
//!
//! ### Game Module (`game`)
//! The session state machine: lazy board generation, reveals and resets.
//!
//! ### Client Manager Module (`client_manager`)
//! Observer registration, capacity limits and outbound queues.
//!
//! ### Hub Module (`hub`)
//! Protocol dispatch and fan-out of snapshots to observers.
//!
//! ### Network Module (`network`)
//! The HTTP board read path and the WebSocket upgrade, served with axum.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use server::game::GameSession;
//! use server::hub::BroadcastHub;
//! use server::network::Server;
//! use server::words::WordPool;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = WordPool::load("words.txt")?;
//!     let session = Arc::new(GameSession::new(pool, StdRng::from_entropy()));
//!     let hub = Arc::new(BroadcastHub::new(session, 64));
//!
//!     let server = Server::bind("127.0.0.1:3000", hub).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Every inbound message is handled to completion (parse, validate, mutate,
//! broadcast) before the next one from any connection, because the hub holds its
//! registry lock across the whole sequence. Observers are written to by their own
//! tasks through bounded queues, so a slow or dead socket cannot hold up the
//! others. An observer whose queue fills up is dropped and its connection closed.

pub mod categories;
pub mod client_manager;
pub mod error;
pub mod game;
pub mod hub;
pub mod network;
pub mod words;

pub use error::SessionError;
