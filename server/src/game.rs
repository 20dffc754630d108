//! The authoritative game session.
//!
//! A session starts `Uninitialized` and becomes `Ready` the first time anything
//! needs the board: the words are drawn, the roles assigned, and the result is
//! kept until the session is reset or the process exits. The transition happens
//! under the same lock that guards reveals, so concurrent first requests can never
//! produce two different boards.

use crate::categories;
use crate::error::SessionError;
use crate::words::WordPool;
use log::{debug, info};
use rand::rngs::StdRng;
use shared::{Board, RevealedCards, BOARD_SIZE};
use tokio::sync::Mutex;

#[derive(Debug)]
struct Ready {
    board: Board,
    revealed: RevealedCards,
}

#[derive(Debug)]
struct Inner {
    rng: StdRng,
    /// `None` while the session is uninitialized.
    ready: Option<Ready>,
}

pub struct GameSession {
    pool: WordPool,
    inner: Mutex<Inner>,
}

impl GameSession {
    /// Creates an uninitialized session drawing boards from `pool` with `rng`.
    pub fn new(pool: WordPool, rng: StdRng) -> Self {
        Self {
            pool,
            inner: Mutex::new(Inner {
                rng,
                ready: None,
            }),
        }
    }

    /// Returns the board, generating it on first use.
    pub async fn board(&self) -> Result<Board, SessionError> {
        let mut inner = self.inner.lock().await;
        let ready = self.ensure_ready(&mut inner)?;
        Ok(ready.board.clone())
    }

    /// Snapshot of the revealed cards. Empty until the board exists.
    pub async fn revealed(&self) -> RevealedCards {
        let inner = self.inner.lock().await;
        inner
            .ready
            .as_ref()
            .map(|ready| ready.revealed.clone())
            .unwrap_or_default()
    }

    /// Whether a board has been generated for the current game.
    ///
    /// False on a fresh session and again right after [`GameSession::reset`].
    pub async fn is_ready(&self) -> bool {
        self.inner.lock().await.ready.is_some()
    }

    /// Reveals the card at `index` and returns the updated snapshot.
    ///
    /// Revealing an already revealed card is a no-op. Out-of-range indices are
    /// rejected without touching the session.
    pub async fn reveal(&self, index: usize) -> Result<RevealedCards, SessionError> {
        let card = u8::try_from(index)
            .ok()
            .filter(|card| usize::from(*card) < BOARD_SIZE)
            .ok_or(SessionError::IndexOutOfRange(index))?;

        let mut inner = self.inner.lock().await;
        let ready = self.ensure_ready(&mut inner)?;
        if ready.revealed.insert(card) {
            debug!("Revealed card {} ({} revealed)", card, ready.revealed.len());
        }
        Ok(ready.revealed.clone())
    }

    /// Discards the current board and its reveals. The next access draws a new board.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.ready = None;
        info!("Game session reset");
    }

    fn ensure_ready<'a>(&self, inner: &'a mut Inner) -> Result<&'a mut Ready, SessionError> {
        let ready = match inner.ready.take() {
            Some(ready) => ready,
            None => {
                let words = self.pool.draw(BOARD_SIZE, &mut inner.rng)?;
                let categories = categories::assign(&words, &mut inner.rng)?;
                info!("Generated new board of {} words", words.len());
                Ready {
                    board: Board { words, categories },
                    revealed: RevealedCards::new(),
                }
            }
        };
        Ok(inner.ready.insert(ready))
    }
}
