use log::debug;
use shared::{Board, CardIndex, Category, RevealedCards, ServerEvent, BOARD_SIZE};

/// How a server snapshot changed the local view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotChange {
    /// Cards the server confirmed since the previous snapshot.
    Revealed(Vec<CardIndex>),
    Unchanged,
    /// The server started a new game: the revealed set shrank, or an empty
    /// snapshot arrived after the initial one.
    NewGame,
}

/// Local replica of the shared board.
///
/// `confirmed` is the last snapshot received from the server. `predicted` also
/// contains reveals sent by this client that the server has not echoed yet; the
/// next snapshot replaces it wholesale.
pub struct ClientBoard {
    pub board: Board,
    pub confirmed: RevealedCards,
    pub predicted: RevealedCards,
    pub spymaster: bool,
    /// Set once the snapshot sent on connect has been applied.
    synced: bool,
}

impl ClientBoard {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            confirmed: RevealedCards::new(),
            predicted: RevealedCards::new(),
            spymaster: false,
            synced: false,
        }
    }

    /// Applies an authoritative snapshot as a replacement set.
    ///
    /// The server only sends an empty snapshot on connect and when a new game
    /// starts, so any empty snapshot after the first one means a new game even if
    /// nothing was revealed locally.
    pub fn apply_server_update(&mut self, event: &ServerEvent) -> SnapshotChange {
        let incoming = event.revealed();
        let was_synced = std::mem::replace(&mut self.synced, true);

        let reset = was_synced && incoming.is_empty();
        let change = if reset || !self.confirmed.is_subset(&incoming) {
            SnapshotChange::NewGame
        } else {
            let fresh: Vec<CardIndex> = incoming.difference(&self.confirmed).copied().collect();
            if fresh.is_empty() {
                SnapshotChange::Unchanged
            } else {
                SnapshotChange::Revealed(fresh)
            }
        };

        let dropped = self.predicted.difference(&incoming).count();
        if dropped > 0 {
            debug!("Server snapshot dropped {} predicted reveals", dropped);
        }

        self.confirmed = incoming;
        self.predicted = self.confirmed.clone();
        change
    }

    /// Marks a card revealed locally before the server confirms it.
    ///
    /// Returns false when the card is off the board or already revealed, in which
    /// case nothing needs to be sent.
    pub fn predict_reveal(&mut self, card: CardIndex) -> bool {
        usize::from(card) < BOARD_SIZE && self.predicted.insert(card)
    }

    /// Swaps in the board of a new game and forgets all reveals.
    pub fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.confirmed.clear();
        self.predicted.clear();
    }

    /// Whether `card` shows as revealed, counting unconfirmed local reveals.
    pub fn is_revealed(&self, card: CardIndex) -> bool {
        self.predicted.contains(&card)
    }

    /// Hidden cards left for a team.
    pub fn remaining(&self, category: Category) -> usize {
        self.board.remaining(category, &self.predicted)
    }

    /// Flips the spymaster view and returns the new setting.
    pub fn toggle_spymaster(&mut self) -> bool {
        self.spymaster = !self.spymaster;
        self.spymaster
    }
}
