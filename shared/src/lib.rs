//! Board model and wire protocol shared by the server and its observers.
//!
//! Everything that both ends of a connection must agree on lives here: the board
//! dimensions, the per-category card counts, the board read-path payload and the
//! JSON messages exchanged over the realtime channel.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub const BOARD_SIZE: usize = 25;
pub const ASSASSIN_COUNT: usize = 1;
pub const TEAM_A_COUNT: usize = 8;
pub const TEAM_B_COUNT: usize = 9;
pub const BYSTANDER_COUNT: usize = BOARD_SIZE - ASSASSIN_COUNT - TEAM_A_COUNT - TEAM_B_COUNT;

/// Liveness check sent outside the JSON envelope.
pub const PING: &str = "ping";
pub const PONG: &str = "pong";

/// Board position, always in `0..BOARD_SIZE` once validated.
pub type CardIndex = u8;

/// Set of revealed board positions. Ordered so snapshots serialize deterministically.
pub type RevealedCards = BTreeSet<CardIndex>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    TeamA,
    TeamB,
    Bystander,
    Assassin,
}

impl Category {
    /// How many cards of this category every board carries.
    pub const fn quota(self) -> usize {
        match self {
            Category::TeamA => TEAM_A_COUNT,
            Category::TeamB => TEAM_B_COUNT,
            Category::Bystander => BYSTANDER_COUNT,
            Category::Assassin => ASSASSIN_COUNT,
        }
    }
}

/// Words and hidden roles for one game, as served by the board read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub words: Vec<String>,
    pub categories: Vec<Category>,
}

impl Board {
    /// Number of cards on the board, `BOARD_SIZE` for any generated board.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true for a board with no cards.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word at `index`, or `None` off the board.
    pub fn word(&self, index: CardIndex) -> Option<&str> {
        self.words.get(usize::from(index)).map(String::as_str)
    }

    /// Hidden role at `index`, or `None` off the board.
    ///
    /// `words[i]` and `categories[i]` always describe the same card.
    pub fn category(&self, index: CardIndex) -> Option<Category> {
        self.categories.get(usize::from(index)).copied()
    }

    /// Number of cards assigned to `category`.
    pub fn count(&self, category: Category) -> usize {
        self.categories.iter().filter(|c| **c == category).count()
    }

    /// Cards of `category` still hidden given the revealed set.
    pub fn remaining(&self, category: Category, revealed: &RevealedCards) -> usize {
        let flipped = revealed
            .iter()
            .filter(|index| self.category(**index) == Some(category))
            .count();
        self.count(category) - flipped
    }
}

/// Messages sent from an observer to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    RevealCard {
        #[serde(deserialize_with = "integral_card")]
        card: CardIndex,
    },
}

/// Accepts any JSON number without a fractional part, so `5.0` names card 5.
fn integral_card<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CardIndex, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(CardIndex::MAX)).contains(&value) {
        return Err(de::Error::invalid_value(
            Unexpected::Float(value),
            &"an integer card index",
        ));
    }
    Ok(value as CardIndex)
}

impl ClientEvent {
    /// Checks that the event names a card on the board.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ClientEvent::RevealCard { card } if usize::from(*card) >= BOARD_SIZE => {
                Err(ProtocolError::CardOutOfRange(*card))
            }
            ClientEvent::RevealCard { .. } => Ok(()),
        }
    }
}

/// Messages pushed from the server to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full replacement set of revealed cards, never a delta.
    RevealedCardsUpdate {
        #[serde(rename = "revealedCards")]
        revealed_cards: Vec<CardIndex>,
    },
}

impl ServerEvent {
    /// Builds the update carrying the whole revealed set, in ascending order.
    pub fn snapshot(revealed: &RevealedCards) -> Self {
        ServerEvent::RevealedCardsUpdate {
            revealed_cards: revealed.iter().copied().collect(),
        }
    }

    /// Encodes the event as a JSON text frame.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Checks that every revealed card is on the board.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ServerEvent::RevealedCardsUpdate { revealed_cards } => {
                match revealed_cards
                    .iter()
                    .find(|card| usize::from(**card) >= BOARD_SIZE)
                {
                    Some(card) => Err(ProtocolError::CardOutOfRange(*card)),
                    None => Ok(()),
                }
            }
        }
    }

    /// Revealed cards as a set, which is how receivers must treat them.
    pub fn revealed(&self) -> RevealedCards {
        match self {
            ServerEvent::RevealedCardsUpdate { revealed_cards } => {
                revealed_cards.iter().copied().collect()
            }
        }
    }
}

/// A decoded inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Ping,
    Event(ClientEvent),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unknown event: {0}")]
    UnknownEvent(#[source] serde_json::Error),
    #[error("card {0} is outside the board")]
    CardOutOfRange(CardIndex),
}

impl ProtocolError {
    /// Plain-text reply sent back to the offending peer.
    pub fn rejection(&self) -> &'static str {
        match self {
            ProtocolError::Malformed(_) => "Invalid message format",
            ProtocolError::UnknownEvent(_) | ProtocolError::CardOutOfRange(_) => "Unknown event",
        }
    }
}

/// Decodes a text frame received by the server.
///
/// JSON is tried first. Text that is not JSON is only accepted when it is the
/// literal liveness check; anything else is malformed. JSON that does not match a
/// known event, or names a card off the board, is an unknown event.
pub fn parse_inbound(raw: &str) -> Result<Inbound, ProtocolError> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) if raw == PING => return Ok(Inbound::Ping),
        Err(e) => return Err(ProtocolError::Malformed(e)),
    };

    let event: ClientEvent =
        serde_json::from_value(value).map_err(ProtocolError::UnknownEvent)?;
    event.validate()?;
    Ok(Inbound::Event(event))
}

/// Decodes a text frame received by an observer.
pub fn parse_server_event(raw: &str) -> Result<ServerEvent, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(ProtocolError::Malformed)?;
    let event: ServerEvent =
        serde_json::from_value(value).map_err(ProtocolError::UnknownEvent)?;
    event.validate()?;
    Ok(event)
}
