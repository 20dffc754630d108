//! Terminal commands typed by the player.

use shared::{CardIndex, BOARD_SIZE};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reveal(CardIndex),
    ToggleSpymaster,
    NewGame,
    Ping,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no command given")]
    Empty,
    #[error("unknown command {0:?}, type `help`")]
    Unknown(String),
    #[error("{0:?} is not a card between 0 and {max}", max = BOARD_SIZE - 1)]
    InvalidCard(String),
}

pub const HELP: &str = "\
commands:
  <n> | reveal <n>   reveal card n (0-24)
  spymaster          toggle spymaster view
  new                start a new game
  ping               check the connection
  quit               leave";

/// Parses one line of player input.
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err(InputError::Empty);
    };

    match head.to_ascii_lowercase().as_str() {
        "reveal" | "r" => match parts.next() {
            Some(card) => parse_card(card).map(Command::Reveal),
            None => Err(InputError::InvalidCard(String::new())),
        },
        "spymaster" | "s" => Ok(Command::ToggleSpymaster),
        "new" => Ok(Command::NewGame),
        "ping" => Ok(Command::Ping),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other if other.chars().all(|c| c.is_ascii_digit()) => parse_card(other).map(Command::Reveal),
        other => Err(InputError::Unknown(other.to_string())),
    }
}

fn parse_card(raw: &str) -> Result<CardIndex, InputError> {
    raw.parse::<CardIndex>()
        .ok()
        .filter(|card| usize::from(*card) < BOARD_SIZE)
        .ok_or_else(|| InputError::InvalidCard(raw.to_string()))
}
