//! Hidden role assignment for a drawn board.

use crate::error::SessionError;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Category, ASSASSIN_COUNT, TEAM_A_COUNT, TEAM_B_COUNT};
use std::collections::HashMap;

/// Assigns exactly one category to every board position.
///
/// A shuffled copy of the board is split in order: the assassin first, then the
/// first team, then the second team, and every word left over is a bystander.
/// Roles are mapped back onto board positions by word value, so the words must be
/// pairwise distinct.
pub fn assign<R: Rng + ?Sized>(words: &[String], rng: &mut R) -> Result<Vec<Category>, SessionError> {
    let required = ASSASSIN_COUNT + TEAM_A_COUNT + TEAM_B_COUNT;
    if words.len() < required {
        return Err(SessionError::InsufficientCorpus {
            required,
            available: words.len(),
        });
    }

    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(words.len());
    for (index, word) in words.iter().enumerate() {
        if positions.insert(word.as_str(), index).is_some() {
            return Err(SessionError::DuplicateWord(word.clone()));
        }
    }

    let mut shuffled: Vec<&str> = words.iter().map(String::as_str).collect();
    shuffled.shuffle(rng);

    let roles = std::iter::repeat(Category::Assassin)
        .take(ASSASSIN_COUNT)
        .chain(std::iter::repeat(Category::TeamA).take(TEAM_A_COUNT))
        .chain(std::iter::repeat(Category::TeamB).take(TEAM_B_COUNT));

    let mut categories = vec![Category::Bystander; words.len()];
    for (word, role) in shuffled.iter().zip(roles) {
        categories[positions[word]] = role;
    }

    Ok(categories)
}
