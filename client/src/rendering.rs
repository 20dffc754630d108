use crate::game::ClientBoard;
use shared::{CardIndex, Category};
use std::fmt::Write;

const COLUMNS: usize = 5;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Width of one card cell, in characters
    pub cell_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { cell_width: 14 }
    }
}

pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Draws the score line and the 5x5 grid.
    ///
    /// Revealed cards show their role. Hidden cards show their index, plus their
    /// role in lowercase when spymaster view is on.
    pub fn render(&self, state: &ClientBoard) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Team A: {}   Team B: {}{}",
            state.remaining(Category::TeamA),
            state.remaining(Category::TeamB),
            if state.spymaster { "   [spymaster]" } else { "" }
        );

        for (row_start, row) in state
            .board
            .words
            .chunks(COLUMNS)
            .enumerate()
            .map(|(row, words)| (row * COLUMNS, words))
        {
            let mut words_line = String::new();
            let mut roles_line = String::new();
            for (offset, word) in row.iter().enumerate() {
                let Ok(card) = CardIndex::try_from(row_start + offset) else {
                    continue;
                };
                let _ = write!(
                    words_line,
                    "{:<width$}",
                    truncate(&word.to_uppercase(), self.config.cell_width.saturating_sub(1)),
                    width = self.config.cell_width
                );
                let _ = write!(
                    roles_line,
                    "{:<width$}",
                    self.card_label(state, card),
                    width = self.config.cell_width
                );
            }
            let _ = writeln!(out, "{}", words_line.trim_end());
            let _ = writeln!(out, "{}", roles_line.trim_end());
        }

        out
    }

    fn card_label(&self, state: &ClientBoard, card: CardIndex) -> String {
        let role = state.board.category(card).map(role_name).unwrap_or("?");
        if state.is_revealed(card) {
            format!("[{}]", role.to_uppercase())
        } else if state.spymaster {
            format!("{card:>2} {role}")
        } else {
            format!("{card:>2}")
        }
    }
}

fn role_name(category: Category) -> &'static str {
    match category {
        Category::TeamA => "team a",
        Category::TeamB => "team b",
        Category::Bystander => "bystander",
        Category::Assassin => "assassin",
    }
}

fn truncate(word: &str, max: usize) -> String {
    word.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Board, ServerEvent, BOARD_SIZE, TEAM_A_COUNT, TEAM_B_COUNT};

    fn state() -> ClientBoard {
        let mut categories = vec![Category::Bystander; BOARD_SIZE];
        categories[0] = Category::Assassin;
        for slot in categories.iter_mut().skip(1).take(TEAM_A_COUNT) {
            *slot = Category::TeamA;
        }
        for slot in categories.iter_mut().skip(1 + TEAM_A_COUNT).take(TEAM_B_COUNT) {
            *slot = Category::TeamB;
        }
        ClientBoard::new(Board {
            words: (0..BOARD_SIZE).map(|i| format!("word{i}")).collect(),
            categories,
        })
    }

    #[test]
    fn test_render_grid_shape() {
        let text = Renderer::new(RenderConfig::default()).render(&state());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * 5);
        assert_eq!(lines[0], "Team A: 8   Team B: 9");
        assert!(lines[1].starts_with("WORD0"));
        assert!(lines[9].contains("WORD24"));
    }

    #[test]
    fn test_hidden_roles_stay_hidden() {
        let text = Renderer::new(RenderConfig::default()).render(&state());
        assert!(!text.contains("assassin"));
        assert!(!text.contains("ASSASSIN"));
    }

    #[test]
    fn test_revealed_card_shows_role() {
        let mut state = state();
        state.apply_server_update(&ServerEvent::RevealedCardsUpdate {
            revealed_cards: vec![0, 1],
        });
        let text = Renderer::new(RenderConfig::default()).render(&state);
        assert!(text.contains("[ASSASSIN]"));
        assert!(text.contains("[TEAM A]"));
        assert!(text.starts_with("Team A: 7   Team B: 9"));
    }

    #[test]
    fn test_spymaster_shows_hidden_roles() {
        let mut state = state();
        state.toggle_spymaster();
        let text = Renderer::new(RenderConfig::default()).render(&state);
        assert!(text.contains(" 0 assassin"));
        assert!(text.contains("[spymaster]"));
    }

    #[test]
    fn test_long_words_truncated() {
        let mut state = state();
        state.board.words[0] = "extraordinarily".to_string();
        let config = RenderConfig { cell_width: 8 };
        let text = Renderer::new(config).render(&state);
        assert!(text.contains("EXTRAOR "));
        assert!(!text.contains("EXTRAORD"));
    }
}
