use serde::{Deserialize, Serialize};

use crate::*;

/// How a finished game ended, shown as a popup over the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lose,
}

/// Which overlays the view layer should show, derived from state changes alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuVisibility {
    pub main_menu: bool,
    pub in_game_menu: bool,
    pub outcome: Option<Outcome>,
}

impl MenuVisibility {
    pub const fn for_state(state: GameState) -> Self {
        Self {
            main_menu: matches!(state, GameState::NotStarted),
            in_game_menu: matches!(state, GameState::Paused),
            outcome: match state {
                GameState::Won => Some(Outcome::Won),
                GameState::Lose => Some(Outcome::Lose),
                _ => None,
            },
        }
    }
}

impl Default for MenuVisibility {
    fn default() -> Self {
        Self::for_state(GameState::default())
    }
}

impl StateListener for MenuVisibility {
    fn on_state_changed(&mut self, change: StateChange) {
        *self = Self::for_state(change.new);
    }
}
