use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use clock::*;
pub use controller::*;
pub use error::*;
pub use generator::*;
pub use state::*;
pub use timer::*;
pub use types::*;
pub use view::*;

mod board;
mod cell;
mod clock;
mod controller;
mod error;
mod generator;
mod state;
mod timer;
mod types;
mod view;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    size: Coord2,
    mines: CellCount,
    /// Delay between two consecutive forced mine reveals after a loss
    reveal_gap: Duration,
}

impl BoardConfig {
    pub const DEFAULT_REVEAL_GAP: Duration = Duration::from_millis(50);

    /// Builds a config without checking that the mines fit around a seed cell,
    /// [`Board::new`] still refuses it if they don't.
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self {
            size,
            mines,
            reveal_gap: Self::DEFAULT_REVEAL_GAP,
        }
    }

    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    /// Checks that the board is not empty and that the mines fit wherever the seed cell lands.
    pub fn validate(&self) -> Result<()> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        if self.mines > self.mine_capacity() {
            return Err(GameError::TooManyMines);
        }
        Ok(())
    }

    pub const fn with_reveal_gap(mut self, reveal_gap: Duration) -> Self {
        self.reveal_gap = reveal_gap;
        self
    }

    pub const fn size(&self) -> Coord2 {
        self.size
    }

    pub const fn mines(&self) -> CellCount {
        self.mines
    }

    pub const fn reveal_gap(&self) -> Duration {
        self.reveal_gap
    }

    pub const fn rows(&self) -> Coord {
        self.size.0
    }

    pub const fn cols(&self) -> Coord {
        self.size.1
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// Largest neighbourhood a seed cell can exclude, 9 on any board of at least 3x3.
    pub const fn exclusion_zone(&self) -> CellCount {
        let rows = if self.size.0 < 3 { self.size.0 } else { 3 };
        let cols = if self.size.1 < 3 { self.size.1 } else { 3 };
        mult(rows, cols)
    }

    /// How many mines can always be placed regardless of where the seed cell lands.
    pub const fn mine_capacity(&self) -> CellCount {
        self.total_cells().saturating_sub(self.exclusion_zone())
    }
}

/// The fixed board sizes offered by the main menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardPreset {
    Small,
    Medium,
    Large,
}

impl BoardPreset {
    pub const ALL: [BoardPreset; 3] = [Self::Small, Self::Medium, Self::Large];

    pub const fn config(self) -> BoardConfig {
        use BoardPreset::*;
        match self {
            Small => BoardConfig::new_unchecked((8, 8), 9),
            Medium => BoardConfig::new_unchecked((10, 10), 15),
            Large => BoardConfig::new_unchecked((12, 12), 25),
        }
    }
}

impl From<BoardPreset> for BoardConfig {
    fn from(preset: BoardPreset) -> Self {
        preset.config()
    }
}
