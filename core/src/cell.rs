use serde::{Deserialize, Serialize};

use crate::*;

/// Result of trying to reveal a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealOutcome {
    /// Cell was revealed before, nothing changed
    AlreadyRevealed,
    /// Cell is flagged and the reveal was not forced
    RejectedFlagged,
    /// Cell is now revealed
    Revealed,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Revealed)
    }
}

/// One square of the board, it knows its position but nothing about the board around it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    coords: Coord2,
    mined: bool,
    revealed: bool,
    flagged: bool,
    adjacent_mines: u8,
}

impl Cell {
    pub const MAX_ADJACENT_MINES: u8 = 8;

    pub const fn new(coords: Coord2) -> Self {
        Self {
            coords,
            mined: false,
            revealed: false,
            flagged: false,
            adjacent_mines: 0,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        self.coords
    }

    pub const fn row(&self) -> Coord {
        self.coords.0
    }

    pub const fn col(&self) -> Coord {
        self.coords.1
    }

    pub const fn is_mine(&self) -> bool {
        self.mined
    }

    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub const fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub fn set_mine(&mut self, mined: bool) {
        self.mined = mined;
    }

    /// Sets or clears the flag, flagging a revealed cell is a no-op.
    ///
    /// Returns whether the flag actually changed.
    pub fn set_flag(&mut self, flagged: bool) -> bool {
        if flagged && self.revealed {
            return false;
        }
        let changed = self.flagged != flagged;
        self.flagged = flagged;
        changed
    }

    pub fn toggle_flag(&mut self) -> bool {
        self.set_flag(!self.flagged)
    }

    pub(crate) fn set_adjacent_mines(&mut self, count: u8) -> Result<()> {
        if count > Self::MAX_ADJACENT_MINES {
            return Err(GameError::InvalidAdjacentCount(count));
        }
        self.adjacent_mines = count;
        Ok(())
    }

    /// Reveal the cell, a flagged cell is only opened when `force` is set.
    pub fn reveal(&mut self, force: bool) -> RevealOutcome {
        if self.revealed {
            return RevealOutcome::AlreadyRevealed;
        }

        if self.flagged && !force {
            return RevealOutcome::RejectedFlagged;
        }

        self.revealed = true;
        self.flagged = false;
        RevealOutcome::Revealed
    }

    pub const fn is_neighbor_of(&self, other: &Cell) -> bool {
        is_within_one(self.coords, other.coords)
    }

    /// Back to a freshly constructed cell at the same position.
    pub fn reset(&mut self) {
        *self = Self::new(self.coords);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_twice_reports_already_revealed() {
        let mut cell = Cell::new((1, 1));

        assert_eq!(cell.reveal(false), RevealOutcome::Revealed);
        assert_eq!(cell.reveal(false), RevealOutcome::AlreadyRevealed);
        assert!(cell.is_revealed());
    }

    #[test]
    fn flagged_cell_rejects_unforced_reveal() {
        let mut cell = Cell::new((0, 0));
        assert!(cell.set_flag(true));

        assert_eq!(cell.reveal(false), RevealOutcome::RejectedFlagged);
        assert!(!cell.is_revealed());
        assert!(cell.is_flagged());
    }

    #[test]
    fn forced_reveal_clears_flag() {
        let mut cell = Cell::new((0, 0));
        cell.set_mine(true);
        cell.set_flag(true);

        assert_eq!(cell.reveal(true), RevealOutcome::Revealed);
        assert!(cell.is_revealed());
        assert!(!cell.is_flagged());
    }

    #[test]
    fn flagging_revealed_cell_is_noop() {
        let mut cell = Cell::new((0, 0));
        cell.reveal(false);

        assert!(!cell.set_flag(true));
        assert!(!cell.toggle_flag());
        assert!(!cell.is_flagged());
    }

    #[test]
    fn toggle_flag_flips_state() {
        let mut cell = Cell::new((3, 2));

        assert!(cell.toggle_flag());
        assert!(cell.is_flagged());
        assert!(cell.toggle_flag());
        assert!(!cell.is_flagged());
        assert!(!cell.set_flag(false));
    }

    #[test]
    fn adjacent_count_rejects_more_than_eight() {
        let mut cell = Cell::new((0, 0));

        assert_eq!(cell.set_adjacent_mines(8), Ok(()));
        assert_eq!(
            cell.set_adjacent_mines(9),
            Err(GameError::InvalidAdjacentCount(9))
        );
        assert_eq!(cell.adjacent_mines(), 8);
    }

    #[test]
    fn neighbor_test_uses_eight_connectivity() {
        let center = Cell::new((2, 2));

        assert!(center.is_neighbor_of(&Cell::new((1, 1))));
        assert!(center.is_neighbor_of(&Cell::new((3, 2))));
        assert!(!center.is_neighbor_of(&Cell::new((0, 2))));
    }

    #[test]
    fn reset_keeps_position_only() {
        let mut cell = Cell::new((4, 5));
        cell.set_mine(true);
        cell.set_adjacent_mines(3).unwrap();
        cell.reveal(true);

        cell.reset();

        assert_eq!(cell, Cell::new((4, 5)));
    }
}
