use std::collections::VecDeque;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Outcome of a primary activation on the board
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Cell was already open or is protected by a flag
    NoChange,
    /// Safe cell opened, with how many cells got revealed including the flood fill
    Safe(CellCount),
    /// A mine was opened
    Explode,
}

impl OpenOutcome {
    /// Whether this outcome could have caused an update to the board
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Outcome of a secondary activation on the board
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    MarkChanged,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::MarkChanged)
    }
}

/// Grid of cells plus the mine bookkeeping of one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: BoardConfig,
    cells: Array2<Cell>,
    mine_cells: Vec<Coord2>,
    unrevealed_count: CellCount,
    flagged_count: CellCount,
    mines_placed: bool,
}

impl Board {
    /// Empty board waiting for its first move, refuses configs whose mines may not fit.
    pub fn new(config: BoardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Board with mines already at `mine_coords`, no seed cell protection applies.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        let mines = mine_coords
            .len()
            .try_into()
            .map_err(|_| GameError::TooManyMines)?;
        let mut board = Self::with_config(BoardConfig::new_unchecked(size, mines));
        board.apply_layout(mine_coords)?;
        Ok(board)
    }

    fn with_config(config: BoardConfig) -> Self {
        let cells = Array2::from_shape_fn(config.size().to_nd_index(), |(row, col)| {
            Cell::new((row as Coord, col as Coord))
        });
        Self {
            config,
            cells,
            mine_cells: Vec::new(),
            unrevealed_count: config.total_cells(),
            flagged_count: 0,
            mines_placed: false,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines()
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    /// Mines in placement order, empty until the first move.
    pub fn mine_cells(&self) -> &[Coord2] {
        &self.mine_cells
    }

    pub fn unrevealed_count(&self) -> CellCount {
        self.unrevealed_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    /// How many mines have not been flagged yet, negative when over-flagged
    pub fn mines_left(&self) -> isize {
        (self.config.mines() as isize) - (self.flagged_count as isize)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (rows, cols) = self.size();
        if coords.0 < rows && coords.1 < cols {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell(&self, coords: Coord2) -> Result<&Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(&self.cells[coords.to_nd_index()])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// Place mines once, keeping whatever guarantees `generator` gives around `seed_cell`.
    pub fn place_mines<G>(&mut self, seed_cell: Coord2, generator: &mut G) -> Result<()>
    where
        G: MinefieldGenerator + ?Sized,
    {
        if self.mines_placed {
            return Err(GameError::MinesAlreadyPlaced);
        }
        let seed_cell = self.validate_coords(seed_cell)?;
        let mines = generator.generate(&self.config, seed_cell)?;
        self.apply_layout(&mines)
    }

    fn apply_layout(&mut self, mines: &[Coord2]) -> Result<()> {
        if mines.len() != usize::from(self.config.mines()) {
            return Err(GameError::InvalidLayout);
        }
        for &coords in mines {
            self.validate_coords(coords)?;
        }
        for &coords in mines {
            if self.cells[coords.to_nd_index()].is_mine() {
                self.clear_mines();
                return Err(GameError::InvalidLayout);
            }
            self.cells[coords.to_nd_index()].set_mine(true);
            self.mine_cells.push(coords);
        }
        self.mines_placed = true;
        self.update_mine_counts()
    }

    fn clear_mines(&mut self) {
        for coords in self.mine_cells.drain(..) {
            self.cells[coords.to_nd_index()].set_mine(false);
        }
    }

    fn update_mine_counts(&mut self) -> Result<()> {
        let (rows, cols) = self.size();
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                let count = self
                    .iter_neighbors(coords)
                    .filter(|&pos| self.cells[pos.to_nd_index()].is_mine())
                    .count();
                self.cells[coords.to_nd_index()].set_adjacent_mines(count as u8)?;
            }
        }
        Ok(())
    }

    fn decrement_unrevealed(&mut self) -> Result<()> {
        self.unrevealed_count = self
            .unrevealed_count
            .checked_sub(1)
            .ok_or(GameError::CounterUnderflow)?;
        Ok(())
    }

    /// Reveal a cell the way a click does, opening the zero region around it.
    pub fn open(&mut self, coords: Coord2) -> Result<OpenOutcome> {
        let coords = self.validate_coords(coords)?;

        let cell = &mut self.cells[coords.to_nd_index()];
        if !cell.reveal(false).has_update() {
            return Ok(OpenOutcome::NoChange);
        }
        let (mined, count) = (cell.is_mine(), cell.adjacent_mines());
        self.decrement_unrevealed()?;

        if mined {
            log::debug!("mine opened at {:?}", coords);
            return Ok(OpenOutcome::Explode);
        }
        log::debug!("Open cell at {:?}, mine count: {}", coords, count);

        let mut opened: CellCount = 1;
        if count == 0 {
            let mut to_visit: VecDeque<_> = self.iter_neighbors(coords).collect();
            log::trace!(
                "Starting flood-fill from {:?}, initial neighbors: {:?}",
                coords,
                to_visit
            );

            while let Some(visit_coords) = to_visit.pop_front() {
                // the revealed flag doubles as the visited set, flags stop the fill
                let visit = &mut self.cells[visit_coords.to_nd_index()];
                if !visit.reveal(false).has_update() {
                    continue;
                }
                let visit_count = visit.adjacent_mines();
                self.decrement_unrevealed()?;
                opened += 1;
                log::trace!(
                    "Flood opened cell at {:?}, mine count: {}",
                    visit_coords,
                    visit_count
                );

                if visit_count == 0 {
                    let cells = &self.cells;
                    to_visit.extend(
                        self.iter_neighbors(visit_coords)
                            .filter(|&pos| !cells[pos.to_nd_index()].is_revealed()),
                    );
                }
            }
        }

        Ok(OpenOutcome::Safe(opened))
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];

        if !cell.toggle_flag() {
            return Ok(FlagOutcome::NoChange);
        }
        if cell.is_flagged() {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }
        Ok(FlagOutcome::MarkChanged)
    }

    /// Reveal regardless of flags, used to uncover the mines after a loss.
    pub fn force_reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];

        let was_flagged = cell.is_flagged();
        let outcome = cell.reveal(true);
        if outcome.has_update() {
            if was_flagged {
                self.flagged_count -= 1;
            }
            self.decrement_unrevealed()?;
        }
        Ok(outcome)
    }

    /// Every mine carries a flag, extra flags on safe cells do not matter.
    pub fn all_mines_flagged(&self) -> bool {
        self.mine_cells
            .iter()
            .all(|&coords| self.cells[coords.to_nd_index()].is_flagged())
    }

    /// Every safe cell is revealed.
    pub fn all_safe_revealed(&self) -> bool {
        self.unrevealed_count == self.config.mines()
    }

    pub fn is_won(&self) -> bool {
        self.mines_placed && (self.all_mines_flagged() || self.all_safe_revealed())
    }

    /// Back to the state right after construction, mines will be placed again on the next move.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(Cell::reset);
        self.mine_cells.clear();
        self.unrevealed_count = self.config.total_cells();
        self.flagged_count = 0;
        self.mines_placed = false;
        log::debug!("board reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::from_mine_coords(size, mines).unwrap()
    }

    fn revealed(board: &Board) -> Vec<Coord2> {
        board
            .cells()
            .filter(|cell| cell.is_revealed())
            .map(Cell::coords)
            .collect()
    }

    #[test]
    fn new_board_is_untouched() {
        let board = Board::new(BoardPreset::Small.config()).unwrap();

        assert_eq!(board.unrevealed_count(), 64);
        assert!(!board.mines_placed());
        assert!(board.cells().all(|cell| *cell == Cell::new(cell.coords())));
    }

    #[test]
    fn new_rejects_more_mines_than_cells() {
        let config = BoardConfig::new_unchecked((2, 2), 5);
        assert_eq!(Board::new(config), Err(GameError::TooManyMines));
        let config = BoardConfig::new_unchecked((0, 2), 0);
        assert_eq!(Board::new(config), Err(GameError::EmptyBoard));
        assert_eq!(Board::from_mine_coords((2, 0), &[]), Err(GameError::EmptyBoard));
    }

    #[test]
    fn new_rejects_mines_that_may_not_fit_around_seed() {
        let config = BoardConfig::new_unchecked((3, 3), 1);
        assert_eq!(Board::new(config), Err(GameError::TooManyMines));

        let config: BoardConfig =
            serde_json::from_str(r#"{"size":[4,4],"mines":8,"reveal_gap":{"secs":0,"nanos":0}}"#)
                .unwrap();
        assert_eq!(Board::new(config), Err(GameError::TooManyMines));

        let board = board((3, 3), &[(1, 1)]);
        assert_eq!(board.total_mines(), 1);
        assert!(board.mines_placed());
    }

    #[test]
    fn layout_rejects_duplicates_and_out_of_bounds() {
        assert_eq!(
            Board::from_mine_coords((3, 3), &[(1, 1), (1, 1)]),
            Err(GameError::InvalidLayout)
        );
        assert_eq!(
            Board::from_mine_coords((3, 3), &[(3, 0)]),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn place_mines_only_once() {
        let mut board = Board::new(BoardPreset::Small.config()).unwrap();
        let mut generator = RandomMinefieldGenerator::new(11);

        board.place_mines((3, 3), &mut generator).unwrap();
        assert_eq!(
            board.place_mines((3, 3), &mut generator),
            Err(GameError::MinesAlreadyPlaced)
        );
    }

    #[test]
    fn adjacency_counts_are_clamped() {
        // mines surround the corner (0, 0) completely
        let board = board((3, 3), &[(0, 1), (1, 0), (1, 1)]);

        assert_eq!(board.cell((0, 0)).unwrap().adjacent_mines(), 3);
        assert_eq!(board.cell((2, 2)).unwrap().adjacent_mines(), 1);
        assert_eq!(board.cell((0, 2)).unwrap().adjacent_mines(), 2);
        assert_eq!(board.cell((1, 2)).unwrap().adjacent_mines(), 2);
    }

    #[test]
    fn open_already_revealed_is_noop() {
        let mut board = board((3, 3), &[(2, 2)]);

        assert_eq!(board.open((1, 1)), Ok(OpenOutcome::Safe(1)));
        let before = board.unrevealed_count();
        assert_eq!(board.open((1, 1)), Ok(OpenOutcome::NoChange));
        assert_eq!(board.unrevealed_count(), before);
    }

    #[test]
    fn open_respects_flags() {
        let mut board = board((3, 3), &[(2, 2)]);
        board.toggle_flag((1, 1)).unwrap();

        assert_eq!(board.open((1, 1)), Ok(OpenOutcome::NoChange));
        assert!(!board.cell((1, 1)).unwrap().is_revealed());
        assert_eq!(board.unrevealed_count(), 9);
    }

    #[test]
    fn open_mine_explodes() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.open((0, 0)), Ok(OpenOutcome::Explode));
        assert_eq!(board.unrevealed_count(), 3);
    }

    #[test]
    fn flood_fill_opens_zero_region_and_border() {
        // 4x4 with a single mine in a corner, the rest is one zero region bordered by ones
        let mut board = board((4, 4), &[(3, 3)]);

        assert_eq!(board.open((0, 0)), Ok(OpenOutcome::Safe(15)));
        assert_eq!(board.unrevealed_count(), 1);
        assert!(board.all_safe_revealed());
        assert!(!board.cell((3, 3)).unwrap().is_revealed());
    }

    #[test]
    fn flood_fill_stops_at_numbers_and_flags() {
        // a wall of mines down the middle column splits the board in two
        let mines = [(0, 2), (1, 2), (2, 2)];
        let mut board = board((3, 5), &mines);
        board.toggle_flag((1, 0)).unwrap();

        assert_eq!(board.open((0, 0)), Ok(OpenOutcome::Safe(3)));
        assert!(!board.cell((1, 0)).unwrap().is_revealed());
        assert!(!board.cell((2, 0)).unwrap().is_revealed());

        assert_eq!(board.open((1, 4)), Ok(OpenOutcome::Safe(6)));
        let mut opened = revealed(&board);
        opened.sort();
        assert_eq!(
            opened,
            vec![
                (0, 0),
                (0, 1),
                (0, 3),
                (0, 4),
                (1, 1),
                (1, 3),
                (1, 4),
                (2, 3),
                (2, 4)
            ]
        );
        assert_eq!(board.unrevealed_count(), 15 - 9);
    }

    #[test]
    fn flag_counts_follow_toggles() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.toggle_flag((0, 0)), Ok(FlagOutcome::MarkChanged));
        assert_eq!(board.toggle_flag((1, 1)), Ok(FlagOutcome::MarkChanged));
        assert_eq!(board.flagged_count(), 2);
        assert_eq!(board.mines_left(), -1);
        assert_eq!(board.toggle_flag((1, 1)), Ok(FlagOutcome::MarkChanged));
        assert_eq!(board.mines_left(), 0);

        board.open((0, 1)).unwrap();
        assert_eq!(board.toggle_flag((0, 1)), Ok(FlagOutcome::NoChange));
    }

    #[test]
    fn win_by_flagging_every_mine() {
        let mut board = board((2, 2), &[(1, 0)]);
        assert!(!board.is_won());

        board.toggle_flag((1, 0)).unwrap();
        assert!(board.all_mines_flagged());
        assert!(board.is_won());
    }

    #[test]
    fn win_by_revealing_every_safe_cell() {
        let mut board = board((2, 2), &[(1, 0)]);

        for coords in [(0, 0), (0, 1), (1, 1)] {
            assert!(!board.is_won());
            board.open(coords).unwrap();
        }
        assert!(board.is_won());
        assert!(!board.all_mines_flagged());
    }

    #[test]
    fn force_reveal_opens_flagged_mine() {
        let mut board = board((2, 2), &[(0, 0), (1, 1)]);
        board.toggle_flag((1, 1)).unwrap();

        assert_eq!(board.force_reveal((1, 1)), Ok(RevealOutcome::Revealed));
        assert_eq!(board.force_reveal((1, 1)), Ok(RevealOutcome::AlreadyRevealed));
        assert_eq!(board.flagged_count(), 0);
        assert_eq!(board.unrevealed_count(), 3);
    }

    #[test]
    fn reset_returns_to_pre_placement() {
        let mut board = Board::new(BoardPreset::Small.config()).unwrap();
        board
            .place_mines((0, 0), &mut RandomMinefieldGenerator::new(5))
            .unwrap();
        board.open((0, 0)).unwrap();
        board.toggle_flag((7, 7)).ok();

        board.reset();

        assert_eq!(board, Board::new(BoardPreset::Small.config()).unwrap());
    }

    #[test]
    fn invalid_coords_are_rejected() {
        let mut board = board((2, 3), &[]);
        assert_eq!(board.open((2, 0)), Err(GameError::InvalidCoords));
        assert_eq!(board.toggle_flag((0, 3)), Err(GameError::InvalidCoords));
        assert!(board.cell((5, 5)).is_err());
    }

    proptest! {
        #[test]
        fn placement_keeps_counts_and_seed_zone(
            seed in any::<u64>(),
            preset in prop::sample::select(BoardPreset::ALL.to_vec()),
            seed_row in 0u8..12,
            seed_col in 0u8..12,
        ) {
            let config = preset.config();
            let seed_cell = (seed_row % config.rows(), seed_col % config.cols());
            let mut board = Board::new(config).unwrap();
            board.place_mines(seed_cell, &mut RandomMinefieldGenerator::new(seed)).unwrap();

            prop_assert_eq!(board.cells().filter(|cell| cell.is_mine()).count(), usize::from(config.mines()));
            prop_assert!(!board.cell(seed_cell).unwrap().is_mine());
            for neighbor in board.iter_neighbors(seed_cell) {
                prop_assert!(!board.cell(neighbor).unwrap().is_mine());
            }
            prop_assert_eq!(board.cell(seed_cell).unwrap().adjacent_mines(), 0);
        }

        #[test]
        fn adjacency_matches_brute_force(seed in any::<u64>(), seed_row in 0u8..10, seed_col in 0u8..10) {
            let mut board = Board::new(BoardPreset::Medium.config()).unwrap();
            board.place_mines((seed_row, seed_col), &mut RandomMinefieldGenerator::new(seed)).unwrap();
            let (rows, cols) = board.size();

            for cell in board.cells() {
                let expected = board
                    .cells()
                    .filter(|other| other.is_mine() && other.is_neighbor_of(cell) && other.coords() != cell.coords())
                    .count();
                prop_assert_eq!(usize::from(cell.adjacent_mines()), expected);

                let (row, col) = cell.coords();
                let on_row_edge = row == 0 || row == rows - 1;
                let on_col_edge = col == 0 || col == cols - 1;
                if on_row_edge && on_col_edge {
                    prop_assert!(cell.adjacent_mines() <= 3);
                } else if on_row_edge || on_col_edge {
                    prop_assert!(cell.adjacent_mines() <= 5);
                }
            }
        }

        #[test]
        fn first_open_never_explodes_and_counter_matches(seed in any::<u64>(), seed_row in 0u8..12, seed_col in 0u8..12) {
            let mut board = Board::new(BoardPreset::Large.config()).unwrap();
            board.place_mines((seed_row, seed_col), &mut RandomMinefieldGenerator::new(seed)).unwrap();

            let outcome = board.open((seed_row, seed_col)).unwrap();
            prop_assert!(matches!(outcome, OpenOutcome::Safe(n) if n >= 4));

            let revealed = board.cells().filter(|cell| cell.is_revealed()).count();
            prop_assert_eq!(usize::from(board.unrevealed_count()), 144 - revealed);
            if let OpenOutcome::Safe(n) = outcome {
                prop_assert_eq!(usize::from(n), revealed);
            }
        }
    }
}
