use core::time::Duration;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use web_time::Instant;

use crate::*;

/// The two ways a player can activate a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// Click, reveals the cell
    Primary,
    /// Secondary click, toggles the flag
    Secondary,
}

/// What a cell activation did to the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No live board, game not running, or a loss is being revealed
    Ignored,
    /// Cell already revealed, or protected by a flag
    NoChange,
    /// Safe reveal, with the number of cells opened by it
    Revealed(CellCount),
    /// Flag was placed or removed
    FlagToggled,
    /// A mine was opened, the loss becomes final once every mine is shown
    Detonated,
    /// The move completed the board
    Won,
}

impl MoveOutcome {
    /// Whether this outcome could have caused an update to the board
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Ignored | Self::NoChange)
    }
}

/// Pending forced reveals of every mine after one was opened, each `gap` after the previous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MineRevealSequence {
    generation: u64,
    triggered_at: Instant,
    gap: Duration,
    mines: Vec<Coord2>,
    next: usize,
}

impl MineRevealSequence {
    fn new(generation: u64, triggered_at: Instant, gap: Duration, mines: Vec<Coord2>) -> Self {
        Self {
            generation,
            triggered_at,
            gap,
            mines,
            next: 0,
        }
    }

    pub fn due_at(&self, index: usize) -> Instant {
        self.triggered_at + self.gap * index as u32
    }

    pub fn remaining(&self) -> usize {
        self.mines.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.mines.len()
    }

    fn pop_due(&mut self, now: Instant) -> Option<Coord2> {
        let coords = *self.mines.get(self.next)?;
        if self.due_at(self.next) > now {
            return None;
        }
        self.next += 1;
        Some(coords)
    }
}

/// Turns cell activations and menu intents into board operations and state transitions.
pub struct GameController<C: Clock = SystemClock> {
    store: Rc<StateStore>,
    clock: C,
    generator: Box<dyn MinefieldGenerator>,
    board: Option<Board>,
    layout: Option<Vec<Coord2>>,
    generation: u64,
    loss_sequence: Option<MineRevealSequence>,
}

impl<C: Clock> GameController<C> {
    pub fn new(
        store: Rc<StateStore>,
        clock: C,
        generator: impl MinefieldGenerator + 'static,
    ) -> Self {
        Self {
            store,
            clock,
            generator: Box::new(generator),
            board: None,
            layout: None,
            generation: 0,
            loss_sequence: None,
        }
    }

    pub fn store(&self) -> &Rc<StateStore> {
        &self.store
    }

    pub fn state(&self) -> GameState {
        self.store.state()
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn mines_left(&self) -> isize {
        self.board.as_ref().map_or(0, Board::mines_left)
    }

    /// A mine went off and the remaining mines are still being shown.
    pub fn is_resolving(&self) -> bool {
        self.live_sequence().is_some()
    }

    pub fn loss_sequence(&self) -> Option<&MineRevealSequence> {
        self.live_sequence()
    }

    fn live_sequence(&self) -> Option<&MineRevealSequence> {
        self.loss_sequence
            .as_ref()
            .filter(|sequence| sequence.generation == self.generation)
    }

    /// Throw away whatever was in flight for the previous board.
    fn next_generation(&mut self) {
        self.generation += 1;
        if self.loss_sequence.is_some() {
            log::debug!("pending mine reveals cancelled");
        }
    }

    /// Start a fresh board, mines get placed on the first activation.
    pub fn start_game(&mut self, config: BoardConfig) -> Result<()> {
        let board = Board::new(config)?;
        log::debug!("new game {:?} with {} mines", config.size(), config.mines());
        self.board = Some(board);
        self.layout = None;
        self.next_generation();
        self.enter_running()
    }

    /// Start a board with mines already at `mines`, restarts bring the same layout back.
    pub fn start_game_with_layout(&mut self, size: Coord2, mines: &[Coord2]) -> Result<()> {
        let board = Board::from_mine_coords(size, mines)?;
        log::debug!("new game {:?} with fixed layout of {} mines", size, mines.len());
        self.board = Some(board);
        self.layout = Some(mines.to_vec());
        self.next_generation();
        self.enter_running()
    }

    /// Same board size, clock from zero. New mines unless the game was started from a layout.
    pub fn restart(&mut self) -> Result<()> {
        let Some(board) = self.board.as_mut() else {
            return Err(GameError::NoBoard);
        };
        match &self.layout {
            Some(mines) => *board = Board::from_mine_coords(board.size(), mines)?,
            None => board.reset(),
        }
        self.next_generation();
        self.enter_running()
    }

    /// Drop the board and go back to the main menu.
    pub fn go_home(&mut self) -> Result<()> {
        self.board = None;
        self.layout = None;
        self.next_generation();
        if !self.store.state().is_initial() {
            self.store.transition(GameState::NotStarted)?;
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.store.transition(GameState::Paused).map(|_| ())
    }

    pub fn resume(&mut self) -> Result<()> {
        let from = self.store.state();
        if from != GameState::Paused {
            return Err(GameError::InvalidTransition {
                from,
                to: GameState::Running,
            });
        }
        self.store.transition(GameState::Running).map(|_| ())
    }

    fn enter_running(&mut self) -> Result<()> {
        match self.store.state() {
            GameState::NotStarted | GameState::Lose => {}
            _ => {
                self.store.transition(GameState::NotStarted)?;
            }
        }
        self.store.transition(GameState::Running).map(|_| ())
    }

    pub fn handle_main_menu(&mut self, action: MainMenuAction) -> Result<()> {
        self.start_game(action.preset().config())
    }

    pub fn handle_in_game_menu(&mut self, action: InGameMenuAction) -> Result<()> {
        match action {
            InGameMenuAction::Restart => self.restart(),
            InGameMenuAction::Home => self.go_home(),
        }
    }

    pub fn primary_activate(&mut self, row: Coord, col: Coord) -> Result<MoveOutcome> {
        self.analyse_move((row, col), Interaction::Primary)
    }

    pub fn secondary_activate(&mut self, row: Coord, col: Coord) -> Result<MoveOutcome> {
        self.analyse_move((row, col), Interaction::Secondary)
    }

    pub fn analyse_move(&mut self, coords: Coord2, interaction: Interaction) -> Result<MoveOutcome> {
        if self.store.state() != GameState::Running || self.is_resolving() {
            log::trace!("ignoring {:?} at {:?}", interaction, coords);
            return Ok(MoveOutcome::Ignored);
        }
        let Some(board) = self.board.as_mut() else {
            return Ok(MoveOutcome::Ignored);
        };
        let coords = board.validate_coords(coords)?;

        if !board.mines_placed() {
            board.place_mines(coords, &mut self.generator)?;
            log::debug!("mines placed around seed {:?}", coords);
        }

        let outcome = match interaction {
            Interaction::Primary => match board.open(coords)? {
                OpenOutcome::NoChange => MoveOutcome::NoChange,
                OpenOutcome::Safe(opened) => MoveOutcome::Revealed(opened),
                OpenOutcome::Explode => MoveOutcome::Detonated,
            },
            Interaction::Secondary => match board.toggle_flag(coords)? {
                FlagOutcome::NoChange => MoveOutcome::NoChange,
                FlagOutcome::MarkChanged => MoveOutcome::FlagToggled,
            },
        };
        let won = board.is_won();

        if outcome == MoveOutcome::Detonated {
            self.begin_loss_sequence();
            return Ok(outcome);
        }
        if won {
            log::debug!("board cleared");
            self.store.transition(GameState::Won)?;
            return Ok(MoveOutcome::Won);
        }
        Ok(outcome)
    }

    fn begin_loss_sequence(&mut self) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        let mines = board.mine_cells().to_vec();
        log::debug!("revealing {} mines", mines.len());
        self.loss_sequence = Some(MineRevealSequence::new(
            self.generation,
            self.clock.now(),
            board.config().reveal_gap(),
            mines,
        ));
    }

    /// Apply the mine reveals that are due, the game is lost once the last one is shown.
    ///
    /// Hosts call this from their frame or timer loop.
    pub fn tick(&mut self) -> Result<()> {
        if !self.is_resolving() {
            self.loss_sequence = None;
            return Ok(());
        }
        let (Some(board), Some(sequence)) = (self.board.as_mut(), self.loss_sequence.as_mut())
        else {
            return Ok(());
        };

        let now = self.clock.now();
        while let Some(coords) = sequence.pop_due(now) {
            let outcome = board.force_reveal(coords)?;
            log::trace!("mine at {:?}: {:?}", coords, outcome);
        }

        if sequence.is_finished() {
            self.loss_sequence = None;
            self.store.transition(GameState::Lose)?;
        }
        Ok(())
    }
}

impl<C: Clock + 'static> GameController<C> {
    /// Share the controller and let it answer menu intents fired on the store.
    pub fn attach(self) -> Rc<RefCell<Self>> {
        let store = self.store.clone();
        let controller = Rc::new(RefCell::new(self));

        let weak = Rc::downgrade(&controller);
        store.on_main_menu(move |action| {
            with_controller(&weak, |controller| controller.handle_main_menu(action))
        });
        let weak = Rc::downgrade(&controller);
        store.on_in_game_menu(move |action| {
            with_controller(&weak, |controller| controller.handle_in_game_menu(action))
        });

        controller
    }
}

fn with_controller<C: Clock>(
    controller: &Weak<RefCell<GameController<C>>>,
    action: impl FnOnce(&mut GameController<C>) -> Result<()>,
) {
    let Some(controller) = controller.upgrade() else {
        return;
    };
    let Ok(mut controller) = controller.try_borrow_mut() else {
        log::warn!("controller busy, menu action dropped");
        return;
    };
    if let Err(err) = action(&mut controller) {
        log::warn!("menu action failed: {}", err);
    }
}
