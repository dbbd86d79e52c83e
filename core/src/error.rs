use thiserror::Error;

use crate::GameState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must have at least one row and one column")]
    EmptyBoard,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Adjacent mine count {0} is out of range")]
    InvalidAdjacentCount(u8),
    #[error("Unrevealed cell count cannot go below zero")]
    CounterUnderflow,
    #[error("Mines were already placed on this board")]
    MinesAlreadyPlaced,
    #[error("Mine layout does not match the board")]
    InvalidLayout,
    #[error("No game in progress")]
    NoBoard,
    #[error("Unknown menu action {0:?}")]
    UnknownAction(String),
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: GameState, to: GameState },
}

pub type Result<T> = core::result::Result<T, GameError>;
