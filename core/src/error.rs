use thiserror::Error;

use crate::{BoardConfig, CellCount};

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board needs at least one row and one column")]
    InvalidDimensions,
    #[error("Too many mines, {mines} requested but the board only has {cells} cells")]
    TooManyMines { mines: CellCount, cells: CellCount },
    #[error("Generated layout {found:?} does not match the requested {expected:?}")]
    LayoutMismatch {
        expected: BoardConfig,
        found: BoardConfig,
    },
    #[error("Could not spawn {0} thread")]
    Spawn(&'static str, #[source] std::io::Error),
}

pub type Result<T> = core::result::Result<T, GameError>;
