use cellsweeper_core::{BoardConfig, ClickSide, Coord2};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  l ROW COL   reveal a cell (chords on an opened cell)
  r ROW COL   toggle a flag (chords on an opened cell)
  n           new game
  h           this help
  q           quit";

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Press { coords: Coord2, side: ClickSide },
    Restart,
    Help,
    Quit,
    Nothing,
}

#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("unknown command `{0}`, try `h`")]
    Unknown(String),
    #[error("expected `{0} ROW COL`")]
    MissingCoords(char),
    #[error("`{0}` is not a valid coordinate")]
    BadCoord(String),
    #[error("({0}, {1}) is outside the {2}x{3} board")]
    OutOfBounds(u8, u8, u8, u8),
}

/// Turns one line of user input into a command, checking coordinates against the board geometry.
pub fn parse(line: &str, config: BoardConfig) -> Result<Command, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Nothing);
    };

    let side = match verb {
        "l" | "left" => ClickSide::Left,
        "r" | "right" => ClickSide::Right,
        "n" | "new" => return Ok(Command::Restart),
        "h" | "help" | "?" => return Ok(Command::Help),
        "q" | "quit" | "exit" => return Ok(Command::Quit),
        other => return Err(InputError::Unknown(other.to_string())),
    };
    let letter = match side {
        ClickSide::Left => 'l',
        ClickSide::Right => 'r',
    };

    let (Some(row), Some(col)) = (words.next(), words.next()) else {
        return Err(InputError::MissingCoords(letter));
    };
    let row = row
        .parse()
        .map_err(|_| InputError::BadCoord(row.to_string()))?;
    let col = col
        .parse()
        .map_err(|_| InputError::BadCoord(col.to_string()))?;

    if !config.contains((row, col)) {
        return Err(InputError::OutOfBounds(row, col, config.rows(), config.cols()));
    }

    Ok(Command::Press {
        coords: (row, col),
        side,
    })
}
