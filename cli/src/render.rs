use anyhow::Context;
use cellsweeper_core::{CellRecord, GameSnapshot, MatchState, SnapshotPublisher};
use clap::ValueEnum;
use crossbeam_channel::{Sender, bounded, select, tick};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_millis(30);

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct Frame<'a> {
    version: u64,
    snapshot: &'a GameSnapshot,
}

/// Polls the publisher on its own cadence and redraws only when a newer version shows up.
pub struct Presenter {
    halt: Sender<()>,
    handle: JoinHandle<()>,
}

impl Presenter {
    pub fn spawn(
        publisher: Arc<SnapshotPublisher>,
        format: Format,
        interval: Duration,
    ) -> anyhow::Result<Self> {
        let (halt, halted) = bounded::<()>(0);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("presenter".into())
            .spawn(move || {
                let mut last_version = 0;
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if let (Some(snapshot), version) = publisher.poll() {
                                if version > last_version {
                                    last_version = version;
                                    println!("{}", draw(&snapshot, version, format));
                                }
                            }
                        }
                        recv(halted) -> _ => break,
                    }
                }
                log::trace!("presenter stopped");
            })
            .context("could not spawn presenter thread")?;

        Ok(Self { halt, handle })
    }

    pub fn stop(self) {
        let Self { halt, handle } = self;
        // disconnecting the halt channel wakes the select right away
        drop(halt);
        if handle.join().is_err() {
            log::error!("presenter thread panicked");
        }
    }
}

fn draw(snapshot: &GameSnapshot, version: u64, format: Format) -> String {
    match format {
        Format::Text => draw_text(snapshot),
        Format::Json => serde_json::to_string(&Frame { version, snapshot })
            .unwrap_or_else(|err| format!("{{\"error\":\"{}\"}}", err)),
    }
}

fn format_for_counter(num: i64) -> String {
    match num {
        ..-99 => "-99".to_string(),
        -99..0 => format!("-{:02}", -num),
        0..1000 => format!("{:03}", num),
        1000.. => "999".to_string(),
    }
}

fn face(state: MatchState) -> &'static str {
    match state {
        MatchState::Init | MatchState::Playing => ":)",
        MatchState::Won => "B)",
        MatchState::Lost => ":(",
    }
}

fn cell_char(cell: &CellRecord) -> char {
    match (cell.revealed, cell.flagged, cell.is_mine) {
        (true, _, true) => '*',
        (true, _, false) if cell.adjacent_mines == 0 => '.',
        (true, _, false) => char::from(b'0' + cell.adjacent_mines.min(8)),
        (false, true, _) => 'F',
        (false, false, _) => '#',
    }
}

pub fn draw_text(snapshot: &GameSnapshot) -> String {
    let (_, cols) = snapshot.size();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}  {}  {}",
        format_for_counter(snapshot.mines_left() as i64),
        face(snapshot.state),
        format_for_counter(snapshot.elapsed.as_secs() as i64),
    );

    out.push_str("    ");
    for col in 0..cols {
        let _ = write!(out, "{:>3}", col);
    }
    for (row, cells) in snapshot.grid.rows().into_iter().enumerate() {
        let _ = write!(out, "\n{:>3} ", row);
        for cell in cells.iter() {
            let _ = write!(out, "{:>3}", cell_char(cell));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellsweeper_core::{Board, MineLayout};

    fn snapshot(state: MatchState) -> GameSnapshot {
        let layout = MineLayout::from_mine_coords((2, 3), &[(0, 0)]).unwrap();
        GameSnapshot {
            grid: Board::new(&layout).grid().clone(),
            state,
            elapsed: Duration::from_secs(7),
            mine_count: layout.mine_count(),
        }
    }

    #[test]
    fn presenter_stops_without_waiting_for_next_poll() {
        let publisher = Arc::new(SnapshotPublisher::new());
        let presenter =
            Presenter::spawn(publisher, Format::Text, Duration::from_secs(3600)).unwrap();

        let started = std::time::Instant::now();
        presenter.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn counter_is_clamped_to_three_digits() {
        assert_eq!(format_for_counter(-120), "-99");
        assert_eq!(format_for_counter(-3), "-03");
        assert_eq!(format_for_counter(42), "042");
        assert_eq!(format_for_counter(1234), "999");
    }

    #[test]
    fn draws_covered_flagged_and_open_cells() {
        let mut snapshot = snapshot(MatchState::Lost);
        snapshot.grid[[0, 0]].revealed = true;
        snapshot.grid[[0, 1]].revealed = true;
        snapshot.grid[[0, 2]].revealed = true;
        snapshot.grid[[1, 1]].flagged = true;

        let text = draw_text(&snapshot);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "000  :(  007");
        assert_eq!(lines[1], "      0  1  2");
        assert_eq!(lines[2], "  0   *  1  .");
        assert_eq!(lines[3], "  1   #  F  #");
    }

    #[test]
    fn json_frame_carries_version() {
        let json = draw(&snapshot(MatchState::Init), 4, Format::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], 4);
        assert_eq!(value["snapshot"]["state"], "Init");
    }
}
