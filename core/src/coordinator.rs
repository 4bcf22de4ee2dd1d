use core::time::Duration;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use web_time::Instant;

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    #[default]
    Init,
    Playing,
    Won,
    Lost,
}

impl MatchState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickSide {
    Left,
    Right,
}

/// Everything the coordinator reacts to, merged into one ordered queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    TilePress { coords: Coord2, side: ClickSide },
    FacePress,
    ClockTick,
    Report(CellReport),
    Shutdown,
}

/// The live actors of one board generation.
#[derive(Debug)]
struct Population {
    generation: u64,
    size: Coord2,
    inboxes: Vec<Sender<Signal>>,
    handles: Vec<JoinHandle<()>>,
    stopped: bool,
}

impl Population {
    /// Spawns one actor per cell, wired to its 8-adjacent neighbors.
    fn spawn(board: &Board, generation: u64, reports: &Sender<Event>) -> Result<Self> {
        let size = board.size();
        let (inboxes, receivers): (Vec<_>, Vec<_>) = (0..board.grid().len())
            .map(|_| unbounded::<Signal>())
            .unzip();

        let mut population = Self {
            generation,
            size,
            inboxes,
            handles: Vec::with_capacity(receivers.len()),
            stopped: false,
        };

        for (record, inbox) in board.grid().iter().zip(receivers) {
            let coords = record.coords();
            let links = CellLinks {
                inbox,
                neighbors: NeighborIter::new(coords, size)
                    .map(|pos| population.inboxes[population.index(pos)].clone())
                    .collect(),
                reports: reports.clone(),
            };
            let actor = CellActor::new(*record, generation);

            let handle = thread::Builder::new()
                .name(format!("cell-{}-{}", coords.0, coords.1))
                .spawn(move || actor.run(links))
                .map_err(|err| GameError::Spawn("cell", err))?;
            population.handles.push(handle);
        }

        log::debug!(
            "spawned {} cell actors for generation {}",
            population.handles.len(),
            generation
        );
        Ok(population)
    }

    fn index(&self, (row, col): Coord2) -> usize {
        usize::from(row) * usize::from(self.size.1) + usize::from(col)
    }

    fn send(&self, coords: Coord2, signal: Signal) {
        if self.inboxes[self.index(coords)].send(signal).is_err() {
            log::warn!("cell {:?} is gone, dropped {:?}", coords, signal);
        }
    }

    /// Sends `Stop` to every actor, once per generation.
    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        for inbox in &self.inboxes {
            let _ = inbox.send(Signal::Stop);
        }
        log::debug!("stopped generation {}", self.generation);
    }

    /// Stops the actors and waits for every thread to exit.
    fn join(&mut self) {
        self.stop();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("cell actor of generation {} panicked", self.generation);
            }
        }
    }
}

impl Drop for Population {
    fn drop(&mut self) {
        self.stop();
        // retired actors exit after `Stop`; their threads are detached here
        self.handles.clear();
    }
}

/// Single authority over the match lifecycle, the grid and the win/loss predicates.
pub struct BoardCoordinator<G> {
    config: BoardConfig,
    generator: G,
    board: Board,
    population: Population,
    state: MatchState,
    started_at: Option<Instant>,
    elapsed: Duration,
    reports: Sender<Event>,
    publisher: Arc<SnapshotPublisher>,
}

impl<G: LayoutGenerator> BoardCoordinator<G> {
    /// Builds the first board generation. `reports` must feed the queue later passed to [`Self::run`].
    pub fn new(
        config: BoardConfig,
        mut generator: G,
        reports: Sender<Event>,
        publisher: Arc<SnapshotPublisher>,
    ) -> Result<Self> {
        let config = BoardConfig::new(config.size, config.mines)?;
        let layout = generate_checked(&mut generator, config)?;
        let board = Board::new(&layout);
        let population = Population::spawn(&board, 0, &reports)?;

        Ok(Self {
            config,
            generator,
            board,
            population,
            state: MatchState::Init,
            started_at: None,
            elapsed: Duration::ZERO,
            reports,
            publisher,
        })
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn generation(&self) -> u64 {
        self.population.generation
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Processes events one at a time until `Shutdown`.
    pub fn run(mut self, events: Receiver<Event>) {
        self.publish();

        for event in events.iter() {
            match event {
                Event::TilePress { coords, side } => self.handle_click(coords, side),
                Event::Report(report) => self.handle_report(report),
                Event::ClockTick => self.handle_tick(),
                Event::FacePress => {
                    if let Err(err) = self.handle_restart() {
                        log::error!("restart failed: {}", err);
                        break;
                    }
                }
                Event::Shutdown => break,
            }
        }

        self.population.join();
        log::debug!("coordinator stopped");
    }

    pub fn handle_click(&mut self, coords: Coord2, side: ClickSide) {
        if !self.config.contains(coords) {
            log::debug!("ignoring press outside the board at {:?}", coords);
            return;
        }

        if side == ClickSide::Left && self.state == MatchState::Init {
            log::debug!("match started by press at {:?}", coords);
            self.state = MatchState::Playing;
            self.started_at = Some(Instant::now());
        }

        if self.state == MatchState::Playing {
            let signal = match side {
                ClickSide::Left => Signal::LeftClick,
                ClickSide::Right => Signal::RightClick,
            };
            self.population.send(coords, signal);
        }
    }

    pub fn handle_report(&mut self, report: CellReport) {
        if report.generation != self.population.generation {
            log::trace!(
                "dropping report from generation {} for {:?}",
                report.generation,
                report.record.coords()
            );
            return;
        }

        if let Err(err) = self.board.apply(report.record) {
            log::warn!("bad report {:?}: {}", report.record, err);
            return;
        }

        if self.state == MatchState::Playing {
            if self.board.is_lost() {
                self.finish(MatchState::Lost);
            } else if self.board.is_cleared() {
                self.finish(MatchState::Won);
            }
        }

        self.publish();
    }

    pub fn handle_tick(&mut self) {
        if self.state != MatchState::Playing {
            return;
        }
        self.update_elapsed();
        self.publish();
    }

    /// Replaces the whole population with a fresh board.
    pub fn handle_restart(&mut self) -> Result<()> {
        let layout = generate_checked(&mut self.generator, self.config)?;
        self.population.stop();

        let generation = self.population.generation + 1;
        let board = Board::new(&layout);
        self.population = Population::spawn(&board, generation, &self.reports)?;
        self.board = board;

        self.state = MatchState::Init;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        log::debug!("restarted as generation {}", generation);

        self.publish();
        Ok(())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            grid: self.board.grid().clone(),
            state: self.state,
            elapsed: self.elapsed,
            mine_count: self.board.mine_count(),
        }
    }

    fn finish(&mut self, state: MatchState) {
        self.update_elapsed();
        self.state = state;
        self.population.stop();
        log::debug!("match ended {:?} after {:?}", state, self.elapsed);
    }

    fn update_elapsed(&mut self) {
        if let Some(started_at) = self.started_at {
            self.elapsed = started_at.elapsed();
        }
    }

    fn publish(&self) {
        self.publisher.publish(self.snapshot());
    }
}

/// Asks `generator` for a layout and refuses one that does not fit `config`.
fn generate_checked<G: LayoutGenerator>(
    generator: &mut G,
    config: BoardConfig,
) -> Result<MineLayout> {
    let layout = generator.generate(config);
    let found = layout.board_config();
    if found != config {
        return Err(GameError::LayoutMismatch {
            expected: config,
            found,
        });
    }
    Ok(layout)
}
