use core::time::Duration;
use crossbeam_channel::{Sender, unbounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GameOptions {
    /// Clock cadence; `None` leaves ticking to the caller.
    pub tick_interval: Option<Duration>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            tick_interval: Some(DEFAULT_TICK_INTERVAL),
        }
    }
}

/// Running match: coordinator thread, optional clock, and the snapshot slot a presentation polls.
#[derive(Debug)]
pub struct Game {
    events: Sender<Event>,
    publisher: Arc<SnapshotPublisher>,
    config: BoardConfig,
    coordinator: Option<JoinHandle<()>>,
    clock: Option<Clock>,
}

impl Game {
    pub fn launch<G>(config: BoardConfig, generator: G, options: GameOptions) -> Result<Self>
    where
        G: LayoutGenerator + Send + 'static,
    {
        let (events, queue) = unbounded();
        let publisher = Arc::new(SnapshotPublisher::new());

        let coordinator =
            BoardCoordinator::new(config, generator, events.clone(), Arc::clone(&publisher))?;
        let config = coordinator.config();

        let clock = options
            .tick_interval
            .map(|interval| Clock::start(interval, events.clone()))
            .transpose()?;

        let coordinator = thread::Builder::new()
            .name("coordinator".into())
            .spawn(move || coordinator.run(queue))
            .map_err(|err| GameError::Spawn("coordinator", err))?;

        log::info!(
            "launched {}x{} board with {} mines",
            config.rows(),
            config.cols(),
            config.mines
        );

        Ok(Self {
            events,
            publisher,
            config,
            coordinator: Some(coordinator),
            clock,
        })
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn press_tile(&self, coords: Coord2, side: ClickSide) {
        self.send(Event::TilePress { coords, side });
    }

    pub fn press_face(&self) {
        self.send(Event::FacePress);
    }

    pub fn tick(&self) {
        self.send(Event::ClockTick);
    }

    pub fn poll(&self) -> (Option<Arc<GameSnapshot>>, u64) {
        self.publisher.poll()
    }

    pub fn publisher(&self) -> Arc<SnapshotPublisher> {
        Arc::clone(&self.publisher)
    }

    /// Sender for input sources living on other threads.
    pub fn events(&self) -> Sender<Event> {
        self.events.clone()
    }

    pub fn shutdown(mut self) {
        self.close();
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::warn!("coordinator is gone, dropped {:?}", event);
        }
    }

    fn close(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.stop();
        }
        if let Some(coordinator) = self.coordinator.take() {
            let _ = self.events.send(Event::Shutdown);
            if coordinator.join().is_err() {
                log::error!("coordinator thread panicked");
            }
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.close();
    }
}
