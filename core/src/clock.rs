use core::time::Duration;
use crossbeam_channel::{Sender, select, tick};
use std::thread::{self, JoinHandle};

use crate::*;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Periodic `ClockTick` source. The interval only sets how often elapsed time is refreshed.
#[derive(Debug)]
pub struct Clock {
    halt: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Clock {
    pub fn start(interval: Duration, events: Sender<Event>) -> Result<Self> {
        let (halt, halted) = crossbeam_channel::bounded::<()>(0);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("clock".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if events.send(Event::ClockTick).is_err() {
                                break;
                            }
                        }
                        recv(halted) -> _ => break,
                    }
                }
                log::trace!("clock stopped");
            })
            .map_err(|err| GameError::Spawn("clock", err))?;

        Ok(Self {
            halt: Some(halt),
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.halt_and_join();
    }

    fn halt_and_join(&mut self) {
        // dropping the sender disconnects `halted`, which wakes the select
        self.halt.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.halt_and_join();
    }
}
