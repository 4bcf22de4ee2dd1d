use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::*;

/// Player-visible state of one cell as last reported by its actor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row: Coord,
    pub col: Coord,
    pub is_mine: bool,
    pub revealed: bool,
    pub flagged: bool,
    pub adjacent_mines: u8,
}

impl CellRecord {
    pub const fn new(coords: Coord2, is_mine: bool, adjacent_mines: u8) -> Self {
        Self {
            row: coords.0,
            col: coords.1,
            is_mine,
            revealed: false,
            flagged: false,
            adjacent_mines,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.row, self.col)
    }

    pub const fn is_detonated(&self) -> bool {
        self.is_mine && self.revealed
    }
}

/// Messages a cell actor receives, from the coordinator or from a neighbor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    LeftClick,
    RightClick,
    NeighborReveal,
    NeighborFlagSet,
    NeighborFlagUnset,
    Stop,
}

/// State report tagged with the board generation of the actor that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellReport {
    pub generation: u64,
    pub record: CellRecord,
}

/// What the event loop must do after an actor handled one signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reaction {
    Stop,
    Report { broadcast: Option<Signal> },
}

/// Channel ends wiring one actor into the board.
#[derive(Debug)]
pub struct CellLinks {
    pub inbox: Receiver<Signal>,
    pub neighbors: Vec<Sender<Signal>>,
    pub reports: Sender<Event>,
}

impl CellLinks {
    fn broadcast(&self, signal: Signal) {
        for neighbor in &self.neighbors {
            // a neighbor that already stopped has dropped its inbox
            let _ = neighbor.send(signal);
        }
    }
}

/// One board cell. Owns its reveal and flag state; everything it learns about neighbors arrives as signals.
#[derive(Clone, Debug, PartialEq)]
pub struct CellActor {
    record: CellRecord,
    neighbor_flags: u8,
    generation: u64,
}

impl CellActor {
    pub const fn new(record: CellRecord, generation: u64) -> Self {
        Self {
            record,
            neighbor_flags: 0,
            generation,
        }
    }

    pub const fn record(&self) -> CellRecord {
        self.record
    }

    pub const fn neighbor_flags(&self) -> u8 {
        self.neighbor_flags
    }

    /// Applies one signal to the local state.
    pub fn handle(&mut self, signal: Signal) -> Reaction {
        use Signal::*;

        let broadcast = match signal {
            LeftClick if self.can_chord() => Some(NeighborReveal),
            LeftClick => self.reveal(),
            RightClick if self.can_chord() => Some(NeighborReveal),
            RightClick if !self.record.revealed => Some(self.toggle_flag()),
            RightClick => None,
            NeighborReveal => self.reveal(),
            NeighborFlagSet => {
                self.neighbor_flags = self.neighbor_flags.saturating_add(1);
                None
            }
            NeighborFlagUnset => {
                self.neighbor_flags = self.neighbor_flags.saturating_sub(1);
                None
            }
            Stop => return Reaction::Stop,
        };

        Reaction::Report { broadcast }
    }

    /// Event loop: consumes the inbox until `Stop` or until the board is torn down.
    pub fn run(mut self, links: CellLinks) {
        let coords = self.record.coords();
        log::trace!("cell {:?} gen {} started", coords, self.generation);

        for signal in links.inbox.iter() {
            let Reaction::Report { broadcast } = self.handle(signal) else {
                break;
            };

            if let Some(signal) = broadcast {
                links.broadcast(signal);
            }

            let report = CellReport {
                generation: self.generation,
                record: self.record,
            };
            if links.reports.send(Event::Report(report)).is_err() {
                log::debug!("cell {:?} lost its coordinator", coords);
                break;
            }
        }

        log::trace!("cell {:?} gen {} stopped", coords, self.generation);
    }

    fn can_chord(&self) -> bool {
        self.record.revealed && self.neighbor_flags == self.record.adjacent_mines
    }

    /// Reveals unless flagged or already open; an empty non-mine cell asks its neighbors to follow.
    fn reveal(&mut self) -> Option<Signal> {
        if self.record.flagged || self.record.revealed {
            return None;
        }

        self.record.revealed = true;
        if !self.record.is_mine && self.record.adjacent_mines == 0 {
            Some(Signal::NeighborReveal)
        } else {
            None
        }
    }

    fn toggle_flag(&mut self) -> Signal {
        self.record.flagged = !self.record.flagged;
        if self.record.flagged {
            Signal::NeighborFlagSet
        } else {
            Signal::NeighborFlagUnset
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use ndarray::Array2;

    fn actor(is_mine: bool, adjacent_mines: u8) -> CellActor {
        CellActor::new(CellRecord::new((1, 1), is_mine, adjacent_mines), 0)
    }

    fn report(broadcast: Option<Signal>) -> Reaction {
        Reaction::Report { broadcast }
    }

    /// Drives a whole board of actors on one thread with an explicit work queue. Each click settles
    /// completely before the next one is delivered.
    fn settle(layout: &MineLayout, clicks: &[(Coord2, Signal)]) -> Array2<CellActor> {
        let size = layout.size();
        let mut actors = Array2::from_shape_fn(size.to_nd_index(), |(row, col)| {
            let coords = (row as Coord, col as Coord);
            CellActor::new(
                CellRecord::new(
                    coords,
                    layout.contains_mine(coords),
                    layout.adjacent_mine_count(coords),
                ),
                0,
            )
        });

        let mut queue: VecDeque<(Coord2, Signal)> = VecDeque::new();
        for &click in clicks {
            queue.push_back(click);
            while let Some((coords, signal)) = queue.pop_front() {
                if let Reaction::Report {
                    broadcast: Some(next),
                } = actors[coords.to_nd_index()].handle(signal)
                {
                    queue.extend(layout.iter_neighbors(coords).map(|pos| (pos, next)));
                }
            }
        }
        actors
    }

    fn revealed(actors: &Array2<CellActor>) -> Vec<Coord2> {
        actors
            .iter()
            .filter(|actor| actor.record().revealed)
            .map(|actor| actor.record().coords())
            .collect()
    }

    #[test]
    fn left_click_reveals_numbered_cell_without_broadcast() {
        let mut cell = actor(false, 2);

        assert_eq!(cell.handle(Signal::LeftClick), report(None));
        assert!(cell.record().revealed);
    }

    #[test]
    fn empty_cell_broadcasts_reveal_once() {
        let mut cell = actor(false, 0);

        assert_eq!(
            cell.handle(Signal::NeighborReveal),
            report(Some(Signal::NeighborReveal))
        );
        assert_eq!(cell.handle(Signal::NeighborReveal), report(None));
        assert!(cell.record().revealed);
    }

    #[test]
    fn mine_never_cascades() {
        let mut cell = actor(true, 0);

        assert_eq!(cell.handle(Signal::LeftClick), report(None));
        assert!(cell.record().is_detonated());
    }

    #[test]
    fn flagged_cell_ignores_reveals() {
        let mut cell = actor(false, 0);

        assert_eq!(
            cell.handle(Signal::RightClick),
            report(Some(Signal::NeighborFlagSet))
        );
        for signal in [Signal::LeftClick, Signal::NeighborReveal, Signal::LeftClick] {
            assert_eq!(cell.handle(signal), report(None));
            assert!(!cell.record().revealed);
            assert!(cell.record().flagged);
        }

        assert_eq!(
            cell.handle(Signal::RightClick),
            report(Some(Signal::NeighborFlagUnset))
        );
        assert_eq!(
            cell.handle(Signal::LeftClick),
            report(Some(Signal::NeighborReveal))
        );
        assert!(cell.record().revealed);
    }

    #[test]
    fn right_click_on_revealed_cell_does_not_flag() {
        let mut cell = actor(false, 1);

        cell.handle(Signal::LeftClick);
        assert_eq!(cell.handle(Signal::RightClick), report(None));
        assert!(!cell.record().flagged);
    }

    #[test]
    fn chord_requires_matching_flag_count() {
        let mut cell = actor(false, 2);
        cell.handle(Signal::LeftClick);

        cell.handle(Signal::NeighborFlagSet);
        assert_eq!(cell.handle(Signal::LeftClick), report(None));

        cell.handle(Signal::NeighborFlagSet);
        assert_eq!(cell.neighbor_flags(), 2);
        assert_eq!(
            cell.handle(Signal::LeftClick),
            report(Some(Signal::NeighborReveal))
        );
        assert_eq!(
            cell.handle(Signal::RightClick),
            report(Some(Signal::NeighborReveal))
        );

        cell.handle(Signal::NeighborFlagUnset);
        assert_eq!(cell.handle(Signal::RightClick), report(None));
    }

    #[test]
    fn flag_bookkeeping_is_reported() {
        let mut cell = actor(false, 1);

        assert_eq!(cell.handle(Signal::NeighborFlagSet), report(None));
        assert_eq!(cell.handle(Signal::NeighborFlagUnset), report(None));
        assert_eq!(cell.handle(Signal::NeighborFlagUnset), report(None));
        assert_eq!(cell.neighbor_flags(), 0);
    }

    #[test]
    fn stop_ends_without_report() {
        let mut cell = actor(false, 0);
        assert_eq!(cell.handle(Signal::Stop), Reaction::Stop);
        assert!(!cell.record().revealed);
    }

    #[test]
    fn cascade_opens_zero_region_and_its_border_only() {
        // column 2 is a wall of mines; everything left of it is one zero region plus border
        let mines = [(0, 2), (1, 2), (2, 2), (3, 2)];
        let layout = MineLayout::from_mine_coords((4, 5), &mines).unwrap();

        let actors = settle(&layout, &[((0, 0), Signal::LeftClick)]);

        let mut expected = Vec::new();
        for row in 0..4 {
            expected.push((row, 0));
            expected.push((row, 1));
        }
        expected.sort();
        assert_eq!(revealed(&actors), expected);
    }

    #[test]
    fn cascade_stops_at_flags() {
        let layout = MineLayout::from_mine_coords((3, 3), &[]).unwrap();

        let actors = settle(
            &layout,
            &[((2, 2), Signal::RightClick), ((0, 0), Signal::LeftClick)],
        );

        let cell = actors[[2, 2]].record();
        assert!(cell.flagged);
        assert!(!cell.revealed);
        assert_eq!(revealed(&actors).len(), 8);
        assert_eq!(actors[[1, 1]].neighbor_flags(), 1);
    }

    #[test]
    fn chord_reveals_unflagged_neighbors() {
        let layout = MineLayout::from_mine_coords((3, 3), &[(0, 1), (2, 1)]).unwrap();

        let actors = settle(
            &layout,
            &[
                ((1, 1), Signal::LeftClick),
                ((0, 1), Signal::RightClick),
                ((2, 1), Signal::RightClick),
                ((1, 1), Signal::LeftClick),
            ],
        );

        assert_eq!(actors[[1, 1]].neighbor_flags(), 2);
        assert_eq!(revealed(&actors).len(), 7);
        assert!(actors.iter().all(|a| !a.record().is_detonated()));
    }
}
