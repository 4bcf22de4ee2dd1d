use rand::prelude::*;

use super::*;

/// Uniform placement without repetition. Every call draws from the same seeded stream, so a sequence of
/// boards is reproducible from the seed while consecutive boards still differ.
#[derive(Clone, Debug)]
pub struct RandomLayoutGenerator {
    rng: SmallRng,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(&mut self, config: BoardConfig) -> MineLayout {
        let total_cells = config.total_cells();

        if config.mines >= total_cells {
            log::warn!(
                "Minefield already full, generated anyway, requested {} but only fits {}",
                config.mines,
                total_cells
            );
            return MineLayout::from_mine_mask(Array2::from_elem(config.size.to_nd_index(), true));
        }

        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut free_cells = total_cells;
        let mut mines_placed = 0;

        while mines_placed < config.mines {
            // index among the cells that are still free, skipping placed mines
            let mut place: CellCount = self.rng.random_range(0..free_cells);
            for (i, cell) in mines.iter_mut().enumerate() {
                let i = i as CellCount;
                if *cell {
                    place += 1;
                }
                if i == place {
                    *cell = true;
                    mines_placed += 1;
                    free_cells -= 1;
                    break;
                }
            }
        }

        let layout = MineLayout::from_mine_mask(mines);
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        layout
    }
}
