use crate::*;
pub use random::*;

mod random;

/// Source of mine layouts, asked for a fresh one on every board generation.
pub trait LayoutGenerator {
    fn generate(&mut self, config: BoardConfig) -> MineLayout;
}

/// Hands out the same layout every time, for reproducible boards.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedLayoutGenerator {
    layout: MineLayout,
}

impl FixedLayoutGenerator {
    pub fn new(layout: MineLayout) -> Self {
        Self { layout }
    }
}

impl LayoutGenerator for FixedLayoutGenerator {
    fn generate(&mut self, _config: BoardConfig) -> MineLayout {
        self.layout.clone()
    }
}
