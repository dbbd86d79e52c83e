use crate::*;
pub use fixed::*;
pub use random::*;

mod fixed;
mod random;

/// Decides where mines go once the player picked the first cell.
///
/// Returned coordinates are in placement order, which is also the order mines are revealed in
/// after a loss.
pub trait MinefieldGenerator {
    fn generate(&mut self, config: &BoardConfig, seed_cell: Coord2) -> Result<Vec<Coord2>>;
}

impl<G: MinefieldGenerator + ?Sized> MinefieldGenerator for Box<G> {
    fn generate(&mut self, config: &BoardConfig, seed_cell: Coord2) -> Result<Vec<Coord2>> {
        (**self).generate(config, seed_cell)
    }
}
