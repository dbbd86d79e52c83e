use super::*;

/// Always hands out the same layout, the seed cell is not taken into account.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedMinefieldGenerator {
    mines: Vec<Coord2>,
}

impl FixedMinefieldGenerator {
    pub fn new(mines: &[Coord2]) -> Self {
        Self {
            mines: mines.to_vec(),
        }
    }

    pub fn mines(&self) -> &[Coord2] {
        &self.mines
    }
}

impl MinefieldGenerator for FixedMinefieldGenerator {
    fn generate(&mut self, config: &BoardConfig, _seed_cell: Coord2) -> Result<Vec<Coord2>> {
        if self.mines.len() != usize::from(config.mines()) {
            log::warn!(
                "Fixed layout has {} mines but config asks for {}",
                self.mines.len(),
                config.mines()
            );
            return Err(GameError::InvalidLayout);
        }
        Ok(self.mines.clone())
    }
}
