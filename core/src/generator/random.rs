use rand::prelude::*;

use super::*;

/// Uniform rejection sampling that keeps the seed cell and its neighbourhood free of mines, so
/// the first move always opens a zero.
#[derive(Clone, Debug)]
pub struct RandomMinefieldGenerator {
    rng: SmallRng,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the wall clock, for hosts that do not care about reproducible boards.
    pub fn from_time() -> Self {
        use web_time::{SystemTime, UNIX_EPOCH};

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        log::debug!("mine generator seed: {}", seed);
        Self::new(seed)
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(&mut self, config: &BoardConfig, seed_cell: Coord2) -> Result<Vec<Coord2>> {
        let (rows, cols) = config.size();
        if seed_cell.0 >= rows || seed_cell.1 >= cols {
            return Err(GameError::InvalidCoords);
        }

        // the loop below only terminates if enough free cells remain
        let excluded = NeighborIter::new(seed_cell, config.size()).count() as CellCount + 1;
        let free_cells = config.total_cells().saturating_sub(excluded);
        if config.mines() > free_cells {
            log::warn!(
                "Cannot place {} mines around {:?}, only {} cells are free",
                config.mines(),
                seed_cell,
                free_cells
            );
            return Err(GameError::TooManyMines);
        }

        let mut taken = vec![false; usize::from(config.total_cells())];
        let mut mines = Vec::with_capacity(config.mines().into());
        let mut attempts: u64 = 0;

        while mines.len() < usize::from(config.mines()) {
            attempts += 1;
            let candidate: Coord2 = (
                self.rng.random_range(0..rows),
                self.rng.random_range(0..cols),
            );
            let slot = usize::from(candidate.0) * usize::from(cols) + usize::from(candidate.1);

            if taken[slot] || is_within_one(candidate, seed_cell) {
                continue;
            }

            taken[slot] = true;
            mines.push(candidate);
        }

        log::debug!(
            "placed {} mines around seed {:?} in {} draws",
            mines.len(),
            seed_cell,
            attempts
        );
        Ok(mines)
    }
}
