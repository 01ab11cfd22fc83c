use crate::*;
use rand::prelude::*;
use std::collections::HashSet;
use std::ops::Range;
use tracing::debug;

/// Random grid worlds: one `+` terminal, one `-` terminal and a random share
/// of walls, no two on the same position.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioGenerator {
    wall_fraction: Range<Continous>,
}

impl Default for ScenarioGenerator {
    fn default() -> Self {
        Self {
            wall_fraction: 0.25..0.6,
        }
    }
}

impl ScenarioGenerator {
    pub fn with_wall_fraction(mut self, wall_fraction: Range<Continous>) -> Result<Self> {
        if !(0. <= wall_fraction.start
            && wall_fraction.start < wall_fraction.end
            && wall_fraction.end <= 1.)
        {
            return Err(GridError::InvalidScenario(format!(
                "wall fraction range {wall_fraction:?} must satisfy 0 <= start < end <= 1"
            )));
        }
        self.wall_fraction = wall_fraction;
        Ok(self)
    }

    pub fn wall_fraction(&self) -> &Range<Continous> {
        &self.wall_fraction
    }

    pub fn from_seed(&self, width: usize, height: usize, seed: u64) -> Result<GridWorld> {
        self.generate(width, height, &mut StdRng::seed_from_u64(seed))
    }

    pub fn generate<R: Rng>(
        &self,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Result<GridWorld> {
        let n_cells = width * height;
        if n_cells < 3 {
            return Err(GridError::InvalidScenario(format!(
                "a {width}x{height} grid cannot hold two terminals and an empty cell"
            )));
        }

        let fraction = rng.gen_range(self.wall_fraction.clone());
        let wall_count = (n_cells as Continous * fraction).round() as usize;
        if wall_count >= n_cells - 2 {
            return Err(GridError::InvalidScenario(format!(
                "{wall_count} walls leave no empty cell in a {width}x{height} grid"
            )));
        }
        debug!(width, height, fraction, wall_count, "generating scenario");

        let mut assigned = HashSet::new();
        let mut specials = Vec::with_capacity(wall_count + 2);
        specials.push((
            unique_random_position(&mut assigned, width, height, rng),
            CellKind::PositiveTerminal,
        ));
        specials.push((
            unique_random_position(&mut assigned, width, height, rng),
            CellKind::NegativeTerminal,
        ));
        for _ in 0..wall_count {
            specials.push((
                unique_random_position(&mut assigned, width, height, rng),
                CellKind::Wall,
            ));
        }

        GridWorld::from_layout(width, height, &specials)
    }
}

/// Rejection-samples a position not yet in `assigned` and records it.
/// Terminates because callers never ask for more positions than the grid has.
fn unique_random_position<R: Rng>(
    assigned: &mut HashSet<Position>,
    width: usize,
    height: usize,
    rng: &mut R,
) -> Position {
    loop {
        let p = Position::new(
            rng.gen_range(0..width) as Discrete,
            rng.gen_range(0..height) as Discrete,
        );
        if assigned.insert(p) {
            return p;
        }
    }
}
