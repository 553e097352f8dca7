#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random maze generation with a guaranteed path between the spawns.
//!
//! Every grid handed out by [`MapGenerator`] is bordered by walls and has at
//! least one 4-connected route from the chaser spawn to the player spawn.
//! Candidates that fail the check are discarded and rebuilt from fresh
//! randomness.

mod spawns;

use escape_block_core::{CellCode, GameSetup, Grid, GridError, GridTunables, GridVec};
use escape_block_system_pathfinding::PathFinder;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

pub use spawns::{SpawnPlanner, Spawns};

/// Which spawn a configuration issue refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnRole {
    /// The chaser's starting cell.
    Chaser,
    /// The player's starting cell.
    Player,
}

/// Inputs rejected before any generation attempt.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationIssue {
    /// Requested size lies outside the configured bounds.
    #[error("grid size {size} lies outside {min}..={max}")]
    SizeOutOfBounds {
        /// Requested size.
        size: u32,
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// A spawn does not address a cell of the grid.
    #[error("{role:?} spawn {at:?} lies outside the {size}x{size} grid")]
    SpawnOutsideGrid {
        /// Spawn that failed validation.
        role: SpawnRole,
        /// Offending coordinate.
        at: GridVec,
        /// Requested size.
        size: u32,
    },
    /// A spawn sits on the walled border and could never be connected.
    #[error("{role:?} spawn {at:?} lies on the border")]
    SpawnOnBorder {
        /// Spawn that failed validation.
        role: SpawnRole,
        /// Offending coordinate.
        at: GridVec,
    },
    /// Wall probability would make connected maps impossible or undefined.
    #[error("wall probability {probability} must lie in [0, 1)")]
    WallProbability {
        /// Configured probability.
        probability: f64,
    },
    /// The spawn margin leaves no cell for the player.
    #[error("spawn margin {margin} leaves no room on a {size}x{size} grid")]
    SpawnMargin {
        /// Configured margin.
        margin: u32,
        /// Requested size.
        size: u32,
    },
}

/// Errors reported by map generation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The request can never produce a valid map.
    #[error("invalid map configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationIssue),
    /// A candidate cell could not be written.
    #[error("failed to build candidate map: {0}")]
    Grid(#[from] GridError),
    /// An attempt limit was configured and every attempt was disconnected.
    #[error("no connected map found within {attempts} attempts")]
    AttemptsExhausted {
        /// Number of candidates that were built and rejected.
        attempts: u32,
    },
}

/// Builds bordered random grids whose spawns are guaranteed to be connected.
#[derive(Clone, Debug)]
pub struct MapGenerator {
    tunables: GridTunables,
    path_finder: PathFinder,
    attempt_limit: Option<u32>,
}

impl MapGenerator {
    /// Creates a generator that retries until a connected map is found.
    #[must_use]
    pub fn new(tunables: GridTunables) -> Self {
        Self {
            tunables,
            path_finder: PathFinder::default(),
            attempt_limit: None,
        }
    }

    /// Caps the number of candidates built per call.
    #[must_use]
    pub fn with_attempt_limit(mut self, limit: u32) -> Self {
        self.attempt_limit = Some(limit.max(1));
        self
    }

    /// Generates a grid of side `size` with the chaser stamped at `chaser_spawn`
    /// and a clear 3×3 pocket around `player_spawn`.
    pub fn generate<R>(
        &self,
        size: u32,
        chaser_spawn: GridVec,
        player_spawn: GridVec,
        rng: &mut R,
    ) -> Result<Grid, GenerationError>
    where
        R: Rng + ?Sized,
    {
        self.validate(size, chaser_spawn, player_spawn)?;

        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            let grid = self.build_candidate(size, chaser_spawn, player_spawn, rng)?;

            if self
                .path_finder
                .find_path(&grid, chaser_spawn, player_spawn)
                .is_some()
            {
                debug!(size, attempts, "map_accepted");
                return Ok(grid);
            }

            debug!(size, attempt = attempts, "map_rejected_disconnected");
            if self.attempt_limit.is_some_and(|limit| attempts >= limit) {
                return Err(GenerationError::AttemptsExhausted { attempts });
            }
        }
    }

    /// Plans random spawns and generates a connected map around them.
    pub fn new_game<R>(&self, size: u32, rng: &mut R) -> Result<GameSetup, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let spawns = SpawnPlanner::new(self.tunables.clone()).plan(size, rng)?;
        let grid = self.generate(size, spawns.chaser(), spawns.player_cell(), rng)?;
        info!(
            size,
            chaser = ?spawns.chaser(),
            player = ?spawns.player_cell(),
            "new_game_generated"
        );
        Ok(GameSetup::new(grid, spawns.player(), spawns.chaser()))
    }

    fn validate(
        &self,
        size: u32,
        chaser_spawn: GridVec,
        player_spawn: GridVec,
    ) -> Result<(), ConfigurationIssue> {
        validate_size(&self.tunables, size)?;

        let probability = self.tunables.wall_probability;
        if !(0.0..1.0).contains(&probability) {
            return Err(ConfigurationIssue::WallProbability { probability });
        }

        for (role, at) in [
            (SpawnRole::Chaser, chaser_spawn),
            (SpawnRole::Player, player_spawn),
        ] {
            let last = i64::from(size) - 1;
            let (x, y) = (i64::from(at.x()), i64::from(at.y()));
            if !(0..=last).contains(&x) || !(0..=last).contains(&y) {
                return Err(ConfigurationIssue::SpawnOutsideGrid { role, at, size });
            }
            if x == 0 || y == 0 || x == last || y == last {
                return Err(ConfigurationIssue::SpawnOnBorder { role, at });
            }
        }

        Ok(())
    }

    fn build_candidate<R>(
        &self,
        size: u32,
        chaser_spawn: GridVec,
        player_spawn: GridVec,
        rng: &mut R,
    ) -> Result<Grid, GridError>
    where
        R: Rng + ?Sized,
    {
        let mut grid = Grid::bordered(size);
        let interior: Vec<GridVec> = grid.interior_cells().collect();

        for cell in interior {
            let reserved = cell == chaser_spawn || in_pocket(cell, player_spawn);
            if !reserved && rng.gen_bool(self.tunables.wall_probability) {
                grid.set(cell, CellCode::Wall)?;
            }
        }

        grid.set(chaser_spawn, CellCode::Chaser)?;
        Ok(grid)
    }
}

pub(crate) fn validate_size(tunables: &GridTunables, size: u32) -> Result<(), ConfigurationIssue> {
    if !(tunables.min_size..=tunables.max_size).contains(&size) {
        return Err(ConfigurationIssue::SizeOutOfBounds {
            size,
            min: tunables.min_size,
            max: tunables.max_size,
        });
    }
    Ok(())
}

/// Reports whether `cell` belongs to the 3×3 block centred on `center`.
pub(crate) fn in_pocket(cell: GridVec, center: GridVec) -> bool {
    cell.x().abs_diff(center.x()) <= 1 && cell.y().abs_diff(center.y()) <= 1
}
