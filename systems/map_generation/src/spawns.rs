//! Random placement of the player and chaser spawns.

use escape_block_core::{GridTunables, GridVec, Vec2D};
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::{in_pocket, validate_size, ConfigurationIssue, GenerationError};

/// Spawn points chosen for a new game.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spawns {
    player: Vec2D,
    chaser: GridVec,
}

impl Spawns {
    /// Continuous player position at the centre of its cell.
    #[must_use]
    pub const fn player(&self) -> Vec2D {
        self.player
    }

    /// Cell containing the player spawn.
    #[must_use]
    pub fn player_cell(&self) -> GridVec {
        GridVec::from(self.player)
    }

    /// Cell the chaser starts in.
    #[must_use]
    pub const fn chaser(&self) -> GridVec {
        self.chaser
    }
}

/// Chooses spawn points that keep the chaser at a controlled distance.
#[derive(Clone, Debug)]
pub struct SpawnPlanner {
    tunables: GridTunables,
}

impl SpawnPlanner {
    /// Creates a planner driven by the provided tunables.
    #[must_use]
    pub fn new(tunables: GridTunables) -> Self {
        Self { tunables }
    }

    /// Picks a player spawn away from the border and a chaser spawn inside the
    /// configured distance range, or the farthest cell when none qualifies.
    pub fn plan<R>(&self, size: u32, rng: &mut R) -> Result<Spawns, GenerationError>
    where
        R: Rng + ?Sized,
    {
        validate_size(&self.tunables, size)?;

        let margin = self.tunables.spawn_margin.max(1);
        let last = size.saturating_sub(1);
        if margin.saturating_mul(2) > last {
            return Err(ConfigurationIssue::SpawnMargin { margin, size }.into());
        }

        let low = to_coordinate(margin);
        let high = to_coordinate(last - margin);
        let player_cell = GridVec::new(rng.gen_range(low..=high), rng.gen_range(low..=high));

        let candidates: Vec<GridVec> = interior(size)
            .filter(|cell| !in_pocket(*cell, player_cell))
            .collect();
        let in_range: Vec<GridVec> = candidates
            .iter()
            .copied()
            .filter(|cell| {
                let distance = cell.distance(player_cell);
                distance >= self.tunables.min_chaser_distance
                    && distance <= self.tunables.max_chaser_distance
            })
            .collect();

        let chaser = match in_range.choose(rng) {
            Some(cell) => *cell,
            None => {
                let farthest = candidates
                    .iter()
                    .copied()
                    .max_by(|a, b| a.distance(player_cell).total_cmp(&b.distance(player_cell)))
                    .ok_or(ConfigurationIssue::SpawnMargin { margin, size })?;
                debug!(
                    size,
                    chaser = ?farthest,
                    "chaser_spawn_range_empty_using_farthest_cell"
                );
                farthest
            }
        };

        Ok(Spawns {
            player: player_cell.center(),
            chaser,
        })
    }
}

fn interior(size: u32) -> impl Iterator<Item = GridVec> {
    let last = to_coordinate(size.saturating_sub(1));
    (1..last).flat_map(move |y| (1..last).map(move |x| GridVec::new(x, y)))
}

fn to_coordinate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
