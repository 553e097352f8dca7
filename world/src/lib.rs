#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Escape the Block.
//!
//! The world owns the live grid, the player pose, the chaser position and the
//! session clock. Adapters and systems never mutate it directly: they submit
//! [`Command`] values to [`apply`] and react to the [`Event`] values it emits.

use std::time::Duration;

use escape_block_core::{
    CellCode, CellLookup, Command, Event, GameSetup, GameState, Grid, GridVec, PlayerPose,
    PlayerTunables, Rejection, Transform, Vec2D,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons a [`GameSetup`] cannot seed a world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The chaser spawn does not carry the chaser marker.
    #[error("chaser spawn {at:?} does not hold the chaser marker")]
    ChaserMarkerMissing {
        /// Chaser spawn announced by the setup.
        at: GridVec,
    },
    /// More than one cell carries the chaser marker.
    #[error("stray chaser marker at {at:?}")]
    StrayChaserMarker {
        /// Marked cell that is not the chaser spawn.
        at: GridVec,
    },
    /// The player spawn lies outside the grid.
    #[error("player spawn ({x}, {y}) lies outside the grid")]
    PlayerOutOfBounds {
        /// Horizontal spawn coordinate.
        x: f64,
        /// Vertical spawn coordinate.
        y: f64,
    },
    /// The player spawn lies inside a wall.
    #[error("player spawn cell {cell:?} is a wall")]
    PlayerInWall {
        /// Cell containing the player spawn.
        cell: GridVec,
    },
}

/// Represents the authoritative Escape the Block world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    player: PlayerPose,
    chaser: GridVec,
    state: GameState,
    elapsed: Duration,
    viewport_half_width: f64,
}

impl World {
    /// Creates a world from a generated setup.
    pub fn new(setup: GameSetup, tunables: &PlayerTunables) -> Result<Self, WorldError> {
        validate_setup(&setup)?;
        let (grid, player_spawn, chaser) = setup.into_parts();
        let viewport_half_width = tunables.viewport_half_width;

        Ok(Self {
            grid,
            player: PlayerPose::spawn(player_spawn, viewport_half_width),
            chaser,
            state: GameState::Active,
            elapsed: Duration::ZERO,
            viewport_half_width,
        })
    }

    fn restart(&mut self, setup: GameSetup) {
        let (grid, player_spawn, chaser) = setup.into_parts();
        self.grid = grid;
        self.player = PlayerPose::spawn(player_spawn, self.viewport_half_width);
        self.chaser = chaser;
        self.state = GameState::Active;
        self.elapsed = Duration::ZERO;
    }

    fn end_game_if_caught(&mut self, out_events: &mut Vec<Event>) {
        if self.state != GameState::Active || self.chaser != self.player.cell() {
            return;
        }

        self.state = GameState::GameOver;
        info!(
            survived_ms = self.elapsed.as_millis(),
            chaser = ?self.chaser,
            "game_over"
        );
        out_events.push(Event::GameOver {
            survived: self.elapsed,
        });
    }

    fn move_player(&mut self, to: Vec2D, out_events: &mut Vec<Event>) {
        let rejection = if self.state != GameState::Active {
            Some(Rejection::Inactive)
        } else if !position_in_grid(&self.grid, to) {
            Some(Rejection::OutOfBounds)
        } else if self.grid.cell(GridVec::from(to)) == Some(CellCode::Wall) {
            Some(Rejection::Blocked)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(?to, ?reason, "player_move_rejected");
            out_events.push(Event::MoveRejected { to, reason });
            return;
        }

        let from = self.player.position;
        self.player.position = to;
        out_events.push(Event::PlayerMoved { from, to });
        self.end_game_if_caught(out_events);
    }

    fn rotate_player(&mut self, radians: f64, out_events: &mut Vec<Event>) {
        if self.state != GameState::Active || radians == 0.0 || !radians.is_finite() {
            return;
        }

        let rotation = Transform::rotation(radians);
        self.player.direction = rotation.apply(self.player.direction);
        self.player.viewport = rotation.apply(self.player.viewport);
        out_events.push(Event::PlayerRotated {
            direction: self.player.direction,
        });
    }

    fn step_chaser(&mut self, to: GridVec, out_events: &mut Vec<Event>) {
        let from = self.chaser;
        let rejection = if self.state != GameState::Active {
            Some(Rejection::Inactive)
        } else if to == from {
            None
        } else if !self.grid.contains(to) {
            Some(Rejection::OutOfBounds)
        } else if !from.is_adjacent(to) {
            Some(Rejection::NotAdjacent)
        } else if self.grid.cell(to) == Some(CellCode::Wall) {
            Some(Rejection::Blocked)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(?from, ?to, ?reason, "chaser_step_rejected");
            out_events.push(Event::StepRejected { to, reason });
            return;
        }

        if to == from {
            out_events.push(Event::ChaserHeld { at: from });
        } else {
            for (at, code) in [(from, CellCode::Empty), (to, CellCode::Chaser)] {
                if let Err(error) = self.grid.set(at, code) {
                    warn!(%error, "chaser_marker_update_failed");
                }
            }
            self.chaser = to;
            out_events.push(Event::ChaserAdvanced { from, to });
        }

        self.end_game_if_caught(out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame { setup } => {
            if let Err(error) = validate_setup(&setup) {
                warn!(%error, "start_game_rejected");
                out_events.push(Event::StartRejected {
                    reason: Rejection::InconsistentSetup,
                });
                return;
            }

            world.restart(setup);
            info!(
                size = world.grid.size(),
                chaser = ?world.chaser,
                player = ?world.player.cell(),
                "game_started"
            );
            out_events.push(Event::GameStarted {
                chaser: world.chaser,
                player: world.player.cell(),
            });
            world.end_game_if_caught(out_events);
        }
        Command::Tick { dt } => {
            if world.state != GameState::Active {
                return;
            }

            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced {
                dt,
                elapsed: world.elapsed,
            });
        }
        Command::MovePlayer { to } => world.move_player(to, out_events),
        Command::RotatePlayer { radians } => world.rotate_player(radians, out_events),
        Command::StepChaser { to } => world.step_chaser(to, out_events),
    }
}

fn validate_setup(setup: &GameSetup) -> Result<(), WorldError> {
    let grid = setup.grid();
    let chaser = setup.chaser_spawn();
    if grid.cell(chaser) != Some(CellCode::Chaser) {
        return Err(WorldError::ChaserMarkerMissing { at: chaser });
    }
    if let Some(at) = grid.cells_with(CellCode::Chaser).find(|cell| *cell != chaser) {
        return Err(WorldError::StrayChaserMarker { at });
    }

    let spawn = setup.player_spawn();
    if !position_in_grid(grid, spawn) {
        return Err(WorldError::PlayerOutOfBounds {
            x: spawn.x(),
            y: spawn.y(),
        });
    }
    let cell = GridVec::from(spawn);
    if grid.cell(cell) == Some(CellCode::Wall) {
        return Err(WorldError::PlayerInWall { cell });
    }

    Ok(())
}

fn position_in_grid(grid: &Grid, position: Vec2D) -> bool {
    let limit = f64::from(grid.size());
    position.is_finite()
        && (0.0..limit).contains(&position.x())
        && (0.0..limit).contains(&position.y())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use escape_block_core::{GameState, Grid, GridVec, PlayerPose};

    /// Provides read-only access to the live grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Current player pose.
    #[must_use]
    pub fn player(world: &World) -> PlayerPose {
        world.player
    }

    /// Cell containing the player, truncated from the continuous position.
    #[must_use]
    pub fn player_cell(world: &World) -> GridVec {
        world.player.cell()
    }

    /// Cell occupied by the chaser.
    #[must_use]
    pub fn chaser(world: &World) -> GridVec {
        world.chaser
    }

    /// Whether the game is running or over.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.state
    }

    /// Session time accumulated while the game was active.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Reports whether the chaser shares the player's cell.
    #[must_use]
    pub fn chaser_caught_player(world: &World) -> bool {
        world.chaser == world.player.cell()
    }
}
