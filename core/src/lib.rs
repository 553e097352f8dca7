#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Escape the Block engine.
//!
//! This crate defines the vector primitives, the cell grid and the message
//! surface that connects adapters, the authoritative world, and pure systems.
//! Adapters and systems submit [`Command`] values describing desired
//! mutations, the world executes those commands via its `apply` entry point,
//! and then broadcasts [`Event`] values for systems to react to
//! deterministically.

mod grid;
mod tunables;
mod vector;

use std::time::Duration;

pub use grid::{CellCode, CellLookup, Grid, GridError};
pub use tunables::{GridTunables, PlayerTunables, PursuitTunables, Tunables, TunablesError};
pub use vector::{GridVec, Transform, TransformError, Vec2D, MIN_SCALAR_MAGNITUDE};

/// Canonical title shown by adapters.
pub const GAME_TITLE: &str = "Escape the Block";

/// Describes whether the simulation currently accepts movement and pursuit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameState {
    /// The player is being chased.
    #[default]
    Active,
    /// The chaser reached the player; only a new game resumes the simulation.
    GameOver,
}

/// Position and camera of the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPose {
    /// Continuous position in grid units.
    pub position: Vec2D,
    /// Unit vector the player faces.
    pub direction: Vec2D,
    /// Camera half-plane perpendicular to `direction`, pointing to the right
    /// edge of the screen.
    pub viewport: Vec2D,
}

impl PlayerPose {
    /// Facing direction assigned to freshly spawned players.
    pub const SPAWN_DIRECTION: Vec2D = Vec2D::new(0.0, 1.0);

    /// Creates a pose at `position` facing the spawn direction.
    #[must_use]
    pub fn spawn(position: Vec2D, viewport_half_width: f64) -> Self {
        let direction = Self::SPAWN_DIRECTION;
        Self {
            position,
            direction,
            viewport: -direction.perpendicular() * viewport_half_width,
        }
    }

    /// Cell containing the player.
    #[must_use]
    pub fn cell(&self) -> GridVec {
        GridVec::from(self.position)
    }
}

/// Everything needed to start a new game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSetup {
    grid: Grid,
    player_spawn: Vec2D,
    chaser_spawn: GridVec,
}

impl GameSetup {
    /// Bundles a generated grid with its spawn points.
    #[must_use]
    pub fn new(grid: Grid, player_spawn: Vec2D, chaser_spawn: GridVec) -> Self {
        Self {
            grid,
            player_spawn,
            chaser_spawn,
        }
    }

    /// Grid the game is played on; the chaser spawn holds [`CellCode::Chaser`].
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Continuous position the player starts at.
    #[must_use]
    pub const fn player_spawn(&self) -> Vec2D {
        self.player_spawn
    }

    /// Cell the chaser starts in.
    #[must_use]
    pub const fn chaser_spawn(&self) -> GridVec {
        self.chaser_spawn
    }

    /// Splits the setup into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Grid, Vec2D, GridVec) {
        (self.grid, self.player_spawn, self.chaser_spawn)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current game and starts a new one.
    StartGame {
        /// Grid and spawn points of the new game.
        setup: GameSetup,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player move to a new continuous position.
    MovePlayer {
        /// Destination already validated against the player's bounding circle.
        to: Vec2D,
    },
    /// Requests that the player's direction and viewport rotate.
    RotatePlayer {
        /// Rotation in radians; positive is counter-clockwise.
        radians: f64,
    },
    /// Requests that the chaser occupy a new cell.
    StepChaser {
        /// Neighbouring cell to enter, or the current cell to hold position.
        to: GridVec,
    },
}

/// Reasons the world refused a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The game is over, so movement and pursuit are frozen.
    Inactive,
    /// The destination lies outside the grid.
    OutOfBounds,
    /// The destination is a wall.
    Blocked,
    /// The chaser may only move one orthogonal step at a time.
    NotAdjacent,
    /// The game setup disagrees with its own grid.
    InconsistentSetup,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a new game began.
    GameStarted {
        /// Cell the chaser starts in.
        chaser: GridVec,
        /// Cell the player starts in.
        player: GridVec,
    },
    /// Reports that a new game was refused and the previous one kept.
    StartRejected {
        /// Reason the setup was refused.
        reason: Rejection,
    },
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Session time accumulated after the tick.
        elapsed: Duration,
    },
    /// Confirms that the player moved.
    PlayerMoved {
        /// Position before the move.
        from: Vec2D,
        /// Position after the move.
        to: Vec2D,
    },
    /// Confirms that the player turned.
    PlayerRotated {
        /// Facing direction after the rotation.
        direction: Vec2D,
    },
    /// Reports that a player move was refused.
    MoveRejected {
        /// Requested destination.
        to: Vec2D,
        /// Reason the move failed.
        reason: Rejection,
    },
    /// Confirms that the chaser moved between two cells.
    ChaserAdvanced {
        /// Cell the chaser occupied before moving.
        from: GridVec,
        /// Cell the chaser occupies after moving.
        to: GridVec,
    },
    /// Reports that the chaser kept its cell for a pursuit tick.
    ChaserHeld {
        /// Cell the chaser occupies.
        at: GridVec,
    },
    /// Reports that a chaser step was refused.
    StepRejected {
        /// Requested cell.
        to: GridVec,
        /// Reason the step failed.
        reason: Rejection,
    },
    /// Announces that the chaser caught the player.
    GameOver {
        /// Session time the player survived.
        survived: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_pose_views_perpendicular_to_direction() {
        let pose = PlayerPose::spawn(Vec2D::new(10.5, 10.5), 0.7);

        assert_eq!(pose.direction, Vec2D::new(0.0, 1.0));
        assert!((pose.viewport.x() - 0.7).abs() < 1e-12);
        assert!(pose.viewport.y().abs() < 1e-12);
        assert!(pose.direction.dot(pose.viewport).abs() < 1e-12);
        assert_eq!(pose.cell(), GridVec::new(10, 10));
    }

    #[test]
    fn game_setup_exposes_its_parts() {
        let grid = Grid::bordered(10);
        let setup = GameSetup::new(grid.clone(), Vec2D::new(5.5, 5.5), GridVec::new(1, 1));

        assert_eq!(setup.grid(), &grid);
        assert_eq!(setup.chaser_spawn(), GridVec::new(1, 1));
        let (_, player, _) = setup.into_parts();
        assert_eq!(player, Vec2D::new(5.5, 5.5));
    }
}
