#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player movement system that turns input intents into validated moves.
//!
//! Each physics tick the adapter hands the system a [`PlayerIntent`]. The
//! system rotates the camera, maps the intent into world space, checks the
//! player's bounding circle against the grid and, when the direct step is
//! blocked, slides along the wall by deflecting the step a little at a time.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

use escape_block_core::{
    CellCode, CellLookup, Command, GameState, GridVec, PlayerPose, PlayerTunables, Vec2D,
};

/// Angular increment tried on each side while sliding along a wall.
const SLIDE_INCREMENT: f64 = 0.1;

/// Unit offsets of the eight compass points sampled around the player.
const COMPASS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (0.0, 1.0),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-1.0, 0.0),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// Movement requested by the player for a single physics tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerIntent {
    movement: Vec2D,
    rotation: f64,
}

impl PlayerIntent {
    /// Intent that neither moves nor turns.
    pub const IDLE: Self = Self {
        movement: Vec2D::ZERO,
        rotation: 0.0,
    };

    /// Creates an intent from a body-relative movement and a rotation.
    ///
    /// `movement.x` points forward and `movement.y` to the player's left.
    /// `rotation` is expressed in radians, positive counter-clockwise.
    #[must_use]
    pub const fn new(movement: Vec2D, rotation: f64) -> Self {
        Self { movement, rotation }
    }

    /// Body-relative movement.
    #[must_use]
    pub const fn movement(&self) -> Vec2D {
        self.movement
    }

    /// Rotation in radians.
    #[must_use]
    pub const fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Reports whether the intent requests nothing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.movement.is_zero() && self.rotation == 0.0
    }
}

/// Pure system that converts intents into player commands.
#[derive(Clone, Debug, Default)]
pub struct Movement {
    tunables: PlayerTunables,
}

impl Movement {
    /// Creates a movement system driven by the provided tunables.
    #[must_use]
    pub fn new(tunables: PlayerTunables) -> Self {
        Self { tunables }
    }

    /// Emits rotation and movement commands for one physics tick.
    pub fn handle<G>(
        &self,
        intent: PlayerIntent,
        game_state: GameState,
        grid: &G,
        pose: PlayerPose,
        out: &mut Vec<Command>,
    ) where
        G: CellLookup + ?Sized,
    {
        if game_state != GameState::Active || intent.is_idle() {
            return;
        }

        let mut direction = pose.direction;
        if intent.rotation != 0.0 && intent.rotation.is_finite() {
            out.push(Command::RotatePlayer {
                radians: intent.rotation,
            });
            direction = direction.rotated(intent.rotation);
        }

        let left = direction.rotated(FRAC_PI_2);
        let world_step = direction * intent.movement.x() + left * intent.movement.y();
        let Some(unit) = world_step.normalized() else {
            return;
        };

        if let Some(to) = self.resolve_step(grid, pose.position, unit * self.tunables.step_length)
        {
            out.push(Command::MovePlayer { to });
        }
    }

    /// Finds a valid destination for `step`, deflecting it along walls.
    fn resolve_step<G>(&self, grid: &G, from: Vec2D, step: Vec2D) -> Option<Vec2D>
    where
        G: CellLookup + ?Sized,
    {
        let radius = self.tunables.bounding_radius;
        let direct = from + step;
        if player_fits(grid, direct, radius) {
            return Some(direct);
        }

        let mut deviation = SLIDE_INCREMENT;
        while deviation < FRAC_PI_2 {
            let shrink = deviation.cos();
            for side in [1.0, -1.0] {
                let candidate = from + step.rotated(side * deviation) * shrink;
                if player_fits(grid, candidate, radius) {
                    return Some(candidate);
                }
            }
            deviation += SLIDE_INCREMENT;
        }

        None
    }
}

/// Reports whether a player of `radius` fits at `position`.
///
/// The centre and eight compass points on the bounding circle must all lie on
/// non-wall cells inside the grid.
#[must_use]
pub fn player_fits<G>(grid: &G, position: Vec2D, radius: f64) -> bool
where
    G: CellLookup + ?Sized,
{
    std::iter::once(position)
        .chain(
            COMPASS
                .iter()
                .map(|&(x, y)| position + Vec2D::new(x, y) * radius),
        )
        .all(|point| point_is_open(grid, point))
}

fn point_is_open<G>(grid: &G, point: Vec2D) -> bool
where
    G: CellLookup + ?Sized,
{
    if !point.is_finite() || point.x() < 0.0 || point.y() < 0.0 {
        return false;
    }

    matches!(
        grid.cell(GridVec::from(point)),
        Some(CellCode::Empty | CellCode::Chaser)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_block_core::Grid;

    #[test]
    fn compass_points_lie_on_the_unit_circle() {
        for (x, y) in COMPASS {
            assert!((Vec2D::new(x, y).length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn negative_coordinates_are_never_open() {
        let grid = Grid::bordered(4);
        assert!(!point_is_open(&grid, Vec2D::new(-0.2, 1.5)));
        assert!(point_is_open(&grid, Vec2D::new(1.5, 1.5)));
    }

    #[test]
    fn idle_intent_is_detected() {
        assert!(PlayerIntent::IDLE.is_idle());
        assert!(!PlayerIntent::new(Vec2D::new(1.0, 0.0), 0.0).is_idle());
        assert!(!PlayerIntent::new(Vec2D::ZERO, 0.05).is_idle());
    }
}
