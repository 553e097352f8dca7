//! Tuning knobs shared by every system, loadable from configuration files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated tuning knobs controlling generation, pursuit and player handling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tunables {
    /// Map size bounds, wall density and spawn placement.
    pub grid: GridTunables,
    /// Chaser cadence and its difficulty ramp.
    pub pursuit: PursuitTunables,
    /// Player collision, speed and camera settings.
    pub player: PlayerTunables,
}

impl Tunables {
    /// Reports the first inconsistency found across every section.
    pub fn validate(&self) -> Result<(), TunablesError> {
        self.grid.validate()?;
        self.pursuit.validate()?;
        self.player.validate()
    }
}

/// Parameters steering map generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridTunables {
    /// Side length used when a new game is generated.
    pub size: u32,
    /// Smallest accepted side length.
    pub min_size: u32,
    /// Largest accepted side length.
    pub max_size: u32,
    /// Chance for each unreserved interior cell to become a wall; must lie in `[0, 1)`.
    pub wall_probability: f64,
    /// Minimum number of cells kept between the player spawn and the border.
    pub spawn_margin: u32,
    /// Smallest Euclidean distance between the chaser and player spawn cells.
    pub min_chaser_distance: f64,
    /// Largest Euclidean distance between the chaser and player spawn cells.
    pub max_chaser_distance: f64,
}

impl Default for GridTunables {
    fn default() -> Self {
        Self {
            size: 30,
            min_size: 10,
            max_size: 1_000,
            wall_probability: 0.15,
            spawn_margin: 2,
            min_chaser_distance: 8.0,
            max_chaser_distance: 20.0,
        }
    }
}

impl GridTunables {
    fn validate(&self) -> Result<(), TunablesError> {
        if self.min_size < 3 || self.min_size > self.max_size {
            return Err(TunablesError::SizeBounds {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if !(self.min_size..=self.max_size).contains(&self.size) {
            return Err(TunablesError::SizeOutOfBounds {
                size: self.size,
                min: self.min_size,
                max: self.max_size,
            });
        }
        if !(0.0..1.0).contains(&self.wall_probability) {
            return Err(TunablesError::WallProbability {
                probability: self.wall_probability,
            });
        }
        if self.spawn_margin == 0 || self.spawn_margin.saturating_mul(2) >= self.min_size {
            return Err(TunablesError::SpawnMargin {
                margin: self.spawn_margin,
                min_size: self.min_size,
            });
        }
        if self.min_chaser_distance < 0.0 || self.min_chaser_distance > self.max_chaser_distance
        {
            return Err(TunablesError::ChaserDistance {
                min: self.min_chaser_distance,
                max: self.max_chaser_distance,
            });
        }
        Ok(())
    }
}

/// Cadence of the chaser's steps, which speed up over the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PursuitTunables {
    /// Delay between chaser steps once fully ramped up, in milliseconds.
    pub min_delay_ms: u64,
    /// Delay between chaser steps when the session starts, in milliseconds.
    pub max_delay_ms: u64,
    /// Session time after which the chaser moves at full speed, in milliseconds.
    pub ramp_up_ms: u64,
}

impl Default for PursuitTunables {
    fn default() -> Self {
        Self {
            min_delay_ms: 300,
            max_delay_ms: 1_500,
            ramp_up_ms: 30_000,
        }
    }
}

impl PursuitTunables {
    /// Delay between chaser steps at full speed.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Delay between chaser steps at the start of a session.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Session time needed to reach full speed.
    #[must_use]
    pub const fn ramp_up(&self) -> Duration {
        Duration::from_millis(self.ramp_up_ms)
    }

    fn validate(&self) -> Result<(), TunablesError> {
        if self.min_delay_ms == 0 || self.min_delay_ms > self.max_delay_ms {
            return Err(TunablesError::PursuitDelay {
                min_ms: self.min_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }
}

/// Player collision, motion and camera parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerTunables {
    /// Radius of the circle that must stay clear of walls.
    pub bounding_radius: f64,
    /// Distance travelled per physics tick while moving.
    pub step_length: f64,
    /// Rotation applied per physics tick while turning, in radians.
    pub turn_rate: f64,
    /// Half-width of the camera plane; larger values widen the field of view.
    pub viewport_half_width: f64,
    /// Number of physics ticks per second.
    pub tick_rate_hz: u32,
}

impl Default for PlayerTunables {
    fn default() -> Self {
        Self {
            bounding_radius: 0.1,
            step_length: 0.05,
            turn_rate: 0.05,
            viewport_half_width: 0.7,
            tick_rate_hz: 60,
        }
    }
}

impl PlayerTunables {
    /// Duration of one physics tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(1)
    }

    fn validate(&self) -> Result<(), TunablesError> {
        if !(0.0..0.5).contains(&self.bounding_radius) {
            return Err(TunablesError::BoundingRadius {
                radius: self.bounding_radius,
            });
        }
        if self.step_length <= 0.0 || self.step_length >= 0.5 {
            return Err(TunablesError::StepLength {
                length: self.step_length,
            });
        }
        if self.viewport_half_width <= 0.0 {
            return Err(TunablesError::Viewport {
                half_width: self.viewport_half_width,
            });
        }
        if self.tick_rate_hz == 0 {
            return Err(TunablesError::TickRate);
        }
        Ok(())
    }
}

/// Inconsistencies detected while validating [`Tunables`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TunablesError {
    /// Size bounds are inverted or too small to hold a bordered interior.
    #[error("grid size bounds {min}..={max} are invalid")]
    SizeBounds {
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// Configured size lies outside its own bounds.
    #[error("grid size {size} lies outside {min}..={max}")]
    SizeOutOfBounds {
        /// Configured size.
        size: u32,
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// Wall probability of one or more would make generation loop forever.
    #[error("wall probability {probability} must lie in [0, 1)")]
    WallProbability {
        /// Configured probability.
        probability: f64,
    },
    /// Spawn margin leaves no room for the player on the smallest grid.
    #[error("spawn margin {margin} does not fit a {min_size}x{min_size} grid")]
    SpawnMargin {
        /// Configured margin.
        margin: u32,
        /// Configured lower size bound.
        min_size: u32,
    },
    /// Chaser spawn distance range is inverted or negative.
    #[error("chaser spawn distance range {min}..={max} is invalid")]
    ChaserDistance {
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },
    /// Pursuit delays are inverted or zero.
    #[error("pursuit delay range {min_ms}ms..={max_ms}ms is invalid")]
    PursuitDelay {
        /// Configured fastest delay.
        min_ms: u64,
        /// Configured slowest delay.
        max_ms: u64,
    },
    /// Bounding radius must fit inside a single cell.
    #[error("bounding radius {radius} must lie in [0, 0.5)")]
    BoundingRadius {
        /// Configured radius.
        radius: f64,
    },
    /// Step length must be positive and shorter than half a cell.
    #[error("step length {length} must lie in (0, 0.5)")]
    StepLength {
        /// Configured step length.
        length: f64,
    },
    /// Camera plane must have a positive half-width.
    #[error("viewport half-width {half_width} must be positive")]
    Viewport {
        /// Configured half-width.
        half_width: f64,
    },
    /// Physics ticks need a positive rate.
    #[error("tick rate must be positive")]
    TickRate,
}
