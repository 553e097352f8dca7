#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Escape the Block adapters.
//!
//! Backends receive a [`Presentation`] once and then repeatedly hand the
//! caller a mutable [`Scene`] to refresh. The scene only carries per-column
//! ray samples and colors, so drawing stays independent of the simulation.

use anyhow::Result as AnyResult;
use escape_block_core::CellCode;
use escape_block_system_raycasting::{Axis, ColumnHit};
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color darkened towards black by the provided amount.
    #[must_use]
    pub fn darken(self, amount: f32) -> Self {
        let keep = 1.0 - amount.clamp(0.0, 1.0);

        Self {
            red: self.red * keep,
            green: self.green * keep,
            blue: self.blue * keep,
            alpha: self.alpha,
        }
    }
}

/// Colors assigned to each kind of cell a ray can hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPalette {
    /// Color used for empty cells.
    pub background: Color,
    /// Color used for walls.
    pub wall: Color,
    /// Color used for the chaser.
    pub chaser: Color,
}

impl CellPalette {
    /// Color used for the provided cell code.
    #[must_use]
    pub const fn color_for(&self, cell: CellCode) -> Color {
        match cell {
            CellCode::Empty => self.background,
            CellCode::Wall => self.wall,
            CellCode::Chaser => self.chaser,
        }
    }
}

impl Default for CellPalette {
    fn default() -> Self {
        Self {
            background: Color::from_rgb_u8(0, 0, 0),
            wall: Color::from_rgb_u8(128, 128, 128),
            chaser: CHASER_START_COLOR,
        }
    }
}

const CHASER_START_COLOR: Color = Color::from_rgb_u8(255, 255, 0);

/// Amount by which faces hit across an x grid line are darkened.
pub const X_SIDE_SHADE: f32 = 0.3;

/// Chaser color for the current session time: yellow at the start, fading
/// to red as the pursuit reaches full speed.
#[must_use]
pub fn chaser_tint(elapsed: Duration, ramp_up: Duration) -> Color {
    let progress = if ramp_up.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f32() / ramp_up.as_secs_f32()).clamp(0.0, 1.0)
    };

    Color {
        green: CHASER_START_COLOR.green * (1.0 - progress),
        ..CHASER_START_COLOR
    }
}

/// Ray result for one screen column, detached from the simulation types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSample {
    /// Distance along the unnormalized ray to the hit.
    pub distance: f32,
    /// Whether the ray crossed a vertical grid line last.
    pub x_side: bool,
    /// Code of the hit cell.
    pub cell: CellCode,
}

impl ColumnSample {
    /// Creates a column sample.
    #[must_use]
    pub const fn new(distance: f32, x_side: bool, cell: CellCode) -> Self {
        Self {
            distance,
            x_side,
            cell,
        }
    }
}

impl From<ColumnHit> for ColumnSample {
    fn from(hit: ColumnHit) -> Self {
        Self::new(hit.distance() as f32, hit.axis() == Axis::X, hit.cell())
    }
}

/// Vertical line drawn for one screen column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallStrip {
    /// Screen column the strip belongs to.
    pub column: usize,
    /// Top end of the strip in screen pixels.
    pub top: f32,
    /// Bottom end of the strip in screen pixels.
    pub bottom: f32,
    /// Fill color of the strip.
    pub color: Color,
}

impl WallStrip {
    /// Projects a sample onto a screen of the provided height.
    ///
    /// The strip is `screen_height / distance` pixels tall, centred
    /// vertically and clipped to the screen.
    pub fn from_sample(
        column: usize,
        sample: ColumnSample,
        screen_height: f32,
        palette: &CellPalette,
    ) -> Result<Self, RenderingError> {
        if !(screen_height.is_finite() && screen_height > 0.0) {
            return Err(RenderingError::InvalidScreenHeight {
                height: screen_height,
            });
        }

        let line_height = if sample.distance > 0.0 {
            screen_height / sample.distance
        } else {
            screen_height
        };
        let top = ((screen_height - line_height) / 2.0).max(0.0);
        let bottom = ((screen_height + line_height) / 2.0).min(screen_height);

        let base = palette.color_for(sample.cell);
        let color = if sample.x_side {
            base.darken(X_SIDE_SHADE)
        } else {
            base
        };

        Ok(Self {
            column,
            top,
            bottom,
            color,
        })
    }

    /// Height of the strip in screen pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Banner shown once the chaser caught the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameOverOverlay {
    /// Time the player survived.
    pub survived: Duration,
}

impl GameOverOverlay {
    /// Text displayed by backends.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Game over! You survived {:.1} s. Press Enter to restart.",
            self.survived.as_secs_f64()
        )
    }
}

/// Scene description combining column samples with their colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Ray samples from the left to the right edge of the screen.
    pub samples: Vec<ColumnSample>,
    /// Colors used for hit cells.
    pub palette: CellPalette,
    /// Color of the upper half of the screen.
    pub sky: Color,
    /// Color of the lower half of the screen.
    pub floor: Color,
    /// Overlay drawn on top of the view after a game over.
    pub game_over: Option<GameOverOverlay>,
}

impl Scene {
    /// Sky color used by the default scene.
    pub const DEFAULT_SKY: Color = Color::from_rgb_u8(240, 255, 255);
    /// Floor color used by the default scene.
    pub const DEFAULT_FLOOR: Color = Color::from_rgb_u8(100, 200, 150);

    /// Creates a scene without samples.
    #[must_use]
    pub fn new(palette: CellPalette, sky: Color, floor: Color) -> Self {
        Self {
            samples: Vec::new(),
            palette,
            sky,
            floor,
            game_over: None,
        }
    }

    /// Wall strips for every sample on a screen of the provided size.
    ///
    /// Each strip reports its sample index as its column.
    pub fn strips(&self, screen_height: f32) -> Result<Vec<WallStrip>, RenderingError> {
        self.samples
            .iter()
            .enumerate()
            .map(|(column, sample)| {
                WallStrip::from_sample(column, *sample, screen_height, &self.palette)
            })
            .collect()
    }

    /// Screen width covered by one sample.
    #[must_use]
    pub fn column_width(&self, screen_width: f32) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }

        screen_width / self.samples.len() as f32
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(CellPalette::default(), Self::DEFAULT_SKY, Self::DEFAULT_FLOOR)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Requested body-relative movement: `x` forward, `y` to the left.
    pub movement: Vec2,
    /// Requested turn direction in `-1.0..=1.0`; positive turns left.
    pub turn: f32,
    /// Whether a restart was requested on this frame.
    pub restart: bool,
    /// Whether the adapter is about to close.
    pub quit: bool,
    /// Number of columns the scene should sample.
    pub columns: usize,
}

/// Time spent in the caller's update closure, reported back to the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSimulationBreakdown {
    /// Time spent advancing the simulation.
    pub simulation: Duration,
    /// Time spent casting rays.
    pub raycasting: Duration,
}

/// Rendering backend capable of presenting Escape the Block scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and refreshes the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameSimulationBreakdown + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Screen height must be positive and finite to project strips.
    InvalidScreenHeight {
        /// Provided height that failed validation.
        height: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScreenHeight { height } => {
                write!(f, "screen height must be positive (received {height})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> CellPalette {
        CellPalette {
            background: Color::from_rgb_u8(0, 0, 0),
            wall: Color::from_rgb_u8(200, 100, 50),
            chaser: Color::from_rgb_u8(255, 255, 0),
        }
    }

    #[test]
    fn strip_height_is_inverse_to_distance() {
        let strip = WallStrip::from_sample(
            3,
            ColumnSample::new(4.0, false, CellCode::Wall),
            800.0,
            &palette(),
        )
        .expect("positive height");

        assert_eq!(strip.column, 3);
        assert_eq!(strip.top, 300.0);
        assert_eq!(strip.bottom, 500.0);
        assert_eq!(strip.height(), 200.0);
        assert_eq!(strip.color, palette().wall);
    }

    #[test]
    fn close_walls_are_clipped_to_the_screen() {
        let strip = WallStrip::from_sample(
            0,
            ColumnSample::new(0.25, false, CellCode::Wall),
            600.0,
            &palette(),
        )
        .expect("positive height");

        assert_eq!(strip.top, 0.0);
        assert_eq!(strip.bottom, 600.0);
    }

    #[test]
    fn x_side_hits_are_darker() {
        let strip = WallStrip::from_sample(
            0,
            ColumnSample::new(2.0, true, CellCode::Chaser),
            600.0,
            &palette(),
        )
        .expect("positive height");

        assert_eq!(strip.color, palette().chaser.darken(X_SIDE_SHADE));
        assert!(strip.color.red < palette().chaser.red);
    }

    #[test]
    fn zero_screen_height_is_rejected_without_panicking() {
        let error = WallStrip::from_sample(
            0,
            ColumnSample::new(2.0, false, CellCode::Wall),
            0.0,
            &palette(),
        )
        .expect_err("zero height must be rejected");

        assert_eq!(error, RenderingError::InvalidScreenHeight { height: 0.0 });
    }

    #[test]
    fn chaser_tint_fades_from_yellow_to_red() {
        let ramp = Duration::from_secs(30);

        assert_eq!(chaser_tint(Duration::ZERO, ramp), CHASER_START_COLOR);
        let halfway = chaser_tint(Duration::from_secs(15), ramp);
        assert!((halfway.green - 0.5).abs() < 1e-6);
        assert_eq!(halfway.red, 1.0);
        assert_eq!(chaser_tint(Duration::from_secs(90), ramp).green, 0.0);
    }

    #[test]
    fn scene_strips_follow_samples() {
        let mut scene = Scene::new(palette(), Scene::DEFAULT_SKY, Scene::DEFAULT_FLOOR);
        scene.samples = vec![
            ColumnSample::new(1.0, false, CellCode::Wall),
            ColumnSample::new(2.0, true, CellCode::Wall),
        ];

        let strips = scene.strips(400.0).expect("positive height");

        assert_eq!(strips.len(), 2);
        assert_eq!(strips[1].column, 1);
        assert_eq!(strips[1].height(), 200.0);
        assert_eq!(scene.column_width(800.0), 400.0);
    }

    #[test]
    fn game_over_message_reports_seconds() {
        let overlay = GameOverOverlay {
            survived: Duration::from_millis(12_340),
        };

        assert_eq!(
            overlay.message(),
            "Game over! You survived 12.3 s. Press Enter to restart."
        );
    }
}
