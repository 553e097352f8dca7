#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Escape the Block.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

use anyhow::Result;
use escape_block_rendering::{
    FrameInput, FrameSimulationBreakdown, Presentation, RenderingBackend, Scene,
};
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use std::time::{Duration, Instant};
use tracing::info;

const OVERLAY_FONT_SIZE: f32 = 32.0;
const REPORT_WINDOW: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyboardState {
    /// `W` moves forward.
    forward: bool,
    /// `S` moves backward.
    backward: bool,
    /// `A` strafes left.
    strafe_left: bool,
    /// `D` strafes right.
    strafe_right: bool,
    /// Left arrow turns counter-clockwise.
    turn_left: bool,
    /// Right arrow turns clockwise.
    turn_right: bool,
    /// `Enter` restarts after a game over.
    restart: bool,
    /// `Escape` quits the game loop.
    quit: bool,
}

impl KeyboardState {
    fn poll() -> Self {
        Self {
            forward: is_key_down(KeyCode::W),
            backward: is_key_down(KeyCode::S),
            strafe_left: is_key_down(KeyCode::A),
            strafe_right: is_key_down(KeyCode::D),
            turn_left: is_key_down(KeyCode::Left),
            turn_right: is_key_down(KeyCode::Right),
            restart: is_key_pressed(KeyCode::Enter),
            quit: is_key_pressed(KeyCode::Escape),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    column_width: f32,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            column_width: 2.0,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Time spent in each stage of one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    raycasting: Duration,
    render: Duration,
}

impl std::ops::AddAssign for FrameBreakdown {
    fn add_assign(&mut self, other: Self) {
        self.frame += other.frame;
        self.simulation += other.simulation;
        self.raycasting += other.raycasting;
        self.render += other.render;
    }
}

/// Frame rate and per-stage averages over one reporting window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TimingReport {
    fps: f32,
    average: FrameBreakdown,
}

/// Sums frame timings and reports once at least a second of frames was seen.
#[derive(Debug, Default)]
struct FrameTimer {
    frames: u32,
    totals: FrameBreakdown,
}

impl FrameTimer {
    fn record(&mut self, breakdown: FrameBreakdown) -> Option<TimingReport> {
        self.frames = self.frames.saturating_add(1);
        self.totals += breakdown;
        if self.totals.frame < REPORT_WINDOW {
            return None;
        }

        let Self { frames, totals } = std::mem::take(self);
        Some(TimingReport {
            fps: frames as f32 / totals.frame.as_secs_f32(),
            average: FrameBreakdown {
                frame: totals.frame / frames,
                simulation: totals.simulation / frames,
                raycasting: totals.raycasting / frames,
                render: totals.render / frames,
            },
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameSimulationBreakdown + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            column_width,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut frame_timer = FrameTimer::default();

            loop {
                let keyboard = KeyboardState::poll();
                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = frame_input_from_keys(keyboard, screen_width, column_width);
                let simulation = update_scene(frame_dt, frame_input, &mut scene);
                if keyboard.quit {
                    break;
                }

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                draw_view(&scene, screen_width, screen_height);
                if let Some(overlay) = scene.game_over {
                    draw_overlay(&overlay.message(), screen_width, screen_height);
                }
                let render = render_start.elapsed();

                let report = frame_timer.record(FrameBreakdown {
                    frame: frame_dt,
                    simulation: simulation.simulation,
                    raycasting: simulation.raycasting,
                    render,
                });
                if show_fps {
                    if let Some(report) = report {
                        info!(
                            fps = report.fps,
                            sim_ms = millis(report.average.simulation),
                            rays_ms = millis(report.average.raycasting),
                            render_ms = millis(report.average.render),
                            "frame_timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn frame_input_from_keys(keyboard: KeyboardState, screen_width: f32, column_width: f32) -> FrameInput {
    let columns = if column_width > 0.0 && screen_width.is_finite() {
        (screen_width / column_width).max(0.0) as usize
    } else {
        0
    };

    FrameInput {
        movement: Vec2::new(
            axis(keyboard.forward, keyboard.backward),
            axis(keyboard.strafe_left, keyboard.strafe_right),
        ),
        turn: axis(keyboard.turn_left, keyboard.turn_right),
        restart: keyboard.restart,
        quit: keyboard.quit,
        columns,
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

fn draw_view(scene: &Scene, screen_width: f32, screen_height: f32) {
    let horizon = screen_height / 2.0;
    macroquad::shapes::draw_rectangle(
        0.0,
        0.0,
        screen_width,
        horizon,
        to_macroquad_color(scene.sky),
    );
    macroquad::shapes::draw_rectangle(
        0.0,
        horizon,
        screen_width,
        screen_height - horizon,
        to_macroquad_color(scene.floor),
    );

    let Ok(strips) = scene.strips(screen_height) else {
        return;
    };
    let column_width = scene.column_width(screen_width);
    for strip in strips {
        macroquad::shapes::draw_rectangle(
            strip.column as f32 * column_width,
            strip.top,
            column_width,
            strip.height(),
            to_macroquad_color(strip.color),
        );
    }
}

fn draw_overlay(message: &str, screen_width: f32, screen_height: f32) {
    let dimensions = macroquad::text::measure_text(message, None, OVERLAY_FONT_SIZE as u16, 1.0);
    let origin = overlay_origin(
        Vec2::new(dimensions.width, dimensions.height),
        Vec2::new(screen_width, screen_height),
    );
    let padding = OVERLAY_FONT_SIZE / 2.0;

    macroquad::shapes::draw_rectangle(
        origin.x - padding,
        origin.y - dimensions.height - padding,
        dimensions.width + padding * 2.0,
        dimensions.height + padding * 2.0,
        macroquad::color::Color::new(0.0, 0.0, 0.0, 0.7),
    );
    macroquad::text::draw_text(
        message,
        origin.x,
        origin.y,
        OVERLAY_FONT_SIZE,
        macroquad::color::WHITE,
    );
}

/// Baseline origin that centres text of `text_size` on a screen of `screen_size`.
fn overlay_origin(text_size: Vec2, screen_size: Vec2) -> Vec2 {
    let centred = (screen_size - text_size) / 2.0;
    Vec2::new(centred.x.max(0.0), centred.y.max(0.0) + text_size.y)
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

fn to_macroquad_color(color: escape_block_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel_out() {
        assert_eq!(axis(true, true), 0.0);
        assert_eq!(axis(true, false), 1.0);
        assert_eq!(axis(false, true), -1.0);
    }

    #[test]
    fn keyboard_maps_to_body_relative_intent() {
        let keyboard = KeyboardState {
            forward: true,
            strafe_right: true,
            turn_left: true,
            ..KeyboardState::default()
        };

        let input = frame_input_from_keys(keyboard, 960.0, 2.0);

        assert_eq!(input.movement, Vec2::new(1.0, -1.0));
        assert_eq!(input.turn, 1.0);
        assert_eq!(input.columns, 480);
        assert!(!input.restart);
        assert!(!input.quit);
    }

    #[test]
    fn overlay_is_centred_on_screen() {
        let origin = overlay_origin(Vec2::new(200.0, 20.0), Vec2::new(800.0, 600.0));

        assert_eq!(origin, Vec2::new(300.0, 310.0));
    }

    #[test]
    fn frame_timer_waits_for_a_full_second() {
        let mut timer = FrameTimer::default();
        let frame = FrameBreakdown {
            frame: Duration::from_millis(250),
            ..FrameBreakdown::default()
        };

        assert!(timer.record(frame).is_none());
        assert!(timer.record(frame).is_none());
        assert!(timer.record(frame).is_none());
        let report = timer.record(frame).expect("one second of frames");
        assert!((report.fps - 4.0).abs() <= 1e-3);
        assert!(timer.record(frame).is_none(), "window restarts after a report");
    }

    #[test]
    fn frame_timer_averages_each_stage() {
        let mut timer = FrameTimer::default();
        let slow = FrameBreakdown {
            frame: Duration::from_millis(600),
            simulation: Duration::from_millis(6),
            raycasting: Duration::from_millis(3),
            render: Duration::from_millis(8),
        };
        let fast = FrameBreakdown {
            frame: Duration::from_millis(400),
            simulation: Duration::from_millis(2),
            raycasting: Duration::from_millis(1),
            render: Duration::from_millis(4),
        };

        assert!(timer.record(slow).is_none());
        let report = timer.record(fast).expect("one second of frames");

        assert_eq!(
            report.average,
            FrameBreakdown {
                frame: Duration::from_millis(500),
                simulation: Duration::from_millis(4),
                raycasting: Duration::from_millis(2),
                render: Duration::from_millis(6),
            }
        );
    }
}
