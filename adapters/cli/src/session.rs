//! Game session driving the world and its systems from frame input.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use escape_block_core::{Command, Event, GameSetup, GameState, Tunables, Vec2D};
use escape_block_rendering::{
    chaser_tint, ColumnSample, FrameInput, FrameSimulationBreakdown, GameOverOverlay, Scene,
};
use escape_block_system_map_generation::MapGenerator;
use escape_block_system_movement::{Movement, PlayerIntent};
use escape_block_system_pathfinding::PathFinder;
use escape_block_system_pursuit::{Pursuit, PursuitCadence};
use escape_block_system_raycasting::RayCaster;
use escape_block_world::{self as world, query, World};
use rand_chacha::ChaCha8Rng;
use tracing::error;

/// Longest frame delta fed into the physics accumulator.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// How a headless run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The chaser reached the player after `ticks` physics ticks.
    Caught { ticks: u32, survived: Duration },
    /// The player was still free when the tick budget ran out.
    Survived { ticks: u32 },
}

/// World plus the systems that advance it on a fixed physics step.
#[derive(Debug)]
pub(crate) struct Session {
    tunables: Tunables,
    generator: MapGenerator,
    rng: ChaCha8Rng,
    world: World,
    movement: Movement,
    pursuit: Pursuit,
    tick_interval: Duration,
    accumulator: Duration,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Session {
    pub(crate) fn new(tunables: Tunables, mut rng: ChaCha8Rng) -> Result<Self> {
        let generator = MapGenerator::new(tunables.grid.clone());
        let setup = generator
            .new_game(tunables.grid.size, &mut rng)
            .context("failed to generate the first map")?;
        let world = World::new(setup, &tunables.player).context("generated map is inconsistent")?;
        let movement = Movement::new(tunables.player.clone());
        let pursuit = Pursuit::new(
            PursuitCadence::from_tunables(&tunables.pursuit),
            PathFinder::default(),
        );
        let tick_interval = tunables.player.tick_interval();

        Ok(Self {
            tunables,
            generator,
            rng,
            world,
            movement,
            pursuit,
            tick_interval,
            accumulator: Duration::ZERO,
            commands: Vec::new(),
            events: Vec::new(),
        })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Replaces the current game with a freshly generated one.
    pub(crate) fn restart(&mut self) -> Result<()> {
        let setup = self
            .generator
            .new_game(self.tunables.grid.size, &mut self.rng)
            .context("failed to generate a new map")?;
        self.start(setup)
    }

    fn start(&mut self, setup: GameSetup) -> Result<()> {
        self.events.clear();
        self.accumulator = Duration::ZERO;
        world::apply(&mut self.world, Command::StartGame { setup }, &mut self.events);
        if let Some(Event::StartRejected { reason }) = self
            .events
            .iter()
            .find(|event| matches!(event, Event::StartRejected { .. }))
        {
            bail!("world refused the new game: {reason:?}");
        }
        self.run_pursuit();
        Ok(())
    }

    /// Runs every whole physics tick contained in `dt` and returns how many ran.
    pub(crate) fn advance(&mut self, dt: Duration, intent: PlayerIntent) -> u32 {
        self.accumulator = self.accumulator.saturating_add(dt.min(MAX_FRAME_DELTA));

        let mut ticks = 0;
        while self.accumulator >= self.tick_interval {
            self.accumulator -= self.tick_interval;
            self.physics_tick(intent);
            ticks += 1;
        }
        ticks
    }

    fn physics_tick(&mut self, intent: PlayerIntent) {
        self.events.clear();
        self.commands.clear();

        self.movement.handle(
            intent,
            query::game_state(&self.world),
            query::grid(&self.world),
            query::player(&self.world),
            &mut self.commands,
        );
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        world::apply(
            &mut self.world,
            Command::Tick {
                dt: self.tick_interval,
            },
            &mut self.events,
        );
        self.run_pursuit();
    }

    fn run_pursuit(&mut self) {
        self.commands.clear();
        self.pursuit.handle(
            &self.events,
            query::game_state(&self.world),
            query::grid(&self.world),
            query::chaser(&self.world),
            query::player_cell(&self.world),
            &mut self.commands,
        );

        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Casts one ray per column from the player's camera into `samples`.
    pub(crate) fn cast_columns(&self, columns: usize, samples: &mut Vec<ColumnSample>) -> Result<()> {
        samples.clear();
        let pose = query::player(&self.world);
        let caster = RayCaster::new(
            query::grid(&self.world),
            pose.position,
            pose.direction,
            pose.viewport,
        )
        .context("player camera cannot be ray cast")?;
        samples.extend(caster.columns(columns).map(ColumnSample::from));
        Ok(())
    }

    /// Advances the session by one rendered frame and refreshes `scene`.
    pub(crate) fn update_frame(
        &mut self,
        dt: Duration,
        input: FrameInput,
        scene: &mut Scene,
    ) -> FrameSimulationBreakdown {
        let simulation_start = Instant::now();
        if input.restart && query::game_state(&self.world) == GameState::GameOver {
            if let Err(error) = self.restart() {
                error!(error = %format!("{error:#}"), "restart_failed");
            }
        }
        let _ = self.advance(dt, intent_from_input(&input, self.tunables.player.turn_rate));
        let simulation = simulation_start.elapsed();

        let raycasting_start = Instant::now();
        if let Err(error) = self.cast_columns(input.columns, &mut scene.samples) {
            error!(error = %format!("{error:#}"), "raycast_failed");
        }
        let raycasting = raycasting_start.elapsed();

        let elapsed = query::elapsed(&self.world);
        scene.palette.chaser = chaser_tint(elapsed, self.tunables.pursuit.ramp_up());
        scene.game_over = match query::game_state(&self.world) {
            GameState::GameOver => Some(GameOverOverlay { survived: elapsed }),
            GameState::Active => None,
        };

        FrameSimulationBreakdown {
            simulation,
            raycasting,
        }
    }

    /// Runs up to `ticks` physics ticks with a stationary player.
    pub(crate) fn run_headless(&mut self, ticks: u32) -> Outcome {
        for tick in 1..=ticks {
            self.physics_tick(PlayerIntent::IDLE);
            if query::game_state(&self.world) == GameState::GameOver {
                return Outcome::Caught {
                    ticks: tick,
                    survived: query::elapsed(&self.world),
                };
            }
        }
        Outcome::Survived { ticks }
    }
}

/// Converts backend input into a per-tick player intent.
pub(crate) fn intent_from_input(input: &FrameInput, turn_rate: f64) -> PlayerIntent {
    PlayerIntent::new(
        Vec2D::new(f64::from(input.movement.x), f64::from(input.movement.y)),
        f64::from(input.turn) * turn_rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_block_core::{CellCode, GridTunables, GridVec};
    use glam::Vec2;
    use rand::SeedableRng;

    fn small_tunables() -> Tunables {
        Tunables {
            grid: GridTunables {
                size: 12,
                ..GridTunables::default()
            },
            ..Tunables::default()
        }
    }

    fn session(seed: u64) -> Session {
        Session::new(small_tunables(), ChaCha8Rng::seed_from_u64(seed)).expect("valid session")
    }

    #[test]
    fn accumulator_runs_whole_ticks_only() {
        let mut session = session(7);

        assert_eq!(session.advance(Duration::from_millis(100), PlayerIntent::IDLE), 6);
        assert_eq!(session.advance(Duration::from_millis(10), PlayerIntent::IDLE), 0);
        assert_eq!(session.advance(Duration::from_millis(10), PlayerIntent::IDLE), 1);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut session = session(7);

        let ticks = session.advance(Duration::from_secs(5), PlayerIntent::IDLE);

        assert_eq!(ticks, 15);
    }

    #[test]
    fn stationary_player_is_eventually_caught() {
        let mut session = session(42);

        let outcome = session.run_headless(60 * 120);

        match outcome {
            Outcome::Caught { ticks, survived } => {
                assert!(ticks > 0);
                assert_eq!(survived, session.tick_interval * ticks);
            }
            Outcome::Survived { .. } => panic!("chaser never reached the player"),
        }
        assert!(query::chaser_caught_player(session.world()));
    }

    #[test]
    fn restart_after_game_over_starts_a_fresh_game() {
        let mut session = session(42);
        let _ = session.run_headless(60 * 120);
        assert_eq!(query::game_state(session.world()), GameState::GameOver);

        let mut scene = Scene::default();
        let input = FrameInput {
            restart: true,
            columns: 8,
            ..FrameInput::default()
        };
        let _ = session.update_frame(Duration::ZERO, input, &mut scene);

        assert_eq!(query::game_state(session.world()), GameState::Active);
        assert_eq!(query::elapsed(session.world()), Duration::ZERO);
        assert!(scene.game_over.is_none());
        assert_eq!(scene.samples.len(), 8);
        let grid = query::grid(session.world());
        assert_eq!(grid.cells_with(CellCode::Chaser).count(), 1);
    }

    #[test]
    fn refused_start_is_reported_and_keeps_the_current_game() {
        let mut session = session(5);
        let chaser = query::chaser(session.world());
        let grid = query::grid(session.world()).clone();
        let unmarked = GridVec::new(chaser.x() + 1, chaser.y());

        let result = session.start(GameSetup::new(grid, Vec2D::new(5.5, 5.5), unmarked));

        assert!(result.is_err());
        assert_eq!(query::chaser(session.world()), chaser);
        assert_eq!(query::game_state(session.world()), GameState::Active);
    }

    #[test]
    fn game_over_frame_shows_the_overlay() {
        let mut session = session(3);
        let _ = session.run_headless(60 * 120);

        let mut scene = Scene::default();
        let _ = session.update_frame(Duration::ZERO, FrameInput::default(), &mut scene);

        let overlay = scene.game_over.expect("overlay after game over");
        assert_eq!(overlay.survived, query::elapsed(session.world()));
    }

    #[test]
    fn turn_input_scales_by_turn_rate() {
        let input = FrameInput {
            movement: Vec2::new(1.0, -1.0),
            turn: -1.0,
            ..FrameInput::default()
        };

        let intent = intent_from_input(&input, 0.05);

        assert_eq!(intent.movement(), Vec2D::new(1.0, -1.0));
        assert!((intent.rotation() + 0.05).abs() < 1e-9);
    }
}
