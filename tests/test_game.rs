use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use game_engine::config::{EngineConfig, GameConfig};
use game_engine::entities::{Entity, GameState};
use game_engine::game::{Frontend, Game, InputCommand, MAX_DELTA, MIN_DELTA};
use game_engine::vector::Vector2D;
use game_engine::world::{GameWorld, Renderer};

fn uncapped() -> EngineConfig {
    EngineConfig {
        game: GameConfig {
            max_fps: None,
            fps_window: 1.0,
        },
        ..EngineConfig::default()
    }
}

/// Quits after a fixed number of frames and records what it saw.
struct Scripted {
    quit_after: usize,
    inputs: usize,
    frames_rendered: usize,
    entities_drawn: usize,
    last_fps: f32,
}

impl Scripted {
    fn new(quit_after: usize) -> Self {
        Self {
            quit_after,
            inputs: 0,
            frames_rendered: 0,
            entities_drawn: 0,
            last_fps: 0.0,
        }
    }
}

impl Renderer for Scripted {
    fn begin_frame(&mut self, _world: &GameWorld) -> std::io::Result<()> {
        self.frames_rendered += 1;
        Ok(())
    }

    fn draw_entity(&mut self, _entity: &Entity) -> std::io::Result<()> {
        self.entities_drawn += 1;
        Ok(())
    }
}

impl Frontend for Scripted {
    fn handle_input(&mut self, _world: &mut GameWorld) -> std::io::Result<InputCommand> {
        self.inputs += 1;
        if self.inputs >= self.quit_after {
            Ok(InputCommand::Quit)
        } else {
            Ok(InputCommand::Continue)
        }
    }

    fn present_stats(&mut self, fps: f32) -> std::io::Result<()> {
        self.last_fps = fps;
        Ok(())
    }
}

// ── Timing ────────────────────────────────────────────────────────────────────

#[test]
fn delta_time_is_clamped() {
    let game = Game::new(uncapped());
    let now = Instant::now();

    let dt = game.calculate_delta_time();
    assert!((MIN_DELTA..=MAX_DELTA).contains(&dt));

    // A timestamp older than the previous frame never yields zero
    assert_eq!(game.calculate_delta_time_at(now - Duration::from_secs(1)), MIN_DELTA);

    // A long stall is cut down
    assert_eq!(game.calculate_delta_time_at(now + Duration::from_secs(10)), MAX_DELTA);
}

#[test]
fn fps_averages_over_a_resetting_window() {
    let mut game = Game::new(uncapped());
    assert_eq!(game.fps(), 0.0);

    game.update_fps(0.25);
    game.update_fps(0.25);
    assert_relative_eq!(game.fps(), 4.0);

    game.update_fps(0.5); // window of 1.0s closes here
    assert_relative_eq!(game.fps(), 3.0);

    game.update_fps(0.125); // fresh window
    assert_relative_eq!(game.fps(), 8.0);
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn initialize_builds_a_populated_world() {
    let mut game = Game::new(uncapped());
    assert!(game.world().is_none());

    game.initialize(GameState::Menu).unwrap();

    let world = game.world().unwrap();
    assert_eq!(world.state(), GameState::Menu);
    assert!(world.player().is_some());
    assert!(game.is_running());
}

#[test]
fn world_only_advances_while_playing() {
    let mut game = Game::new(uncapped());
    game.initialize(GameState::Menu).unwrap();

    let player = game.world_mut().unwrap().player_mut().unwrap();
    let start = player.position();
    player.set_velocity(Vector2D::new(100.0, 0.0)).unwrap();

    game.update(0.1);
    assert_eq!(game.world().unwrap().player().unwrap().position(), start);

    game.world_mut().unwrap().set_state(GameState::Playing);
    game.update(0.1);
    let moved = game.world().unwrap().player().unwrap().position();
    assert_relative_eq!(moved.x, start.x + 10.0, epsilon = 1e-3);
}

#[test]
fn quit_command_stops_after_completing_the_frame() {
    let mut game = Game::new(uncapped());
    game.initialize(GameState::Playing).unwrap();

    let mut frontend = Scripted::new(3);
    game.run(&mut frontend).unwrap();

    assert!(!game.is_running());
    assert_eq!(frontend.inputs, 3);
    assert_eq!(frontend.frames_rendered, 3);
    assert!(frontend.entities_drawn >= 3); // the player, every frame
    assert!(frontend.last_fps > 0.0);
}

#[test]
fn run_initializes_on_demand() {
    let mut game = Game::new(uncapped());
    let mut frontend = Scripted::new(1);
    game.run(&mut frontend).unwrap();

    assert_eq!(game.world().unwrap().state(), GameState::Menu);
    assert_eq!(frontend.frames_rendered, 1);
}

#[test]
fn stop_and_shutdown() {
    let mut game = Game::new(uncapped());
    game.initialize(GameState::Playing).unwrap();

    game.stop();
    assert!(!game.is_running());

    game.shutdown();
    assert!(game.world().is_none());
}
