//! Top-level driver: owns the world and runs the variable-timestep frame loop.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::entities::GameState;
use crate::error::GameError;
use crate::world::{GameWorld, Renderer};

/// Smallest delta handed to the world, so the first frame never sees zero.
pub const MIN_DELTA: f32 = 0.0001;
/// Largest delta handed to the world; longer stalls (debugger, suspend) are cut.
pub const MAX_DELTA: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    Continue,
    Quit,
}

/// Presentation + input collaborator plugged into [`Game::run`].
pub trait Frontend: Renderer {
    /// Poll input and apply it to the world (player movement, state changes).
    fn handle_input(&mut self, world: &mut GameWorld) -> io::Result<InputCommand>;

    fn present_stats(&mut self, _fps: f32) -> io::Result<()> {
        Ok(())
    }
}

pub struct Game {
    config: EngineConfig,
    world: Option<GameWorld>,
    running: bool,
    last_frame_time: Instant,

    frame_count: u32,
    total_time: f32,
    average_fps: f32,
}

impl Game {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            world: None,
            running: false,
            last_frame_time: Instant::now(),
            frame_count: 0,
            total_time: 0.0,
            average_fps: 0.0,
        }
    }

    /// Build and populate a fresh world, entering `initial_state`
    /// (normally `Menu`, or `Playing` to skip it).
    pub fn initialize(&mut self, initial_state: GameState) -> Result<(), GameError> {
        let mut world = GameWorld::with_config(self.config.world.clone())?;
        world.initialize()?;
        world.set_state(initial_state);

        self.world = Some(world);
        self.running = true;
        self.frame_count = 0;
        self.total_time = 0.0;
        self.average_fps = 0.0;
        self.last_frame_time = Instant::now();
        log::info!("game initialised in {:?}", initial_state);
        Ok(())
    }

    /// Run frames until [`Game::stop`] is called (directly or via
    /// `InputCommand::Quit`).  The current frame always completes.
    pub fn run<F: Frontend>(&mut self, frontend: &mut F) -> Result<(), GameError> {
        if self.world.is_none() {
            self.initialize(GameState::Menu)?;
        }
        self.running = true;
        self.last_frame_time = Instant::now();
        log::info!("game loop started (cap: {:?} fps)", self.config.game.max_fps);

        while self.running {
            let frame_start = Instant::now();
            let delta_time = self.calculate_delta_time_at(frame_start);

            self.handle_input(frontend)?;
            self.update(delta_time);
            self.render(frontend)?;

            self.last_frame_time = frame_start;

            if let Some(budget) = self.frame_budget() {
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                }
            }
        }

        log::info!("game loop stopped after {:.1}s", self.world_elapsed());
        Ok(())
    }

    fn frame_budget(&self) -> Option<Duration> {
        self.config
            .game
            .max_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
    }

    fn world_elapsed(&self) -> f32 {
        self.world
            .as_ref()
            .map(|w| w.statistics().elapsed)
            .unwrap_or(0.0)
    }

    // ── Frame stages ─────────────────────────────────────────────────────────

    pub fn handle_input<F: Frontend>(&mut self, frontend: &mut F) -> io::Result<()> {
        if let Some(world) = self.world.as_mut() {
            if frontend.handle_input(world)? == InputCommand::Quit {
                self.stop();
            }
        }
        Ok(())
    }

    /// Step the world (only while playing) and account the frame.
    pub fn update(&mut self, delta_time: f32) {
        if let Some(world) = self.world.as_mut() {
            if world.state() == GameState::Playing {
                world.update(delta_time);
                world.purge_inactive();
            }
        }
        self.update_fps(delta_time);
    }

    pub fn render<F: Frontend>(&mut self, frontend: &mut F) -> io::Result<()> {
        if let Some(world) = self.world.as_ref() {
            world.render(frontend)?;
        }
        frontend.present_stats(self.average_fps)
    }

    // ── Timing ───────────────────────────────────────────────────────────────

    /// Seconds since the previous frame, clamped to `[MIN_DELTA, MAX_DELTA]`.
    pub fn calculate_delta_time(&self) -> f32 {
        self.calculate_delta_time_at(Instant::now())
    }

    pub fn calculate_delta_time_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.last_frame_time)
            .as_secs_f32()
            .clamp(MIN_DELTA, MAX_DELTA)
    }

    /// Running average over the current window; the window restarts every
    /// `fps_window` seconds so the figure tracks recent performance.
    pub fn update_fps(&mut self, delta_time: f32) {
        self.frame_count += 1;
        self.total_time += delta_time.max(0.0);
        if self.total_time > 0.0 {
            self.average_fps = self.frame_count as f32 / self.total_time;
        }
        if self.total_time >= self.config.game.fps_window {
            log::debug!("fps window closed: {:.1}", self.average_fps);
            self.frame_count = 0;
            self.total_time = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.average_fps
    }

    pub fn display_fps(&self) {
        log::info!("FPS: {:.1}", self.average_fps);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Release the world and every entity it owns.
    pub fn shutdown(&mut self) {
        self.running = false;
        if let Some(world) = self.world.take() {
            world.display_statistics();
        }
        self.display_fps();
        log::info!("game shut down");
    }

    pub fn world(&self) -> Option<&GameWorld> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut GameWorld> {
        self.world.as_mut()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
