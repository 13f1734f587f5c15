mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use env_logger::{Builder, Env, Target};

use display::TerminalRenderer;
use game_engine::{
    EngineConfig, Entity, Frontend, Game, GameState, GameWorld, InputCommand, Renderer,
};

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms at
/// 30 FPS) is always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

#[derive(Debug, Parser)]
#[command(name = "game_engine", about = "Terminal frontend for the 2D game-engine core")]
struct Cli {
    /// TOML file overriding world and loop settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame-rate cap; 0 runs uncapped.
    #[arg(long)]
    max_fps: Option<u32>,

    /// Skip the menu and start playing immediately.
    #[arg(long)]
    play: bool,

    /// Where log output goes (the terminal itself is busy drawing).
    #[arg(long, default_value = "game_engine.log")]
    log_file: PathBuf,
}

// ── Terminal frontend ─────────────────────────────────────────────────────────

/// Input model: instead of acting on each key event individually, we keep a
/// `key_frame` map recording the frame of the last press/repeat event for
/// every key.  Each frame, keys still "fresh" (within `HOLD_WINDOW` frames)
/// steer the player together, so diagonals work.
///
/// Keyboard-enhancement capable terminals (kitty protocol) also send
/// `Release` events, which drop the key immediately.
struct TerminalFrontend<W: Write> {
    renderer: TerminalRenderer<W>,
    rx: mpsc::Receiver<Event>,
    key_frame: HashMap<KeyCode, u64>,
    frame: u64,
}

fn is_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|key| {
        key_frame
            .get(key)
            .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
            .unwrap_or(false)
    })
}

impl<W: Write> TerminalFrontend<W> {
    /// One-shot actions bound to a key press.
    fn on_press(
        &mut self,
        world: &mut GameWorld,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> InputCommand {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return InputCommand::Quit,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return InputCommand::Quit;
            }
            KeyCode::Enter if world.state() == GameState::Menu => {
                world.set_state(GameState::Playing);
            }
            KeyCode::Char('p') | KeyCode::Char('P') => match world.state() {
                GameState::Playing => world.set_state(GameState::Paused),
                GameState::Paused => world.set_state(GameState::Playing),
                _ => {}
            },
            KeyCode::Char('r') | KeyCode::Char('R') if world.state() == GameState::GameOver => {
                if let Err(err) = world.initialize() {
                    log::error!("restart failed: {}", err);
                }
            }
            _ => {}
        }
        InputCommand::Continue
    }

    fn steer(&self, player: &mut Entity) {
        let up = is_held(
            &self.key_frame,
            &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')],
            self.frame,
        );
        let down = is_held(
            &self.key_frame,
            &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')],
            self.frame,
        );
        let left = is_held(
            &self.key_frame,
            &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
            self.frame,
        );
        let right = is_held(
            &self.key_frame,
            &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
            self.frame,
        );

        player.halt();
        if up {
            player.move_up();
        } else if down {
            player.move_down();
        }
        if left {
            player.move_left();
        } else if right {
            player.move_right();
        }
    }
}

impl<W: Write> Renderer for TerminalFrontend<W> {
    fn begin_frame(&mut self, world: &GameWorld) -> std::io::Result<()> {
        self.renderer.begin_frame(world)
    }

    fn draw_entity(&mut self, entity: &Entity) -> std::io::Result<()> {
        self.renderer.draw_entity(entity)
    }

    fn end_frame(&mut self, world: &GameWorld) -> std::io::Result<()> {
        self.renderer.end_frame(world)
    }
}

impl<W: Write> Frontend for TerminalFrontend<W> {
    fn handle_input(&mut self, world: &mut GameWorld) -> std::io::Result<InputCommand> {
        self.frame += 1;

        // Drain all pending input events (non-blocking)
        while let Ok(ev) = self.rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind,
                    modifiers,
                    ..
                }) => match kind {
                    KeyEventKind::Press => {
                        self.key_frame.insert(code, self.frame);
                        if self.on_press(world, code, modifiers) == InputCommand::Quit {
                            return Ok(InputCommand::Quit);
                        }
                    }
                    KeyEventKind::Repeat => {
                        self.key_frame.insert(code, self.frame);
                    }
                    KeyEventKind::Release => {
                        self.key_frame.remove(&code);
                    }
                },
                Event::Resize(cols, rows) => self.renderer.resize(cols, rows),
                _ => {}
            }
        }

        if world.state() == GameState::Playing {
            if let Some(player) = world.player_mut() {
                self.steer(player);
            }
        }
        Ok(InputCommand::Continue)
    }

    fn present_stats(&mut self, fps: f32) -> std::io::Result<()> {
        self.renderer.draw_fps(fps)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(fps) = cli.max_fps {
        config.game.max_fps = (fps > 0).then_some(fps);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;
    // The default hook writes to stderr, which would tear through the
    // alternate screen; listener panics are caught and must stay quiet.
    std::panic::set_hook(Box::new(|info| log::error!("{info}")));
    let config = load_config(&cli)?;

    let mut out = BufWriter::new(stdout());
    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the frame loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let (cols, rows) = terminal::size()?;
    let mut frontend = TerminalFrontend {
        renderer: TerminalRenderer::new(out, cols, rows),
        rx,
        key_frame: HashMap::new(),
        frame: 0,
    };

    let result = run(config, cli.play, &mut frontend);

    // Always restore the terminal
    let out: &mut BufWriter<Stdout> = frontend.renderer.out();
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(config: EngineConfig, play: bool, frontend: &mut TerminalFrontend<W>) -> Result<()> {
    let mut game = Game::new(config);
    game.initialize(if play { GameState::Playing } else { GameState::Menu })?;

    if let Some(world) = game.world_mut() {
        world.add_collision_listener(|event| {
            log::debug!("{} touched {} at {}", event.object1, event.object2, event.position);
            Ok(())
        });
        world.add_score_listener(|event| {
            log::info!("{} scored: {}", event.player_name, event.score);
            Ok(())
        });
    }

    game.run(frontend)?;
    game.shutdown();
    Ok(())
}
