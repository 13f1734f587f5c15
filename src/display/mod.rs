//! Rendering layer — all terminal output lives here.
//!
//! The world is scaled onto the terminal grid: row 0 holds the HUD, rows 1
//! and `height - 2` the border, the last row the controls hint.  No game
//! logic is performed; this module only translates world state into
//! terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use game_engine::entities::HEALTH_ITEM;
use game_engine::world::Renderer;
use game_engine::{Entity, EntityKind, GameState, GameWorld};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_HEALTH: Color = Color::Red;
const C_PLAYER: Color = Color::White;
const C_ENEMY: Color = Color::Red;
const C_ITEM_COIN: Color = Color::Yellow;
const C_ITEM_GEM: Color = Color::Cyan;
const C_ITEM_HEALTH: Color = Color::Magenta;
const C_HINT: Color = Color::DarkGrey;

const CONTROLS: &str = "← ↑ → ↓ / WASD : Move   P : Pause   Q : Quit";

pub struct TerminalRenderer<W: Write> {
    out: W,
    cols: u16,
    rows: u16,
    world_width: f32,
    world_height: f32,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            cols,
            rows,
            world_width: 1.0,
            world_height: 1.0,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    /// Map a world coordinate onto the inner play area.
    fn to_cell(&self, x: f32, y: f32) -> (u16, u16) {
        let inner_w = self.cols.saturating_sub(3) as f32;
        let inner_h = self.rows.saturating_sub(5) as f32;
        let fx = if self.world_width > 0.0 { x / self.world_width } else { 0.0 };
        let fy = if self.world_height > 0.0 { y / self.world_height } else { 0.0 };
        let col = 1 + (fx.clamp(0.0, 1.0) * inner_w).round() as u16;
        let row = 2 + (fy.clamp(0.0, 1.0) * inner_h).round() as u16;
        (col, row)
    }

    /// FPS readout, bottom-right.  Flushes.
    pub fn draw_fps(&mut self, fps: f32) -> std::io::Result<()> {
        let text = format!("{:>5.1} fps", fps);
        let col = self.cols.saturating_sub(text.chars().count() as u16 + 1);
        self.out.queue(cursor::MoveTo(col, self.rows.saturating_sub(1)))?;
        self.out.queue(style::SetForegroundColor(C_HINT))?;
        self.out.queue(Print(text))?;
        self.out.queue(style::ResetColor)?;
        self.out.flush()
    }

    // ── Border ────────────────────────────────────────────────────────────────

    fn draw_border(&mut self) -> std::io::Result<()> {
        let w = self.cols as usize;
        let h = self.rows;

        self.out.queue(style::SetForegroundColor(C_BORDER))?;

        self.out.queue(cursor::MoveTo(0, 1))?;
        self.out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

        self.out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
        self.out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

        for row in 2..h.saturating_sub(2) {
            self.out.queue(cursor::MoveTo(0, row))?;
            self.out.queue(Print("│"))?;
            self.out.queue(cursor::MoveTo(self.cols.saturating_sub(1), row))?;
            self.out.queue(Print("│"))?;
        }

        Ok(())
    }

    // ── HUD (row 0) ───────────────────────────────────────────────────────────

    fn draw_hud(&mut self, world: &GameWorld) -> std::io::Result<()> {
        let stats = world.player().and_then(Entity::as_player);
        let (score, health, max_health) = stats
            .map(|p| (p.score, p.health, p.max_health))
            .unwrap_or((0, 0, 0));

        self.out.queue(cursor::MoveTo(1, 0))?;
        self.out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
        self.out.queue(Print(format!("Score: {:>8}", score)))?;

        let (state_str, state_color) = match world.state() {
            GameState::Menu => ("[ MENU ]", Color::Cyan),
            GameState::Playing => ("[ PLAYING ]", Color::Green),
            GameState::Paused => ("[ PAUSED ]", Color::Yellow),
            GameState::GameOver => ("[ GAME OVER ]", Color::Red),
        };
        let sx = (self.cols / 2).saturating_sub(state_str.len() as u16 / 2);
        self.out.queue(cursor::MoveTo(sx, 0))?;
        self.out.queue(style::SetForegroundColor(state_color))?;
        self.out.queue(Print(state_str))?;

        let health_text = format!("Health: {:>3}/{}", health, max_health);
        let hx = self
            .cols
            .saturating_sub(health_text.chars().count() as u16 + 1);
        self.out.queue(cursor::MoveTo(hx, 0))?;
        self.out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
        self.out.queue(Print(&health_text))?;

        Ok(())
    }

    fn draw_controls_hint(&mut self) -> std::io::Result<()> {
        self.out.queue(cursor::MoveTo(1, self.rows.saturating_sub(1)))?;
        self.out.queue(style::SetForegroundColor(C_HINT))?;
        self.out.queue(Print(CONTROLS))?;
        Ok(())
    }

    // ── Overlays ──────────────────────────────────────────────────────────────

    fn draw_box(&mut self, lines: &[(&str, Color)]) -> std::io::Result<()> {
        let cx = self.cols / 2;
        let start_row = (self.rows / 2).saturating_sub(lines.len() as u16 / 2);

        for (i, (msg, color)) in lines.iter().enumerate() {
            let row = start_row + i as u16;
            let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
            self.out.queue(cursor::MoveTo(col, row))?;
            self.out.queue(style::SetForegroundColor(*color))?;
            self.out.queue(Print(*msg))?;
        }
        Ok(())
    }

    fn draw_overlay(&mut self, world: &GameWorld) -> std::io::Result<()> {
        match world.state() {
            GameState::Playing => Ok(()),
            GameState::Menu => self.draw_box(&[
                ("★  GAME  ENGINE  ★", Color::Cyan),
                ("", Color::White),
                ("$ coin   ◆ gem   ♥ health   X enemy", Color::DarkGrey),
                ("", Color::White),
                ("ENTER - Start   Q - Quit", Color::White),
            ]),
            GameState::Paused => self.draw_box(&[
                ("╔══════════════════╗", Color::Yellow),
                ("║      PAUSED      ║", Color::Yellow),
                ("╚══════════════════╝", Color::Yellow),
                ("P - Resume  Q - Quit", Color::White),
            ]),
            GameState::GameOver => {
                let score = world
                    .player()
                    .and_then(Entity::as_player)
                    .map(|p| p.score)
                    .unwrap_or(0);
                let score_line = format!("Final Score: {}", score);
                self.draw_box(&[
                    ("╔══════════════════╗", Color::Red),
                    ("║    GAME  OVER    ║", Color::Red),
                    ("╚══════════════════╝", Color::Red),
                    (&score_line, Color::Yellow),
                    ("R - Play Again  Q - Quit", Color::White),
                ])
            }
        }
    }
}

fn glyph(entity: &Entity) -> (&'static str, Color) {
    match &entity.kind {
        EntityKind::Player(_) => ("@", C_PLAYER),
        EntityKind::Enemy(_) => ("X", C_ENEMY),
        EntityKind::Item(item) => match item.item_type.as_str() {
            "gem" => ("◆", C_ITEM_GEM),
            HEALTH_ITEM => ("♥", C_ITEM_HEALTH),
            _ => ("$", C_ITEM_COIN),
        },
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn begin_frame(&mut self, world: &GameWorld) -> std::io::Result<()> {
        self.world_width = world.width();
        self.world_height = world.height();

        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        self.draw_border()?;
        self.draw_hud(world)
    }

    fn draw_entity(&mut self, entity: &Entity) -> std::io::Result<()> {
        let position = entity.position();
        let (col, row) = self.to_cell(position.x, position.y);
        let (symbol, color) = glyph(entity);
        self.out.queue(cursor::MoveTo(col, row))?;
        self.out.queue(style::SetForegroundColor(color))?;
        self.out.queue(Print(symbol))?;
        Ok(())
    }

    fn end_frame(&mut self, world: &GameWorld) -> std::io::Result<()> {
        self.draw_controls_hint()?;
        self.draw_overlay(world)?;

        // Park cursor in a harmless spot and flush
        self.out.queue(style::ResetColor)?;
        self.out.queue(cursor::MoveTo(0, self.rows.saturating_sub(1)))?;
        self.out.flush()
    }
}
