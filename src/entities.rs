//! Simulated entities: one struct carrying the shared spatial state plus a
//! closed set of kind-specific payloads (player, enemy, item).

use crate::error::GameError;
use crate::events::ScoreEvent;
use crate::vector::Vector2D;
use crate::world::Renderer;

// ── Per-kind defaults ─────────────────────────────────────────────────────────

pub const DEFAULT_PLAYER_RADIUS: f32 = 20.0;
pub const DEFAULT_PLAYER_HEALTH: i32 = 100;
pub const DEFAULT_PLAYER_SPEED: f32 = 200.0;

pub const DEFAULT_ENEMY_RADIUS: f32 = 15.0;
pub const DEFAULT_ENEMY_DAMAGE: i32 = 10;
pub const DEFAULT_ENEMY_SPEED: f32 = 100.0;

pub const DEFAULT_ITEM_RADIUS: f32 = 10.0;

/// Item type that restores health instead of adding score.
pub const HEALTH_ITEM: &str = "health";

/// Enemies closer than this to their target stop instead of jittering.
const ARRIVE_EPSILON: f32 = 0.01;

// ── Identity & state ─────────────────────────────────────────────────────────

/// Allocated by the owning world; never reused while that world lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Menu,
    Playing,
    Paused,
    GameOver,
}

// ── Kind payloads ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStats {
    pub health: i32,
    pub max_health: i32,
    pub score: i32,
    pub speed: f32,
}

impl PlayerStats {
    /// Subtract `damage`, keeping health within `0..=max_health`.  Returns
    /// `true` once health is gone.
    pub fn take_damage(&mut self, damage: i32) -> bool {
        self.health = self.health.saturating_sub(damage).min(self.max_health).max(0);
        self.health == 0
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    /// Saturating; returns the new score.
    pub fn add_score(&mut self, points: i32) -> i32 {
        self.score = self.score.saturating_add(points);
        self.score
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnemyStats {
    pub damage: i32,
    pub speed: f32,
    pub target: Vector2D,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemStats {
    pub value: i32,
    pub item_type: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Player(PlayerStats),
    Enemy(EnemyStats),
    Item(ItemStats),
}

// ── Entity ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    name: String,
    position: Vector2D,
    velocity: Vector2D,
    active: bool,
    radius: f32,
    pub kind: EntityKind,
}

fn checked(position: Vector2D) -> Result<Vector2D, GameError> {
    if position.is_finite() {
        Ok(position)
    } else {
        Err(GameError::InvalidPosition {
            x: position.x,
            y: position.y,
        })
    }
}

impl Entity {
    fn new(
        id: EntityId,
        name: impl Into<String>,
        position: Vector2D,
        radius: f32,
        kind: EntityKind,
    ) -> Result<Self, GameError> {
        Ok(Self {
            id,
            name: name.into(),
            position: checked(position)?,
            velocity: Vector2D::ZERO,
            active: true,
            radius,
            kind,
        })
    }

    pub fn player(id: EntityId, name: impl Into<String>, position: Vector2D) -> Result<Self, GameError> {
        let stats = PlayerStats {
            health: DEFAULT_PLAYER_HEALTH,
            max_health: DEFAULT_PLAYER_HEALTH,
            score: 0,
            speed: DEFAULT_PLAYER_SPEED,
        };
        Self::new(id, name, position, DEFAULT_PLAYER_RADIUS, EntityKind::Player(stats))
    }

    /// A fresh enemy targets its own spawn point until told otherwise.
    pub fn enemy(id: EntityId, name: impl Into<String>, position: Vector2D) -> Result<Self, GameError> {
        let stats = EnemyStats {
            damage: DEFAULT_ENEMY_DAMAGE,
            speed: DEFAULT_ENEMY_SPEED,
            target: position,
        };
        Self::new(id, name, position, DEFAULT_ENEMY_RADIUS, EntityKind::Enemy(stats))
    }

    pub fn item(
        id: EntityId,
        name: impl Into<String>,
        item_type: impl Into<String>,
        value: i32,
        position: Vector2D,
    ) -> Result<Self, GameError> {
        let stats = ItemStats {
            value,
            item_type: item_type.into(),
        };
        Self::new(id, name, position, DEFAULT_ITEM_RADIUS, EntityKind::Item(stats))
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }

    pub fn velocity(&self) -> Vector2D {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_position(&mut self, position: Vector2D) -> Result<(), GameError> {
        self.position = checked(position)?;
        Ok(())
    }

    /// Unchecked move for positions the world already knows are finite.
    pub(crate) fn place(&mut self, position: Vector2D) {
        self.position = position;
    }

    pub fn set_velocity(&mut self, velocity: Vector2D) -> Result<(), GameError> {
        self.velocity = checked(velocity)?;
        Ok(())
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Player(_) => "player",
            EntityKind::Enemy(_) => "enemy",
            EntityKind::Item(_) => "item",
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn as_player(&self) -> Option<&PlayerStats> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerStats> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<&EnemyStats> {
        match &self.kind {
            EntityKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut EnemyStats> {
        match &mut self.kind {
            EntityKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&ItemStats> {
        match &self.kind {
            EntityKind::Item(i) => Some(i),
            _ => None,
        }
    }

    // ── Per-frame behaviour ──────────────────────────────────────────────────

    /// Advance one frame.  Enemies steer toward their target first; players
    /// and items only drift by whatever velocity they already carry.
    pub fn update(&mut self, delta_time: f32) {
        if !self.active || delta_time <= 0.0 {
            return;
        }

        if let EntityKind::Enemy(enemy) = &self.kind {
            let to_target = enemy.target - self.position;
            let distance = to_target.magnitude();
            self.velocity = if distance <= ARRIVE_EPSILON {
                Vector2D::ZERO
            } else if enemy.speed * delta_time >= distance {
                // Land on the target rather than overshooting it.
                to_target * (1.0 / delta_time)
            } else {
                to_target.normalized() * enemy.speed
            };
        }

        self.position += self.velocity * delta_time;
    }

    /// Hand this entity to the presentation layer.  Never touches simulation state.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> std::io::Result<()> {
        renderer.draw_entity(self)
    }

    /// Both sides active and closer than the sum of their radii.
    pub fn check_collision(&self, other: &Entity) -> bool {
        self.active
            && other.active
            && self.position.distance(&other.position) < self.radius + other.radius
    }

    /// React to touching `other`.  `other` is a snapshot taken before either
    /// side reacted.  Returns a score event when the player's score changed.
    pub fn on_collision(&mut self, other: &Entity) -> Option<ScoreEvent> {
        match (&mut self.kind, &other.kind) {
            (EntityKind::Player(player), EntityKind::Enemy(enemy)) => {
                player.take_damage(enemy.damage);
                log::debug!(
                    "{} hit by {} for {} (health {})",
                    self.name,
                    other.name,
                    enemy.damage,
                    player.health
                );
                None
            }
            (EntityKind::Player(player), EntityKind::Item(item)) if other.active => {
                if item.item_type == HEALTH_ITEM {
                    player.heal(item.value);
                    None
                } else {
                    Some(ScoreEvent {
                        score: player.add_score(item.value),
                        player_name: self.name.clone(),
                    })
                }
            }
            (EntityKind::Item(_), EntityKind::Player(_)) => {
                self.active = false;
                None
            }
            _ => None,
        }
    }

    pub fn on_destroy(&self) {
        log::debug!("{} {} '{}' destroyed", self.kind_name(), self.id, self.name);
    }

    // ── Player-only operations (no-ops on other kinds) ──────────────────────

    /// Returns `true` when this is a player whose health just reached zero.
    pub fn take_damage(&mut self, damage: i32) -> bool {
        self.as_player_mut()
            .map(|p| p.take_damage(damage))
            .unwrap_or(false)
    }

    pub fn heal(&mut self, amount: i32) {
        if let Some(p) = self.as_player_mut() {
            p.heal(amount);
        }
    }

    pub fn add_score(&mut self, points: i32) -> Option<ScoreEvent> {
        let score = self.as_player_mut()?.add_score(points);
        Some(ScoreEvent {
            score,
            player_name: self.name.clone(),
        })
    }

    /// Players: health above zero.  Other kinds are always "alive".
    pub fn is_alive(&self) -> bool {
        self.as_player().map(PlayerStats::is_alive).unwrap_or(true)
    }

    /// Displace by `speed * dt` along `direction`, which need not be normalised.
    /// A zero direction leaves the entity in place.
    pub fn move_by(&mut self, direction: Vector2D, speed: f32, dt: f32) -> Result<(), GameError> {
        let step = direction.normalized() * (speed * dt);
        self.set_position(self.position + step)
    }

    fn player_speed(&self) -> Option<f32> {
        self.as_player().map(|p| p.speed)
    }

    pub fn move_up(&mut self) {
        if let Some(speed) = self.player_speed() {
            self.velocity.y = -speed;
        }
    }

    pub fn move_down(&mut self) {
        if let Some(speed) = self.player_speed() {
            self.velocity.y = speed;
        }
    }

    pub fn move_left(&mut self) {
        if let Some(speed) = self.player_speed() {
            self.velocity.x = -speed;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(speed) = self.player_speed() {
            self.velocity.x = speed;
        }
    }

    pub fn halt(&mut self) {
        self.velocity = Vector2D::ZERO;
    }

    /// Point an enemy at `target`.  Ignored for other kinds.
    pub fn set_target(&mut self, target: Vector2D) {
        if let Some(enemy) = self.as_enemy_mut() {
            enemy.target = target;
        }
    }
}
