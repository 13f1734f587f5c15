//! The world: owns every entity, steps them once per frame, detects
//! collisions and fires gameplay events.
//!
//! Entities live in a slot arena.  Removing one frees its slot without
//! shifting the others, and the freed slot is reused by the next insertion.
//! Ids come from a counter owned by the world, so they stay unique for the
//! world's lifetime regardless of slot reuse.

use std::io;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::WorldConfig;
use crate::entities::{Entity, EntityId, GameState, HEALTH_ITEM};
use crate::error::GameError;
use crate::events::{CollisionEvent, EventSystem, ScoreEvent};
use crate::vector::Vector2D;

/// Presentation collaborator.  The world calls `draw_entity` once per active
/// entity per frame, bracketed by `begin_frame` / `end_frame`.
pub trait Renderer {
    fn begin_frame(&mut self, _world: &GameWorld) -> io::Result<()> {
        Ok(())
    }

    fn draw_entity(&mut self, entity: &Entity) -> io::Result<()>;

    fn end_frame(&mut self, _world: &GameWorld) -> io::Result<()> {
        Ok(())
    }
}

// ── Spawn tables ─────────────────────────────────────────────────────────────

/// (type, value) pairs for randomly spawned items.
const ITEM_TABLE: &[(&str, i32)] = &[("coin", 10), ("gem", 50), (HEALTH_ITEM, 25)];

// ── Statistics ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldStats {
    pub enemies: usize,
    pub items: usize,
    pub active_entities: usize,
    pub frames: u64,
    /// Simulated seconds.
    pub elapsed: f32,
    pub collisions: u64,
    pub enemies_spawned: u64,
    pub items_spawned: u64,
}

impl std::fmt::Display for WorldStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames over {:.1}s, {} enemies / {} items ({} active), \
             {} collisions, spawned {} enemies / {} items",
            self.frames,
            self.elapsed,
            self.enemies,
            self.items,
            self.active_entities,
            self.collisions,
            self.enemies_spawned,
            self.items_spawned
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Counters {
    frames: u64,
    elapsed: f32,
    collisions: u64,
    enemies_spawned: u64,
    items_spawned: u64,
}

/// Where an entity taking part in a collision lives.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Player,
    Index(usize),
}

// ── World ────────────────────────────────────────────────────────────────────

pub struct GameWorld {
    config: WorldConfig,
    slots: Vec<Option<Entity>>,
    free_slots: Vec<usize>,
    player: Option<Entity>,
    state: GameState,
    collision_events: EventSystem<CollisionEvent>,
    score_events: EventSystem<ScoreEvent>,
    rng: StdRng,
    next_id: u64,
    enemy_spawn_timer: f32,
    item_spawn_timer: f32,
    counters: Counters,
}

fn clamp_into(position: Vector2D, width: f32, height: f32) -> Vector2D {
    Vector2D::new(position.x.clamp(0.0, width), position.y.clamp(0.0, height))
}

impl GameWorld {
    /// A world with default stats and the given bounds.
    pub fn new(width: f32, height: f32) -> Result<Self, GameError> {
        Self::with_config(WorldConfig {
            width,
            height,
            ..WorldConfig::default()
        })
    }

    /// RNG seeded once from OS entropy.
    pub fn with_config(config: WorldConfig) -> Result<Self, GameError> {
        Self::with_config_and_rng(config, StdRng::from_entropy())
    }

    pub fn with_config_and_rng(config: WorldConfig, rng: StdRng) -> Result<Self, GameError> {
        let (width, height) = (config.width, config.height);
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(GameError::InvalidBounds { width, height });
        }
        Ok(Self {
            config,
            slots: Vec::new(),
            free_slots: Vec::new(),
            player: None,
            state: GameState::Menu,
            collision_events: EventSystem::new(),
            score_events: EventSystem::new(),
            rng,
            next_id: 0,
            enemy_spawn_timer: 0.0,
            item_spawn_timer: 0.0,
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn width(&self) -> f32 {
        self.config.width
    }

    pub fn height(&self) -> f32 {
        self.config.height
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Drop everything, then place the player at the centre with the
    /// configured opening wave of enemies and items.
    pub fn initialize(&mut self) -> Result<(), GameError> {
        self.cleanup();

        let centre = Vector2D::new(self.width() / 2.0, self.height() / 2.0);
        let player = self.create_player("Player", centre)?;
        self.set_player(player)?;

        for _ in 0..self.config.initial_enemies {
            self.spawn_enemy()?;
        }
        for _ in 0..self.config.initial_items {
            self.spawn_item()?;
        }

        self.state = GameState::Playing;
        log::info!(
            "world initialised: {}x{}, {} entities",
            self.width(),
            self.height(),
            self.len()
        );
        Ok(())
    }

    /// Destroy every entity and the player and reset ids, timers and stats.
    /// Registered listeners are kept.
    pub fn cleanup(&mut self) {
        for entity in self.slots.drain(..).flatten() {
            entity.on_destroy();
        }
        if let Some(player) = self.player.take() {
            player.on_destroy();
        }
        self.free_slots.clear();
        self.next_id = 0;
        self.enemy_spawn_timer = 0.0;
        self.item_spawn_timer = 0.0;
        self.counters = Counters::default();
        self.state = GameState::Menu;
    }

    // ── Factories ────────────────────────────────────────────────────────────

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn create_player(&mut self, name: &str, position: Vector2D) -> Result<Entity, GameError> {
        let mut player = Entity::player(self.allocate_id(), name, position)?
            .with_radius(self.config.player_radius);
        if let Some(stats) = player.as_player_mut() {
            stats.health = self.config.player_health;
            stats.max_health = self.config.player_health;
            stats.speed = self.config.player_speed;
        }
        Ok(player)
    }

    pub fn create_enemy(&mut self, name: &str, position: Vector2D) -> Result<Entity, GameError> {
        let mut enemy = Entity::enemy(self.allocate_id(), name, position)?
            .with_radius(self.config.enemy_radius);
        if let Some(stats) = enemy.as_enemy_mut() {
            stats.damage = self.config.enemy_damage;
            stats.speed = self.config.enemy_speed;
        }
        Ok(enemy)
    }

    pub fn create_item(
        &mut self,
        name: &str,
        item_type: &str,
        value: i32,
        position: Vector2D,
    ) -> Result<Entity, GameError> {
        Ok(Entity::item(self.allocate_id(), name, item_type, value, position)?
            .with_radius(self.config.item_radius))
    }

    // ── Collection management ───────────────────────────────────────────────

    /// Insert into the first free slot.  Never fails.
    pub fn add_game_object(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        match self.free_slots.pop() {
            Some(index) => self.slots[index] = Some(entity),
            None => self.slots.push(Some(entity)),
        }
        id
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.name() == name))
    }

    /// Remove the first entity called `name`.  On a miss the collection is
    /// left as it was.
    pub fn remove_game_object(&mut self, name: &str) -> Result<Entity, GameError> {
        let removed = self
            .index_of(name)
            .and_then(|index| self.slots[index].take().map(|e| (index, e)));
        match removed {
            Some((index, entity)) => {
                self.free_slots.push(index);
                entity.on_destroy();
                Ok(entity)
            }
            None => {
                log::warn!("cannot remove '{}': no such game object", name);
                Err(GameError::ObjectNotFound(name.to_string()))
            }
        }
    }

    /// Linear scan for the first entity called `name`.
    pub fn find_game_object(&self, name: &str) -> Result<&Entity, GameError> {
        self.entities()
            .find(|e| e.name() == name)
            .ok_or_else(|| GameError::ObjectNotFound(name.to_string()))
    }

    pub fn find_game_object_mut(&mut self, name: &str) -> Result<&mut Entity, GameError> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|e| e.name() == name)
            .ok_or_else(|| GameError::ObjectNotFound(name.to_string()))
    }

    /// Look up by id, the player slot included.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.player
            .iter()
            .chain(self.slots.iter().flatten())
            .find(|e| e.id() == id)
    }

    /// Every entity in the general collection (not the player), active or not.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.entities().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every inactive entity (e.g. picked-up items).  Must not be
    /// called while a collision scan is running.
    pub fn purge_inactive(&mut self) -> usize {
        let mut purged = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|e| !e.is_active()) {
                if let Some(entity) = slot.take() {
                    entity.on_destroy();
                    self.free_slots.push(index);
                    purged += 1;
                }
            }
        }
        purged
    }

    // ── Player slot ──────────────────────────────────────────────────────────

    pub fn set_player(&mut self, player: Entity) -> Result<(), GameError> {
        if !player.is_player() {
            return Err(GameError::NotAPlayer(player.name().to_string()));
        }
        if let Some(old) = self.player.replace(player) {
            old.on_destroy();
        }
        Ok(())
    }

    /// `None` until `set_player` has been called.
    pub fn player(&self) -> Option<&Entity> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player.as_mut()
    }

    /// Add `points` to the player's score and notify score listeners.
    /// Returns the new score.
    pub fn add_score(&mut self, points: i32) -> Result<i32, GameError> {
        let event = self
            .player
            .as_mut()
            .and_then(|player| player.add_score(points))
            .ok_or_else(|| GameError::ObjectNotFound("player".to_string()))?;
        self.score_events.broadcast(&event);
        Ok(event.score)
    }

    // ── State ────────────────────────────────────────────────────────────────

    pub fn set_state(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    // ── Bounds ───────────────────────────────────────────────────────────────

    pub fn is_in_bounds(&self, position: &Vector2D) -> bool {
        (0.0..=self.width()).contains(&position.x) && (0.0..=self.height()).contains(&position.y)
    }

    pub fn clamp_to_bounds(&self, position: Vector2D) -> Vector2D {
        clamp_into(position, self.width(), self.height())
    }

    // ── Simulation step ─────────────────────────────────────────────────────

    /// Advance the simulation by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) {
        let dt = delta_time.max(0.0);

        // 1. Player, then everything else chasing the player's new position
        let mut chase = None;
        if let Some(player) = self.player.as_mut().filter(|p| p.is_active()) {
            player.update(dt);
            chase = Some(player.position());
        }
        for entity in self.slots.iter_mut().flatten().filter(|e| e.is_active()) {
            if let Some(target) = chase {
                entity.set_target(target);
            }
            entity.update(dt);
        }

        // 2. Keep everyone inside the world
        let (width, height) = (self.width(), self.height());
        for entity in self
            .player
            .iter_mut()
            .chain(self.slots.iter_mut().flatten())
            .filter(|e| e.is_active())
        {
            entity.place(clamp_into(entity.position(), width, height));
        }

        // 3. Collisions and their events
        self.check_collisions();

        // 4. Timed spawning
        if let Err(err) = self.advance_spawn_timers(dt) {
            log::warn!("spawn failed: {}", err);
        }

        self.counters.frames += 1;
        self.counters.elapsed += dt;
    }

    fn advance_spawn_timers(&mut self, dt: f32) -> Result<(), GameError> {
        let enemy_interval = self.config.enemy_spawn_interval;
        if enemy_interval > 0.0 {
            self.enemy_spawn_timer += dt;
            if self.enemy_spawn_timer >= enemy_interval {
                self.enemy_spawn_timer -= enemy_interval;
                if self.count_active(|e| e.as_enemy().is_some()) < self.config.max_enemies {
                    self.spawn_enemy()?;
                }
            }
        }

        let item_interval = self.config.item_spawn_interval;
        if item_interval > 0.0 {
            self.item_spawn_timer += dt;
            if self.item_spawn_timer >= item_interval {
                self.item_spawn_timer -= item_interval;
                if self.count_active(|e| e.as_item().is_some()) < self.config.max_items {
                    self.spawn_item()?;
                }
            }
        }
        Ok(())
    }

    fn count_active(&self, pred: impl Fn(&Entity) -> bool) -> usize {
        self.entities().filter(|e| e.is_active() && pred(e)).count()
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut Entity> {
        match slot {
            Slot::Player => self.player.as_mut(),
            Slot::Index(index) => self.slots.get_mut(index).and_then(Option::as_mut),
        }
    }

    /// Pairwise scan over every active entity, player included.  The scan
    /// works on a snapshot; handlers and events run only once it is done.
    /// Returns the number of colliding pairs.
    pub fn check_collisions(&mut self) -> usize {
        let snapshot: Vec<(Slot, Entity)> = self
            .player
            .iter()
            .filter(|p| p.is_active())
            .map(|p| (Slot::Player, p.clone()))
            .chain(self.slots.iter().enumerate().filter_map(|(index, slot)| {
                slot.as_ref()
                    .filter(|e| e.is_active())
                    .map(|e| (Slot::Index(index), e.clone()))
            }))
            .collect();

        let mut hits = Vec::new();
        for i in 0..snapshot.len() {
            for j in (i + 1)..snapshot.len() {
                if snapshot[i].1.check_collision(&snapshot[j].1) {
                    hits.push((i, j));
                }
            }
        }

        let mut score_changes = Vec::new();
        for &(i, j) in &hits {
            let (slot_a, a) = &snapshot[i];
            let (slot_b, b) = &snapshot[j];

            if let Some(entity) = self.slot_mut(*slot_a) {
                score_changes.extend(entity.on_collision(b));
            }
            if let Some(entity) = self.slot_mut(*slot_b) {
                score_changes.extend(entity.on_collision(a));
            }

            let event = CollisionEvent {
                object1: a.name().to_string(),
                object2: b.name().to_string(),
                position: a.position().midpoint(&b.position()),
            };
            log::debug!("collision: {} <-> {} at {}", event.object1, event.object2, event.position);
            self.collision_events.broadcast(&event);
        }

        for event in &score_changes {
            self.score_events.broadcast(event);
        }

        self.counters.collisions += hits.len() as u64;

        let player_dead = self.player.as_ref().is_some_and(|p| !p.is_alive());
        if player_dead && self.state != GameState::GameOver {
            log::info!("player died, game over");
            self.state = GameState::GameOver;
        }

        hits.len()
    }

    // ── Spawning ─────────────────────────────────────────────────────────────

    fn random_position(&mut self) -> Vector2D {
        let x = self.rng.gen_range(0.0..=self.config.width);
        let y = self.rng.gen_range(0.0..=self.config.height);
        Vector2D::new(x, y)
    }

    pub fn spawn_enemy(&mut self) -> Result<EntityId, GameError> {
        let position = self.random_position();
        let name = format!("Enemy_{}", self.next_id);
        let enemy = self.create_enemy(&name, position)?;
        log::debug!("spawned {} at {}", name, position);
        self.counters.enemies_spawned += 1;
        Ok(self.add_game_object(enemy))
    }

    pub fn spawn_item(&mut self) -> Result<EntityId, GameError> {
        let position = self.random_position();
        let (item_type, value) = ITEM_TABLE[self.rng.gen_range(0..ITEM_TABLE.len())];
        let name = format!("Item_{}", self.next_id);
        let item = self.create_item(&name, item_type, value, position)?;
        log::debug!("spawned {} ({} worth {}) at {}", name, item_type, value, position);
        self.counters.items_spawned += 1;
        Ok(self.add_game_object(item))
    }

    // ── Events ───────────────────────────────────────────────────────────────

    pub fn add_collision_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&CollisionEvent) -> anyhow::Result<()> + 'static,
    {
        self.collision_events.add_listener(listener);
    }

    pub fn add_score_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&ScoreEvent) -> anyhow::Result<()> + 'static,
    {
        self.score_events.add_listener(listener);
    }

    // ── Presentation ─────────────────────────────────────────────────────────

    /// Draw every active entity, the player last so it stays on top.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> io::Result<()> {
        renderer.begin_frame(self)?;
        for entity in self.entities().filter(|e| e.is_active()) {
            entity.render(renderer)?;
        }
        if let Some(player) = self.player.as_ref().filter(|p| p.is_active()) {
            player.render(renderer)?;
        }
        renderer.end_frame(self)
    }

    // ── Statistics ───────────────────────────────────────────────────────────

    pub fn statistics(&self) -> WorldStats {
        WorldStats {
            enemies: self.entities().filter(|e| e.as_enemy().is_some()).count(),
            items: self.entities().filter(|e| e.as_item().is_some()).count(),
            active_entities: self.entities().filter(|e| e.is_active()).count(),
            frames: self.counters.frames,
            elapsed: self.counters.elapsed,
            collisions: self.counters.collisions,
            enemies_spawned: self.counters.enemies_spawned,
            items_spawned: self.counters.items_spawned,
        }
    }

    pub fn display_statistics(&self) {
        log::info!("world statistics: {}", self.statistics());
        if let Some(player) = self.player.as_ref().and_then(|p| p.as_player()) {
            log::info!("player: score {}, health {}/{}", player.score, player.health, player.max_health);
        }
    }
}

impl std::fmt::Debug for GameWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameWorld")
            .field("state", &self.state)
            .field("bounds", &(self.config.width, self.config.height))
            .field("entities", &self.len())
            .field("player", &self.player.as_ref().map(Entity::name))
            .finish()
    }
}
