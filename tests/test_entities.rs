use approx::assert_relative_eq;
use game_engine::entities::*;
use game_engine::error::GameError;
use game_engine::vector::Vector2D;

fn player_at(x: f32, y: f32) -> Entity {
    Entity::player(EntityId(0), "Hero", Vector2D::new(x, y)).unwrap()
}

fn enemy_at(x: f32, y: f32) -> Entity {
    Entity::enemy(EntityId(1), "Goblin", Vector2D::new(x, y)).unwrap()
}

fn item_at(item_type: &str, value: i32, x: f32, y: f32) -> Entity {
    Entity::item(EntityId(2), "Loot", item_type, value, Vector2D::new(x, y)).unwrap()
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn constructors_apply_kind_defaults() {
    let p = player_at(1.0, 2.0);
    let stats = p.as_player().unwrap();
    assert_eq!(stats.health, DEFAULT_PLAYER_HEALTH);
    assert_eq!(stats.score, 0);
    assert_eq!(p.radius(), DEFAULT_PLAYER_RADIUS);
    assert!(p.is_active());
    assert_eq!(p.velocity(), Vector2D::ZERO);

    let e = enemy_at(5.0, 5.0);
    assert_eq!(e.as_enemy().unwrap().damage, DEFAULT_ENEMY_DAMAGE);
    assert_eq!(e.as_enemy().unwrap().target, Vector2D::new(5.0, 5.0));

    let i = item_at("coin", 10, 0.0, 0.0);
    assert_eq!(i.as_item().unwrap().item_type, "coin");
    assert_eq!(i.kind_name(), "item");
}

#[test]
fn non_finite_position_is_rejected() {
    let err = Entity::player(EntityId(0), "Bad", Vector2D::new(f32::NAN, 0.0)).unwrap_err();
    assert!(matches!(err, GameError::InvalidPosition { .. }));

    let mut p = player_at(0.0, 0.0);
    let err = p
        .set_position(Vector2D::new(0.0, f32::NEG_INFINITY))
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidPosition { .. }));
    assert_eq!(p.position(), Vector2D::ZERO);
}

// ── update ────────────────────────────────────────────────────────────────────

#[test]
fn zero_velocity_leaves_position_unchanged() {
    let mut p = player_at(40.0, 30.0);
    let mut i = item_at("gem", 50, 7.0, 8.0);
    let mut e = enemy_at(3.0, 3.0); // target == position

    for dt in [0.0, 0.016, 1.0, 5.0] {
        p.update(dt);
        i.update(dt);
        e.update(dt);
    }

    assert_eq!(p.position(), Vector2D::new(40.0, 30.0));
    assert_eq!(i.position(), Vector2D::new(7.0, 8.0));
    assert_eq!(e.position(), Vector2D::new(3.0, 3.0));
}

#[test]
fn velocity_integrates_over_delta_time() {
    let mut p = player_at(0.0, 0.0);
    p.set_velocity(Vector2D::new(100.0, -50.0)).unwrap();
    p.update(0.5);
    assert_eq!(p.position(), Vector2D::new(50.0, -25.0));
}

#[test]
fn inactive_entity_does_not_move() {
    let mut p = player_at(0.0, 0.0);
    p.set_velocity(Vector2D::new(100.0, 0.0)).unwrap();
    p.set_active(false);
    p.update(1.0);
    assert_eq!(p.position(), Vector2D::ZERO);
}

#[test]
fn enemy_steers_toward_target_at_speed() {
    let mut e = enemy_at(0.0, 0.0);
    e.set_target(Vector2D::new(1000.0, 0.0));
    e.update(1.0);
    assert_relative_eq!(e.position().x, DEFAULT_ENEMY_SPEED, epsilon = 1e-3);
    assert_relative_eq!(e.velocity().magnitude(), DEFAULT_ENEMY_SPEED, epsilon = 1e-3);
}

#[test]
fn enemy_does_not_overshoot_target() {
    let mut e = enemy_at(0.0, 0.0);
    e.set_target(Vector2D::new(30.0, 40.0)); // 50 away, speed 100
    e.update(1.0);
    assert_relative_eq!(e.position().x, 30.0, epsilon = 1e-3);
    assert_relative_eq!(e.position().y, 40.0, epsilon = 1e-3);
}

#[test]
fn player_movement_sets_velocity_from_speed() {
    let mut p = player_at(0.0, 0.0);
    p.move_right();
    p.move_down();
    assert_eq!(
        p.velocity(),
        Vector2D::new(DEFAULT_PLAYER_SPEED, DEFAULT_PLAYER_SPEED)
    );
    p.move_left();
    p.move_up();
    assert_eq!(
        p.velocity(),
        Vector2D::new(-DEFAULT_PLAYER_SPEED, -DEFAULT_PLAYER_SPEED)
    );
    p.halt();
    assert_eq!(p.velocity(), Vector2D::ZERO);

    // Non-players ignore movement commands
    let mut i = item_at("coin", 1, 0.0, 0.0);
    i.move_up();
    assert_eq!(i.velocity(), Vector2D::ZERO);
}

// ── Collision ─────────────────────────────────────────────────────────────────

#[test]
fn check_collision_uses_sum_of_radii() {
    let p = player_at(0.0, 0.0); // r = 20
    let near = enemy_at(34.0, 0.0); // r = 15, 34 < 35
    let far = enemy_at(36.0, 0.0);
    assert!(p.check_collision(&near));
    assert!(near.check_collision(&p));
    assert!(!p.check_collision(&far));
}

#[test]
fn inactive_entities_never_collide() {
    let p = player_at(0.0, 0.0);
    let mut e = enemy_at(0.0, 0.0);
    e.set_active(false);
    assert!(!p.check_collision(&e));
}

#[test]
fn player_takes_enemy_damage() {
    let mut p = player_at(0.0, 0.0);
    let e = enemy_at(0.0, 0.0);
    assert!(p.on_collision(&e).is_none());
    assert_eq!(
        p.as_player().unwrap().health,
        DEFAULT_PLAYER_HEALTH - DEFAULT_ENEMY_DAMAGE
    );
}

#[test]
fn take_damage_clamps_at_zero() {
    let mut p = player_at(0.0, 0.0);
    p.as_player_mut().unwrap().health = 10;
    assert!(p.take_damage(15));
    assert_eq!(p.as_player().unwrap().health, 0);
    assert!(!p.is_alive());
}

#[test]
fn score_item_adds_score_and_reports_it() {
    let mut p = player_at(0.0, 0.0);
    let mut coin = item_at("coin", 10, 0.0, 0.0);
    let snapshot = coin.clone();

    let event = p.on_collision(&snapshot).expect("score event");
    assert_eq!(event.score, 10);
    assert_eq!(event.player_name, "Hero");
    assert_eq!(p.as_player().unwrap().score, 10);

    assert!(coin.on_collision(&p).is_none());
    assert!(!coin.is_active());
}

#[test]
fn health_item_heals_up_to_max() {
    let mut p = player_at(0.0, 0.0);
    p.as_player_mut().unwrap().health = 90;
    let potion = item_at(HEALTH_ITEM, 25, 0.0, 0.0);

    assert!(p.on_collision(&potion).is_none());
    assert_eq!(p.as_player().unwrap().health, DEFAULT_PLAYER_HEALTH);
    assert_eq!(p.as_player().unwrap().score, 0);
}

#[test]
fn inactive_item_gives_nothing() {
    let mut p = player_at(0.0, 0.0);
    let mut coin = item_at("coin", 10, 0.0, 0.0);
    coin.set_active(false);
    assert!(p.on_collision(&coin).is_none());
    assert_eq!(p.as_player().unwrap().score, 0);
}

#[test]
fn enemy_reaction_is_a_noop() {
    let p = player_at(0.0, 0.0);
    let mut e = enemy_at(0.0, 0.0);
    let before = e.clone();
    assert!(e.on_collision(&p).is_none());
    assert_eq!(e, before);
}

#[test]
fn add_score_only_for_players() {
    let mut p = player_at(0.0, 0.0);
    let event = p.add_score(5).unwrap();
    assert_eq!(event.score, 5);
    assert_eq!(p.add_score(3).unwrap().score, 8);

    let mut e = enemy_at(0.0, 0.0);
    assert!(e.add_score(5).is_none());
    assert!(!e.take_damage(100));
}

#[test]
fn score_and_health_saturate_instead_of_overflowing() {
    let mut p = player_at(0.0, 0.0);
    p.add_score(i32::MAX);
    assert_eq!(p.add_score(1).unwrap().score, i32::MAX);
    assert_eq!(p.add_score(i32::MIN).unwrap().score, -1);

    // Negative damage never lifts health past its maximum
    assert!(!p.take_damage(-50));
    assert_eq!(p.as_player().unwrap().health, DEFAULT_PLAYER_HEALTH);
    assert!(!p.take_damage(i32::MIN));
    assert_eq!(p.as_player().unwrap().health, DEFAULT_PLAYER_HEALTH);
    assert!(p.take_damage(i32::MAX));
    assert_eq!(p.as_player().unwrap().health, 0);

    p.heal(i32::MAX);
    assert_eq!(p.as_player().unwrap().health, DEFAULT_PLAYER_HEALTH);
}

#[test]
fn coin_pickup_saturates_score() {
    let mut p = player_at(0.0, 0.0);
    p.as_player_mut().unwrap().score = i32::MAX - 5;
    let coin = item_at("coin", 10, 0.0, 0.0);
    assert_eq!(p.on_collision(&coin).unwrap().score, i32::MAX);
}

#[test]
fn move_by_normalises_direction() {
    let mut e = enemy_at(0.0, 0.0);
    e.move_by(Vector2D::new(3.0, 4.0), 10.0, 0.5).unwrap();
    assert_relative_eq!(e.position().x, 3.0, epsilon = 1e-4);
    assert_relative_eq!(e.position().y, 4.0, epsilon = 1e-4);

    // Zero direction stays put
    e.move_by(Vector2D::ZERO, 10.0, 1.0).unwrap();
    assert_relative_eq!(e.position().x, 3.0, epsilon = 1e-4);

    let err = e.move_by(Vector2D::new(1.0, 0.0), f32::INFINITY, 1.0).unwrap_err();
    assert!(matches!(err, GameError::InvalidPosition { .. }));
    assert_relative_eq!(e.position().x, 3.0, epsilon = 1e-4);
}

#[test]
fn game_state_variants_compare() {
    assert_eq!(GameState::Playing, GameState::Playing);
    assert_ne!(GameState::Playing, GameState::GameOver);
    assert_ne!(GameState::Menu, GameState::Paused);
}
