use std::cell::RefCell;
use std::rc::Rc;

use game_engine::events::{CollisionEvent, EventSystem, ScoreEvent};
use game_engine::vector::Vector2D;

fn collision(a: &str, b: &str) -> CollisionEvent {
    CollisionEvent {
        object1: a.to_string(),
        object2: b.to_string(),
        position: Vector2D::new(1.0, 2.0),
    }
}

#[test]
fn listeners_run_in_registration_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut channel = EventSystem::<ScoreEvent>::new();

    for tag in ["first", "second", "third"] {
        let seen = Rc::clone(&seen);
        channel.add_listener(move |event: &ScoreEvent| {
            seen.borrow_mut().push(format!("{}:{}", tag, event.score));
            Ok(())
        });
    }

    let failures = channel.broadcast(&ScoreEvent {
        score: 7,
        player_name: "Hero".to_string(),
    });

    assert_eq!(failures, 0);
    assert_eq!(*seen.borrow(), vec!["first:7", "second:7", "third:7"]);
}

#[test]
fn failing_listener_does_not_block_the_next() {
    let delivered = Rc::new(RefCell::new(Vec::new()));
    let mut channel = EventSystem::<CollisionEvent>::new();

    channel.add_listener(|_: &CollisionEvent| anyhow::bail!("listener exploded"));
    {
        let delivered = Rc::clone(&delivered);
        channel.add_listener(move |event: &CollisionEvent| {
            delivered.borrow_mut().push(event.clone());
            Ok(())
        });
    }

    let event = collision("Player", "Enemy_1");
    assert_eq!(channel.broadcast(&event), 1);
    assert_eq!(channel.broadcast(&event), 1);
    assert_eq!(delivered.borrow().len(), 2);
    assert_eq!(delivered.borrow()[0], event);
}

#[test]
fn panicking_listener_is_isolated() {
    let count = Rc::new(RefCell::new(0));
    let mut channel = EventSystem::<CollisionEvent>::new();

    channel.add_listener(|_: &CollisionEvent| panic!("listener panicked"));
    {
        let count = Rc::clone(&count);
        channel.add_listener(move |_: &CollisionEvent| {
            *count.borrow_mut() += 1;
            Ok(())
        });
    }

    let failures = channel.broadcast(&collision("a", "b"));
    assert_eq!(failures, 1);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn empty_channel_broadcast_is_harmless() {
    let mut channel: EventSystem<ScoreEvent> = EventSystem::default();
    assert!(channel.is_empty());
    assert_eq!(
        channel.broadcast(&ScoreEvent {
            score: 0,
            player_name: String::new(),
        }),
        0
    );
    channel.add_listener(|_: &ScoreEvent| Ok(()));
    assert_eq!(channel.listener_count(), 1);
}
