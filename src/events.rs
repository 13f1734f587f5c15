//! Publish / subscribe channel decoupling collision detection from gameplay
//! reactions.
//!
//! Listeners run synchronously, in registration order, on the thread that
//! calls [`EventSystem::broadcast`].  A listener that returns an error or
//! panics is logged and skipped; the remaining listeners still receive the
//! event and nothing reaches the caller.

use std::panic::{self, AssertUnwindSafe};

use crate::vector::Vector2D;

/// Emitted once per colliding pair per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionEvent {
    pub object1: String,
    pub object2: String,
    /// Midpoint of the two entities at detection time.
    pub position: Vector2D,
}

/// Emitted whenever the player's score changes.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreEvent {
    pub score: i32,
    pub player_name: String,
}

pub type Listener<T> = Box<dyn FnMut(&T) -> anyhow::Result<()>>;

pub struct EventSystem<T> {
    listeners: Vec<Listener<T>>,
}

impl<T> EventSystem<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&T) -> anyhow::Result<()> + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver `event` to every listener.  Returns how many of them failed.
    pub fn broadcast(&mut self, event: &T) -> usize {
        let mut failures = 0;
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    log::warn!("event listener #{} failed: {:#}", index, err);
                }
                Err(payload) => {
                    failures += 1;
                    log::error!(
                        "event listener #{} panicked: {}",
                        index,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        failures
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T> Default for EventSystem<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventSystem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
