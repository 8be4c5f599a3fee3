//! Observer pattern for simulation inspection.
//!
//! Observers receive an immutable snapshot of game state plus the events
//! the round produced. They can render, log or forward, but they cannot
//! touch the simulation; determinism is unaffected by who is watching.

pub mod console;
pub mod event_log;

use crate::events::GameEvent;
use crate::state::GameState;
use std::sync::Arc;
use thiserror::Error;

/// Immutable snapshot of game state handed to observers.
///
/// `Arc`-wrapped so multiple observers share one copy.
#[derive(Clone)]
pub struct Snapshot {
    pub state: Arc<GameState>,
    /// Round counter at the time of the snapshot.
    pub round: u64,
}

impl Snapshot {
    pub fn new(state: GameState, round: u64) -> Self {
        Self {
            state: Arc::new(state),
            round,
        }
    }
}

#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Render error: {0}")]
    Render(String),
}

/// Trait for simulation observers.
///
/// Errors returned from `on_round` are logged but never block the
/// simulation. Implementations must be `Send + Sync`.
pub trait SimObserver: Send + Sync {
    /// Called after every completed round with the events it produced.
    fn on_round(&self, snapshot: &Snapshot, events: &[GameEvent]) -> Result<(), ObserverError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Called once when the simulation ends. Default is a no-op.
    fn on_shutdown(&self) {}
}

/// Heterogeneous collection of observers.
pub struct ObserverRegistry {
    observers: Vec<Box<dyn SimObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self { observers: vec![] }
    }

    pub fn register(&mut self, observer: Box<dyn SimObserver>) {
        log::info!("Registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    /// Notify every observer. Errors are logged, never propagated.
    pub fn notify(&self, snapshot: &Snapshot, events: &[GameEvent]) {
        for observer in &self.observers {
            if let Err(e) = observer.on_round(snapshot, events) {
                log::warn!("Observer '{}' error: {}", observer.name(), e);
            }
        }
    }

    pub fn shutdown(&self) {
        for observer in &self.observers {
            observer.on_shutdown();
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        // Flush buffers even when the caller forgets an explicit shutdown
        self.shutdown();
    }
}
