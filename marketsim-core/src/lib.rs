//! # Market Simulation Core
//!
//! Deterministic simulation kernel for a card-driven trading game.
//!
//! Every external mutation is a [`Command`] routed through the
//! [`Dispatcher`] to exactly one handler; handlers queue follow-up commands
//! (reactions) that drain FIFO before control returns. Time advances in
//! discrete rounds driven by a [`TickTimer`].
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐     ┌────────────┐     ┌──────────────┐
//! │ UI / cards │────▶│  Command   │────▶│  Dispatcher  │
//! │ settlement │     │ (payload)  │     │ (1 handler)  │
//! └────────────┘     └────────────┘     └──────┬───────┘
//!                                              │ reactions, events
//! ┌────────────┐     ┌────────────┐     ┌──────▼───────┐
//! │ Observers  │◀────│ GameEvent  │◀────│  GameState   │
//! │ (side fx)  │     │  (JSONL)   │     │ (owned data) │
//! └────────────┘     └────────────┘     └──────────────┘
//! ```
//!
//! Each round the [`Simulation`] runs: energy/card refresh → stochastic
//! price tick → event selector → prediction settlement → modifier decay.
//! All money and price math is [`Fixed`]-point; floats appear only in the
//! selector's transient probability weights.
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`GameState`] | Complete session state (market, ledger, player) |
//! | [`Command`] | Tagged mutation payloads (trade, predict, upgrade...) |
//! | [`Simulation`] | Engine owning state, dispatcher, RNG and observers |
//! | [`EventSelector`] | Deviation-weighted event card draws |
//! | [`SimObserver`] | Trait for watching rounds without touching them |

pub mod attributes;
pub mod bounded;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod economy;
pub mod events;
pub mod fixed;
pub mod market;
pub mod modifiers;
pub mod observer;
pub mod prediction;
pub mod selector;
pub mod state;
pub mod step;
pub mod testing;
pub mod timer;

pub use attributes::{Attribute, AttributeSet, EnergyState};
pub use bounded::{BoundedFixed, BoundedInt};
pub use command::{AttributeKind, Command, CommandTag, Direction, TradeSide};
pub use config::{SimConfig, WeightMode};
pub use dispatch::{CommandError, CommandHandler, Dispatcher, Effects};
pub use events::GameEvent;
pub use fixed::Fixed;
pub use modifiers::ModifierStack;
pub use observer::console::ConsoleObserver;
pub use observer::event_log::EventLogObserver;
pub use observer::{ObserverRegistry, SimObserver, Snapshot};
pub use prediction::{LedgerStats, Prediction};
pub use selector::{EventCard, EventCategory, EventSelector};
pub use state::{GameState, InstrumentId, InstrumentState};
pub use step::Simulation;
pub use timer::TickTimer;
