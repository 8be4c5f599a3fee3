//! Observable simulation events, emitted by handlers and systems and fanned
//! out to observers. Serialized as tagged JSON for the event log.

use crate::command::{AttributeKind, Direction};
use crate::fixed::Fixed;
use crate::selector::EventCategory;
use crate::state::InstrumentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// An instrument's price moved (random tick or event payload).
    PriceChanged {
        instrument: InstrumentId,
        old_price: Fixed,
        new_price: Fixed,
    },

    /// A trade settled: positive amount is a buy, negative a sell.
    TradeExecuted {
        instrument: InstrumentId,
        amount: i64,
        price: Fixed,
        total: Fixed,
    },

    /// Cash balance moved outside a trade (payouts, upgrade costs).
    CurrencyChanged { amount: Fixed, balance: Fixed },

    /// Leverage modifier stacks or duration changed.
    ModifierChanged {
        stacks: u32,
        multiplier: Fixed,
        remaining_rounds: u32,
    },

    /// A direction bet was opened.
    PredictionOpened {
        instrument: InstrumentId,
        direction: Direction,
        rounds: u32,
        snapshot_price: Fixed,
    },

    /// A direction bet reached its settlement round.
    PredictionResolved {
        instrument: InstrumentId,
        direction: Direction,
        correct: bool,
        snapshot_price: Fixed,
        settle_price: Fixed,
    },

    /// An attribute was upgraded.
    AttributeUpgraded {
        attribute: AttributeKind,
        new_level: u32,
        cost: Fixed,
    },

    /// Energy was spent or restored.
    EnergyChanged { delta: i32, current: i32 },

    /// Cards were dealt at round start.
    CardsDrawn { count: u32, round: u64 },

    /// The event selector fired a market event card.
    MarketEventFired {
        category: EventCategory,
        card: String,
    },

    /// A full round tick completed.
    RoundCompleted { round: u64 },
}
