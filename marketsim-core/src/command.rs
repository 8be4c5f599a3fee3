//! The command surface: every external mutation of game state is expressed
//! as one of these immutable payloads and routed through the dispatcher.

use crate::fixed::Fixed;
use crate::state::InstrumentId;
use serde::{Deserialize, Serialize};

/// Direction of a price prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Rise,
    Fall,
}

/// Side of an all-in trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// An intended state mutation. Constructed by collaborators (UI, event
/// payloads, settlement), owned transiently by the dispatcher until handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Buy (positive) or sell (negative) `amount` units of an instrument
    /// at the current price. Rejected if funds/holdings are insufficient.
    Trade {
        instrument: InstrumentId,
        amount: i64,
    },

    /// Buy as many units as money allows, or sell the entire position.
    TradeAll {
        instrument: InstrumentId,
        side: TradeSide,
    },

    /// Shift an instrument's price by a raw delta (event payloads use this).
    /// The active modifier multiplier scales the delta before clamping.
    ChangePrice {
        instrument: InstrumentId,
        delta: Fixed,
    },

    /// Unconditional money delta (trade settlement, prediction payouts,
    /// upgrade costs).
    ChangeCurrency { amount: Fixed },

    /// Unconditional holdings delta; holdings floor at zero.
    ChangeHoldings {
        instrument: InstrumentId,
        amount: i64,
    },

    /// Add stacks to the leverage modifier. With `refresh`, the remaining
    /// duration extends to at least `duration_rounds`.
    AddModifier {
        stacks: u32,
        multiplier: Fixed,
        duration_rounds: u32,
        refresh: bool,
    },

    /// Open a direction bet resolved after `rounds` round ticks.
    OpenPrediction {
        direction: Direction,
        reward_money: Fixed,
        reward_units: i64,
        penalty_money: Fixed,
        penalty_units: i64,
        rounds: u32,
    },

    /// Spend money to raise a player attribute one level.
    UpgradeAttribute { attribute: AttributeKind },

    /// Spend energy (playing a card). Rejected if insufficient.
    UseEnergy { amount: i32 },

    /// Restore energy, capped at the energy maximum.
    RestoreEnergy { amount: i32 },
}

/// Upgradeable player attributes and the bonus each one feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Extra cards drawn each round.
    Social,
    /// Energy carried over between rounds.
    Patience,
    /// Extra energy restored each round.
    Wisdom,
    /// Market influence bonus on price ticks (+10% per level).
    Charisma,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 4] = [
        AttributeKind::Social,
        AttributeKind::Patience,
        AttributeKind::Wisdom,
        AttributeKind::Charisma,
    ];
}

/// Routing key for the handler table. Exactly one handler may be attached
/// per tag at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandTag {
    Trade,
    TradeAll,
    ChangePrice,
    ChangeCurrency,
    ChangeHoldings,
    AddModifier,
    OpenPrediction,
    UpgradeAttribute,
    UseEnergy,
    RestoreEnergy,
}

impl Command {
    /// The tag the dispatcher routes on.
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::Trade { .. } => CommandTag::Trade,
            Command::TradeAll { .. } => CommandTag::TradeAll,
            Command::ChangePrice { .. } => CommandTag::ChangePrice,
            Command::ChangeCurrency { .. } => CommandTag::ChangeCurrency,
            Command::ChangeHoldings { .. } => CommandTag::ChangeHoldings,
            Command::AddModifier { .. } => CommandTag::AddModifier,
            Command::OpenPrediction { .. } => CommandTag::OpenPrediction,
            Command::UpgradeAttribute { .. } => CommandTag::UpgradeAttribute,
            Command::UseEnergy { .. } => CommandTag::UseEnergy,
            Command::RestoreEnergy { .. } => CommandTag::RestoreEnergy,
        }
    }
}

impl std::fmt::Display for CommandTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
