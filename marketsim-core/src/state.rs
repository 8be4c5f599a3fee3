//! Game state: the single owning struct the dispatcher and round pipeline
//! mutate. Everything here is plain data; behavior lives in the handlers
//! and systems.

use crate::attributes::{AttributeSet, EnergyState};
use crate::bounded::BoundedFixed;
use crate::fixed::Fixed;
use crate::modifiers::ModifierStack;
use crate::prediction::Prediction;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Index into [`GameState::instruments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentId(pub u16);

/// One tradeable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentState {
    pub id: InstrumentId,
    pub name: String,
    pub symbol: String,
    /// Current price, clamped to the instrument's allowed band.
    pub price: BoundedFixed,
    /// Price at market open; deviation is measured against this.
    pub base_price: Fixed,
    /// Volatility multiplier applied to every random delta.
    pub volatility: Fixed,
    /// Rolling window of recent prices, newest last.
    pub history: VecDeque<Fixed>,
    pub history_cap: usize,
    /// Units the player holds. Never negative.
    pub holdings: i64,
}

impl InstrumentState {
    pub fn new(
        id: InstrumentId,
        name: impl Into<String>,
        symbol: impl Into<String>,
        base_price: Fixed,
        min_price: Fixed,
        max_price: Fixed,
        volatility: Fixed,
        history_cap: usize,
    ) -> Self {
        let mut history = VecDeque::with_capacity(history_cap);
        history.push_back(base_price);
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            price: BoundedFixed::new(base_price, min_price, max_price),
            base_price,
            volatility,
            history,
            history_cap,
            holdings: 0,
        }
    }

    /// Append the current price to the history window, evicting the oldest
    /// entry once the window is full.
    pub fn record_price(&mut self) {
        if self.history.len() >= self.history_cap {
            self.history.pop_front();
        }
        self.history.push_back(self.price.get());
    }

    /// Relative deviation from the opening price:
    /// `(price − base) / base`. Zero for a degenerate base price.
    pub fn deviation(&self) -> Fixed {
        if self.base_price == Fixed::ZERO {
            return Fixed::ZERO;
        }
        (self.price.get() - self.base_price) / self.base_price
    }
}

/// The complete mutable state of one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub money: Fixed,
    pub instruments: Vec<InstrumentState>,
    pub modifier: ModifierStack,
    pub predictions: Vec<Prediction>,
    pub attributes: AttributeSet,
    pub energy: EnergyState,
    /// Completed round count. Incremented at the end of each round tick.
    pub round: u64,
}

impl GameState {
    pub fn instrument(&self, id: InstrumentId) -> Option<&InstrumentState> {
        self.instruments.get(id.0 as usize)
    }

    pub fn instrument_mut(&mut self, id: InstrumentId) -> Option<&mut InstrumentState> {
        self.instruments.get_mut(id.0 as usize)
    }

    /// Total value of all positions at current prices, plus cash.
    /// Saturates rather than overflowing on outsized positions.
    pub fn net_worth(&self) -> Fixed {
        let positions = self.instruments.iter().fold(Fixed::ZERO, |acc, i| {
            acc.saturating_add(i.price.get().saturating_mul_units(i.holdings.max(0) as u64))
        });
        self.money.saturating_add(positions)
    }
}
