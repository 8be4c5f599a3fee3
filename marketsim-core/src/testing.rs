//! Test helpers: a game-state builder and a one-shot dispatch helper.
//!
//! Exposed as a normal module so integration tests and downstream crates
//! can build fixture states without hand-assembling every field.

use crate::command::Command;
use crate::config::SimConfig;
use crate::dispatch::{CommandError, Dispatcher};
use crate::events::GameEvent;
use crate::fixed::Fixed;
use crate::state::GameState;
use crate::step::attach_standard_handlers;

/// Builder for test game states, starting from the default config.
pub struct GameStateBuilder {
    config: SimConfig,
    money: Option<Fixed>,
    energy: Option<i32>,
    prices: Vec<(usize, Fixed)>,
    holdings: Vec<(usize, i64)>,
}

impl GameStateBuilder {
    pub fn new() -> Self {
        Self {
            config: SimConfig::default(),
            money: None,
            energy: None,
            prices: Vec::new(),
            holdings: Vec::new(),
        }
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn money(mut self, money: Fixed) -> Self {
        self.money = Some(money);
        self
    }

    pub fn energy(mut self, energy: i32) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn price(mut self, instrument: usize, price: Fixed) -> Self {
        self.prices.push((instrument, price));
        self
    }

    pub fn holdings(mut self, instrument: usize, holdings: i64) -> Self {
        self.holdings.push((instrument, holdings));
        self
    }

    pub fn build(self) -> GameState {
        let mut state = self.config.initial_state();
        if let Some(money) = self.money {
            state.money = money;
        }
        if let Some(energy) = self.energy {
            state.energy.current.set(energy);
        }
        for (idx, price) in self.prices {
            state.instruments[idx].price.set(price);
            state.instruments[idx].base_price = price;
        }
        for (idx, holdings) in self.holdings {
            state.instruments[idx].holdings = holdings;
        }
        state
    }
}

impl Default for GameStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Perform one command against a fully wired dispatcher under the default
/// config, discarding emitted events.
pub fn perform_one(state: &mut GameState, command: Command) -> Result<(), CommandError> {
    let config = SimConfig::default();
    let mut dispatcher = Dispatcher::new();
    attach_standard_handlers(&mut dispatcher)?;
    let mut events: Vec<GameEvent> = Vec::new();
    dispatcher.perform(command, state, &config, &mut events)
}
