//! The simulation engine: owns the state, the wired dispatcher, the seeded
//! RNG, the event selector and the observer registry, and advances the
//! whole thing one round at a time.
//!
//! Round pipeline:
//! 1. round-start economy (energy refresh, card deal)
//! 2. stochastic price tick
//! 3. event selector attempt (every `event_interval_rounds` rounds, so it
//!    sees the fresh prices)
//! 4. prediction countdown and settlement (also on the fresh prices)
//! 5. modifier decay

use crate::command::{Command, CommandTag};
use crate::config::SimConfig;
use crate::dispatch::{CommandError, Dispatcher};
use crate::economy::{run_round_start, EconomyHandler};
use crate::events::GameEvent;
use crate::market::{run_price_tick, MarketHandler};
use crate::modifiers::ModifierHandler;
use crate::observer::{ObserverRegistry, SimObserver, Snapshot};
use crate::prediction::{run_prediction_tick, PredictionHandler};
use crate::selector::{default_decks, EventCategory, EventSelector};
use crate::state::{GameState, InstrumentId};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Attach the full handler set. Fails only if a tag is already taken.
pub fn attach_standard_handlers(dispatcher: &mut Dispatcher) -> Result<(), CommandError> {
    for tag in [
        CommandTag::Trade,
        CommandTag::TradeAll,
        CommandTag::ChangePrice,
        CommandTag::ChangeCurrency,
        CommandTag::ChangeHoldings,
    ] {
        dispatcher.attach(tag, Box::new(MarketHandler))?;
    }
    dispatcher.attach(CommandTag::AddModifier, Box::new(ModifierHandler))?;
    dispatcher.attach(CommandTag::OpenPrediction, Box::new(PredictionHandler))?;
    for tag in [
        CommandTag::UpgradeAttribute,
        CommandTag::UseEnergy,
        CommandTag::RestoreEnergy,
    ] {
        dispatcher.attach(tag, Box::new(EconomyHandler))?;
    }
    Ok(())
}

pub struct Simulation {
    state: GameState,
    config: SimConfig,
    dispatcher: Dispatcher,
    selector: EventSelector,
    rng: StdRng,
    observers: ObserverRegistry,
    /// Events from player commands performed since the last round tick.
    pending_events: Vec<GameEvent>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let config = config.validated();
        let mut dispatcher = Dispatcher::new();
        // A fresh dispatcher has every tag free
        attach_standard_handlers(&mut dispatcher)
            .unwrap_or_else(|e| unreachable!("handler wiring conflict: {e}"));

        let (bullish, bearish, neutral) = default_decks(&config);
        let rng = StdRng::seed_from_u64(config.seed);

        Self {
            state: config.initial_state(),
            rng,
            config,
            dispatcher,
            selector: EventSelector::new(bullish, bearish, neutral),
            observers: ObserverRegistry::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn register_observer(&mut self, observer: Box<dyn SimObserver>) {
        self.observers.register(observer);
    }

    /// Perform a player command. Its events are delivered to observers with
    /// the next round's batch.
    pub fn perform(&mut self, command: Command) -> Result<(), CommandError> {
        self.dispatcher.perform(
            command,
            &mut self.state,
            &self.config,
            &mut self.pending_events,
        )
    }

    /// Advance one full round and return every event it produced.
    pub fn step_round(&mut self) -> Vec<GameEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        let round_number = self.state.round + 1;

        events.extend(run_round_start(&mut self.state, &self.config));
        events.extend(run_price_tick(&mut self.state, &self.config, &mut self.rng));

        if round_number % self.config.event_interval_rounds == 0 {
            self.run_event_selector(&mut events);
        }

        let (settlements, resolution_events) = run_prediction_tick(&mut self.state);
        events.extend(resolution_events);
        for command in settlements {
            let tag = command.tag();
            if let Err(e) =
                self.dispatcher
                    .perform(command, &mut self.state, &self.config, &mut events)
            {
                log::warn!("settlement {} failed: {}", tag, e);
            }
        }

        self.state.modifier.decay_round();

        self.state.round = round_number;
        events.push(GameEvent::RoundCompleted {
            round: round_number,
        });

        let snapshot = Snapshot::new(self.state.clone(), round_number);
        self.observers.notify(&snapshot, &events);
        events
    }

    /// Skip the gate and weights and fire a card from a named category.
    pub fn trigger_event(&mut self, category: EventCategory) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if let Some(card) = self.selector.trigger(category, &mut self.rng) {
            events.push(GameEvent::MarketEventFired {
                category,
                card: card.title.clone(),
            });
            self.perform_card_effects(card.effects, &mut events);
        }
        events
    }

    /// Reshuffle every event deck back to full.
    pub fn reset_event_piles(&mut self) {
        self.selector.reset_piles();
    }

    pub fn shutdown(&self) {
        self.observers.shutdown();
    }

    fn run_event_selector(&mut self, events: &mut Vec<GameEvent>) {
        let reference = InstrumentId(self.config.selector.reference_instrument);
        let deviation = self
            .state
            .instrument(reference)
            .map(|i| i.deviation().to_f64())
            .unwrap_or(0.0);

        let selection = self
            .selector
            .select(deviation, &self.config.selector, &mut self.rng);

        if let Some(card) = selection.card {
            events.push(GameEvent::MarketEventFired {
                category: selection.category,
                card: card.title.clone(),
            });
            self.perform_card_effects(card.effects, events);
        }
    }

    fn perform_card_effects(&mut self, effects: Vec<Command>, events: &mut Vec<GameEvent>) {
        for command in effects {
            let tag = command.tag();
            if let Err(e) =
                self.dispatcher
                    .perform(command, &mut self.state, &self.config, events)
            {
                log::warn!("event card effect {} failed: {}", tag, e);
            }
        }
    }
}
