//! Delayed-settlement prediction ledger. A prediction snapshots the
//! reference instrument's price when opened and resolves a fixed number of
//! rounds later; settlement is paid out through dispatched commands, never
//! by direct mutation here.

use crate::command::{Command, Direction};
use crate::config::SimConfig;
use crate::dispatch::{CommandError, CommandHandler, Effects};
use crate::events::GameEvent;
use crate::fixed::Fixed;
use crate::state::{GameState, InstrumentId};
use serde::{Deserialize, Serialize};

/// One open direction bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub instrument: InstrumentId,
    pub direction: Direction,
    pub snapshot_price: Fixed,
    pub remaining_rounds: u32,
    pub reward_money: Fixed,
    pub reward_units: i64,
    pub penalty_money: Fixed,
    pub penalty_units: i64,
    pub resolved: bool,
    pub correct: bool,
}

/// Summary counts over the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub open: usize,
}

pub fn stats(state: &GameState) -> LedgerStats {
    LedgerStats {
        open: state.predictions.iter().filter(|p| !p.resolved).count(),
    }
}

/// Handles `OpenPrediction`. Bets run against the configured reference
/// instrument, whose current price becomes the snapshot.
pub struct PredictionHandler;

impl CommandHandler for PredictionHandler {
    fn handle(
        &self,
        command: &Command,
        state: &mut GameState,
        config: &SimConfig,
        fx: &mut Effects,
    ) -> Result<(), CommandError> {
        let Command::OpenPrediction {
            direction,
            reward_money,
            reward_units,
            penalty_money,
            penalty_units,
            rounds,
        } = *command
        else {
            unreachable!("prediction handler attached to a foreign tag");
        };

        let instrument = InstrumentId(config.selector.reference_instrument);
        let snapshot_price = state
            .instrument(instrument)
            .ok_or(CommandError::UnknownInstrument(instrument))?
            .price
            .get();

        state.predictions.push(Prediction {
            instrument,
            direction,
            snapshot_price,
            remaining_rounds: rounds,
            reward_money,
            reward_units,
            penalty_money,
            penalty_units,
            resolved: false,
            correct: false,
        });

        fx.emit(GameEvent::PredictionOpened {
            instrument,
            direction,
            rounds,
            snapshot_price,
        });
        Ok(())
    }
}

/// Count down every open prediction and resolve the ones whose horizon
/// elapsed. Runs after the round's price tick so settlement sees the new
/// price. Resolved entries are purged before returning.
///
/// Returns the settlement commands for the caller to perform through the
/// dispatcher, and the resolution events.
pub fn run_prediction_tick(state: &mut GameState) -> (Vec<Command>, Vec<GameEvent>) {
    let mut settlements = Vec::new();
    let mut events = Vec::new();

    for prediction in state.predictions.iter_mut() {
        if prediction.resolved {
            continue;
        }
        prediction.remaining_rounds = prediction.remaining_rounds.saturating_sub(1);
        if prediction.remaining_rounds > 0 {
            continue;
        }

        let settle_price = state
            .instruments
            .get(prediction.instrument.0 as usize)
            .map(|i| i.price.get())
            .unwrap_or(prediction.snapshot_price);

        let rose = settle_price > prediction.snapshot_price;
        prediction.correct = rose == (prediction.direction == Direction::Rise);
        prediction.resolved = true;

        let (money, units) = if prediction.correct {
            (prediction.reward_money, prediction.reward_units)
        } else {
            (-prediction.penalty_money, -prediction.penalty_units)
        };
        if money != Fixed::ZERO {
            settlements.push(Command::ChangeCurrency { amount: money });
        }
        if units != 0 {
            settlements.push(Command::ChangeHoldings {
                instrument: prediction.instrument,
                amount: units,
            });
        }

        events.push(GameEvent::PredictionResolved {
            instrument: prediction.instrument,
            direction: prediction.direction,
            correct: prediction.correct,
            snapshot_price: prediction.snapshot_price,
            settle_price,
        });
    }

    state.predictions.retain(|p| !p.resolved);
    (settlements, events)
}
