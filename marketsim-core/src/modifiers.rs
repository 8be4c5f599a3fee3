//! Stacking, time-limited price modifier (the leverage buff).
//!
//! The ledger tracks one stacking multiplier. The market engine calls
//! [`ModifierStack::apply_to`] on every price delta; the round pipeline
//! calls [`ModifierStack::decay_round`] once per round after prices settle.

use crate::command::Command;
use crate::config::SimConfig;
use crate::dispatch::{CommandError, CommandHandler, Effects};
use crate::events::GameEvent;
use crate::fixed::Fixed;
use crate::state::GameState;
use serde::{Deserialize, Serialize};

/// Stacking leverage modifier.
///
/// Active while `stacks > 0 && remaining_rounds > 0`; the total multiplier
/// is then `1 + (per_stack − 1) × stacks`, otherwise exactly 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierStack {
    stacks: u32,
    /// Multiplier contributed per stack (e.g. 2.00).
    per_stack: Fixed,
    remaining_rounds: u32,
    max_stacks: u32,
}

impl ModifierStack {
    pub fn new(per_stack: Fixed, max_stacks: u32) -> Self {
        Self {
            stacks: 0,
            per_stack,
            remaining_rounds: 0,
            max_stacks,
        }
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn remaining_rounds(&self) -> u32 {
        self.remaining_rounds
    }

    pub fn max_stacks(&self) -> u32 {
        self.max_stacks
    }

    pub fn is_active(&self) -> bool {
        self.stacks > 0 && self.remaining_rounds > 0
    }

    /// Total multiplier: `1 + (per_stack − 1) × stacks` when active, else 1.
    pub fn total_multiplier(&self) -> Fixed {
        if !self.is_active() {
            return Fixed::ONE;
        }
        Fixed::ONE + (self.per_stack - Fixed::ONE) * self.stacks as i64
    }

    /// Add stacks (capped at `max_stacks`). With `refresh`, the remaining
    /// duration extends to `max(current, duration_rounds)`; without it the
    /// duration is only set when no duration is currently running.
    pub fn add_stacks(&mut self, amount: u32, duration_rounds: u32, refresh: bool) {
        self.stacks = (self.stacks + amount).min(self.max_stacks);

        if refresh {
            self.remaining_rounds = self.remaining_rounds.max(duration_rounds);
        } else if self.remaining_rounds == 0 {
            self.remaining_rounds = duration_rounds;
        }
    }

    /// Replace the per-stack multiplier. Event payloads may grant a
    /// stronger leverage than the configured default.
    pub fn set_per_stack(&mut self, per_stack: Fixed) {
        self.per_stack = per_stack;
    }

    /// Tick down one round of duration. Called once per round, after the
    /// round's price effects.
    pub fn decay_round(&mut self) {
        self.remaining_rounds = self.remaining_rounds.saturating_sub(1);
    }

    /// Scale a price delta by the total multiplier. Pure: no side effects,
    /// identity when inactive.
    pub fn apply_to(&self, delta: Fixed) -> Fixed {
        if !self.is_active() {
            return delta;
        }
        delta * self.total_multiplier()
    }

    /// Drop all stacks and remaining duration.
    pub fn reset(&mut self) {
        self.stacks = 0;
        self.remaining_rounds = 0;
    }
}

/// Handles `AddModifier`.
pub struct ModifierHandler;

impl CommandHandler for ModifierHandler {
    fn handle(
        &self,
        command: &Command,
        state: &mut GameState,
        _config: &SimConfig,
        fx: &mut Effects,
    ) -> Result<(), CommandError> {
        let Command::AddModifier {
            stacks,
            multiplier,
            duration_rounds,
            refresh,
        } = *command
        else {
            unreachable!("modifier handler attached to a foreign tag");
        };

        state.modifier.set_per_stack(multiplier);
        state.modifier.add_stacks(stacks, duration_rounds, refresh);

        fx.emit(GameEvent::ModifierChanged {
            stacks: state.modifier.stacks(),
            multiplier: state.modifier.total_multiplier(),
            remaining_rounds: state.modifier.remaining_rounds(),
        });
        Ok(())
    }
}
