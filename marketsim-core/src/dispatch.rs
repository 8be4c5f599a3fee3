//! Command dispatch. One handler per command tag; handlers queue follow-up
//! commands as reactions, which the dispatcher drains in FIFO order after
//! the root command completes.

use crate::command::{AttributeKind, Command, CommandTag};
use crate::config::SimConfig;
use crate::events::GameEvent;
use crate::fixed::Fixed;
use crate::state::{GameState, InstrumentId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no handler attached for {0}")]
    NoHandler(CommandTag),

    #[error("a handler is already attached for {0}")]
    DuplicateHandler(CommandTag),

    #[error("unknown instrument {0:?}")]
    UnknownInstrument(InstrumentId),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Fixed, available: Fixed },

    #[error("insufficient holdings: need {needed}, have {available}")]
    InsufficientHoldings { needed: i64, available: i64 },

    #[error("insufficient energy: need {needed}, have {available}")]
    InsufficientEnergy { needed: i32, available: i32 },

    #[error("energy amount {0} must be non-negative")]
    NegativeEnergyAmount(i32),

    #[error("attribute {0:?} is already at max level")]
    MaxLevel(AttributeKind),

    #[error("attribute {0:?} is not in the attribute table")]
    UnknownAttribute(AttributeKind),
}

/// Side effects a handler may produce besides mutating state: follow-up
/// commands and observable events.
#[derive(Default)]
pub struct Effects {
    reactions: VecDeque<Command>,
    events: Vec<GameEvent>,
}

impl Effects {
    /// Queue a follow-up command, performed after the current one finishes.
    pub fn react(&mut self, command: Command) {
        self.reactions.push_back(command);
    }

    /// Record an observable event for this perform pass.
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// A stateless unit of command-handling behavior. Implementations match on
/// the command payload; receiving a tag they were not attached for is a bug.
pub trait CommandHandler {
    fn handle(
        &self,
        command: &Command,
        state: &mut GameState,
        config: &SimConfig,
        fx: &mut Effects,
    ) -> Result<(), CommandError>;
}

/// Routes commands to their attached handlers and drains reactions.
#[derive(Default)]
pub struct Dispatcher {
    handlers: FxHashMap<CommandTag, Box<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler for a tag. At most one handler per tag.
    pub fn attach(
        &mut self,
        tag: CommandTag,
        handler: Box<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        if self.handlers.contains_key(&tag) {
            return Err(CommandError::DuplicateHandler(tag));
        }
        self.handlers.insert(tag, handler);
        Ok(())
    }

    /// Detach the handler for a tag, returning it if one was attached.
    pub fn detach(&mut self, tag: CommandTag) -> Option<Box<dyn CommandHandler>> {
        self.handlers.remove(&tag)
    }

    pub fn is_attached(&self, tag: CommandTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    /// Perform a command, then drain its reaction queue in FIFO order.
    ///
    /// The root command's error is returned to the caller. Reaction errors
    /// are logged and draining continues; a failed payout must not block
    /// the settlements queued after it.
    pub fn perform(
        &self,
        command: Command,
        state: &mut GameState,
        config: &SimConfig,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), CommandError> {
        let mut fx = Effects::default();
        let result = self.dispatch(&command, state, config, &mut fx);

        if result.is_ok() {
            while let Some(reaction) = fx.reactions.pop_front() {
                let tag = reaction.tag();
                if let Err(e) = self.dispatch(&reaction, state, config, &mut fx) {
                    log::warn!("reaction {} failed: {}", tag, e);
                }
            }
        }

        events.append(&mut fx.events);
        result
    }

    fn dispatch(
        &self,
        command: &Command,
        state: &mut GameState,
        config: &SimConfig,
        fx: &mut Effects,
    ) -> Result<(), CommandError> {
        let handler = self
            .handlers
            .get(&command.tag())
            .ok_or(CommandError::NoHandler(command.tag()))?;
        handler.handle(command, state, config, fx)
    }
}
