//! Turn economy: the round-start energy/card refresh and the handler for
//! attribute upgrades and energy spending.

use crate::command::{AttributeKind, Command};
use crate::config::SimConfig;
use crate::dispatch::{CommandError, CommandHandler, Effects};
use crate::events::GameEvent;
use crate::state::GameState;

/// Refresh energy and deal cards at the start of a round.
///
/// Patience decides how much leftover energy carries over, Wisdom adds to
/// the restored amount, Social adds to the cards dealt:
/// `saved = min(current, patience)`, `current = min(base + wisdom + saved, max)`.
pub fn run_round_start(state: &mut GameState, config: &SimConfig) -> Vec<GameEvent> {
    let patience = state.attributes.value(AttributeKind::Patience);
    let wisdom = state.attributes.value(AttributeKind::Wisdom);
    let social = state.attributes.value(AttributeKind::Social);

    let old = state.energy.current.get();
    let saved = old.min(patience.to_int() as i32);
    let restored = config.energy.base_restore + wisdom.to_int() as i32;

    state.energy.saved = saved;
    state.energy.current.set(restored + saved);

    let cards = config.energy.base_draw + social.to_int() as u32;

    vec![
        GameEvent::EnergyChanged {
            delta: state.energy.current.get() - old,
            current: state.energy.current.get(),
        },
        GameEvent::CardsDrawn {
            count: cards,
            round: state.round,
        },
    ]
}

/// Handles `UpgradeAttribute`, `UseEnergy` and `RestoreEnergy`.
pub struct EconomyHandler;

impl CommandHandler for EconomyHandler {
    fn handle(
        &self,
        command: &Command,
        state: &mut GameState,
        _config: &SimConfig,
        fx: &mut Effects,
    ) -> Result<(), CommandError> {
        match *command {
            Command::UpgradeAttribute { attribute } => {
                let attr = state
                    .attributes
                    .get(attribute)
                    .ok_or(CommandError::UnknownAttribute(attribute))?;
                let cost = attr
                    .next_upgrade_cost()
                    .ok_or(CommandError::MaxLevel(attribute))?;
                if cost > state.money {
                    return Err(CommandError::InsufficientFunds {
                        needed: cost,
                        available: state.money,
                    });
                }

                let attr = state
                    .attributes
                    .get_mut(attribute)
                    .ok_or(CommandError::UnknownAttribute(attribute))?;
                attr.raise_level();
                let new_level = attr.level;

                fx.react(Command::ChangeCurrency { amount: -cost });
                fx.emit(GameEvent::AttributeUpgraded {
                    attribute,
                    new_level,
                    cost,
                });
                Ok(())
            }

            Command::UseEnergy { amount } => {
                if amount < 0 {
                    return Err(CommandError::NegativeEnergyAmount(amount));
                }
                let available = state.energy.current.get();
                if amount > available {
                    return Err(CommandError::InsufficientEnergy {
                        needed: amount,
                        available,
                    });
                }
                state.energy.current.add(-amount);
                fx.emit(GameEvent::EnergyChanged {
                    delta: -amount,
                    current: state.energy.current.get(),
                });
                Ok(())
            }

            Command::RestoreEnergy { amount } => {
                if amount < 0 {
                    return Err(CommandError::NegativeEnergyAmount(amount));
                }
                let old = state.energy.current.get();
                state.energy.current.add(amount);
                fx.emit(GameEvent::EnergyChanged {
                    delta: state.energy.current.get() - old,
                    current: state.energy.current.get(),
                });
                Ok(())
            }

            _ => unreachable!("economy handler attached to a foreign tag"),
        }
    }
}
