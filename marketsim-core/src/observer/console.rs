//! Console observer: one human-readable summary line per round.

use super::{ObserverError, SimObserver, Snapshot};
use crate::events::GameEvent;
use std::io::Write;

pub struct ConsoleObserver;

impl SimObserver for ConsoleObserver {
    fn on_round(&self, snapshot: &Snapshot, events: &[GameEvent]) -> Result<(), ObserverError> {
        let state = &snapshot.state;
        // Band position shows at a glance how close each price sits to
        // its clamp limits.
        let prices = state
            .instruments
            .iter()
            .map(|i| {
                format!(
                    "{} {} ({:.0}%)",
                    i.symbol,
                    i.price.get(),
                    i.price.ratio().to_f64() * 100.0
                )
            })
            .collect::<Vec<_>>()
            .join("  ");

        let mut stdout = std::io::stdout().lock();
        writeln!(
            stdout,
            "round {:>4}  cash {:>10}  {}  energy {}/{}  events {}",
            snapshot.round,
            state.money,
            prices,
            state.energy.current.get(),
            state.energy.current.max(),
            events.len(),
        )?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ConsoleObserver"
    }
}
