//! Event log observer: records every simulation event as JSONL.
//!
//! One JSON object per line, tagged by event type:
//! ```json
//! {"type":"price_changed","instrument":0,"old_price":10000,"new_price":10350,"round":4}
//! ```
//! Output goes to any `Write` destination (stdout, file, pipe).

use super::{ObserverError, SimObserver, Snapshot};
use crate::events::GameEvent;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// One logged line: the event plus the round it happened in.
#[derive(Serialize)]
struct LoggedEvent<'a> {
    #[serde(flatten)]
    event: &'a GameEvent,
    round: u64,
}

pub struct EventLogObserver {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl EventLogObserver {
    /// Write JSONL to stdout, for piping into `jq` and friends.
    pub fn stdout() -> Self {
        Self::new(Box::new(BufWriter::new(std::io::stdout())))
    }

    /// Write JSONL to a file.
    pub fn file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl SimObserver for EventLogObserver {
    fn on_round(&self, snapshot: &Snapshot, events: &[GameEvent]) -> Result<(), ObserverError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ObserverError::Render("event log writer lock poisoned".into()))?;

        for event in events {
            let line = LoggedEvent {
                event,
                round: snapshot.round,
            };
            serde_json::to_writer(&mut *writer, &line)?;
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "EventLogObserver"
    }

    fn on_shutdown(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::state::InstrumentId;
    use crate::testing::GameStateBuilder;
    use std::io::Cursor;
    use std::sync::Arc;

    /// Shared buffer so the test can read what the observer wrote.
    struct OutputCapture(Arc<Mutex<Cursor<Vec<u8>>>>);

    impl Write for OutputCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.0.lock().unwrap().flush()
        }
    }

    #[test]
    fn test_events_written_as_tagged_jsonl() {
        let output = Arc::new(Mutex::new(Cursor::new(Vec::new())));
        let observer = EventLogObserver::new(Box::new(OutputCapture(output.clone())));

        let snapshot = Snapshot::new(GameStateBuilder::new().build(), 7);
        let events = vec![
            GameEvent::PriceChanged {
                instrument: InstrumentId(0),
                old_price: Fixed::from_int(100),
                new_price: Fixed::from_f64(103.5),
            },
            GameEvent::RoundCompleted { round: 7 },
        ];
        observer.on_round(&snapshot, &events).unwrap();

        let data = output.lock().unwrap();
        let text = String::from_utf8_lossy(data.get_ref());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"type\":\"price_changed\""));
        assert!(lines[0].contains("\"round\":7"));
        assert!(lines[1].contains("\"type\":\"round_completed\""));
    }

    #[test]
    fn test_empty_batches_write_nothing() {
        let output = Arc::new(Mutex::new(Cursor::new(Vec::new())));
        let observer = EventLogObserver::new(Box::new(OutputCapture(output.clone())));

        let snapshot = Snapshot::new(GameStateBuilder::new().build(), 0);
        observer.on_round(&snapshot, &[]).unwrap();

        assert!(output.lock().unwrap().get_ref().is_empty());
    }
}
