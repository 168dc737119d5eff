//! Event handling for the TUI

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::live::DashboardState;

/// TUI events
#[derive(Debug, Clone)]
pub enum Event {
    /// Redraw tick
    Tick,
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// The live client published a new state
    StateChanged,
}

/// Merges terminal input, ticks and live state changes into one channel
pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    tick_rate: Duration,
}

impl EventHandler {
    /// Handler ticking every `tick_rate_ms` milliseconds
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            tick_rate: Duration::from_millis(tick_rate_ms.max(1)),
        }
    }

    /// Sender for injecting events
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Start reading terminal input and ticking
    pub fn start(&self) {
        let tx = self.tx.clone();
        let tick_rate = self.tick_rate;

        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut ticker = tokio::time::interval(tick_rate);

            loop {
                let event = tokio::select! {
                    _ = ticker.tick() => Event::Tick,
                    next = reader.next() => match next {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => Event::Key(key),
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            debug!(error = %e, "Terminal input error");
                            continue;
                        }
                        None => break,
                    },
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
    }

    /// Forward every state change from the live client
    pub fn watch_state(&self, mut state_rx: watch::Receiver<DashboardState>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                if tx.send(Event::StateChanged).is_err() {
                    break;
                }
            }
        });
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_changes_are_forwarded() {
        let (state_tx, state_rx) = watch::channel(DashboardState::default());
        let mut events = EventHandler::new(250);
        events.watch_state(state_rx);

        state_tx.send_modify(|s| s.revision = 1);
        assert!(matches!(events.next().await, Some(Event::StateChanged)));
    }

    #[tokio::test]
    async fn test_injected_events_arrive() {
        let mut events = EventHandler::new(250);
        events.sender().send(Event::Resize(80, 24)).unwrap();
        assert!(matches!(events.next().await, Some(Event::Resize(80, 24))));
    }
}
