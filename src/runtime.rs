use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::sync::ServerMsg;

/// One-second cadence for the session clock.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Unified event type consumed by the app runner. Keystrokes, ticks and
/// inbound channel messages are processed as discrete, non-overlapping
/// handlers; no transition is interrupted by another.
#[derive(Clone, Debug)]
pub enum RaceEvent {
    Key(KeyEvent),
    /// Inbound message from the relay channel.
    Net(ServerMsg),
    Resize,
    Tick,
}

/// Source of events (keyboard, channel, resize).
pub trait RaceEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<RaceEvent, RecvTimeoutError>;
}

/// Production event source reading terminal input via crossterm. Channel
/// messages can be injected through the sender half.
pub struct CrosstermEventSource {
    rx: Receiver<RaceEvent>,
}

impl CrosstermEventSource {
    /// Terminal input only; what the practice front-end uses.
    pub fn new() -> Self {
        let (source, _net_tx) = Self::with_net_injection();
        source
    }

    /// Terminal input plus a sender half for injecting relay messages as
    /// `RaceEvent::Net`.
    pub fn with_net_injection() -> (Self, mpsc::Sender<RaceEvent>) {
        let (tx, rx) = mpsc::channel();

        let key_tx = tx.clone();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(RaceEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(RaceEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        (Self { rx }, tx)
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<RaceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<RaceEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<RaceEvent>) -> Self {
        Self { rx }
    }
}

impl RaceEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<RaceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: RaceEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: RaceEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> RaceEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => RaceEvent::Tick,
        }
    }
}
