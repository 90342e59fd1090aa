use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// What the app loop reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// One clock period has passed
    Tick,
    /// Nothing arrived within the poll interval; redraw only
    Idle,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(AppEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Loop timing: how long to wait for input, and how often the clock ticks
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
    fn period(&self) -> Duration;
}

/// Fixed poll interval and clock period
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
    period: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration, period: Duration) -> Self {
        Self { interval, period }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }

    fn period(&self) -> Duration {
        self.period
    }
}

/// Test event source fed from a channel
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the app one event at a time. Clock ticks are interleaved with
/// input so a burst of keys never starves the session clock.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Instant::now(),
        }
    }

    /// Tick when a period has passed, otherwise block up to the poll
    /// interval for an event and return Idle on timeout
    pub fn step(&mut self) -> AppEvent {
        if self.tick_due(Instant::now()) {
            return AppEvent::Tick;
        }
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Idle,
        }
    }

    /// Count the next period from now, e.g. when a round starts
    pub fn restart_clock(&mut self) {
        self.last_tick = Instant::now();
    }

    fn tick_due(&mut self, now: Instant) -> bool {
        let period = self.ticker.period();
        if now.saturating_duration_since(self.last_tick) < period {
            return false;
        }
        self.last_tick += period;
        // don't replay a backlog after a stall
        if now.saturating_duration_since(self.last_tick) >= period {
            self.last_tick = now;
        }
        true
    }
}
