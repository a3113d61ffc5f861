//! Session clock: fixed countdown or open stopwatch at one-second granularity.
//!
//! The clock is pure state; the one-second cadence comes from the runtime
//! ticker. A duration of 0 selects the open stopwatch.

/// What a one-second tick did to the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock is not running; nothing happened.
    Idle,
    /// One second accounted for, race still in progress.
    Running,
    /// Countdown reached zero on this tick. Fired at most once per race.
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionClock {
    duration_secs: u64,
    seconds_remaining: Option<u64>,
    seconds_elapsed: u64,
    running: bool,
    // finish latch: once set, Expired can never fire again until reset
    expired: bool,
}

impl SessionClock {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            seconds_remaining: (duration_secs > 0).then_some(duration_secs),
            seconds_elapsed: 0,
            running: false,
            expired: false,
        }
    }

    pub fn is_countdown(&self) -> bool {
        self.duration_secs > 0
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.seconds_remaining
    }

    pub fn seconds_elapsed(&self) -> u64 {
        self.seconds_elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    /// Start ticking. Re-entrant starts are no-ops, as is starting a clock
    /// that has already expired.
    pub fn start(&mut self) {
        if !self.running && !self.expired {
            self.running = true;
        }
    }

    /// Account for one second of race time.
    pub fn on_tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.seconds_elapsed += 1;
        match self.seconds_remaining {
            Some(remaining) => {
                let remaining = remaining.saturating_sub(1);
                self.seconds_remaining = Some(remaining);
                if remaining == 0 {
                    self.expired = true;
                    self.running = false;
                    TickOutcome::Expired
                } else {
                    TickOutcome::Running
                }
            }
            None => TickOutcome::Running,
        }
    }

    /// Stop ticking without expiring (race completed by finishing the words).
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Restore the clock to its initial state, cancelling any pending expiry.
    pub fn reset(&mut self) {
        *self = Self::new(self.duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_counts_down() {
        let mut clock = SessionClock::new(3);
        assert!(clock.is_countdown());
        assert_eq!(clock.seconds_remaining(), Some(3));

        clock.start();
        assert_eq!(clock.on_tick(), TickOutcome::Running);
        assert_eq!(clock.seconds_remaining(), Some(2));
        assert_eq!(clock.seconds_elapsed(), 1);
    }

    #[test]
    fn test_stopwatch_counts_up() {
        let mut clock = SessionClock::new(0);
        assert!(!clock.is_countdown());
        assert_eq!(clock.seconds_remaining(), None);

        clock.start();
        clock.on_tick();
        clock.on_tick();
        assert_eq!(clock.seconds_elapsed(), 2);
        assert!(!clock.has_expired());
    }

    #[test]
    fn test_tick_before_start_is_idle() {
        let mut clock = SessionClock::new(5);
        assert_eq!(clock.on_tick(), TickOutcome::Idle);
        assert_eq!(clock.seconds_elapsed(), 0);
        assert_eq!(clock.seconds_remaining(), Some(5));
    }

    #[test]
    fn test_expiry_fires_exactly_once() {
        let mut clock = SessionClock::new(2);
        clock.start();
        assert_eq!(clock.on_tick(), TickOutcome::Running);
        assert_eq!(clock.on_tick(), TickOutcome::Expired);
        assert!(clock.has_expired());
        assert!(!clock.is_running());

        // Further ticks and starts are inert until reset
        assert_eq!(clock.on_tick(), TickOutcome::Idle);
        clock.start();
        assert!(!clock.is_running());
        assert_eq!(clock.on_tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_reentrant_start_is_noop() {
        let mut clock = SessionClock::new(10);
        clock.start();
        clock.on_tick();
        clock.start();
        assert_eq!(clock.seconds_elapsed(), 1);
        assert_eq!(clock.seconds_remaining(), Some(9));
    }

    #[test]
    fn test_stop_does_not_expire() {
        let mut clock = SessionClock::new(10);
        clock.start();
        clock.on_tick();
        clock.stop();
        assert!(!clock.is_running());
        assert!(!clock.has_expired());
        assert_eq!(clock.on_tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut clock = SessionClock::new(2);
        clock.start();
        clock.on_tick();
        clock.on_tick();
        assert!(clock.has_expired());

        clock.reset();
        assert_eq!(clock, SessionClock::new(2));
        clock.start();
        assert_eq!(clock.on_tick(), TickOutcome::Running);
    }
}
