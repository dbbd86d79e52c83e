use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

/// Whole minutes and seconds shown by the game clock.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDisplay {
    pub minutes: u64,
    pub seconds: u8,
}

impl TimerDisplay {
    pub const ZERO: TimerDisplay = TimerDisplay {
        minutes: 0,
        seconds: 0,
    };

    pub const fn from_elapsed(elapsed: Duration) -> Self {
        let secs = elapsed.as_secs();
        Self {
            minutes: secs / 60,
            seconds: (secs % 60) as u8,
        }
    }
}

impl fmt::Display for TimerDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}M {}S", self.minutes, self.seconds)
    }
}

/// Elapsed game time, driven only by state changes and a host tick.
///
/// The two timestamps encode the phase: neither set is stopped, only `started_at` is running and
/// both set is paused.
#[derive(Clone, Debug)]
pub struct Timer<C: Clock> {
    clock: C,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    ticking: bool,
    display: TimerDisplay,
}

impl<C: Clock> Timer<C> {
    /// How often the host is expected to call [`Timer::tick`].
    pub const TICK_PERIOD: Duration = Duration::from_secs(1);

    pub fn new(clock: C) -> Self {
        Self {
            clock,
            started_at: None,
            paused_at: None,
            ticking: false,
            display: TimerDisplay::ZERO,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.ticking
    }

    pub fn is_paused(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_some() && !self.ticking
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Last value computed by a tick.
    pub fn display(&self) -> TimerDisplay {
        self.display
    }

    /// Time since start minus time spent paused.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => {
                let until = self.paused_at.unwrap_or_else(|| self.clock.now());
                until.saturating_duration_since(started_at)
            }
            None => Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        if self.started_at.is_some() || self.ticking || self.paused_at.is_some() {
            return;
        }
        self.started_at = Some(self.clock.now());
        self.ticking = true;
        log::debug!("timer started");
        self.tick();
    }

    pub fn pause(&mut self) {
        if self.started_at.is_none() || !self.ticking {
            return;
        }
        self.tick();
        self.ticking = false;
        self.paused_at = Some(self.clock.now());
        log::debug!("timer paused at {}", TimerDisplay::from_elapsed(self.elapsed()));
    }

    pub fn resume(&mut self) {
        let (Some(started_at), Some(paused_at)) = (self.started_at, self.paused_at) else {
            return;
        };
        if self.ticking {
            return;
        }
        let paused_for = self.clock.now().saturating_duration_since(paused_at);
        self.started_at = Some(started_at + paused_for);
        self.paused_at = None;
        self.ticking = true;
        log::debug!("timer resumed after {:?}", paused_for);
        self.tick();
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.paused_at = None;
        self.ticking = false;
        self.display = TimerDisplay::ZERO;
        log::debug!("timer stopped");
    }

    /// Refresh the display, does nothing unless running.
    pub fn tick(&mut self) -> TimerDisplay {
        if self.ticking {
            self.display = TimerDisplay::from_elapsed(self.elapsed());
        }
        self.display
    }
}

impl<C: Clock> StateListener for Timer<C> {
    fn on_state_changed(&mut self, StateChange { old, new }: StateChange) {
        use GameState::*;
        match (old, new) {
            (_, Paused | Won | Lose) => self.pause(),
            (NotStarted, Running) => self.start(),
            (Paused, Running) => self.resume(),
            (Lose, Running) => {
                self.stop();
                self.start();
            }
            (_, NotStarted) => self.stop(),
            (Running | Won, Running) => {}
        }
    }
}
