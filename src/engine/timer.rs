use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Length of a countdown session unless configured otherwise.
pub const DEFAULT_SESSION_SECS: u32 = 1200;
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Countdown,
    Stopwatch,
}

impl TimerMode {
    pub fn toggled(self) -> Self {
        match self {
            TimerMode::Countdown => TimerMode::Stopwatch,
            TimerMode::Stopwatch => TimerMode::Countdown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Countdown => "countdown",
            TimerMode::Stopwatch => "stopwatch",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerState {
    pub mode: TimerMode,
    pub seconds: u32,
    pub running: bool,
    session_length: u32,
}

impl TimerState {
    /// A configured but stopped timer.
    pub fn new(mode: TimerMode, session_length: u32) -> Self {
        let mut timer = Self {
            mode,
            seconds: 0,
            running: false,
            session_length,
        };
        timer.seconds = timer.starting_seconds();
        timer
    }

    pub fn starting_seconds(&self) -> u32 {
        match self.mode {
            TimerMode::Countdown => self.session_length,
            TimerMode::Stopwatch => 0,
        }
    }

    pub fn session_length(&self) -> u32 {
        self.session_length
    }

    /// Reset to the mode's starting value and run.
    pub fn start(&mut self) {
        self.seconds = self.starting_seconds();
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one second. Countdown clamps at zero; stopwatch counts up.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.seconds = match self.mode {
            TimerMode::Countdown => self.seconds.saturating_sub(1),
            TimerMode::Stopwatch => self.seconds.saturating_add(1),
        };
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    /// Flip the mode and restart the counter from the new mode's starting value.
    /// Progress under the previous mode is discarded.
    pub fn switch_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.seconds = self.starting_seconds();
    }

    pub fn is_expired(&self) -> bool {
        self.mode == TimerMode::Countdown && self.seconds == 0
    }

    /// Seconds spent under the current mode.
    pub fn elapsed_secs(&self) -> u32 {
        match self.mode {
            TimerMode::Countdown => self.session_length.saturating_sub(self.seconds),
            TimerMode::Stopwatch => self.seconds,
        }
    }

    pub fn display(&self) -> String {
        format_clock(self.seconds)
    }
}

pub fn format_clock(seconds: u32) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{minutes:02}:{secs:02}")
}

/// Once-per-period schedule. Holding a `Ticker` is what keeps ticks flowing;
/// dropping it cancels every future tick.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
}

impl Ticker {
    pub fn start(now: Instant, period: Duration) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }

    /// Number of ticks that became due since the last poll.
    pub fn due(&mut self, now: Instant) -> u32 {
        let mut count = 0;
        while now >= self.next_due {
            self.next_due += self.period;
            count += 1;
        }
        count
    }
}
