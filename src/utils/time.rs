use std::time::{Duration, Instant};

/// Monotonic timer used to derive the elapsed time between playback ticks.
pub struct Timer {
    started: Instant,
    last_tick: Instant,
    /// Time between the two most recent ticks
    delta: Duration,
    /// Total number of ticks
    ticks: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Creates a new timer starting from now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_tick: now,
            delta: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Advances the timer and returns the time elapsed since the previous
    /// tick (or since creation, for the first tick).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        self.delta = now - self.last_tick;
        self.last_tick = now;
        self.ticks += 1;
        self.delta
    }

    /// Restarts the timer from now, clearing the tick count.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.started = now;
        self.last_tick = now;
        self.delta = Duration::ZERO;
        self.ticks = 0;
    }

    /// Elapsed time between the two most recent ticks.
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// The last delta in seconds, the unit playback runs in.
    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time since creation or the last [`Timer::reset`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last_tick - self.started
    }

    /// Number of ticks since creation or the last [`Timer::reset`].
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
