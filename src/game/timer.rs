use std::time::{Duration, Instant};

/// Wall-clock puzzle timer.
///
/// Starts on the first interaction, not when the puzzle loads. Once stopped it
/// stays frozen until reset. All methods take the current instant so callers
/// control the clock.
#[derive(Debug, Clone, Default)]
pub struct PuzzleTimer {
    started_at: Option<Instant>,
    frozen: Option<Duration>,
    /// Time carried over from a saved session
    carried: Duration,
}

impl PuzzleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer that already stopped at `elapsed_seconds`, for restored puzzles
    pub fn stopped_at(elapsed_seconds: u64) -> Self {
        Self {
            started_at: None,
            frozen: Some(Duration::from_secs(elapsed_seconds)),
            carried: Duration::ZERO,
        }
    }

    /// A timer that continues from `elapsed_seconds` once started again
    pub fn resumed_from(elapsed_seconds: u64) -> Self {
        Self {
            started_at: None,
            frozen: None,
            carried: Duration::from_secs(elapsed_seconds),
        }
    }

    /// Start the timer. Returns false if it was already started or stopped.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() || self.frozen.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Freeze the elapsed time at `now`
    pub fn stop(&mut self, now: Instant) {
        if self.frozen.is_none() {
            self.frozen = Some(self.elapsed(now));
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some() || self.frozen.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.frozen.is_none()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.frozen, self.started_at) {
            (Some(frozen), _) => frozen,
            (None, Some(start)) => self.carried + now.saturating_duration_since(start),
            (None, None) => self.carried,
        }
    }

    pub fn elapsed_seconds(&self, now: Instant) -> u64 {
        self.elapsed(now).as_secs()
    }
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
