/// What focus mode is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FocusTarget {
    Task(String),
    Note(String),
    /// Focus mode opened without an item (quick capture)
    #[default]
    Empty,
}

/// Countdown state for focus mode. Times are in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTimer {
    pub duration: u64,
    pub time_left: u64,
    pub running: bool,
}

impl FocusTimer {
    pub fn new(duration: u64) -> Self {
        FocusTimer {
            duration,
            time_left: duration,
            running: false,
        }
    }

    /// Advance by one second. Stops the timer when it reaches zero.
    /// Returns true if this tick finished the countdown.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.time_left == 0 {
            return false;
        }
        self.time_left -= 1;
        if self.time_left == 0 {
            self.running = false;
            return true;
        }
        false
    }

    /// Add `secs` to both the total duration and the remaining time.
    pub fn extend(&mut self, secs: u64) {
        self.duration += secs;
        self.time_left += secs;
    }

    /// Replace the duration and reset the countdown, paused.
    /// Durations under one minute are raised to one minute.
    pub fn set_duration(&mut self, secs: u64) {
        let secs = secs.max(60);
        self.duration = secs;
        self.time_left = secs;
        self.running = false;
    }

    /// Remaining time as a fraction of the duration, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        self.time_left as f64 / self.duration as f64
    }
}

/// Focus mode session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSession {
    pub active: bool,
    pub minimized: bool,
    pub target: FocusTarget,
    pub timer: FocusTimer,
}

impl FocusSession {
    pub fn new(duration: u64) -> Self {
        FocusSession {
            active: false,
            minimized: false,
            target: FocusTarget::Empty,
            timer: FocusTimer::new(duration),
        }
    }

    /// Open focus mode on `target` with a fresh timer.
    /// The timer runs straight away for task and note targets.
    pub fn start(&mut self, target: FocusTarget, duration: u64) {
        let running = target != FocusTarget::Empty;
        self.active = true;
        self.minimized = false;
        self.target = target;
        self.timer = FocusTimer {
            duration,
            time_left: duration,
            running,
        };
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.minimized = false;
        self.target = FocusTarget::Empty;
        self.timer.running = false;
    }

    /// Minimizing pauses the timer.
    pub fn minimize(&mut self) {
        if !self.active {
            return;
        }
        self.minimized = true;
        self.timer.running = false;
    }

    /// Restoring resumes the timer.
    pub fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.minimized = false;
        self.timer.running = self.timer.time_left > 0;
    }

    pub fn toggle_timer(&mut self) {
        if !self.active {
            return;
        }
        self.timer.running = !self.timer.running && self.timer.time_left > 0;
    }

    /// Whether the one-second tick should be running
    pub fn wants_ticks(&self) -> bool {
        self.active && self.timer.running
    }
}
