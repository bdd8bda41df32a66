/// Default focus phase length in seconds (25 minutes)
pub const DEFAULT_WORK_SECS: u32 = 25 * 60;

/// Default break phase length in seconds (5 minutes)
pub const DEFAULT_BREAK_SECS: u32 = 5 * 60;

/// The two phases a session alternates between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }
}

/// Emitted when a countdown reaches zero and the session flips phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCompleted {
    pub finished: Phase,
    pub next: Phase,
}

/// The Pomodoro countdown state machine.
///
/// Pure state - the caller drives it with one `tick()` per elapsed second
/// while running. Pausing suspends ticking entirely, so no time accrues
/// while paused.
#[derive(Debug)]
pub struct PomodoroTimer {
    phase: Phase,
    work_secs: u32,
    break_secs: u32,
    remaining_secs: u32,
    running: bool,
    focus_count: u32,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::with_durations(DEFAULT_WORK_SECS, DEFAULT_BREAK_SECS)
    }
}

impl PomodoroTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(work_secs: u32, break_secs: u32) -> Self {
        Self {
            phase: Phase::Work,
            work_secs,
            break_secs,
            remaining_secs: work_secs,
            running: false,
            focus_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Completed Work phases this session
    pub fn focus_count(&self) -> u32 {
        self.focus_count
    }

    pub fn reset_focus_count(&mut self) {
        self.focus_count = 0;
    }

    /// Resume the countdown from wherever it stands
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Suspend the countdown without touching the remaining time
    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Back to a stopped Work phase at full duration; keeps the focus count
    pub fn reset(&mut self) {
        self.phase = Phase::Work;
        self.running = false;
        self.remaining_secs = self.work_secs;
    }

    /// Set both durations. Always stops the run and returns to a full
    /// Work phase, even mid-countdown.
    pub fn configure(&mut self, work_secs: u32, break_secs: u32) {
        self.work_secs = work_secs;
        self.break_secs = break_secs;
        self.phase = Phase::Work;
        self.running = false;
        self.remaining_secs = work_secs;
    }

    /// Consume one second of the countdown. Returns the completion event
    /// when this tick finishes the current phase: the run stops, the
    /// phase flips, and the next phase's duration is loaded. Finishing a
    /// Work phase increments the focus count.
    pub fn tick(&mut self) -> Option<PhaseCompleted> {
        if !self.running || self.remaining_secs == 0 {
            return None;
        }

        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return None;
        }

        self.running = false;
        let finished = self.phase;
        match finished {
            Phase::Work => {
                self.focus_count += 1;
                self.phase = Phase::Break;
                self.remaining_secs = self.break_secs;
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.remaining_secs = self.work_secs;
            }
        }

        Some(PhaseCompleted {
            finished,
            next: self.phase,
        })
    }

    /// Remaining time as "MM:SS"
    pub fn format_remaining(&self) -> String {
        let minutes = self.remaining_secs / 60;
        let seconds = self.remaining_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initial_state() {
        let timer = PomodoroTimer::new();
        assert_eq!(timer.phase(), Phase::Work);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), DEFAULT_WORK_SECS);
        assert_eq!(timer.focus_count(), 0);
    }

    #[test]
    fn test_tick_does_nothing_while_paused() {
        let mut timer = PomodoroTimer::new();
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining_secs(), DEFAULT_WORK_SECS);
    }

    #[test]
    fn test_tick_counts_down_while_running() {
        let mut timer = PomodoroTimer::new();
        timer.start();
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining_secs(), DEFAULT_WORK_SECS - 1);
    }

    #[test]
    fn test_full_work_phase_flips_to_break() {
        let mut timer = PomodoroTimer::new();
        timer.start();

        let mut completed = None;
        for _ in 0..DEFAULT_WORK_SECS {
            completed = timer.tick();
        }

        assert_eq!(
            completed,
            Some(PhaseCompleted {
                finished: Phase::Work,
                next: Phase::Break,
            })
        );
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining_secs(), DEFAULT_BREAK_SECS);
        assert_eq!(timer.focus_count(), 1);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_full_break_phase_flips_back_to_work() {
        let mut timer = PomodoroTimer::with_durations(10, 3);
        timer.start();
        for _ in 0..10 {
            timer.tick();
        }
        assert_eq!(timer.phase(), Phase::Break);

        timer.start();
        let mut completed = None;
        for _ in 0..3 {
            completed = timer.tick();
        }

        assert_eq!(
            completed,
            Some(PhaseCompleted {
                finished: Phase::Break,
                next: Phase::Work,
            })
        );
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_secs(), 10);
        // Finishing a break does not count as a focus session
        assert_eq!(timer.focus_count(), 1);
    }

    #[test]
    fn test_pause_and_resume_keeps_remaining_time() {
        let mut timer = PomodoroTimer::with_durations(100, 20);
        timer.start();
        for _ in 0..30 {
            timer.tick();
        }
        assert_eq!(timer.remaining_secs(), 70);

        timer.pause();
        // Ticks while paused change nothing
        for _ in 0..50 {
            assert!(timer.tick().is_none());
        }
        assert_eq!(timer.remaining_secs(), 70);

        timer.start();
        timer.tick();
        assert_eq!(timer.remaining_secs(), 69);
    }

    #[test]
    fn test_toggle_flips_running() {
        let mut timer = PomodoroTimer::new();
        timer.toggle();
        assert!(timer.is_running());
        timer.toggle();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_reset_returns_to_stopped_work_phase() {
        let mut timer = PomodoroTimer::with_durations(10, 3);
        timer.start();
        for _ in 0..10 {
            timer.tick();
        }
        timer.start();
        timer.tick();
        assert_eq!(timer.phase(), Phase::Break);

        timer.reset();
        assert_eq!(timer.phase(), Phase::Work);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 10);
        // The focus count survives a reset
        assert_eq!(timer.focus_count(), 1);
    }

    #[test]
    fn test_configure_mid_run_forces_work_phase() {
        let mut timer = PomodoroTimer::with_durations(10, 3);
        timer.start();
        for _ in 0..10 {
            timer.tick();
        }
        timer.start();
        assert_eq!(timer.phase(), Phase::Break);

        timer.configure(50, 10);
        assert_eq!(timer.phase(), Phase::Work);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 50);
    }

    #[test]
    fn test_focus_count_accumulates_and_resets() {
        let mut timer = PomodoroTimer::with_durations(2, 1);

        for _ in 0..3 {
            timer.start();
            timer.tick();
            timer.tick(); // completes Work
            timer.start();
            timer.tick(); // completes Break
        }
        assert_eq!(timer.focus_count(), 3);

        timer.reset_focus_count();
        assert_eq!(timer.focus_count(), 0);
    }

    #[test]
    fn test_default_durations_after_1500_ticks() {
        let mut timer = PomodoroTimer::new();
        timer.start();
        for _ in 0..1500 {
            timer.tick();
        }

        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining_secs(), 300);
        assert_eq!(timer.focus_count(), 1);
    }

    #[test]
    fn test_format_remaining() {
        let mut timer = PomodoroTimer::with_durations(1500, 300);
        assert_eq!(timer.format_remaining(), "25:00");
        timer.start();
        timer.tick();
        assert_eq!(timer.format_remaining(), "24:59");
    }
}
