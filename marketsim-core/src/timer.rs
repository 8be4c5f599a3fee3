//! Non-blocking interval timer. The driving loop feeds in elapsed wall
//! time; the timer answers how many round ticks became due. Nothing here
//! sleeps or spawns.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    accumulated: Duration,
    state: TimerState,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
            state: TimerState::Stopped,
        }
    }

    /// Begin ticking from a clean accumulator.
    pub fn start(&mut self) {
        self.accumulated = Duration::ZERO;
        self.state = TimerState::Running;
    }

    /// Stop and clear. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.accumulated = Duration::ZERO;
        self.state = TimerState::Stopped;
    }

    /// Freeze the accumulator. No-op unless running.
    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Continue from the frozen accumulator. No-op unless paused.
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Replace the interval; already-accumulated time is kept.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Credit elapsed time and return how many ticks became due. Time fed
    /// while stopped or paused is discarded.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.state != TimerState::Running || self.interval.is_zero() {
            return 0;
        }

        self.accumulated += dt;
        let mut due = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            due += 1;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_ticks_accumulate_across_advances() {
        let mut timer = TickTimer::new(ms(100));
        timer.start();

        assert_eq!(timer.advance(ms(60)), 0);
        assert_eq!(timer.advance(ms(60)), 1);
        assert_eq!(timer.advance(ms(79)), 0);
        assert_eq!(timer.advance(ms(1)), 1);
    }

    #[test]
    fn test_large_step_yields_multiple_ticks() {
        let mut timer = TickTimer::new(ms(100));
        timer.start();

        assert_eq!(timer.advance(ms(350)), 3);
        assert_eq!(timer.advance(ms(50)), 1);
    }

    #[test]
    fn test_stopped_timer_discards_time() {
        let mut timer = TickTimer::new(ms(100));
        assert_eq!(timer.advance(ms(500)), 0);

        timer.start();
        timer.stop();
        timer.stop(); // repeated stop is harmless
        assert_eq!(timer.advance(ms(500)), 0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut timer = TickTimer::new(ms(100));
        timer.start();
        timer.advance(ms(70));

        timer.pause();
        timer.pause(); // repeated pause is harmless
        assert_eq!(timer.advance(ms(500)), 0);

        timer.resume();
        timer.resume(); // repeated resume is harmless
        assert_eq!(timer.advance(ms(30)), 1);
    }

    #[test]
    fn test_resume_without_pause_does_not_start() {
        let mut timer = TickTimer::new(ms(100));
        timer.resume();
        assert!(!timer.is_running());
        assert_eq!(timer.advance(ms(500)), 0);
    }

    #[test]
    fn test_start_clears_leftover_time() {
        let mut timer = TickTimer::new(ms(100));
        timer.start();
        timer.advance(ms(90));

        timer.start();
        assert_eq!(timer.advance(ms(90)), 0);
    }

    #[test]
    fn test_zero_interval_never_ticks() {
        let mut timer = TickTimer::new(Duration::ZERO);
        timer.start();
        assert_eq!(timer.advance(ms(100)), 0);
    }
}
