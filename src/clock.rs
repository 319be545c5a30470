use std::time::{Duration, Instant};

/// A periodic trigger. Rather than sleeping per tick, the caller asks how many
/// ticks have come due since it last looked and runs that many.
#[derive(Clone, Debug)]
pub struct Clock {
    period: Duration,
    next: Instant,
    max_backlog: u32,
}

impl Clock {
    /// a clock firing `hz` times a second, first tick one period after `start`
    pub fn from_hz(hz: u32, start: Instant) -> Self {
        let hz = hz.max(1);
        let period = Duration::from_nanos(1_000_000_000 / hz as u64);
        Clock {
            period,
            next: start + period,
            // catch up on at most 100ms of missed ticks
            max_backlog: (hz / 10).max(1),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// when the next tick is due
    pub fn next_tick(&self) -> Instant {
        self.next
    }

    /// how many ticks are due at `now`. If we've fallen further behind than
    /// the backlog allows, the missed ticks are dropped and the clock restarts
    /// from `now`.
    pub fn due(&mut self, now: Instant) -> u32 {
        if now < self.next {
            return 0;
        }
        let late = (now - self.next).as_nanos() / self.period.as_nanos();
        let ticks = late.saturating_add(1);
        if ticks > self.max_backlog as u128 {
            self.next = now + self.period;
            return self.max_backlog;
        }
        let ticks = ticks as u32;
        self.next += self.period * ticks;
        ticks
    }
}

/// sleep until `deadline`; spin_sleep keeps us accurate at 700Hz where
/// thread::sleep alone overshoots
pub fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        spin_sleep::sleep(deadline - now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        let c = Clock::from_hz(60, Instant::now());
        assert_eq!(c.period(), Duration::from_nanos(16_666_666));
        let c = Clock::from_hz(0, Instant::now());
        assert_eq!(c.period(), Duration::from_secs(1));
    }

    #[test]
    fn test_nothing_due_before_first_period() {
        let t0 = Instant::now();
        let mut c = Clock::from_hz(100, t0);
        assert_eq!(c.due(t0), 0);
        assert_eq!(c.due(t0 + Duration::from_millis(9)), 0);
        assert_eq!(c.next_tick(), t0 + Duration::from_millis(10));
    }

    #[test]
    fn test_ticks_counted_once() {
        let t0 = Instant::now();
        let mut c = Clock::from_hz(100, t0);
        assert_eq!(c.due(t0 + Duration::from_millis(10)), 1);
        assert_eq!(c.due(t0 + Duration::from_millis(10)), 0);
        assert_eq!(c.due(t0 + Duration::from_millis(35)), 2);
        assert_eq!(c.next_tick(), t0 + Duration::from_millis(40));
    }

    #[test]
    fn test_independent_periods() {
        let t0 = Instant::now();
        let mut fast = Clock::from_hz(700, t0);
        let mut slow = Clock::from_hz(60, t0);
        let mut fast_ticks = 0;
        let mut slow_ticks = 0;
        for ms in 1..=60 {
            let now = t0 + Duration::from_millis(ms);
            fast_ticks += fast.due(now);
            slow_ticks += slow.due(now);
        }
        assert_eq!(fast_ticks, 42);
        assert_eq!(slow_ticks, 3);
    }

    #[test]
    fn test_backlog_capped() {
        let t0 = Instant::now();
        let mut c = Clock::from_hz(100, t0);
        let later = t0 + Duration::from_secs(5);
        assert_eq!(c.due(later), 10);
        assert_eq!(c.next_tick(), later + Duration::from_millis(10));
        assert_eq!(c.due(later), 0);
    }
}
