use std::time::Duration;

// Ticks fire when the held duration first passes delay, delay + interval,
// delay + 2 * interval, ... at most one per frame.
#[derive(Clone, Debug, Default)]
pub(crate) struct HoldRepeat {
    held: Duration,
    fired: u64,
}

impl HoldRepeat {
    pub(crate) fn held(&self) -> Duration {
        self.held
    }

    pub(crate) fn reset(&mut self) {
        self.held = Duration::ZERO;
        self.fired = 0;
    }

    pub(crate) fn advance(&mut self, dt: Duration, delay: Duration, interval: Duration) -> bool {
        self.held = self.held.saturating_add(dt);
        if self.held <= delay {
            return false;
        }
        let due = thresholds_passed(self.held - delay, interval);
        if due > self.fired {
            // a long frame skips missed ticks instead of bursting them
            self.fired = due;
            true
        } else {
            false
        }
    }
}

fn thresholds_passed(past: Duration, interval: Duration) -> u64 {
    let i = interval.max(Duration::from_millis(1)).as_nanos();
    let n = past.as_nanos().div_ceil(i);
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);
    const INTERVAL: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // hold times at which ticks fired, stepping `frame` ms at a time
    fn run(frame: u64, total: u64) -> Vec<u64> {
        let mut h = HoldRepeat::default();
        let mut fired = Vec::new();
        let mut t = 0;
        while t < total {
            t += frame;
            if h.advance(ms(frame), DELAY, INTERVAL) {
                fired.push(t);
            }
        }
        fired
    }

    #[test]
    fn nothing_before_the_delay() {
        let mut h = HoldRepeat::default();
        assert!(!h.advance(ms(250), DELAY, INTERVAL));
        assert!(!h.advance(ms(250), DELAY, INTERVAL));
        assert_eq!(h.held(), DELAY);
    }

    #[test]
    fn first_tick_just_past_the_delay() {
        let mut h = HoldRepeat::default();
        assert!(!h.advance(ms(500), DELAY, INTERVAL));
        assert!(h.advance(ms(1), DELAY, INTERVAL));
        assert!(!h.advance(ms(50), DELAY, INTERVAL));
        assert!(!h.advance(ms(49), DELAY, INTERVAL));
        assert!(h.advance(ms(1), DELAY, INTERVAL));
    }

    #[test]
    fn repeats_every_interval_at_ten_ms_frames() {
        assert_eq!(run(10, 900), vec![510, 610, 710, 810]);
    }

    #[test]
    fn sixty_fps_cadence_is_roughly_every_interval() {
        let fired = run(16, 1200);
        assert_eq!(fired.first(), Some(&512));
        for pair in fired.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((96..=112).contains(&gap), "gap {gap}");
        }
        assert_eq!(fired.len(), 7);
    }

    #[test]
    fn long_frame_fires_once() {
        let mut h = HoldRepeat::default();
        assert!(h.advance(ms(2050), DELAY, INTERVAL));
        assert!(!h.advance(ms(40), DELAY, INTERVAL));
    }

    #[test]
    fn reset_restarts_the_delay() {
        let mut h = HoldRepeat::default();
        assert!(h.advance(ms(600), DELAY, INTERVAL));
        h.reset();
        assert_eq!(h.held(), Duration::ZERO);
        assert!(!h.advance(ms(400), DELAY, INTERVAL));
    }
}
