use std::time::{Duration, Instant};

/// Repeating deadline polled from the control loop. Fires on the first poll,
/// then once per `period`; periods missed while the loop was stalled collapse
/// into a single firing.
#[derive(Clone, Debug)]
pub struct ScanTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl ScanTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            Some(due) => {
                let next = due + self.period;
                self.next_due = Some(if next <= now { now + self.period } else { next });
                true
            }
            None => {
                self.next_due = Some(now + self.period);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.next_due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_immediately_then_per_period() {
        let t0 = Instant::now();
        let mut t = ScanTimer::new(Duration::from_millis(100));
        assert!(t.poll(t0));
        assert!(!t.poll(t0 + Duration::from_millis(50)));
        assert!(t.poll(t0 + Duration::from_millis(100)));
        assert!(!t.poll(t0 + Duration::from_millis(150)));
        assert!(t.poll(t0 + Duration::from_millis(210)));
        // Deadlines stay aligned to the first poll.
        assert!(!t.poll(t0 + Duration::from_millis(299)));
        assert!(t.poll(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn missed_periods_collapse() {
        let t0 = Instant::now();
        let mut t = ScanTimer::new(Duration::from_millis(100));
        assert!(t.poll(t0));
        assert!(t.poll(t0 + Duration::from_millis(1000)));
        assert!(!t.poll(t0 + Duration::from_millis(1050)));
        assert!(t.poll(t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn reset_fires_again() {
        let t0 = Instant::now();
        let mut t = ScanTimer::new(Duration::from_secs(5));
        assert!(t.poll(t0));
        t.reset();
        assert!(t.poll(t0 + Duration::from_millis(1)));
    }
}
