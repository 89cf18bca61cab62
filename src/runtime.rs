use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation handle for the live render loop.
///
/// Clones observe the same flag; once cancelled it stays cancelled.
#[derive(Clone)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-interval schedule for the capture-and-render cycle.
///
/// Overrun policy is skip: when a cycle takes longer than the
/// interval, missed ticks are dropped and the schedule realigns to
/// the grid, so a slow cycle never builds a backlog.
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    /// `interval` must be non-zero; callers validate user input.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    /// Block until the next scheduled tick fires. Returns how many
    /// ticks were skipped to catch up (0 while keeping pace).
    pub fn wait(&mut self) -> u32 {
        let now = Instant::now();
        if now < self.next {
            std::thread::sleep(self.next - now);
            self.next += self.interval;
            return 0;
        }
        self.skip_to(now)
    }

    /// Drop every grid point at or before `now` except the latest,
    /// which fires immediately; schedule the one after it.
    fn skip_to(&mut self, now: Instant) -> u32 {
        let behind = now.duration_since(self.next);
        let skipped = (behind.as_nanos() / self.interval.as_nanos()) as u32;
        self.next += self.interval * (skipped + 1);
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn cancel_propagates_across_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());

        flag.cancel();
        assert!(observer.is_cancelled());
        // Cancelling again changes nothing.
        flag.cancel();
        assert!(observer.is_cancelled());
    }

    #[rstest]
    #[case(0, 0)] // exactly on the grid point: it fires, nothing skipped
    #[case(50, 0)] // mid-interval: still the same tick
    #[case(100, 1)]
    #[case(250, 2)]
    #[case(1000, 10)]
    fn overrun_skips_whole_missed_ticks(#[case] behind_ms: u64, #[case] expected_skips: u32) {
        let interval = Duration::from_millis(100);
        let mut ticker = Ticker::new(interval);

        let due = ticker.next;
        let skipped = ticker.skip_to(due + Duration::from_millis(behind_ms));
        assert_eq!(skipped, expected_skips);
        // The schedule realigned past the observed instant.
        assert!(ticker.next > due + Duration::from_millis(behind_ms));
    }

    #[test]
    fn on_pace_wait_skips_nothing() {
        let mut ticker = Ticker::new(Duration::from_millis(25));
        for _ in 0..3 {
            assert_eq!(ticker.wait(), 0);
        }
    }
}
