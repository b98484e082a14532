use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling-window request limiter for the public routing endpoint.
///
/// Admits a request only if fewer than `max_requests` were started within
/// the trailing `window`. Unlike a token bucket, the bound holds for every
/// window position: timestamps are kept and pruned, not smoothed.
/// Denied attempts are not recorded, so probing while saturated does not
/// push the reopening time further out.
pub struct RateWindow {
    max_requests: usize,
    window: Duration,
    started: Mutex<VecDeque<Instant>>,
}

impl RateWindow {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        RateWindow {
            max_requests,
            window,
            started: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Try to admit one request now. Returns false when the window is full.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut started = self.started.lock().unwrap_or_else(|e| e.into_inner());

        Self::prune(&mut started, now, self.window);

        if started.len() < self.max_requests {
            started.push_back(now);
            true
        } else {
            false
        }
    }

    /// Requests still admissible in the current window.
    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let mut started = self.started.lock().unwrap_or_else(|e| e.into_inner());

        Self::prune(&mut started, now, self.window);
        self.max_requests - started.len()
    }

    fn prune(started: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = started.front() {
            if now.duration_since(*oldest) >= window {
                started.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_denies() {
        let limiter = RateWindow::new(5, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn denied_attempts_do_not_extend_the_window() {
        let limiter = RateWindow::new(2, Duration::from_millis(100));

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());

        // Hammering while full must not delay reopening.
        for _ in 0..10 {
            assert!(!limiter.try_acquire());
        }

        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn window_reopens_after_expiry() {
        let limiter = RateWindow::new(3, Duration::from_millis(100));

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(limiter.remaining(), 3);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn remaining_counts_down() {
        let limiter = RateWindow::new(3, Duration::from_secs(60));

        assert_eq!(limiter.remaining(), 3);
        limiter.try_acquire();
        assert_eq!(limiter.remaining(), 2);
        limiter.try_acquire();
        limiter.try_acquire();
        assert_eq!(limiter.remaining(), 0);
    }
}
