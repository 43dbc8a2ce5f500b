//! Shared minimum-interval gate for geocoder requests.
//!
//! The public Nominatim instance allows one request per second per client.
//! Every request from every worker, retries included, waits its turn here.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug)]
pub struct RequestGate {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestGate {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// caller was let through, then records this request.
    ///
    /// The lock is held while sleeping so callers are released one at a time.
    pub async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval.saturating_sub(elapsed)).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn first_request_passes_immediately() {
        let gate = RequestGate::new(Duration::from_secs(5));
        let started = Instant::now();
        gate.wait_turn().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn consecutive_requests_are_spaced() {
        let gate = RequestGate::new(Duration::from_millis(40));
        let started = Instant::now();
        for _ in 0..3 {
            gate.wait_turn().await;
        }
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_gate() {
        let gate = Arc::new(RequestGate::new(Duration::from_millis(30)));
        let started = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.wait_turn().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let gate = RequestGate::new(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..10 {
            gate.wait_turn().await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
