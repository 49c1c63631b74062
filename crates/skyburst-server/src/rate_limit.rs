use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Per-client sliding-window rate limiter.
///
/// Each key keeps the instants of its admissions inside the current window.
/// `admit` and `sweep` share one lock, so admission for a key is serialized.
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_per_window: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_per_window,
            window,
        }
    }

    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` and records `now` if `key` is under its limit,
    /// `false` (recording nothing) otherwise.
    pub async fn admit(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;
        let stamps = windows.entry(key.to_string()).or_default();
        prune(stamps, now, self.window);
        if stamps.len() >= self.max_per_window {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// [`admit`](Self::admit) at the current instant.
    pub async fn admit_now(&self, key: &str) -> bool {
        self.admit(key, Instant::now()).await
    }

    /// Drop keys with no admissions left in the window. Returns how many were removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, stamps| {
            prune(stamps, now, self.window);
            !stamps.is_empty()
        });
        before - windows.len()
    }

    /// Number of keys currently holding state.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = stamps.front() {
        if now.saturating_duration_since(oldest) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Background task that sweeps idle keys every `interval`, independent of traffic.
pub fn spawn_rate_limit_sweeper(
    limiter: Arc<SlidingWindowLimiter>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep(Instant::now()).await;
            if removed > 0 {
                tracing::debug!(removed, "Swept idle rate-limit entries");
            }
        }
    })
}
