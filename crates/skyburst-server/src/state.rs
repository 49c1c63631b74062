use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ServerConfig;
use crate::rate_limit::SlidingWindowLimiter;
use crate::relay::{Broadcaster, ChannelHub, Relay};

#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub config: Arc<ServerConfig>,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub sse_subscriber_count: Arc<AtomicUsize>,
}

impl AppState {
    /// State backed by the in-process [`ChannelHub`].
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(ChannelHub::new(config.limits.broadcast_capacity));
        Self::with_broadcaster(config, hub)
    }

    pub fn with_broadcaster(config: ServerConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        let limiter = Arc::new(SlidingWindowLimiter::new(
            config.limits.rate_limit_max,
            config.limits.rate_limit_window(),
        ));
        let relay = Relay::new(limiter, broadcaster, config.environment.channel_name());
        Self {
            relay,
            config: Arc::new(config),
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            sse_subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Counts one live connection for as long as it is held.
pub struct ConnectionGuard {
    counter: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
