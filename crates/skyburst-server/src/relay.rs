use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use skyburst_core::net::messages::{ChannelMessage, FireworkEvent};

use crate::rate_limit::SlidingWindowLimiter;

/// Failure inside the fan-out transport.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastError {
    /// The transport's internal state is unusable.
    Unavailable(String),
}

impl std::fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(m) => write!(f, "broadcast transport unavailable: {m}"),
        }
    }
}

impl std::error::Error for BroadcastError {}

/// Fan-out transport behind the relay. A publish reaches every current
/// subscriber of the channel at most once.
pub trait Broadcaster: Send + Sync + 'static {
    /// Publish to `channel`, returning how many subscribers were reached.
    fn publish(&self, channel: &str, msg: &ChannelMessage) -> Result<usize, BroadcastError>;

    fn subscribe(&self, channel: &str)
    -> Result<broadcast::Receiver<ChannelMessage>, BroadcastError>;
}

/// In-process transport: one bounded `tokio::sync::broadcast` channel per name.
pub struct ChannelHub {
    channels: Mutex<HashMap<String, broadcast::Sender<ChannelMessage>>>,
    capacity: usize,
}

impl ChannelHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, channel: &str) -> Result<broadcast::Sender<ChannelMessage>, BroadcastError> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|e| BroadcastError::Unavailable(e.to_string()))?;
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(tx.clone())
    }
}

impl Broadcaster for ChannelHub {
    fn publish(&self, channel: &str, msg: &ChannelMessage) -> Result<usize, BroadcastError> {
        // Sending with no subscribers is not a failure; nobody is watching yet.
        Ok(self.sender(channel)?.send(msg.clone()).unwrap_or(0))
    }

    fn subscribe(
        &self,
        channel: &str,
    ) -> Result<broadcast::Receiver<ChannelMessage>, BroadcastError> {
        Ok(self.sender(channel)?.subscribe())
    }
}

/// Why a publish did not go out.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishError {
    /// The client is over its rate limit.
    Throttled { limit: usize, window: Duration },
    Transport(BroadcastError),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Throttled { limit, window } if *window == Duration::from_secs(1) => {
                write!(
                    f,
                    "Rate limit exceeded. Maximum {limit} fireworks per second."
                )
            },
            Self::Throttled { limit, window } => write!(
                f,
                "Rate limit exceeded. Maximum {limit} fireworks per {} ms.",
                window.as_millis()
            ),
            Self::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PublishError {}

impl From<BroadcastError> for PublishError {
    fn from(e: BroadcastError) -> Self {
        Self::Transport(e)
    }
}

/// Throttles client fireworks and republishes them on the shared channel.
#[derive(Clone)]
pub struct Relay {
    limiter: Arc<SlidingWindowLimiter>,
    broadcaster: Arc<dyn Broadcaster>,
    channel: Arc<str>,
}

impl Relay {
    pub fn new(
        limiter: Arc<SlidingWindowLimiter>,
        broadcaster: Arc<dyn Broadcaster>,
        channel: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            limiter,
            broadcaster,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Admit `client_id` against the rate limit, then fan `event` out.
    pub async fn publish(
        &self,
        event: FireworkEvent,
        client_id: &str,
    ) -> Result<usize, PublishError> {
        if !self.limiter.admit_now(client_id).await {
            tracing::info!(client_id, "Firework throttled");
            return Err(PublishError::Throttled {
                limit: self.limiter.max_per_window(),
                window: self.limiter.window(),
            });
        }
        let reached = self
            .broadcaster
            .publish(&self.channel, &ChannelMessage::NewFirework(event))?;
        tracing::debug!(client_id, reached, channel = %self.channel, "Firework published");
        Ok(reached)
    }

    /// Broadcast the parameterless epoch event. Not rate limited.
    pub fn publish_epoch(&self) -> Result<usize, PublishError> {
        let reached = self
            .broadcaster
            .publish(&self.channel, &ChannelMessage::HappyNewYear)?;
        tracing::info!(reached, channel = %self.channel, "Epoch event published");
        Ok(reached)
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<ChannelMessage>, BroadcastError> {
        self.broadcaster.subscribe(&self.channel)
    }
}
