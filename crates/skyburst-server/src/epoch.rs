use std::time::Duration;

use tokio::task::JoinHandle;

use skyburst_core::time::unix_secs_now;

use crate::relay::Relay;

/// How long to wait from `now` until `target` (both Unix seconds).
/// `None` once the target has passed.
pub fn delay_until(target: u64, now: u64) -> Option<Duration> {
    target.checked_sub(now).map(Duration::from_secs)
}

/// Broadcast `happy-new-year` once when the wall clock reaches `target_unix_secs`.
/// Returns `None` (and spawns nothing) if the target is already in the past.
pub fn spawn_epoch_timer(relay: Relay, target_unix_secs: u64) -> Option<JoinHandle<()>> {
    let Some(delay) = delay_until(target_unix_secs, unix_secs_now()) else {
        tracing::warn!(target_unix_secs, "Epoch target already passed, timer not started");
        return None;
    };
    tracing::info!(
        target_unix_secs,
        in_secs = delay.as_secs(),
        "Epoch timer armed"
    );
    Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = relay.publish_epoch() {
            tracing::error!(error = %e, "Epoch broadcast failed");
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use skyburst_core::net::messages::ChannelMessage;

    use super::*;
    use crate::rate_limit::SlidingWindowLimiter;
    use crate::relay::ChannelHub;

    #[test]
    fn delay_computation() {
        assert_eq!(delay_until(100, 40), Some(Duration::from_secs(60)));
        assert_eq!(delay_until(100, 100), Some(Duration::ZERO));
        assert_eq!(delay_until(100, 101), None);
    }

    #[tokio::test]
    async fn past_target_is_skipped() {
        let relay = Relay::new(
            Arc::new(SlidingWindowLimiter::new(5, Duration::from_secs(1))),
            Arc::new(ChannelHub::new(4)),
            "c",
        );
        assert!(spawn_epoch_timer(relay, 1).is_none());
    }

    #[tokio::test]
    async fn fires_once_at_target() {
        let relay = Relay::new(
            Arc::new(SlidingWindowLimiter::new(5, Duration::from_secs(1))),
            Arc::new(ChannelHub::new(4)),
            "c",
        );
        let mut rx = relay.subscribe().unwrap();
        let handle = spawn_epoch_timer(relay, unix_secs_now() + 1).unwrap();
        handle.await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), ChannelMessage::HappyNewYear);
        assert!(rx.try_recv().is_err());
    }
}
