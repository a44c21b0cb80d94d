use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    models::PushSubscription,
    platform::{PushManager, SubscribeOptions},
    services::server_key::decode_server_key,
};

/// Owns the "one push subscription per installation" rule.
pub struct SubscriptionManager {
    push: Arc<dyn PushManager>,
    server_key: Option<String>,
    // check-then-create must not interleave
    ensure_lock: Mutex<()>,
}

impl SubscriptionManager {
    pub fn new(push: Arc<dyn PushManager>, server_key: Option<String>) -> Self {
        Self {
            push,
            server_key: server_key.filter(|k| !k.trim().is_empty()),
            ensure_lock: Mutex::new(()),
        }
    }

    pub fn has_server_key(&self) -> bool {
        self.server_key.is_some()
    }

    /// Read-only probe; never creates.
    pub async fn current_subscription(&self) -> Option<PushSubscription> {
        match self.push.get_subscription().await {
            Ok(sub) => sub,
            Err(e) => {
                tracing::warn!(error = %e, "could not read push subscription");
                None
            }
        }
    }

    /// Existing subscription, or a new one scoped by the configured server key.
    pub async fn ensure_subscription(&self) -> Option<PushSubscription> {
        self.ensure_subscription_with(self.server_key.as_deref()).await
    }

    /// Same as [`ensure_subscription`](Self::ensure_subscription) with an explicit key.
    /// Every failure is logged and reported as `None`.
    pub async fn ensure_subscription_with(&self, server_key: Option<&str>) -> Option<PushSubscription> {
        let _guard = self.ensure_lock.lock().await;

        match self.push.get_subscription().await {
            Ok(Some(sub)) => return Some(sub),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "push manager unavailable");
                return None;
            }
        }

        let Some(key) = server_key else {
            tracing::error!("no VAPID public key configured; cannot subscribe to push");
            return None;
        };

        let key = match decode_server_key(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "invalid VAPID public key");
                return None;
            }
        };

        match self.push.subscribe(SubscribeOptions::visible(key)).await {
            Ok(sub) => {
                tracing::info!(endpoint = %sub.endpoint, "push subscription created");
                Some(sub)
            }
            Err(e) => {
                tracing::warn!(error = %e, "push subscription request failed");
                None
            }
        }
    }
}
