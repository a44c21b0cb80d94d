use serde::{Deserialize, Serialize};

/// Encryption material the push service needs to deliver to this subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Wire form of a browser push subscription (`PushSubscription.toJSON()`).
///
/// Issued by the push service; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}
