//! Seams to the host runtime.
//!
//! In a browser these map onto `Notification`, `PushManager` and
//! `localStorage`; [`headless`] provides the versions the CLI uses.

pub mod headless;
pub mod store;

use async_trait::async_trait;

use crate::{
    error::PlatformError,
    models::{PermissionState, PushSubscription},
};

pub use store::{FileSettingsStore, MemoryStore, SettingsStore};

#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Current permission, `None` when the host has no notification capability.
    fn permission(&self) -> Option<PermissionState>;

    /// Shows the host's permission prompt and waits for the answer.
    async fn request_permission(&self) -> Result<PermissionState, PlatformError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Every delivered push must show a notification.
    pub user_visible_only: bool,
    pub application_server_key: Vec<u8>,
}

impl SubscribeOptions {
    pub fn visible(application_server_key: Vec<u8>) -> Self {
        Self {
            user_visible_only: true,
            application_server_key,
        }
    }
}

/// Push manager of the registered service worker.
#[async_trait]
pub trait PushManager: Send + Sync {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PlatformError>;

    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscription, PlatformError>;
}
