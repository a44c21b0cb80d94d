//! Host implementations for running outside a browser.
//!
//! There is no push service here, so [`FilePushManager`] works from a
//! subscription exported by a browser (`JSON.stringify(sub.toJSON())`).

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use super::{NotificationPlatform, PushManager, SubscribeOptions};
use crate::{
    error::PlatformError,
    models::{PermissionState, PushSubscription},
};

/// Permission fixed by configuration. There is nobody to prompt.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    state: PermissionState,
}

impl StaticPermission {
    pub fn new(state: PermissionState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl NotificationPlatform for StaticPermission {
    fn permission(&self) -> Option<PermissionState> {
        match self.state {
            PermissionState::Unsupported => None,
            s => Some(s),
        }
    }

    async fn request_permission(&self) -> Result<PermissionState, PlatformError> {
        match self.state {
            PermissionState::Unsupported => Err(PlatformError::Unsupported),
            PermissionState::Default => Err(PlatformError::Rejected(
                "no interactive permission prompt on this host".to_string(),
            )),
            s => Ok(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilePushManager {
    path: PathBuf,
}

impl FilePushManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<PushSubscription>, PlatformError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PlatformError::Rejected(e.to_string())),
        };

        serde_json::from_str::<PushSubscription>(&raw)
            .map(Some)
            .map_err(|e| PlatformError::Rejected(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl PushManager for FilePushManager {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PlatformError> {
        self.read()
    }

    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscription, PlatformError> {
        if !options.user_visible_only {
            return Err(PlatformError::Rejected(
                "silent push is not allowed".to_string(),
            ));
        }

        self.read()?.ok_or_else(|| {
            PlatformError::Rejected(format!(
                "no push service available; export a browser subscription to {}",
                self.path.display()
            ))
        })
    }
}
