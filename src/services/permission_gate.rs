use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;

use crate::{models::PermissionState, platform::NotificationPlatform};

/// What the "enable notifications" banner should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDisplay {
    Hidden,
    /// Denied; only the browser settings can undo it.
    Blocked,
    Ask,
}

pub struct PermissionGate {
    platform: Arc<dyn NotificationPlatform>,
    state: watch::Sender<PermissionState>,
    loading: AtomicBool,
}

impl PermissionGate {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        let initial = platform.permission().unwrap_or(PermissionState::Unsupported);
        let (state, _rx) = watch::channel(initial);

        Self {
            platform,
            state,
            loading: AtomicBool::new(false),
        }
    }

    /// Reads the host permission right now.
    pub fn get_permission(&self) -> PermissionState {
        self.platform
            .permission()
            .unwrap_or(PermissionState::Unsupported)
    }

    /// Last state published to observers.
    pub fn state(&self) -> PermissionState {
        *self.state.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<PermissionState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_granted(&self) -> bool {
        self.state() == PermissionState::Granted
    }

    pub fn is_denied(&self) -> bool {
        self.state() == PermissionState::Denied
    }

    pub fn is_supported(&self) -> bool {
        self.state() != PermissionState::Unsupported
    }

    /// Prompts at most once. A decided permission is returned as-is, and a
    /// failing prompt reads as `default`. Publishes exactly one state per call.
    pub async fn request_permission(&self) -> PermissionState {
        let current = self.get_permission();
        if current == PermissionState::Unsupported || current.is_decided() {
            self.state.send_replace(current);
            return current;
        }

        let result = {
            let _loading = LoadingGuard::set(&self.loading);
            match self.platform.request_permission().await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "notification permission prompt failed");
                    PermissionState::Default
                }
            }
        };

        tracing::info!(permission = %result, "notification permission resolved");
        self.state.send_replace(result);
        result
    }

    pub fn prompt_display(&self, dismissed: bool) -> PromptDisplay {
        match self.state() {
            _ if dismissed => PromptDisplay::Hidden,
            PermissionState::Unsupported | PermissionState::Granted => PromptDisplay::Hidden,
            PermissionState::Denied => PromptDisplay::Blocked,
            PermissionState::Default => PromptDisplay::Ask,
        }
    }
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
