//! Alert preference reconciler.
//!
//! Every edit is written to the local store before anything asynchronous
//! happens, then a debounce window coalesces bursts of edits into a single
//! `POST /alerts/subscribe` carrying whatever the settings are when the
//! window closes. On mount the backend record, if any, replaces local state.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::{
    config::Settings,
    error::{ApiError, StoreError},
    models::{
        AlertSettings, PermissionState, PushSubscription, ThresholdType,
        alert_settings::format_threshold,
    },
    platform::SettingsStore,
    services::{
        alerts_api::{AlertStatus, AlertsBackend, SubscribeRequest, TestRequest},
        debounce::Debouncer,
        permission_gate::PermissionGate,
        subscription_manager::SubscriptionManager,
    },
};

/// Local store key holding the serialized [`AlertSettings`].
pub const SETTINGS_KEY: &str = "alertSettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Idle,
    LocalPersisted,
    Debouncing,
    Reconciling,
    Reconciled,
    ReconcileFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Both alert types off; nothing to tell the backend.
    Skipped,
    NoSubscription,
    Saved,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    NotSubscribed,
    Adopted,
    /// Local edits landed while the status request was in flight.
    Superseded,
    KeptLocal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub ok: bool,
    pub message: String,
}

impl TestOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Reads the stored settings; a missing or malformed record yields defaults.
pub fn load_settings(store: &dyn SettingsStore) -> AlertSettings {
    let Some(raw) = store.get_item(SETTINGS_KEY) else {
        return AlertSettings::default();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring malformed stored alert settings");
        AlertSettings::default()
    })
}

pub fn persist_settings(store: &dyn SettingsStore, settings: &AlertSettings) {
    let result = serde_json::to_string(settings)
        .map_err(StoreError::from)
        .and_then(|raw| store.set_item(SETTINGS_KEY, &raw));

    if let Err(e) = result {
        tracing::error!(error = %e, "failed to persist alert settings");
    }
}

fn adopt_status(settings: &mut AlertSettings, status: &AlertStatus) {
    settings.threshold_enabled = status.threshold_enabled;
    settings.volatility_enabled = status.volatility_alert;

    if let Some(threshold) = status.threshold {
        settings.threshold = Some(format_threshold(threshold));
        settings.threshold_type = status.threshold_type.unwrap_or_default();
    }
}

fn subscribe_request(sub: &PushSubscription, settings: &AlertSettings) -> SubscribeRequest {
    SubscribeRequest {
        endpoint: sub.endpoint.clone(),
        keys: sub.keys.clone(),
        threshold: settings.submitted_threshold(),
        threshold_type: settings.threshold_type,
        volatility_alert: settings.volatility_enabled,
    }
}

struct State {
    settings: AlertSettings,
    // bumped on every local edit
    revision: u64,
    subscribed: bool,
    timer: Debouncer,
    last_reconciled_at: Option<DateTime<Utc>>,
}

struct Shared {
    store: Arc<dyn SettingsStore>,
    backend: Arc<dyn AlertsBackend>,
    subscriptions: Arc<SubscriptionManager>,
    gate: Arc<PermissionGate>,
    state: Mutex<State>,
    phase: watch::Sender<ReconcilePhase>,
}

#[derive(Clone)]
pub struct AlertPreferences {
    shared: Arc<Shared>,
}

impl AlertPreferences {
    /// Loads whatever the local store holds; call [`mount`](Self::mount) to
    /// pull the backend's record afterwards.
    pub fn new(
        config: &Settings,
        store: Arc<dyn SettingsStore>,
        backend: Arc<dyn AlertsBackend>,
        subscriptions: Arc<SubscriptionManager>,
        gate: Arc<PermissionGate>,
    ) -> Self {
        let settings = load_settings(store.as_ref());
        let (phase, _rx) = watch::channel(ReconcilePhase::Idle);

        let state = State {
            settings,
            revision: 0,
            subscribed: false,
            timer: Debouncer::new(config.debounce),
            last_reconciled_at: None,
        };

        Self {
            shared: Arc::new(Shared {
                store,
                backend,
                subscriptions,
                gate,
                state: Mutex::new(state),
                phase,
            }),
        }
    }

    pub fn settings(&self) -> AlertSettings {
        self.shared.lock().settings.clone()
    }

    pub fn phase(&self) -> ReconcilePhase {
        *self.shared.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<ReconcilePhase> {
        self.shared.phase.subscribe()
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.lock().subscribed
    }

    pub fn last_reconciled_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().last_reconciled_at
    }

    pub fn is_debouncing(&self) -> bool {
        self.shared.lock().timer.is_pending()
    }

    pub fn set_threshold(&self, text: impl Into<String>) -> AlertSettings {
        let text = text.into();
        self.update(move |s| s.threshold = Some(text))
    }

    pub fn set_threshold_type(&self, threshold_type: ThresholdType) -> AlertSettings {
        self.update(|s| s.threshold_type = threshold_type)
    }

    pub fn set_threshold_enabled(&self, enabled: bool) -> AlertSettings {
        self.update(|s| s.threshold_enabled = enabled)
    }

    pub fn toggle_threshold(&self) -> AlertSettings {
        self.update(|s| s.threshold_enabled = !s.threshold_enabled)
    }

    pub fn set_volatility_enabled(&self, enabled: bool) -> AlertSettings {
        self.update(|s| s.volatility_enabled = enabled)
    }

    pub fn toggle_volatility(&self) -> AlertSettings {
        self.update(|s| s.volatility_enabled = !s.volatility_enabled)
    }

    /// Applies an edit, persists it synchronously and restarts the debounce
    /// window. An edit that changes nothing is ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn update(&self, edit: impl FnOnce(&mut AlertSettings)) -> AlertSettings {
        let mut st = self.shared.lock();

        let mut next = st.settings.clone();
        edit(&mut next);
        if next.threshold.as_deref() == Some("") {
            next.threshold = None;
        }
        if next == st.settings {
            return next;
        }

        persist_settings(self.shared.store.as_ref(), &next);
        st.settings = next.clone();
        st.revision += 1;
        self.shared.phase.send_replace(ReconcilePhase::LocalPersisted);

        let shared = self.shared.clone();
        st.timer.schedule(async move {
            shared.reconcile().await;
        });
        self.shared.phase.send_replace(ReconcilePhase::Debouncing);

        next
    }

    /// Runs a pending reconcile now instead of waiting out the window.
    /// Returns `None` when nothing was pending.
    pub async fn flush(&self) -> Option<ReconcileOutcome> {
        let pending = self.shared.lock().timer.cancel();
        if !pending {
            return None;
        }
        Some(self.shared.reconcile().await)
    }

    /// If this installation already has a push subscription, replaces local
    /// settings with the backend's record. Never blocks on failure.
    pub async fn mount(&self) -> MountOutcome {
        let Some(sub) = self.shared.subscriptions.current_subscription().await else {
            return MountOutcome::NotSubscribed;
        };

        let issued_at = {
            let mut st = self.shared.lock();
            st.subscribed = true;
            st.revision
        };

        let status = match self.shared.backend.status(&sub.endpoint).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(endpoint = %sub.endpoint, error = %e, "failed to sync alert status");
                return MountOutcome::KeptLocal;
            }
        };

        let mut st = self.shared.lock();
        if st.revision != issued_at {
            tracing::info!("alert settings edited during sync; keeping local edits");
            return MountOutcome::Superseded;
        }

        let mut adopted = st.settings.clone();
        adopt_status(&mut adopted, &status);
        persist_settings(self.shared.store.as_ref(), &adopted);
        st.settings = adopted;

        tracing::debug!(endpoint = %sub.endpoint, "adopted backend alert settings");
        MountOutcome::Adopted
    }

    /// Sends a test push to this installation, creating the subscription
    /// first when permission is already granted. Leaves settings untouched.
    pub async fn send_test(&self) -> TestOutcome {
        let subscriptions = &self.shared.subscriptions;

        let sub = match subscriptions.current_subscription().await {
            Some(sub) => sub,
            None => {
                if !subscriptions.has_server_key() {
                    return TestOutcome::failed("VAPID public key not configured");
                }
                if self.shared.gate.get_permission() != PermissionState::Granted {
                    return TestOutcome::failed("Notification permission not granted");
                }
                match subscriptions.ensure_subscription().await {
                    Some(sub) => sub,
                    None => return TestOutcome::failed("Failed to enable push notifications"),
                }
            }
        };
        self.shared.lock().subscribed = true;

        match self.shared.backend.send_test(&TestRequest::from(&sub)).await {
            Ok(()) => TestOutcome::ok("Test notification sent!"),
            Err(e @ ApiError::Status { .. }) => {
                tracing::warn!(error = %e, "test notification rejected");
                TestOutcome::failed(e.detail().unwrap_or("Failed to send"))
            }
            Err(e) => {
                tracing::warn!(error = %e, "test notification request failed");
                TestOutcome::failed(e.to_string())
            }
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publishes `phase` unless the settings moved on after `revision`.
    fn finish(&self, revision: u64, phase: ReconcilePhase) {
        let st = self.lock();
        if st.revision == revision {
            self.phase.send_replace(phase);
        }
    }

    async fn reconcile(&self) -> ReconcileOutcome {
        let (settings, revision) = {
            let st = self.lock();
            (st.settings.clone(), st.revision)
        };

        if !settings.any_enabled() {
            tracing::debug!("alerts disabled; skipping backend save");
            self.finish(revision, ReconcilePhase::Idle);
            return ReconcileOutcome::Skipped;
        }

        self.finish(revision, ReconcilePhase::Reconciling);

        let Some(sub) = self.subscriptions.ensure_subscription().await else {
            self.finish(revision, ReconcilePhase::ReconcileFailed);
            return ReconcileOutcome::NoSubscription;
        };
        self.lock().subscribed = true;

        if settings.is_armed_but_unset() {
            tracing::debug!(threshold = ?settings.threshold, "threshold alert on without a usable value");
        }

        let req = subscribe_request(&sub, &settings);
        match self.backend.subscribe(&req).await {
            Ok(()) => {
                self.lock().last_reconciled_at = Some(Utc::now());
                tracing::info!(
                    endpoint = %sub.endpoint,
                    threshold = ?req.threshold,
                    threshold_type = %req.threshold_type,
                    volatility = req.volatility_alert,
                    "alert preferences saved"
                );
                self.finish(revision, ReconcilePhase::Reconciled);
                ReconcileOutcome::Saved
            }
            Err(e) => {
                tracing::error!(endpoint = %sub.endpoint, error = %e, "failed to save alert preferences");
                self.finish(revision, ReconcilePhase::ReconcileFailed);
                ReconcileOutcome::Failed(e.to_string())
            }
        }
    }
}
