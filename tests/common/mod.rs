#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

use ratewatch_alerts::{
    AlertPreferences, PermissionGate, SubscriptionManager,
    config::Settings,
    error::{ApiError, PlatformError},
    models::{PermissionState, PushSubscription, SubscriptionKeys},
    platform::{MemoryStore, NotificationPlatform, PushManager, SettingsStore, SubscribeOptions},
    services::alerts_api::{AlertStatus, AlertsBackend, SubscribeRequest, TestRequest},
};

pub const VAPID_KEY: &str =
    "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U";

pub fn subscription(n: usize) -> PushSubscription {
    PushSubscription {
        endpoint: format!("https://push.example/send/{n}"),
        keys: SubscriptionKeys {
            p256dh: format!("p256dh-{n}"),
            auth: format!("auth-{n}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Notification permission
// ---------------------------------------------------------------------------

pub struct FakeNotifications {
    pub state: Mutex<Option<PermissionState>>,
    pub answer: Result<PermissionState, PlatformError>,
    pub prompts: AtomicUsize,
}

impl FakeNotifications {
    pub fn new(state: Option<PermissionState>, answer: Result<PermissionState, PlatformError>) -> Self {
        Self {
            state: Mutex::new(state),
            answer,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn with(state: PermissionState) -> Self {
        Self::new(Some(state), Ok(state))
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationPlatform for FakeNotifications {
    fn permission(&self) -> Option<PermissionState> {
        *self.state.lock().unwrap()
    }

    async fn request_permission(&self) -> Result<PermissionState, PlatformError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Ok(s) = &self.answer {
            *self.state.lock().unwrap() = Some(*s);
        }
        self.answer.clone()
    }
}

// ---------------------------------------------------------------------------
// Push manager
// ---------------------------------------------------------------------------

pub struct FakePush {
    pub current: Mutex<Option<PushSubscription>>,
    pub unavailable: bool,
    pub reject: bool,
    pub subscribe_calls: AtomicUsize,
    pub last_options: Mutex<Option<SubscribeOptions>>,
}

impl FakePush {
    pub fn empty() -> Self {
        Self {
            current: Mutex::new(None),
            unavailable: false,
            reject: false,
            subscribe_calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    pub fn subscribed(sub: PushSubscription) -> Self {
        let push = Self::empty();
        *push.current.lock().unwrap() = Some(sub);
        push
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushManager for FakePush {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PlatformError> {
        if self.unavailable {
            return Err(PlatformError::WorkerUnavailable);
        }
        Ok(self.current.lock().unwrap().clone())
    }

    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscription, PlatformError> {
        let n = self.subscribe_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_options.lock().unwrap() = Some(options);

        if self.reject {
            return Err(PlatformError::PermissionDenied);
        }

        let sub = subscription(n);
        *self.current.lock().unwrap() = Some(sub.clone());
        Ok(sub)
    }
}

// ---------------------------------------------------------------------------
// Alert backend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeBackend {
    pub subscribes: Mutex<Vec<SubscribeRequest>>,
    pub tests: Mutex<Vec<TestRequest>>,
    pub status_queries: Mutex<Vec<String>>,

    /// `None` answers `/alerts/status` with a 500.
    pub status: Mutex<Option<AlertStatus>>,
    /// When set, `/alerts/status` waits for a notification before answering.
    pub status_gate: Option<Arc<Notify>>,
    pub fail_subscribe: Mutex<bool>,
    /// Non-2xx reply for `/alerts/test`: status and optional `detail`.
    pub test_failure: Option<(u16, Option<String>)>,
}

impl FakeBackend {
    pub fn subscribe_count(&self) -> usize {
        self.subscribes.lock().unwrap().len()
    }

    pub fn last_subscribe(&self) -> Option<SubscribeRequest> {
        self.subscribes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AlertsBackend for FakeBackend {
    async fn status(&self, endpoint: &str) -> Result<AlertStatus, ApiError> {
        self.status_queries.lock().unwrap().push(endpoint.to_string());
        if let Some(gate) = &self.status_gate {
            gate.notified().await;
        }

        let status = self.status.lock().unwrap().clone();
        status.ok_or(ApiError::Status {
            status: 500,
            detail: Some("Internal server error".to_string()),
        })
    }

    async fn subscribe(&self, req: &SubscribeRequest) -> Result<(), ApiError> {
        if *self.fail_subscribe.lock().unwrap() {
            return Err(ApiError::Status {
                status: 500,
                detail: Some("Failed to subscribe".to_string()),
            });
        }
        self.subscribes.lock().unwrap().push(req.clone());
        Ok(())
    }

    async fn send_test(&self, req: &TestRequest) -> Result<(), ApiError> {
        self.tests.lock().unwrap().push(req.clone());
        match &self.test_failure {
            Some((status, detail)) => Err(ApiError::Status {
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub prefs: AlertPreferences,
    pub store: Arc<MemoryStore>,
    pub backend: Arc<FakeBackend>,
    pub push: Arc<FakePush>,
    pub notifications: Arc<FakeNotifications>,
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::for_api("http://backend.test");
    settings.vapid_public_key = Some(VAPID_KEY.to_string());
    settings.debounce = Duration::from_millis(1000);
    settings
}

pub fn harness(
    store: Arc<MemoryStore>,
    backend: FakeBackend,
    push: FakePush,
    notifications: FakeNotifications,
) -> Harness {
    let settings = test_settings();
    let backend = Arc::new(backend);
    let push = Arc::new(push);
    let notifications = Arc::new(notifications);

    let subscriptions = Arc::new(SubscriptionManager::new(
        push.clone(),
        settings.vapid_public_key.clone(),
    ));
    let gate = Arc::new(PermissionGate::new(notifications.clone()));
    let prefs = AlertPreferences::new(
        &settings,
        store.clone(),
        backend.clone(),
        subscriptions,
        gate,
    );

    Harness {
        prefs,
        store,
        backend,
        push,
        notifications,
    }
}

/// Fresh store, empty push manager, permission granted.
pub fn granted_harness() -> Harness {
    harness(
        Arc::new(MemoryStore::new()),
        FakeBackend::default(),
        FakePush::empty(),
        FakeNotifications::with(PermissionState::Granted),
    )
}

pub fn stored_record(store: &MemoryStore) -> Option<serde_json::Value> {
    store
        .get_item("alertSettings")
        .map(|raw| serde_json::from_str(&raw).expect("stored record is json"))
}
