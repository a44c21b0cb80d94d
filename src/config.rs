use std::{env, path::PathBuf, time::Duration};

use crate::models::PermissionState;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    /// URL-safe base64 public key issued by the push backend.
    pub vapid_public_key: Option<String>,

    pub store_dir: PathBuf,
    pub subscription_file: PathBuf,
    pub debounce: Duration,

    // headless driver only
    pub notification_permission: PermissionState,
}

impl Settings {
    /// Settings pointing at `api_base_url` with every other value at its default.
    pub fn for_api(api_base_url: impl Into<String>) -> Self {
        let store_dir = PathBuf::from(".ratewatch");
        Self {
            api_base_url: api_base_url.into(),
            vapid_public_key: None,
            subscription_file: store_dir.join("subscription.json"),
            store_dir,
            debounce: Duration::from_millis(1000),
            notification_permission: PermissionState::Default,
        }
    }
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let api_base_url = env::var("ALERTS_API_URL")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "http://localhost:8000".to_string());

    let vapid_public_key = env::var("VAPID_PUBLIC_KEY")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let store_dir = env::var("ALERTS_STORE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".ratewatch"));

    let subscription_file = env::var("PUSH_SUBSCRIPTION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| store_dir.join("subscription.json"));

    let debounce_ms = env::var("ALERTS_DEBOUNCE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(1000);

    let notification_permission = env::var("NOTIFICATION_PERMISSION")
        .ok()
        .and_then(|s| s.parse::<PermissionState>().ok())
        .unwrap_or(PermissionState::Default);

    Settings {
        api_base_url,
        vapid_public_key,
        store_dir,
        subscription_file,
        debounce: Duration::from_millis(debounce_ms),
        notification_permission,
    }
}
