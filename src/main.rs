use std::{process::ExitCode, sync::Arc};

use tracing_subscriber::EnvFilter;

use ratewatch_alerts::{
    AlertPreferences, PermissionGate, SubscriptionManager, config,
    models::{AlertSettings, ThresholdType},
    platform::{
        FileSettingsStore,
        headless::{FilePushManager, StaticPermission},
    },
    services::{alerts_api::AlertsApiClient, preferences::ReconcileOutcome},
};

const USAGE: &str = "usage: ratewatch-alerts <status|sync|permission|test|set> [key=value ...]

set keys:
  threshold=<decimal text>     threshold value, empty to clear
  type=above|below             comparison direction
  threshold-alerts=on|off      threshold alert toggle
  volatility=on|off            volatility alert toggle";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let settings = config::load();
    tracing::debug!(api = %settings.api_base_url, store = %settings.store_dir.display(), "loaded settings");

    let gate = Arc::new(PermissionGate::new(Arc::new(StaticPermission::new(
        settings.notification_permission,
    ))));
    let subscriptions = Arc::new(SubscriptionManager::new(
        Arc::new(FilePushManager::new(&settings.subscription_file)),
        settings.vapid_public_key.clone(),
    ));
    let prefs = AlertPreferences::new(
        &settings,
        Arc::new(FileSettingsStore::new(&settings.store_dir)),
        Arc::new(AlertsApiClient::new(&settings.api_base_url)),
        subscriptions.clone(),
        gate.clone(),
    );

    match command.as_str() {
        "status" => {
            let sub = subscriptions.current_subscription().await;
            println!("permission:   {}", gate.get_permission());
            match sub {
                Some(s) => println!("subscription: {}", s.endpoint),
                None => println!("subscription: none"),
            }
            print_settings(&prefs.settings());
            ExitCode::SUCCESS
        }
        "sync" => {
            let outcome = prefs.mount().await;
            println!("sync: {outcome:?}");
            print_settings(&prefs.settings());
            ExitCode::SUCCESS
        }
        "permission" => {
            let state = gate.request_permission().await;
            println!("permission: {state}");
            ExitCode::SUCCESS
        }
        "test" => {
            let outcome = prefs.send_test().await;
            println!("{}", outcome.message);
            if outcome.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        "set" => {
            for arg in rest {
                if let Err(e) = apply_edit(&prefs, arg) {
                    eprintln!("{e}\n\n{USAGE}");
                    return ExitCode::FAILURE;
                }
            }
            print_settings(&prefs.settings());

            match prefs.flush().await {
                None => println!("no changes"),
                Some(ReconcileOutcome::Saved) => println!("saved to backend"),
                Some(ReconcileOutcome::Skipped) => println!("alerts disabled; saved locally only"),
                Some(ReconcileOutcome::NoSubscription) => {
                    println!("saved locally; no push subscription available")
                }
                Some(ReconcileOutcome::Failed(e)) => {
                    println!("saved locally; backend save failed: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("unknown command: {other}\n\n{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn apply_edit(prefs: &AlertPreferences, arg: &str) -> Result<(), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {arg:?}"))?;

    match key {
        "threshold" => {
            prefs.set_threshold(value);
        }
        "type" => {
            prefs.set_threshold_type(value.parse::<ThresholdType>()?);
        }
        "threshold-alerts" => {
            prefs.set_threshold_enabled(parse_switch(value)?);
        }
        "volatility" => {
            prefs.set_volatility_enabled(parse_switch(value)?);
        }
        other => return Err(format!("unknown setting: {other}")),
    }
    Ok(())
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected on/off, got {other:?}")),
    }
}

fn print_settings(s: &AlertSettings) {
    println!(
        "threshold:    {} {} ({})",
        s.threshold_type,
        s.threshold.as_deref().unwrap_or("-"),
        if s.threshold_enabled { "on" } else { "off" }
    );
    println!(
        "volatility:   {}",
        if s.volatility_enabled { "on" } else { "off" }
    );
}
