pub mod alerts_api;
pub mod debounce;
pub mod permission_gate;
pub mod preferences;
pub mod server_key;
pub mod subscription_manager;
